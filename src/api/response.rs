//! Response normalization
//!
//! Every backend call ends up here. Successful HTTP exchanges go through
//! [`normalize_success`], transport-level failures through [`normalize_error`],
//! so callers only ever see a [`NormalizedResult`] or an [`ApiError`].

use crate::api::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const DEFAULT_SUCCESS_MESSAGE: &str = "success";

/// Uniform shape of a successful backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult<T = Value> {
    pub ok: bool,
    pub data: Option<T>,
    pub message: String,
    pub status_code: Option<u16>,
}

impl NormalizedResult<Value> {
    /// Decode the payload into a typed structure.
    ///
    /// A missing payload is decoded from `null`, so `Option<T>` and `()` targets
    /// accept it while required structs report an invalid payload.
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<T> {
        let status_code = self.status_code;
        serde_json::from_value(self.data.unwrap_or(Value::Null))
            .map_err(|e| ApiError::invalid_payload(e.to_string(), status_code))
    }
}

/// Envelope every backend handler wraps its payload in.
///
/// All fields are optional and read independently, so a mistyped field does not
/// hide the others; defaults are applied by the normalizer.
#[derive(Debug, Default)]
struct Envelope {
    is_success: Option<bool>,
    message: Option<String>,
    data: Option<Value>,
}

impl Envelope {
    /// Parse a raw body. Empty, non-JSON or non-object bodies yield an empty envelope.
    fn parse(body: &[u8]) -> Self {
        let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };

        Self {
            is_success: fields.get("isSuccess").and_then(Value::as_bool),
            message: fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            data: fields.remove("data").filter(|data| !data.is_null()),
        }
    }
}

/// Raw outcome of a request that did not produce a usable 2xx response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server responded with an error status
    Response { status: u16, body: Vec<u8> },
    /// Request went out but nothing came back (connect failure, timeout, dropped body)
    NoResponse { reason: String },
    /// Request was never sent (bad URL, builder failure)
    NotSent { message: Option<String> },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::NotSent {
                message: Some(err.to_string()),
            }
        } else {
            TransportError::NoResponse {
                reason: err.to_string(),
            }
        }
    }
}

/// Normalize a 2xx response body.
///
/// Fails with a business error when the body's `isSuccess` flag is false or absent.
pub fn normalize_success(status: u16, body: &[u8]) -> ApiResult<NormalizedResult> {
    let envelope = Envelope::parse(body);

    if !envelope.is_success.unwrap_or(false) {
        let err = ApiError::business(envelope.message, status);
        warn!("Request rejected by backend: status={}, message={}", status, err.message);
        return Err(err);
    }

    Ok(NormalizedResult {
        ok: true,
        data: envelope.data,
        message: envelope
            .message
            .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
        status_code: Some(status),
    })
}

/// Normalize a transport-level failure into an [`ApiError`]
pub fn normalize_error(error: TransportError) -> ApiError {
    let err = match error {
        TransportError::Response { status, body } => {
            let envelope = Envelope::parse(&body);
            ApiError::server(status, envelope.message, envelope.is_success)
        }
        TransportError::NoResponse { reason } => {
            debug!("No response received: {}", reason);
            ApiError::no_response()
        }
        TransportError::NotSent { message } => ApiError::not_sent(message),
    };

    warn!(
        "Request failed: kind={:?}, status={:?}, message={}",
        err.kind, err.status_code, err.message
    );
    err
}
