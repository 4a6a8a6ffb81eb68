use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_FAILURE_MESSAGE: &str = "request failed";
pub const NO_RESPONSE_MESSAGE: &str = "no response from server";
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Where in the request lifecycle a call went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Server answered 2xx but the body's success flag was false
    Business,
    /// Server answered with an error status
    Server,
    /// Request was sent but no response came back
    Network,
    /// Request was never sent
    Client,
    /// Response arrived but its payload did not match the expected shape
    Payload,
}

/// Normalized failure handed to every call site.
///
/// Carries the same three fields as a successful `NormalizedResult`
/// (`message`, `ok`, `status_code`) so callers can display `message` directly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub ok: bool,
    pub status_code: Option<u16>,
}

impl ApiError {
    pub fn business(message: Option<String>, status_code: u16) -> Self {
        Self {
            kind: ApiErrorKind::Business,
            message: message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            ok: false,
            status_code: Some(status_code),
        }
    }

    pub fn server(status_code: u16, message: Option<String>, ok: Option<bool>) -> Self {
        Self {
            kind: ApiErrorKind::Server,
            message: message.unwrap_or_else(|| format!("server error: {}", status_code)),
            ok: ok.unwrap_or(false),
            status_code: Some(status_code),
        }
    }

    pub fn no_response() -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: NO_RESPONSE_MESSAGE.to_string(),
            ok: false,
            status_code: None,
        }
    }

    pub fn not_sent(message: Option<String>) -> Self {
        Self {
            kind: ApiErrorKind::Client,
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            ok: false,
            status_code: None,
        }
    }

    pub fn invalid_payload(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            kind: ApiErrorKind::Payload,
            message: format!("invalid response payload: {}", message.into()),
            ok: false,
            status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let err = ApiError::business(Some("Insufficient stock".to_string()), 200);
        assert_eq!(err.to_string(), "Insufficient stock");
    }

    #[test]
    fn test_server_error_defaults() {
        let err = ApiError::server(503, None, None);
        assert_eq!(err.message, "server error: 503");
        assert!(!err.ok);
        assert_eq!(err.status_code, Some(503));
    }

    #[test]
    fn test_not_sent_blank_message_falls_back() {
        let err = ApiError::not_sent(Some("   ".to_string()));
        assert_eq!(err.message, UNKNOWN_ERROR_MESSAGE);
        assert_eq!(err.kind, ApiErrorKind::Client);
    }
}
