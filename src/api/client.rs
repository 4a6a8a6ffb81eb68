use crate::api::error::{ApiError, ApiResult};
use crate::api::response::{normalize_error, normalize_success, NormalizedResult, TransportError};
use crate::config::ApiConfig;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Shared HTTP client for the marketplace backend.
///
/// Every request is sent against `{base_url}/api`, carries a bearer token when
/// one is configured, and comes back through the response normalizer.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("storefront-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ApiError::not_sent(Some(format!("Failed to create HTTP client: {}", e)))
            })?;

        let base_url = format!("{}/api", config.base_url.trim_end_matches('/'));
        info!("API client initialized with base URL: {}", base_url);

        Ok(Self {
            http_client,
            base_url,
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token, e.g. after login or logout
    pub fn set_auth_token(&mut self, token: Option<String>) {
        self.auth_token = token.filter(|t| !t.is_empty());
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get(&self, endpoint: &str) -> ApiResult<NormalizedResult> {
        self.execute(self.request(Method::GET, endpoint)).await
    }

    pub async fn post<B>(&self, endpoint: &str, body: &B) -> ApiResult<NormalizedResult>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::POST, endpoint).json(body))
            .await
    }

    pub async fn put<B>(&self, endpoint: &str, body: &B) -> ApiResult<NormalizedResult>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::PUT, endpoint).json(body))
            .await
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = self.url(endpoint);
        debug!("{} {}", method, url);

        let request = self
            .http_client
            .request(method, &url)
            .header("Content-Type", "application/json");

        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<NormalizedResult> {
        let response = request
            .send()
            .await
            .map_err(|e| normalize_error(TransportError::from(e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| normalize_error(TransportError::from(e)))?;

        if !status.is_success() {
            return Err(normalize_error(TransportError::Response {
                status: status.as_u16(),
                body: body.to_vec(),
            }));
        }

        normalize_success(status.as_u16(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiErrorKind;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 2,
            auth_token: None,
        }
    }

    #[test]
    fn test_base_url_gets_api_suffix() {
        let client = ApiClient::new(&config("http://localhost:3030/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3030/api");
        assert_eq!(
            client.url("/payment/check_payment_status/TX1"),
            "http://localhost:3030/api/payment/check_payment_status/TX1"
        );
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let mut client = ApiClient::new(&config("http://localhost:3030")).unwrap();
        client.set_auth_token(Some(String::new()));
        assert!(client.auth_token.is_none());
        client.set_auth_token(Some("jwt".to_string()));
        assert_eq!(client.auth_token.as_deref(), Some("jwt"));
    }

    #[tokio::test]
    async fn test_malformed_url_is_never_sent() {
        let client = ApiClient::new(&config("not a url")).unwrap();
        let err = client.get("/orders").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Client);
        assert_eq!(err.status_code, None);
        assert!(!err.ok);
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_no_response() {
        let client = ApiClient::new(&config("http://127.0.0.1:1")).unwrap();
        let err = client.get("/orders").await.unwrap_err();
        assert_eq!(err.message, "no response from server");
        assert_eq!(err.status_code, None);
    }
}
