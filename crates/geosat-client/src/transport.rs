//! HTTP Transport
//!
//! The wire layer under [`crate::ApiClient`]. Implement [`Transport`] to run
//! the client against something other than reqwest (tests, recorded fixtures).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use geosat_core::{ClientError, Envelope, HttpMethod, Result};

/// A fully resolved backend request
#[derive(Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: Url,

    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,

    /// JSON body
    pub body: Option<Value>,
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("body", &self.body)
            .finish()
    }
}

/// Status code plus the decoded JSON body (`Null` when the body was empty or not JSON)
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the response envelope; non-2xx statuses become `ClientError::Api`
    pub fn into_envelope<T: DeserializeOwned>(self) -> Result<Envelope<T>> {
        if !self.is_success() {
            let message = self
                .body
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(
                    || format!("Request failed with status {}", self.status),
                    str::to_string,
                );
            return Err(ClientError::Api {
                status: self.status,
                message,
            });
        }
        serde_json::from_value(self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Transport trait (Strategy pattern)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Only transport failures are errors; any HTTP status
    /// is returned as a response.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client.request(method, request.url.clone());
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_status_uses_backend_message() {
        let response = ApiResponse::new(400, json!({"status": "error", "message": "Bad coordinates"}));
        match response.into_envelope::<Value>() {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad coordinates");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_status_without_body() {
        let response = ApiResponse::new(502, Value::Null);
        assert!(matches!(
            response.into_envelope::<Value>(),
            Err(ClientError::Api { status: 502, .. })
        ));
    }

    #[test]
    fn test_debug_redacts_bearer() {
        let request = ApiRequest {
            method: HttpMethod::Get,
            url: Url::parse("http://localhost/api/get-user/").unwrap(),
            bearer: Some("secret-token".into()),
            body: None,
        };
        assert!(!format!("{:?}", request).contains("secret-token"));
    }
}
