//! Error Types

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// Form input rejected before any network call
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Transport failure (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Backend answered 2xx but the envelope status was not `success`
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Still unauthorized after a token refresh
    #[error("Unauthorized")]
    Unauthorized,

    /// Token refresh failed; stored tokens were cleared
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Preference store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Check if re-submitting the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// True when the user has to log in again
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Unauthorized | ClientError::SessionExpired(_))
    }

    /// Message suitable for an inline form error or a toast
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(errors) => errors
                .first()
                .map_or_else(|| "Invalid input".into(), str::to_string),
            ClientError::Network(_) => "Network error occurred".into(),
            ClientError::Api { message, .. } | ClientError::Rejected(message) => message.clone(),
            ClientError::Unauthorized | ClientError::SessionExpired(_) => {
                "Your session has expired. Please log in again.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Validation(errors)
    }
}

/// Per-field validation messages, one message per field
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`; the first message for a field wins
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn first(&self) -> Option<&str> {
        self.fields.values().next().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when no field failed
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Invalid email format");
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_retryable() {
        assert!(ClientError::Network("timeout".into()).is_retryable());
        assert!(ClientError::Api { status: 502, message: "bad gateway".into() }.is_retryable());
        assert!(!ClientError::Api { status: 400, message: "bad".into() }.is_retryable());
        assert!(!ClientError::Unauthorized.is_retryable());
    }

    #[test]
    fn test_user_message_uses_backend_text() {
        let err = ClientError::Rejected("Invalid credentials".into());
        assert_eq!(err.user_message(), "Invalid credentials");
    }
}
