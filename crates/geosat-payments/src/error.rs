//! Payment Error Types

use thiserror::Error;

use geosat_core::ClientError;

use crate::checkout::Leg;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment workflow errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Backend refused or failed to create the checkout order
    #[error("Order creation failed: {0}")]
    CreateOrder(#[source] ClientError),

    /// Verify request failed (transport, auth or non-2xx)
    #[error("Payment verification failed: {0}")]
    Verification(#[source] ClientError),

    /// Verify endpoint answered but did not accept the receipt
    #[error("Payment verification rejected: {0}")]
    VerificationRejected(String),

    /// Checkout script could not be loaded
    #[error("Checkout widget failed to load: {0}")]
    WidgetLoad(String),

    /// Script loaded but no widget constructor is available
    #[error("Checkout widget unavailable")]
    WidgetUnavailable,

    /// The same leg for the same id is already running
    #[error("{leg} payment already in progress for {id}")]
    LegInFlight { leg: Leg, id: String },

    /// Checkout signature could not be computed
    #[error("Signature error: {0}")]
    Signature(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::CreateOrder(e) | PaymentError::Verification(e) | PaymentError::Client(e) => {
                e.is_retryable()
            }
            PaymentError::WidgetLoad(_) => true,
            _ => false,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::CreateOrder(_)
            | PaymentError::WidgetLoad(_)
            | PaymentError::WidgetUnavailable => "Failed to process payment".into(),
            PaymentError::Verification(e) if e.is_auth() => e.user_message(),
            PaymentError::Verification(_) | PaymentError::VerificationRejected(_) => {
                "Payment could not be verified. Please try again.".into()
            }
            PaymentError::LegInFlight { .. } => "A payment is already in progress.".into(),
            PaymentError::Client(e) => e.user_message(),
            PaymentError::Signature(_) => "An error occurred processing your payment.".into(),
        }
    }
}
