//! Client Configuration

use std::time::Duration;

use crate::endpoints::Endpoints;
use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_CHECKOUT_SCRIPT: &str = "https://checkout.razorpay.com/v1/checkout.js";

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://host/api/`
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Status poll interval
    pub poll_interval: Duration,

    /// Pause between a payment success alert and the redirect
    pub redirect_delay: Duration,

    /// Checkout widget script URL
    pub checkout_script_url: String,

    /// Merchant name shown by the checkout widget
    pub merchant_name: String,

    pub currency: String,

    pub theme_color: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(30),
            redirect_delay: Duration::from_millis(2000),
            checkout_script_url: DEFAULT_CHECKOUT_SCRIPT.into(),
            merchant_name: "GeoSearch Satellite".into(),
            currency: "INR".into(),
            theme_color: "#38b2ac".into(),
        }
    }
}

impl ClientConfig {
    /// Create from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            base_url: std::env::var("GEOSAT_API_URL").unwrap_or(defaults.base_url),
            request_timeout: env_duration("GEOSAT_TIMEOUT_SECS", Duration::from_secs)?
                .unwrap_or(defaults.request_timeout),
            poll_interval: env_duration("GEOSAT_POLL_SECS", Duration::from_secs)?
                .unwrap_or(defaults.poll_interval),
            redirect_delay: env_duration("GEOSAT_REDIRECT_MS", Duration::from_millis)?
                .unwrap_or(defaults.redirect_delay),
            checkout_script_url: std::env::var("GEOSAT_CHECKOUT_SCRIPT")
                .unwrap_or(defaults.checkout_script_url),
            merchant_name: std::env::var("GEOSAT_MERCHANT_NAME")
                .unwrap_or(defaults.merchant_name),
            currency: std::env::var("GEOSAT_CURRENCY").unwrap_or(defaults.currency),
            theme_color: defaults.theme_color,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_redirect_delay(mut self, redirect_delay: Duration) -> Self {
        self.redirect_delay = redirect_delay;
        self
    }

    /// Check the values that would otherwise fail late
    pub fn validate(&self) -> Result<()> {
        Endpoints::new(&self.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", self.base_url, e)))?;

        if self.poll_interval.is_zero() {
            return Err(ClientError::Config("poll interval must be non-zero".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::Config("request timeout must be non-zero".into()));
        }
        Ok(())
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::new(&self.base_url)
    }
}

fn env_duration(name: &str, unit: fn(u64) -> Duration) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|n| Some(unit(n)))
            .map_err(|_| ClientError::Config(format!("{} must be a whole number, got '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = ClientConfig::default().with_poll_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let config = ClientConfig::default().with_base_url("::nope::");
        assert!(config.validate().is_err());
    }
}
