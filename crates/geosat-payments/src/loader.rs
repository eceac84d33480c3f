//! Checkout Script Loader
//!
//! The checkout widget lives in a script that must be present before the
//! first checkout. Loading is idempotent: concurrent callers share a single
//! injection, and a failed injection is forgotten so the next call retries.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use geosat_core::ClientConfig;

use crate::checkout::CheckoutWidget;
use crate::error::{PaymentError, Result};

/// The environment the checkout script is loaded into
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Whether a script with this source URL is already present
    fn has_script(&self, url: &str) -> bool;

    /// The widget constructor exposed by the script, once loaded
    fn widget(&self) -> Option<Arc<dyn CheckoutWidget>>;

    /// Add the script and wait for it to load
    async fn inject(&self, url: &str) -> Result<()>;
}

pub struct CheckoutLoader {
    host: Arc<dyn ScriptHost>,
    script_url: String,
    widget: OnceCell<Arc<dyn CheckoutWidget>>,
}

impl CheckoutLoader {
    pub fn new(host: Arc<dyn ScriptHost>, script_url: impl Into<String>) -> Self {
        Self {
            host,
            script_url: script_url.into(),
            widget: OnceCell::new(),
        }
    }

    pub fn from_config(host: Arc<dyn ScriptHost>, config: &ClientConfig) -> Self {
        Self::new(host, config.checkout_script_url.clone())
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    /// Make the widget available, injecting the script at most once
    pub async fn load(&self) -> Result<Arc<dyn CheckoutWidget>> {
        let widget = self
            .widget
            .get_or_try_init(|| async {
                if let Some(widget) = self.host.widget() {
                    return Ok(widget);
                }

                if self.host.has_script(&self.script_url) {
                    tracing::debug!(url = %self.script_url, "Checkout script tag already present");
                } else {
                    tracing::info!(url = %self.script_url, "Injecting checkout script");
                    self.host.inject(&self.script_url).await.inspect_err(|e| {
                        tracing::warn!(url = %self.script_url, error = %e, "Checkout script failed to load");
                    })?;
                }

                self.host.widget().ok_or(PaymentError::WidgetUnavailable)
            })
            .await?;
        Ok(Arc::clone(widget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{SandboxCheckout, SandboxHost};

    const SCRIPT: &str = "https://checkout.example.com/v1/checkout.js";

    fn host() -> Arc<SandboxHost> {
        Arc::new(SandboxHost::new(Arc::new(SandboxCheckout::new(b"secret".to_vec()))))
    }

    #[tokio::test]
    async fn test_concurrent_loads_inject_once() {
        let host = host();
        let loader = CheckoutLoader::new(host.clone(), SCRIPT);

        let (a, b) = futures::join!(loader.load(), loader.load());
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(host.injections(), 1);

        loader.load().await.unwrap();
        assert_eq!(host.injections(), 1);
    }

    #[tokio::test]
    async fn test_present_script_is_not_injected() {
        let host = host();
        host.mark_present(SCRIPT);
        let loader = CheckoutLoader::new(host.clone(), SCRIPT);

        loader.load().await.unwrap();
        assert_eq!(host.injections(), 0);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let host = host();
        host.fail_next_injections(1);
        let loader = CheckoutLoader::new(host.clone(), SCRIPT);

        assert!(matches!(loader.load().await, Err(PaymentError::WidgetLoad(_))));
        loader.load().await.unwrap();
        assert_eq!(host.injections(), 1);
    }
}
