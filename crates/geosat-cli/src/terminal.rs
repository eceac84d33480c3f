//! Terminal adapters for the presenter and the checkout widget

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use geosat_core::{PaymentConfirmation, Presenter, Route};
use geosat_payments::{CheckoutOptions, CheckoutOutcome, CheckoutWidget, PaymentError, ScriptHost};

/// Prints alerts and errors; navigation becomes a hint for the next command
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn navigate(&self, route: Route) {
        let hint = match route {
            Route::Login => "run `geosat login` to sign in again",
            Route::ProcessImage => "run `geosat status --watch` to follow processing",
            Route::SatelliteMap => "run `geosat status` to see the finished image",
            Route::Dashboard | Route::ImageRequest | Route::Settings => return,
        };
        println!("→ {}", hint);
    }

    fn alert(&self, message: &str) {
        println!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }
}

/// Checkout completed outside the terminal.
///
/// Prints the order, then reads the provider's receipt as one line of JSON
/// from stdin. An empty line counts as dismissing the checkout.
pub struct ManualCheckout;

#[async_trait]
impl CheckoutWidget for ManualCheckout {
    async fn open(&self, options: &CheckoutOptions) -> geosat_payments::Result<CheckoutOutcome> {
        println!("{}", options.description);
        println!(
            "  order {}  amount {} {} (minor units)  key {}",
            options.order_id, options.amount, options.currency, options.key
        );
        println!("Complete the payment, then paste the receipt JSON (empty line to cancel):");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| PaymentError::WidgetLoad(e.to_string()))?;

        let line = line.trim();
        if line.is_empty() {
            return Ok(CheckoutOutcome::Dismissed);
        }
        let confirmation: PaymentConfirmation = serde_json::from_str(line)
            .map_err(|e| PaymentError::WidgetLoad(format!("unreadable receipt: {}", e)))?;
        Ok(CheckoutOutcome::Completed(confirmation))
    }
}

/// The terminal has no script to load; the manual widget is always there
pub struct TerminalHost;

#[async_trait]
impl ScriptHost for TerminalHost {
    fn has_script(&self, _url: &str) -> bool {
        true
    }

    fn widget(&self) -> Option<Arc<dyn CheckoutWidget>> {
        Some(Arc::new(ManualCheckout))
    }

    async fn inject(&self, _url: &str) -> geosat_payments::Result<()> {
        Ok(())
    }
}
