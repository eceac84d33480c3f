//! Checkout Widget
//!
//! The third-party checkout is an external collaborator: it is given an
//! order and either reports a signed receipt or is dismissed by the user.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use geosat_core::{ClientConfig, PaymentConfirmation, PaymentOrder, Route};

use crate::error::Result;

/// The two payment phases of an image request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Leg {
    /// Paid when the request is created
    Advance,
    /// Paid once the image is ready
    Final,
}

impl Leg {
    pub fn as_str(self) -> &'static str {
        match self {
            Leg::Advance => "advance",
            Leg::Final => "final",
        }
    }

    /// Description shown inside the checkout widget
    pub fn description(self) -> &'static str {
        match self {
            Leg::Advance => "Advance Payment for Satellite Image",
            Leg::Final => "Final Payment for Satellite Image",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Leg::Advance => "Payment successful! Redirecting to processing page...",
            Leg::Final => "Payment completed! Redirecting...",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Leg::Advance => "Failed to process payment",
            Leg::Final => "Final payment failed. Please try again.",
        }
    }

    /// Where the user goes after a verified payment
    pub fn success_route(self) -> Route {
        match self {
            Leg::Advance => Route::ProcessImage,
            Leg::Final => Route::SatelliteMap,
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options handed to the checkout widget
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutOptions {
    pub key: String,

    /// Amount in minor units, as returned by the order endpoint
    pub amount: u64,

    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub theme_color: String,
}

impl CheckoutOptions {
    /// The order's currency wins; the configured one only fills a blank
    pub fn for_order(order: &PaymentOrder, leg: Leg, config: &ClientConfig) -> Self {
        let currency = if order.currency.trim().is_empty() {
            config.currency.clone()
        } else {
            order.currency.clone()
        };
        Self {
            key: order.key.clone(),
            amount: order.amount,
            currency,
            name: config.merchant_name.clone(),
            description: leg.description().to_string(),
            order_id: order.order_id.clone(),
            theme_color: config.theme_color.clone(),
        }
    }
}

/// How the checkout widget closed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Completion handler fired; the receipt still needs server verification
    Completed(PaymentConfirmation),

    /// User closed the widget without paying
    Dismissed,
}

/// Checkout widget trait (Strategy pattern)
#[async_trait]
pub trait CheckoutWidget: Send + Sync {
    /// Open the widget and wait until it completes or is dismissed
    async fn open(&self, options: &CheckoutOptions) -> Result<CheckoutOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_for_order() {
        let order = PaymentOrder {
            order_id: "order_9".into(),
            key: "rzp_test_key".into(),
            amount: 250_000,
            currency: "INR".into(),
        };
        let options = CheckoutOptions::for_order(&order, Leg::Advance, &ClientConfig::default());

        assert_eq!(options.order_id, "order_9");
        assert_eq!(options.amount, 250_000);
        assert_eq!(options.name, "GeoSearch Satellite");
        assert_eq!(options.description, "Advance Payment for Satellite Image");
        assert_eq!(options.theme_color, "#38b2ac");
    }

    #[test]
    fn test_order_currency_is_kept() {
        let mut order = PaymentOrder {
            order_id: "order_10".into(),
            key: "rzp_test_key".into(),
            amount: 1_000,
            currency: "USD".into(),
        };
        let config = ClientConfig::default();
        assert_eq!(CheckoutOptions::for_order(&order, Leg::Final, &config).currency, "USD");

        order.currency = String::new();
        assert_eq!(CheckoutOptions::for_order(&order, Leg::Final, &config).currency, "INR");
    }

    #[test]
    fn test_leg_routes() {
        assert_eq!(Leg::Advance.success_route(), Route::ProcessImage);
        assert_eq!(Leg::Final.success_route(), Route::SatelliteMap);
    }
}
