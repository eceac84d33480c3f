//! # geosat-payments
//!
//! Two-phase payment workflow for satellite image requests.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐  advance leg   ┌──────────────┐   poll    ┌──────────────┐  final leg   ┌──────────────┐
//! │   Request    │───────────────▶│  Processing  │──────────▶│    Ready     │─────────────▶│  Completed   │
//! │   created    │  (50% upfront) │              │  (30 s)   │ (pay rest)   │              │  (map view)  │
//! └──────────────┘                └──────────────┘           └──────────────┘              └──────────────┘
//! ```
//!
//! Each leg is: create order → open checkout widget → verify the signed
//! receipt on the backend. Only the backend's verify response marks a leg
//! paid.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geosat_payments::{CheckoutLoader, PaymentService, StatusPoller};
//!
//! let loader = Arc::new(CheckoutLoader::from_config(host, &config));
//! let payments = PaymentService::new(client.clone(), loader, config.clone());
//! payments.initiate_advance_payment(&request.request_id).await?;
//!
//! let poller = StatusPoller::spawn(client.clone(), presenter, config.poll_interval);
//! let mut updates = poller.subscribe();
//! ```

pub mod checkout;
mod error;
pub mod loader;
pub mod poller;
pub mod sandbox;
pub mod service;

pub use checkout::{CheckoutOptions, CheckoutOutcome, CheckoutWidget, Leg};
pub use error::{PaymentError, Result};
pub use loader::{CheckoutLoader, ScriptHost};
pub use poller::{derive_state, PollSnapshot, PollState, PollerHandle, StatusPoller, StatusSource};
pub use sandbox::{sign, verify_signature, SandboxCheckout, SandboxHost};
pub use service::{LegOutcome, PaymentService};
