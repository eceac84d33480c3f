//! # geosat-client
//!
//! Authenticated access to the GeoSearch Satellite backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        ApiClient                          │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌─────────────┐  │
//! │  │   Session    │  │ Auth interceptor │  │  Transport  │  │
//! │  │ (token store)│──│ bearer + refresh │──│  (Strategy) │  │
//! │  └──────────────┘  └──────────────────┘  └─────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is an explicit object shared through `Arc`; every client bound
//! to it sees the same tokens. The `Transport` trait lets tests swap the
//! reqwest transport for [`MockTransport`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geosat_client::{ApiClient, Session};
//! use geosat_core::{forms::LoginForm, ClientConfig, NullPresenter};
//!
//! let session = Arc::new(Session::in_memory());
//! let client = ApiClient::new(&ClientConfig::from_env()?, session, Arc::new(NullPresenter))?;
//! client.login(&LoginForm::new("user@example.com", "hunter2hunter2")).await?;
//! let status = client.payment_status().await?;
//! ```

mod api;
pub mod client;
pub mod mock;
pub mod session;
pub mod store;
pub mod transport;

pub use client::ApiClient;
pub use mock::MockTransport;
pub use session::Session;
pub use store::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
