//! # geosat-core
//!
//! Shared building blocks for the GeoSearch Satellite client: the data model
//! exchanged with the backend, the error taxonomy, configuration, the endpoint
//! table, client-side form validation and the land-unit converter.
//!
//! ## Request lifecycle
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ ImageRequest │──▶│ Advance payment│──▶│  Processing  │──▶│ Final payment│──▶ image
//! │   (form)     │   │ create/verify  │   │ (status poll)│   │ create/verify│
//! └──────────────┘   └────────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Nothing here performs I/O; the HTTP client lives in `geosat-client` and
//! the payment workflow in `geosat-payments`.

pub mod config;
pub mod endpoints;
pub mod error;
pub mod forms;
pub mod land;
pub mod model;
pub mod presenter;
pub mod validation;

pub use config::ClientConfig;
pub use endpoints::{Endpoint, Endpoints, HttpMethod};
pub use error::{ClientError, Result, ValidationErrors};
pub use forms::Validate;
pub use land::{ConversionHistory, LandConverter, LandUnit};
pub use model::{
    AuthTokens, Envelope, ImageRequest, ImageRequestForm, ImageStatus, PaymentConfirmation,
    PaymentHistoryEntry, PaymentOrder, PaymentState, PaymentStatus, PlanType, Resolution,
    SatelliteImage, UserProfile,
};
pub use presenter::{NullPresenter, Presenter, RecordingPresenter, Route, UiEvent};
