//! Backend Data Model
//!
//! Types exchanged with the backend. Everything is transient on the client;
//! only the auth tokens are persisted (see `geosat-client`).

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ClientError, Result};

/// Response envelope shared by every backend endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope<T> {
    /// `success` or an error keyword
    pub status: String,

    #[serde(default)]
    pub message: Option<String>,

    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Backend message, or `fallback` when it sent none
    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }

    /// Unwrap `data` from a successful envelope
    pub fn into_data(self) -> Result<T> {
        if !self.is_success() {
            return Err(ClientError::Rejected(self.message_or("Request failed")));
        }
        self.data
            .ok_or_else(|| ClientError::Decode("response envelope has no data".into()))
    }
}

/// Access/refresh token pair issued on login
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// `data` payload of `login/` and `refresh-token/`
#[derive(Clone, Debug, Deserialize)]
pub struct TokenPayload<T> {
    pub tokens: T,
}

/// Token refresh only guarantees a new access token
#[derive(Clone, Deserialize)]
pub struct RefreshedTokens {
    pub access: String,

    #[serde(default)]
    pub refresh: Option<String>,
}

/// Image resolution requested for a satellite image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    High,
    Medium,
    Low,
}

impl FromStr for Resolution {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Resolution::High),
            "medium" => Ok(Resolution::Medium),
            "low" => Ok(Resolution::Low),
            other => Err(ClientError::Config(format!("unknown resolution '{}'", other))),
        }
    }
}

/// Subscription plan chosen for an image request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    PayAsYouGo,
    Monthly,
    Yearly,
}

/// Pricing information, in rupees
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanPricing {
    pub name: &'static str,
    pub price: Decimal,
    pub advance: Decimal,
    pub period: &'static str,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::PayAsYouGo => "payasyougo",
            PlanType::Monthly => "monthly",
            PlanType::Yearly => "yearly",
        }
    }

    /// Get pricing for this plan
    pub fn pricing(&self) -> PlanPricing {
        let (name, price, period) = match self {
            PlanType::PayAsYouGo => ("Pay As You Go", dec!(5000), "per image"),
            PlanType::Monthly => ("Monthly Plan", dec!(20000), "per month"),
            PlanType::Yearly => ("Yearly Plan", dec!(260000), "per year"),
        };
        PlanPricing {
            name,
            price,
            advance: price / dec!(2),
            period,
        }
    }
}

impl FromStr for PlanType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "payasyougo" | "pay-as-you-go" | "per_image" => Ok(PlanType::PayAsYouGo),
            "monthly" => Ok(PlanType::Monthly),
            "yearly" => Ok(PlanType::Yearly),
            other => Err(ClientError::Config(format!("unknown plan '{}'", other))),
        }
    }
}

/// User input for a new satellite image request (POST body)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageRequestForm {
    pub latitude: f64,
    pub longitude: f64,
    pub resolution: Resolution,
    pub coverage_area: String,
    pub plan_type: PlanType,
}

impl ImageRequestForm {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            resolution: Resolution::default(),
            coverage_area: "5km".into(),
            plan_type: PlanType::default(),
        }
    }

    pub fn with_plan(mut self, plan_type: PlanType) -> Self {
        self.plan_type = plan_type;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_coverage_area(mut self, coverage_area: impl Into<String>) -> Self {
        self.coverage_area = coverage_area.into();
        self
    }
}

/// `data` payload of `request-satellite-image/`
#[derive(Clone, Debug, Deserialize)]
pub struct CreatedRequest {
    #[serde(deserialize_with = "lenient_id")]
    pub request_id: String,
}

/// A submitted satellite image request; immutable once created
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub request_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub resolution: Resolution,
    pub coverage_area: String,
    pub plan_type: PlanType,
}

impl ImageRequest {
    pub fn from_form(request_id: impl Into<String>, form: &ImageRequestForm) -> Self {
        Self {
            request_id: request_id.into(),
            latitude: form.latitude,
            longitude: form.longitude,
            resolution: form.resolution,
            coverage_area: form.coverage_area.clone(),
            plan_type: form.plan_type,
        }
    }
}

/// Checkout order created by the backend for one payment leg
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,

    /// Public checkout key
    pub key: String,

    /// Amount in minor units (paise)
    pub amount: u64,

    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "INR".into()
}

/// Signed receipt returned by the checkout widget.
///
/// This is an unverified claim until the backend's verify endpoint accepts it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

/// Image processing state reported by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageStatus {
    Pending,
    Processing,
    Ready,
    Other(String),
}

impl ImageStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ImageStatus::Pending => "pending",
            ImageStatus::Processing => "processing",
            ImageStatus::Ready => "ready",
            ImageStatus::Other(s) => s,
        }
    }
}

impl From<String> for ImageStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => ImageStatus::Pending,
            "processing" => ImageStatus::Processing,
            "ready" => ImageStatus::Ready,
            _ => ImageStatus::Other(s),
        }
    }
}

impl From<ImageStatus> for String {
    fn from(status: ImageStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment progress reported by the backend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentState {
    #[default]
    AdvancePaid,
    Completed,
    Other(String),
}

impl PaymentState {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentState::AdvancePaid => "advance_paid",
            PaymentState::Completed => "completed",
            PaymentState::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PaymentState::Completed)
    }
}

impl From<String> for PaymentState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "advance_paid" => PaymentState::AdvancePaid,
            "completed" => PaymentState::Completed,
            _ => PaymentState::Other(s),
        }
    }
}

impl From<PaymentState> for String {
    fn from(state: PaymentState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current processing/payment status of the user's active request.
///
/// Owned by the backend; the client only re-fetches it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaymentStatus {
    #[serde(deserialize_with = "lenient_id")]
    pub payment_id: String,

    pub image_status: ImageStatus,

    #[serde(default)]
    pub payment_status: PaymentState,

    /// Amount still due for the final leg, in rupees
    #[serde(default)]
    pub pending_amount: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub coverage_area: Option<String>,
}

/// Result of `satellite-images/`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SatelliteImage {
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,

    pub image_status: ImageStatus,

    #[serde(default)]
    pub kml_file_url: Option<String>,
}

impl SatelliteImage {
    /// KML overlay URL, only once the image is ready
    pub fn viewable_kml(&self) -> Option<&str> {
        match self.image_status {
            ImageStatus::Ready => self.kml_file_url.as_deref(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Coordinates {
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: f64,
}

/// One row of `payment-history/`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaymentHistoryEntry {
    #[serde(deserialize_with = "lenient_id")]
    pub payment_id: String,

    pub plan_type: String,

    pub payment_status: PaymentState,

    pub coordinates: Coordinates,

    pub image_status: ImageStatus,

    pub total_amount: Decimal,
}

impl PaymentHistoryEntry {
    pub fn plan_label(&self) -> &str {
        if self.plan_type == "per_image" {
            "One-time Satview"
        } else {
            &self.plan_type
        }
    }
}

/// Profile returned by `get-user/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserPayload {
    pub user: UserProfile,
}

// The backend is not consistent about sending ids and coordinates as
// numbers or strings.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(n) => n.to_string(),
        NumberOrText::Float(n) => n.to_string(),
        NumberOrText::Text(s) => s,
    })
}

#[allow(clippy::cast_precision_loss)]
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(n) => Ok(n as f64),
        NumberOrText::Float(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[allow(clippy::cast_precision_loss)]
fn lenient_coordinate<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Int(n)) => Some(n as f64),
        Some(NumberOrText::Float(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
    })
}
