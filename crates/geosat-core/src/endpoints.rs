//! Backend Endpoints
//!
//! Every backend URL is built here, by joining a relative endpoint path onto
//! one normalised base URL. Call sites never concatenate strings.

use url::Url;

use crate::error::Result;

/// HTTP verbs used by the backend API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// Backend REST endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Signup,
    ForgotPassword,
    VerifyOtp,
    RefreshToken,
    RequestSatelliteImage,
    GetUser,
    UpdateProfile,
    ChangePassword,
    CreateAdvancePayment,
    VerifyAdvancePayment,
    CreateFinalPayment,
    VerifyFinalPayment,
    PaymentStatus,
    SatelliteImages,
    SubmitFeedback,
    PaymentHistory,
}

impl Endpoint {
    /// Path relative to the API base (no leading slash)
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "login/",
            Endpoint::Signup => "signup/",
            Endpoint::ForgotPassword => "forgot-password/",
            Endpoint::VerifyOtp => "verify-otp/",
            Endpoint::RefreshToken => "refresh-token/",
            Endpoint::RequestSatelliteImage => "request-satellite-image/",
            Endpoint::GetUser => "get-user/",
            Endpoint::UpdateProfile => "update-profile/",
            Endpoint::ChangePassword => "change-password/",
            Endpoint::CreateAdvancePayment => "create-advance-payment/",
            Endpoint::VerifyAdvancePayment => "verify-advance-payment/",
            Endpoint::CreateFinalPayment => "create-final-payment/",
            Endpoint::VerifyFinalPayment => "verify-final-payment/",
            Endpoint::PaymentStatus => "payment-status/",
            Endpoint::SatelliteImages => "satellite-images/",
            Endpoint::SubmitFeedback => "submit-feedback/",
            Endpoint::PaymentHistory => "payment-history/",
        }
    }

    pub const fn method(self) -> HttpMethod {
        match self {
            Endpoint::GetUser
            | Endpoint::PaymentStatus
            | Endpoint::SatelliteImages
            | Endpoint::PaymentHistory => HttpMethod::Get,
            Endpoint::UpdateProfile => HttpMethod::Put,
            _ => HttpMethod::Post,
        }
    }

    /// Whether the bearer token is attached and 401s trigger a refresh
    pub const fn requires_auth(self) -> bool {
        !matches!(
            self,
            Endpoint::Login
                | Endpoint::Signup
                | Endpoint::ForgotPassword
                | Endpoint::VerifyOtp
                | Endpoint::RefreshToken
        )
    }
}

/// Resolves endpoints against the configured API base
#[derive(Clone, Debug)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Parse the base URL; a missing trailing slash is added so that joins
    /// append instead of replacing the last path segment.
    pub fn new(base: &str) -> Result<Self> {
        let mut base = Url::parse(base.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, endpoint: Endpoint) -> Result<Url> {
        Ok(self.base.join(endpoint.path())?)
    }
}
