//! Form Inputs
//!
//! Request bodies for the account, profile and feedback endpoints. Every form
//! validates itself so that bad input never reaches the network.

use serde::Serialize;

use crate::error::{Result, ValidationErrors};
use crate::model::ImageRequestForm;
use crate::validation::{
    validate_email, validate_latitude, validate_longitude, validate_password, validate_required,
};

/// Forms checked client-side before submission
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if let Err(msg) = validate_email(&self.email) {
            errors.add("email", msg);
        }
        if let Err(msg) = validate_password(&self.password) {
            errors.add("password", msg);
        }
        errors.into_result()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SignupForm {
    pub fname: String,
    pub lname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for SignupForm {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if let Err(msg) = validate_required(&self.fname, "First name is required") {
            errors.add("fname", msg);
        }
        if let Err(msg) = validate_required(&self.lname, "Last name is required") {
            errors.add("lname", msg);
        }
        if let Err(msg) = validate_email(&self.email) {
            errors.add("email", msg);
        }
        if let Err(msg) = validate_password(&self.password) {
            errors.add("password", msg);
        }
        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Please confirm password");
        } else if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

/// Sign-up with an identity token obtained from a third-party sign-in
#[derive(Clone, Debug, Serialize)]
pub struct GoogleSignup {
    pub google_token: String,
    pub platform: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl Validate for ForgotPasswordForm {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if self.email.is_empty() {
            errors.add("email", "Please enter your email");
        }
        errors.into_result()
    }
}

/// OTP-based password reset. `confirm_password` is checked locally only.
#[derive(Clone, Debug, Serialize)]
pub struct ResetPasswordForm {
    pub email: String,
    pub otp: String,
    pub new_password: String,
    #[serde(skip)]
    pub confirm_password: String,
}

impl Validate for ResetPasswordForm {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if self.otp.is_empty() || self.new_password.is_empty() || self.confirm_password.is_empty() {
            errors.add("form", "Please fill all fields");
        } else if self.new_password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Validate for ChangePasswordForm {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if self.current_password.is_empty() {
            errors.add("current_password", "Current password is required");
        }
        if let Err(msg) = validate_password(&self.new_password) {
            errors.add("new_password", msg);
        }
        if self.new_password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

/// Profile edit; a blank first name is refused so it cannot wipe the stored one
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProfileUpdate {
    pub fname: String,
    pub lname: String,
    pub phone: String,
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if let Err(msg) = validate_required(&self.fname, "First name is required") {
            errors.add("fname", msg);
        }
        errors.into_result()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FeedbackForm {
    pub rating: u8,
    pub comment: String,
}

impl FeedbackForm {
    /// The comment is trimmed before it is sent
    pub fn new(rating: u8, comment: &str) -> Self {
        Self {
            rating,
            comment: comment.trim().to_string(),
        }
    }
}

impl Validate for FeedbackForm {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if !(1..=5).contains(&self.rating) {
            errors.add("rating", "Please choose a rating from 1 to 5");
        }
        errors.into_result()
    }
}

impl Validate for ImageRequestForm {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if let Err(msg) = validate_latitude(self.latitude) {
            errors.add("latitude", msg);
        }
        if let Err(msg) = validate_longitude(self.longitude) {
            errors.add("longitude", msg);
        }
        if let Err(msg) = validate_required(&self.coverage_area, "Coverage area is required") {
            errors.add("coverage_area", msg);
        }
        errors.into_result()
    }
}
