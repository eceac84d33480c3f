//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("Failed to compile email regex"));

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }

    Ok(())
}

/// Validate a required free-text field
pub fn validate_required(value: &str, message: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(message.to_string());
    }
    Ok(())
}

pub fn validate_latitude(latitude: f64) -> Result<(), String> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90".to_string());
    }
    Ok(())
}

pub fn validate_longitude(longitude: f64) -> Result<(), String> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert_eq!(validate_email("").unwrap_err(), "Email is required");
        assert_eq!(validate_email("user.example.com").unwrap_err(), "Invalid email format");
        assert!(validate_email("user@localhost").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
        assert_eq!(validate_password("").unwrap_err(), "Password is required");
    }

    #[test]
    fn test_coordinates() {
        assert!(validate_latitude(12.97).is_ok());
        assert!(validate_latitude(90.5).is_err());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(f64::NAN).is_err());
    }
}
