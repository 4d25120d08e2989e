//! Input validation run before any backend call.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::dates::{self, DateError};

/// Country code 595 followed by 9 to 12 digits.
static WHATSAPP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^595[0-9]{9,12}$").expect("static regex"));

/// Loose shape check: something@domain.tld with no whitespace.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"));

/// Example shown to users when their number is rejected.
pub const WHATSAPP_EXAMPLE: &str = "595978654321";

/// Validation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid WhatsApp number '{0}': expected 595 followed by 9 to 12 digits")]
    InvalidWhatsApp(String),

    #[error("Password and confirmation do not match")]
    PasswordMismatch,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Required field is empty: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidDate(#[from] DateError),

    #[error("Index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("User {0} has no valid role")]
    InvalidRole(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check a WhatsApp contact number.
pub fn validate_whatsapp(number: &str) -> ValidationResult<()> {
    if WHATSAPP_PATTERN.is_match(number) {
        Ok(())
    } else {
        Err(ValidationError::InvalidWhatsApp(number.to_string()))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> ValidationResult<()> {
    if password == confirmation {
        Ok(())
    } else {
        Err(ValidationError::PasswordMismatch)
    }
}

pub fn validate_password_length(password: &str, min_length: usize) -> ValidationResult<()> {
    if password.chars().count() >= min_length {
        Ok(())
    } else {
        Err(ValidationError::PasswordTooShort(min_length))
    }
}

/// Reject empty or whitespace-only values.
pub fn require(value: &str, field: &'static str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Birth dates may be left empty; otherwise they must parse.
pub fn validate_optional_date(value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Ok(());
    }
    dates::parse_date_time(value)?;
    Ok(())
}

/// Contact link opened by the patient's contact screen.
pub fn whatsapp_link(number: &str) -> String {
    format!("https://wa.me/{}", number)
}
