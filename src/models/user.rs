// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

/// Email shape accepted at registration and login.
/// Local part up to 64 chars, domain up to 255, TLD of at least 2.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]{1,64}@[^\s@]{1,255}\.[^\s@]{2,}$").unwrap());

/// Lowercased, trimmed form an email is stored and looked up as.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(&normalize_email(email)) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email_format"))
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique, stored normalized (trimmed, lowercased).
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub role: Role,

    /// Whether the user has confirmed their email via OTP.
    pub is_verified: bool,

    /// Pending verification code, cleared on successful verification.
    #[serde(skip)]
    pub otp_code: Option<String>,

    #[serde(skip)]
    pub otp_expires_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Consecutive failed logins; reset on success.
    #[serde(skip)]
    pub failed_login_attempts: i32,

    /// While this is in the future, every login attempt is refused.
    #[serde(skip)]
    pub lock_until: Option<chrono::DateTime<chrono::Utc>>,

    pub bio: String,
    pub avatar: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,

    #[validate(custom(function = validate_email_format))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,

    /// Defaults to Student when absent.
    pub role: Option<Role>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 320))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for OTP email verification.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(custom(function = validate_email_format))]
    pub email: String,
    #[validate(length(equal = 6, message = "Verification code must be 6 digits."))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendOtpRequest {
    #[validate(custom(function = validate_email_format))]
    pub email: String,
}

/// DTO for profile updates. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    pub email: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,

    #[validate(length(max = 500))]
    pub avatar: Option<String>,
}

/// Issued on login, verification and profile update.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_common_addresses() {
        assert!(validate_email_format("student@example.com").is_ok());
        assert!(validate_email_format("  Mixed.Case@Example.ORG  ").is_ok());
    }

    #[test]
    fn email_regex_rejects_malformed_addresses() {
        assert!(validate_email_format("no-at-sign").is_err());
        assert!(validate_email_format("spaces in@example.com").is_err());
        assert!(validate_email_format("missing@tld").is_err());
        assert!(validate_email_format("short@tld.x").is_err());
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_email(" A@B.Co "), "a@b.co");
    }
}
