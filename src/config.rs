// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Number of failed login attempts before the account is locked.
pub const MAX_FAILED_LOGIN_ATTEMPTS: i32 = 3;

/// How long a locked account stays locked, in minutes.
pub const LOCKOUT_MINUTES: i64 = 5;

/// How long an emailed verification code remains valid, in minutes.
pub const OTP_EXPIRY_MINUTES: i64 = 10;

/// File extensions accepted for assignment submissions.
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "pptx", "zip"];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Session lifetime in seconds (default: 30 days).
    pub jwt_expiration: u64,
    pub port: u16,
    /// Directory submission files are written to and served from.
    pub upload_dir: String,
    pub rust_log: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30 * 24 * 60 * 60);

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            port,
            upload_dir,
            rust_log,
            admin_email,
            admin_password,
        }
    }
}
