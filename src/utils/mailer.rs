use async_trait::async_trait;

use crate::error::AppError;

/// Outbound mail seam.
///
/// The concrete transport (SMTP credentials, provider API) is deployment
/// configuration; handlers only ever see this trait via `AppState`.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Mailer that writes outbound messages to the log.
///
/// Used in development and in the test suite, where the OTP is read back
/// from the database instead of an inbox.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        tracing::info!(to, subject, body, "outbound email");
        Ok(())
    }
}
