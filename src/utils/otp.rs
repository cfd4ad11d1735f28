use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::config::OTP_EXPIRY_MINUTES;

/// Generates a 6-digit one-time verification code.
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// Expiry timestamp for a code issued now.
pub fn otp_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(OTP_EXPIRY_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn expiry_is_in_the_future() {
        assert!(otp_expiry() > Utc::now());
    }
}
