//! One-time-code verification.
//!
//! [`machine`] holds the pure flow state machine; the HTTP side of the flow
//! lives in `services::otp_service`, which drives the machine against
//! persisted `otp_sessions` rows. Delivery goes through the [`OtpSender`]
//! seam so the transport (SMS gateway, or a log line in development) stays
//! out of the verification logic.

use anyhow::Result;
use async_trait::async_trait;

pub mod machine;

pub use machine::{CodeBuffer, OtpEvent, OtpFlow};

/// Number of digit slots in a verification code.
pub const CODE_LEN: usize = 6;

/// Seconds a customer must wait before a code can be re-sent.
pub const RESEND_COOLDOWN_SECS: u32 = 30;

/// Seconds an issued code stays verifiable.
pub const CODE_TTL_SECS: i64 = 300;

/// Wrong-code submissions allowed before the session is invalidated.
pub const MAX_VERIFY_ATTEMPTS: i32 = 5;

#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, mobile: &str, code: &str) -> Result<()>;
}

/// Development sender: prints the code instead of delivering it.
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, mobile: &str, code: &str) -> Result<()> {
        tracing::info!(mobile, code, "otp issued (log sender, not delivered)");
        Ok(())
    }
}
