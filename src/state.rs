use std::sync::Arc;

use crate::cart::CartStorage;
use crate::db::{DbPool, OrmConn};
use crate::otp::OtpSender;

/// Shared application state. The cart storage and OTP sender are trait
/// objects so tests and tooling can swap the backends without touching the
/// services.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub cart: Arc<dyn CartStorage>,
    pub otp_sender: Arc<dyn OtpSender>,
}
