use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: uuid::Uuid,
    pub otp_token: uuid::Uuid,
    pub resend_available_in: u32,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Signup,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "signup",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "signup" => Some(OtpPurpose::Signup),
            "password_reset" => Some(OtpPurpose::PasswordReset),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct OtpRequest {
    pub mobile: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpRequested {
    pub otp_token: uuid::Uuid,
    pub resend_available_in: u32,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VerifyOtpRequest {
    pub otp_token: uuid::Uuid,
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyOtpResponse {
    /// Present only for password-reset flows; spend it on `/api/auth/password/reset`.
    pub reset_token: Option<uuid::Uuid>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ResetPasswordRequest {
    pub reset_token: uuid::Uuid,
    pub new_password: String,
}
