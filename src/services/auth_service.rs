use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        Claims, LoginRequest, LoginResponse, OtpPurpose, RegisterRequest, RegisterResponse,
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::otp_service,
    state::AppState,
};

#[derive(FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
    role: String,
    mobile_verified_at: Option<DateTime<Utc>>,
}

/// Creates an unverified account and opens a signup OTP session for it.
/// The account can log in only after the code is verified.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let RegisterRequest {
        name,
        mobile,
        password,
    } = payload;

    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    validate_mobile(&mobile)?;
    if password.len() < 8 {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE mobile = $1")
        .bind(mobile.as_str())
        .fetch_optional(&state.pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest(
            "Mobile number is already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&password)?;
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, name, mobile, password_hash, role) VALUES ($1, $2, $3, $4, 'customer')",
    )
    .bind(id)
    .bind(name.as_str())
    .bind(mobile.as_str())
    .bind(password_hash)
    .execute(&state.pool)
    .await?;

    let otp = otp_service::open_session(state, &mobile, OtpPurpose::Signup).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Account created, verify the code we sent",
        RegisterResponse {
            user_id: id,
            otp_token: otp.otp_token,
            resend_available_in: otp.resend_available_in,
        },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { mobile, password } = payload;
    let row: Option<CredentialRow> = sqlx::query_as(
        "SELECT id, password_hash, role, mobile_verified_at FROM users WHERE mobile = $1",
    )
    .bind(mobile.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::Unauthorized("Invalid mobile or password".into())),
    };

    let parsed_hash = PasswordHash::new(&row.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid mobile or password".into()));
    }

    if row.mobile_verified_at.is_none() {
        return Err(AppError::Forbidden);
    }

    let token = issue_token(row.id, &row.role)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(row.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": row.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse { token },
        Some(Meta::empty()),
    ))
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn issue_token(user_id: Uuid, role: &str) -> Result<String, AppError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {}", token))
}

pub fn validate_mobile(mobile: &str) -> Result<(), AppError> {
    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    if digits.len() < 8 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest("Invalid mobile number".into()));
    }
    Ok(())
}
