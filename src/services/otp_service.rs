use argon2::{
    Argon2, PasswordVerifier,
    password_hash::PasswordHash,
};
use chrono::Utc;
use password_hash::rand_core::{OsRng, RngCore};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        OtpPurpose, OtpRequest, OtpRequested, ResetPasswordRequest, VerifyOtpRequest,
        VerifyOtpResponse,
    },
    error::{AppError, AppResult},
    otp::{CODE_TTL_SECS, MAX_VERIFY_ATTEMPTS, OtpEvent, OtpFlow, RESEND_COOLDOWN_SECS},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

#[derive(FromRow)]
struct OtpSessionRow {
    id: Uuid,
    mobile: String,
    purpose: String,
    code_hash: String,
    attempts: i32,
    expires_at: chrono::DateTime<Utc>,
}

/// Requests a verification code for an existing account. Signup resends
/// require the mobile to still be unverified; password resets require it
/// to be registered.
pub async fn request_code(
    state: &AppState,
    payload: OtpRequest,
) -> AppResult<ApiResponse<OtpRequested>> {
    auth_service::validate_mobile(&payload.mobile)?;

    let account: Option<(Uuid, Option<chrono::DateTime<Utc>>)> =
        sqlx::query_as("SELECT id, mobile_verified_at FROM users WHERE mobile = $1")
            .bind(payload.mobile.as_str())
            .fetch_optional(&state.pool)
            .await?;

    match (payload.purpose, account) {
        (_, None) => {
            return Err(AppError::BadRequest(
                "Mobile number is not registered".into(),
            ));
        }
        (OtpPurpose::Signup, Some((_, Some(_)))) => {
            return Err(AppError::BadRequest("Mobile is already verified".into()));
        }
        _ => {}
    }

    let requested = open_session(state, &payload.mobile, payload.purpose).await?;
    Ok(ApiResponse::success(
        "Code sent",
        requested,
        Some(Meta::empty()),
    ))
}

/// Opens a fresh OTP session: enforces the resend cooldown, generates and
/// sends a code, and persists the session keyed by an opaque token.
///
/// Any earlier session for the same mobile and purpose is discarded, so at
/// most one code per flow is live at a time.
pub async fn open_session(
    state: &AppState,
    mobile: &str,
    purpose: OtpPurpose,
) -> AppResult<OtpRequested> {
    let now = Utc::now();

    let pending: Option<(chrono::DateTime<Utc>,)> = sqlx::query_as(
        "SELECT resend_available_at FROM otp_sessions WHERE mobile = $1 AND purpose = $2",
    )
    .bind(mobile)
    .bind(purpose.as_str())
    .fetch_optional(&state.pool)
    .await?;

    if let Some((resend_at,)) = pending {
        let wait = (resend_at - now).num_seconds();
        if wait > 0 {
            return Err(AppError::TooManyRequests(format!(
                "Wait {}s before requesting another code",
                wait
            )));
        }
    }

    let flow = OtpFlow::new().apply(OtpEvent::RequestCode);

    let code = generate_code();
    let flow = match state.otp_sender.send(mobile, &code).await {
        Ok(()) => flow.apply(OtpEvent::SendAccepted),
        Err(err) => {
            tracing::error!(error = %err, "otp send failed");
            return Err(AppError::Internal(anyhow::anyhow!(
                "Could not send verification code"
            )));
        }
    };

    let code_hash = auth_service::hash_password(&code)?;
    let otp_token = Uuid::new_v4();
    let resend_in = flow.resend_in().unwrap_or(RESEND_COOLDOWN_SECS);

    let mut txn = state.pool.begin().await?;
    sqlx::query("DELETE FROM otp_sessions WHERE mobile = $1 AND purpose = $2")
        .bind(mobile)
        .bind(purpose.as_str())
        .execute(&mut *txn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO otp_sessions
            (id, mobile, purpose, code_hash, state, attempts, expires_at, resend_available_at)
        VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
        "#,
    )
    .bind(otp_token)
    .bind(mobile)
    .bind(purpose.as_str())
    .bind(code_hash)
    .bind(flow.label())
    .bind(now + chrono::Duration::seconds(CODE_TTL_SECS as i64))
    .bind(now + chrono::Duration::seconds(resend_in as i64))
    .execute(&mut *txn)
    .await?;
    txn.commit().await?;

    Ok(OtpRequested {
        otp_token,
        resend_available_in: resend_in,
    })
}

/// Checks a submitted code against the stored session. The code is first
/// pushed through the entry flow digit by digit, so anything that would not
/// survive local entry (short, long, non-numeric) is rejected before the
/// hash comparison.
pub async fn verify_code(
    state: &AppState,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<VerifyOtpResponse>> {
    let now = Utc::now();

    // Local gate first: push the submission through the entry flow before
    // the stored session is even read, so anything that would not survive
    // local entry (short, long, non-numeric) never reaches it.
    let mut flow = OtpFlow::awaiting(0);
    for ch in payload.code.chars() {
        let digit = ch
            .to_digit(10)
            .ok_or_else(|| AppError::BadRequest("Code must be numeric".into()))?;
        flow = flow.apply(OtpEvent::Digit(digit as u8));
    }
    let flow = flow.apply(OtpEvent::Submit);
    let submitted = match &flow {
        OtpFlow::Submitting { code, .. } => code.clone(),
        _ => {
            return Err(AppError::BadRequest("Enter the 6-digit code".into()));
        }
    };

    let session: Option<OtpSessionRow> = sqlx::query_as(
        r#"
        SELECT id, mobile, purpose, code_hash, attempts, expires_at
        FROM otp_sessions
        WHERE id = $1 AND state <> 'verified'
        "#,
    )
    .bind(payload.otp_token)
    .fetch_optional(&state.pool)
    .await?;

    let session = match session {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    if session.expires_at < now {
        sqlx::query("DELETE FROM otp_sessions WHERE id = $1")
            .bind(session.id)
            .execute(&state.pool)
            .await?;
        return Err(AppError::BadRequest(
            "Code expired, request a new one".into(),
        ));
    }

    if session.attempts >= MAX_VERIFY_ATTEMPTS {
        return Err(AppError::TooManyRequests(
            "Too many attempts, request a new code".into(),
        ));
    }

    let parsed_hash = PasswordHash::new(&session.code_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid code hash")))?;
    let matches = Argon2::default()
        .verify_password(submitted.as_bytes(), &parsed_hash)
        .is_ok();

    if !matches {
        let attempts = session.attempts + 1;
        let remaining = MAX_VERIFY_ATTEMPTS - attempts;
        let flow = flow.apply(OtpEvent::VerifyRejected {
            message: "Incorrect code".into(),
        });
        sqlx::query("UPDATE otp_sessions SET attempts = $2, state = $3 WHERE id = $1")
            .bind(session.id)
            .bind(attempts)
            .bind(flow.label())
            .execute(&state.pool)
            .await?;
        return Err(AppError::BadRequest(format!(
            "Incorrect code, {} attempts left",
            remaining.max(0)
        )));
    }

    let purpose = OtpPurpose::parse(&session.purpose)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Unknown otp purpose")))?;

    let continuation = match purpose {
        OtpPurpose::Signup => None,
        OtpPurpose::PasswordReset => Some(Uuid::new_v4()),
    };
    let flow = flow.apply(OtpEvent::VerifyPassed {
        continuation: continuation.map(|t| t.to_string()),
    });

    let response = match purpose {
        OtpPurpose::Signup => {
            let mut txn = state.pool.begin().await?;
            let updated =
                sqlx::query("UPDATE users SET mobile_verified_at = $2 WHERE mobile = $1")
                    .bind(session.mobile.as_str())
                    .bind(now)
                    .execute(&mut *txn)
                    .await?;
            if updated.rows_affected() == 0 {
                return Err(AppError::BadRequest(
                    "Mobile number is not registered".into(),
                ));
            }
            sqlx::query("DELETE FROM otp_sessions WHERE id = $1")
                .bind(session.id)
                .execute(&mut *txn)
                .await?;
            txn.commit().await?;

            VerifyOtpResponse { reset_token: None }
        }
        OtpPurpose::PasswordReset => {
            sqlx::query(
                "UPDATE otp_sessions SET state = $2, continuation_token = $3 WHERE id = $1",
            )
            .bind(session.id)
            .bind(flow.label())
            .bind(continuation)
            .execute(&state.pool)
            .await?;

            VerifyOtpResponse {
                reset_token: continuation,
            }
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "otp_verified",
        Some("otp_sessions"),
        Some(serde_json::json!({ "purpose": session.purpose })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Code verified",
        response,
        Some(Meta::empty()),
    ))
}

/// Spends a reset token produced by a verified password-reset session.
/// The session is deleted on success; a token works exactly once.
pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.new_password.len() < 8 {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let now = Utc::now();
    let session: Option<OtpSessionRow> = sqlx::query_as(
        r#"
        SELECT id, mobile, purpose, code_hash, attempts, expires_at
        FROM otp_sessions
        WHERE continuation_token = $1 AND state = 'verified' AND purpose = 'password_reset'
        "#,
    )
    .bind(payload.reset_token)
    .fetch_optional(&state.pool)
    .await?;

    let session = match session {
        Some(s) => s,
        None => {
            return Err(AppError::BadRequest("Invalid or spent reset token".into()));
        }
    };

    if session.expires_at < now {
        sqlx::query("DELETE FROM otp_sessions WHERE id = $1")
            .bind(session.id)
            .execute(&state.pool)
            .await?;
        return Err(AppError::BadRequest(
            "Reset token expired, request a new code".into(),
        ));
    }

    let password_hash = auth_service::hash_password(&payload.new_password)?;

    let mut txn = state.pool.begin().await?;
    let updated = sqlx::query("UPDATE users SET password_hash = $2 WHERE mobile = $1")
        .bind(session.mobile.as_str())
        .bind(password_hash)
        .execute(&mut *txn)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(AppError::BadRequest(
            "Mobile number is not registered".into(),
        ));
    }
    sqlx::query("DELETE FROM otp_sessions WHERE id = $1")
        .bind(session.id)
        .execute(&mut *txn)
        .await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "password_reset",
        Some("users"),
        Some(serde_json::json!({ "mobile": session.mobile })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Password updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn generate_code() -> String {
    let n = OsRng.next_u32() % 1_000_000;
    format!("{:06}", n)
}
