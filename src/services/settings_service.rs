use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    audit::log_audit,
    dto::discounts::UpdateCheckoutSettingsRequest,
    entity::checkout_settings::{ActiveModel, Entity as CheckoutSettingsEntity, Model as SettingsModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::CheckoutSettings,
    response::{ApiResponse, Meta},
    state::AppState,
};

const SETTINGS_ROW_ID: i32 = 1;

const DEFAULT_TAX_PERCENT: i64 = 0;
const DEFAULT_SHIPPING_FEE: i64 = 99;
const DEFAULT_FREE_SHIPPING_ABOVE: i64 = 2999;
const DEFAULT_COD_LIMIT: i64 = 10000;

/// The live settings, falling back to defaults when the row was never
/// seeded. Checkout always gets something usable.
pub async fn load_settings(state: &AppState) -> AppResult<CheckoutSettings> {
    let row = CheckoutSettingsEntity::find_by_id(SETTINGS_ROW_ID)
        .one(&state.orm)
        .await?;

    Ok(match row {
        Some(model) => settings_from_entity(model),
        None => CheckoutSettings {
            tax_percent: DEFAULT_TAX_PERCENT,
            shipping_fee: DEFAULT_SHIPPING_FEE,
            free_shipping_above: Some(DEFAULT_FREE_SHIPPING_ABOVE),
            cod_limit: DEFAULT_COD_LIMIT,
            updated_at: Utc::now(),
        },
    })
}

pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<CheckoutSettings>> {
    let settings = load_settings(state).await?;
    Ok(ApiResponse::success("Checkout settings", settings, None))
}

/// Partial update of the settings row. Omitted fields keep their current
/// value; `free_shipping_above: 0` clears the threshold so shipping is
/// charged on every order again.
pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCheckoutSettingsRequest,
) -> AppResult<ApiResponse<CheckoutSettings>> {
    ensure_admin(user)?;

    if let Some(tax) = payload.tax_percent {
        if !(0..=100).contains(&tax) {
            return Err(AppError::BadRequest(
                "tax_percent must be between 0 and 100".into(),
            ));
        }
    }
    for (field, value) in [
        ("shipping_fee", payload.shipping_fee),
        ("free_shipping_above", payload.free_shipping_above),
        ("cod_limit", payload.cod_limit),
    ] {
        if let Some(v) = value {
            if v < 0 {
                return Err(AppError::BadRequest(format!(
                    "{} must not be negative",
                    field
                )));
            }
        }
    }

    let existing = CheckoutSettingsEntity::find_by_id(SETTINGS_ROW_ID)
        .one(&state.orm)
        .await?;

    let current = match existing.clone() {
        Some(model) => settings_from_entity(model),
        None => load_settings(state).await?,
    };

    let next = ActiveModel {
        id: Set(SETTINGS_ROW_ID),
        tax_percent: Set(payload.tax_percent.unwrap_or(current.tax_percent)),
        shipping_fee: Set(payload.shipping_fee.unwrap_or(current.shipping_fee)),
        free_shipping_above: Set(match payload.free_shipping_above {
            Some(0) => None,
            Some(threshold) => Some(threshold),
            None => current.free_shipping_above,
        }),
        cod_limit: Set(payload.cod_limit.unwrap_or(current.cod_limit)),
        updated_at: Set(Utc::now().into()),
    };

    let saved = if existing.is_some() {
        next.update(&state.orm).await?
    } else {
        next.insert(&state.orm).await?
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout_settings_update",
        Some("checkout_settings"),
        Some(serde_json::json!({
            "tax_percent": saved.tax_percent,
            "shipping_fee": saved.shipping_fee,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Settings updated",
        settings_from_entity(saved),
        Some(Meta::empty()),
    ))
}

fn settings_from_entity(model: SettingsModel) -> CheckoutSettings {
    CheckoutSettings {
        tax_percent: model.tax_percent,
        shipping_fee: model.shipping_fee,
        free_shipping_above: model.free_shipping_above,
        cod_limit: model.cod_limit,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
