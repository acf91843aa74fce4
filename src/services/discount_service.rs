use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::discounts::{CreateDiscountRequest, DiscountList, UpdateDiscountRequest},
    entity::discounts::{ActiveModel, Column, Entity as Discounts, Model as DiscountModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Discount, DiscountKind},
    pricing::DiscountTerms,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Resolves a code to the terms checkout can price with. Fails when the
/// code is unknown, switched off, expired, or the subtotal is below its
/// minimum.
pub async fn active_terms(
    state: &AppState,
    code: &str,
    subtotal: i64,
) -> AppResult<(String, DiscountTerms)> {
    let discount = find_applicable(state, code, Some(subtotal)).await?;

    let kind = DiscountKind::parse(&discount.kind)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Unknown discount kind")))?;

    Ok((
        discount.code,
        DiscountTerms {
            kind,
            value: discount.value,
        },
    ))
}

/// Public lookup used by the storefront to validate a code before checkout.
/// When a subtotal is given, the code's minimum is checked against it too.
pub async fn lookup_discount(
    state: &AppState,
    code: &str,
    subtotal: Option<i64>,
) -> AppResult<ApiResponse<Discount>> {
    let discount = find_applicable(state, code, subtotal).await?;
    Ok(ApiResponse::success(
        "Discount",
        discount_from_entity(discount),
        None,
    ))
}

async fn find_applicable(
    state: &AppState,
    code: &str,
    subtotal: Option<i64>,
) -> AppResult<DiscountModel> {
    let normalized = code.trim().to_uppercase();
    let discount = Discounts::find()
        .filter(Column::Code.eq(normalized))
        .one(&state.orm)
        .await?;
    let discount = match discount {
        Some(d) => d,
        None => return Err(AppError::BadRequest("Invalid discount code".into())),
    };

    if !discount.active {
        return Err(AppError::BadRequest("Invalid discount code".into()));
    }
    if let Some(expires_at) = discount.expires_at {
        if expires_at < Utc::now() {
            return Err(AppError::BadRequest("Discount code has expired".into()));
        }
    }
    if let Some(subtotal) = subtotal {
        if subtotal < discount.min_subtotal {
            return Err(AppError::BadRequest(format!(
                "Discount requires a subtotal of at least {}",
                discount.min_subtotal
            )));
        }
    }

    Ok(discount)
}

pub async fn list_discounts(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DiscountList>> {
    ensure_admin(user)?;
    let items = Discounts::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(discount_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Discounts",
        DiscountList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_discount(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;

    let code = payload.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::BadRequest("code must not be empty".into()));
    }
    validate_value(payload.kind, payload.value)?;

    let existing = Discounts::find()
        .filter(Column::Code.eq(code.clone()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("Discount code already exists".into()));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        kind: Set(payload.kind.as_str().to_string()),
        value: Set(payload.value),
        min_subtotal: Set(payload.min_subtotal.unwrap_or(0)),
        active: Set(true),
        expires_at: Set(payload.expires_at.map(Into::into)),
        created_at: NotSet,
    };
    let discount = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_create",
        Some("discounts"),
        Some(serde_json::json!({ "code": discount.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Discount created",
        discount_from_entity(discount),
        Some(Meta::empty()),
    ))
}

pub async fn update_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;

    let existing = Discounts::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };

    let kind = payload
        .kind
        .or_else(|| DiscountKind::parse(&existing.kind))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Unknown discount kind")))?;
    let value = payload.value.unwrap_or(existing.value);
    validate_value(kind, value)?;

    let mut active: ActiveModel = existing.into();
    active.kind = Set(kind.as_str().to_string());
    active.value = Set(value);
    if let Some(min_subtotal) = payload.min_subtotal {
        active.min_subtotal = Set(min_subtotal);
    }
    if let Some(is_active) = payload.active {
        active.active = Set(is_active);
    }
    if let Some(expires_at) = payload.expires_at {
        active.expires_at = Set(Some(expires_at.into()));
    }

    let discount = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_update",
        Some("discounts"),
        Some(serde_json::json!({ "code": discount.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Discount updated",
        discount_from_entity(discount),
        Some(Meta::empty()),
    ))
}

pub async fn delete_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Discounts::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_delete",
        Some("discounts"),
        Some(serde_json::json!({ "discount_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_value(kind: DiscountKind, value: i64) -> Result<(), AppError> {
    match kind {
        DiscountKind::Percent => {
            if !(1..=100).contains(&value) {
                return Err(AppError::BadRequest(
                    "percent value must be between 1 and 100".into(),
                ));
            }
        }
        DiscountKind::Fixed => {
            if value < 1 {
                return Err(AppError::BadRequest(
                    "fixed value must be at least 1".into(),
                ));
            }
        }
    }
    Ok(())
}

fn discount_from_entity(model: DiscountModel) -> Discount {
    Discount {
        id: model.id,
        code: model.code,
        kind: DiscountKind::parse(&model.kind).unwrap_or(DiscountKind::Fixed),
        value: model.value,
        min_subtotal: model.min_subtotal,
        active: model.active,
        expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
