use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch},
};

use crate::{
    dto::discounts::UpdateCheckoutSettingsRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::CheckoutSettings,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout", get(get_settings).patch(update_settings))
}

#[utoipa::path(
    get,
    path = "/api/settings/checkout",
    responses(
        (status = 200, description = "Tax, shipping and COD settings the storefront prices with", body = ApiResponse<CheckoutSettings>),
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CheckoutSettings>>> {
    let resp = settings_service::get_settings(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/settings/checkout",
    request_body = UpdateCheckoutSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<CheckoutSettings>),
        (status = 400, description = "Invalid values"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateCheckoutSettingsRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSettings>>> {
    let resp = settings_service::update_settings(&state, &user, payload).await?;
    Ok(Json(resp))
}
