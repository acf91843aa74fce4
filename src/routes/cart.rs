use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartLineRequest, CartView, LineVariantParams, UpdateCartLineRequest},
    error::AppResult,
    middleware::cart_session::CartSession,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).delete(clear_cart))
        .route("/lines", post(add_line))
        .route("/lines/{product_id}", patch(update_line))
        .route("/lines/{product_id}", delete(remove_line))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session id"),
    ),
    responses(
        (status = 200, description = "Current cart with count and subtotal", body = ApiResponse<CartView>),
        (status = 400, description = "Missing or invalid session header"),
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/lines",
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session id"),
    ),
    request_body = AddCartLineRequest,
    responses(
        (status = 200, description = "Line added, quantities merged on repeat", body = ApiResponse<CartView>),
        (status = 400, description = "Unknown product or variant"),
    ),
    tag = "Cart"
)]
pub async fn add_line(
    State(state): State<AppState>,
    session: CartSession,
    Json(payload): Json<AddCartLineRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_line(&state, session, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/lines/{product_id}",
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session id"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    request_body = UpdateCartLineRequest,
    responses(
        (status = 200, description = "Quantity overwritten", body = ApiResponse<CartView>),
        (status = 404, description = "No such line in the cart"),
    ),
    tag = "Cart"
)]
pub async fn update_line(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartLineRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::update_line(&state, session, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/lines/{product_id}",
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session id"),
        ("product_id" = Uuid, Path, description = "Product ID"),
        ("color" = String, Query, description = "Line color"),
        ("size" = String, Query, description = "Line size"),
    ),
    responses(
        (status = 200, description = "Line removed; removing a missing line is a no-op", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn remove_line(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<Uuid>,
    Query(params): Query<LineVariantParams>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::remove_line(&state, session, product_id, params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session id"),
    ),
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::clear_cart(&state, session).await?;
    Ok(Json(resp))
}
