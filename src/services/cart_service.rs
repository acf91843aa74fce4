use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{CartLine, CartStore, LineKey, MAX_LINE_QUANTITY},
    dto::cart::{AddCartLineRequest, CartView, LineVariantParams, UpdateCartLineRequest},
    entity::products::{Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::cart_session::CartSession,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn view_cart(
    state: &AppState,
    session: CartSession,
) -> AppResult<ApiResponse<CartView>> {
    let store = CartStore::hydrate(state.cart.clone(), session.0).await;
    Ok(ApiResponse::success(
        "Cart",
        CartView::from_cart(store.cart()),
        Some(Meta::empty()),
    ))
}

/// Adds a variant to the cart. Quantities merge when the same product,
/// color and size is added again; price, name and image are captured from
/// the catalog at add time. Merges that would push a line past the
/// per-line quantity cap are rejected rather than clamped.
pub async fn add_line(
    state: &AppState,
    session: CartSession,
    payload: AddCartLineRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity == 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if payload.quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must be at most {} per line",
            MAX_LINE_QUANTITY
        )));
    }

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".to_string())),
    };

    validate_variant(&product, &payload.color, &payload.size)?;

    let line = CartLine {
        product_id: product.id,
        color: payload.color,
        size: payload.size,
        quantity: payload.quantity,
        unit_price: product.price,
        name: product.name,
        image: product.image,
    };

    let mut store = CartStore::hydrate(state.cart.clone(), session.0).await;
    if let Some(existing) = store.cart().find(&line.key()) {
        if existing.quantity.saturating_add(line.quantity) > MAX_LINE_QUANTITY {
            return Err(AppError::BadRequest(format!(
                "quantity must be at most {} per line",
                MAX_LINE_QUANTITY
            )));
        }
    }
    store.add(line).await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "cart_add",
        Some("cart_snapshots"),
        Some(serde_json::json!({ "session_id": session.0, "product_id": payload.product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Added to cart",
        CartView::from_cart(store.cart()),
        Some(Meta::empty()),
    ))
}

/// Overwrites the quantity of one line. Zero is allowed and keeps the line;
/// removal is its own operation.
pub async fn update_line(
    state: &AppState,
    session: CartSession,
    product_id: Uuid,
    payload: UpdateCartLineRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must be at most {} per line",
            MAX_LINE_QUANTITY
        )));
    }
    let key = LineKey::new(product_id, &payload.color, &payload.size);

    let mut store = CartStore::hydrate(state.cart.clone(), session.0).await;
    if !store.update_quantity(&key, payload.quantity).await? {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Cart updated",
        CartView::from_cart(store.cart()),
        Some(Meta::empty()),
    ))
}

/// Removes one line. Removing a line that is not there is a no-op, not an
/// error; the caller may be retrying.
pub async fn remove_line(
    state: &AppState,
    session: CartSession,
    product_id: Uuid,
    params: LineVariantParams,
) -> AppResult<ApiResponse<CartView>> {
    let key = LineKey::new(product_id, &params.color, &params.size);

    let mut store = CartStore::hydrate(state.cart.clone(), session.0).await;
    store.remove(&key).await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "cart_remove",
        Some("cart_snapshots"),
        Some(serde_json::json!({ "session_id": session.0, "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        CartView::from_cart(store.cart()),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    session: CartSession,
) -> AppResult<ApiResponse<CartView>> {
    let mut store = CartStore::hydrate(state.cart.clone(), session.0).await;
    store.clear().await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        CartView::from_cart(store.cart()),
        Some(Meta::empty()),
    ))
}

fn validate_variant(product: &ProductModel, color: &str, size: &str) -> Result<(), AppError> {
    let colors: Vec<String> = serde_json::from_value(product.colors.clone()).unwrap_or_default();
    let sizes: Vec<String> = serde_json::from_value(product.sizes.clone()).unwrap_or_default();

    if !colors.iter().any(|c| c == color) {
        return Err(AppError::BadRequest(format!(
            "Color {} is not available for this product",
            color
        )));
    }
    if !sizes.iter().any(|s| s == size) {
        return Err(AppError::BadRequest(format!(
            "Size {} is not available for this product",
            size
        )));
    }
    Ok(())
}
