use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::wishlist::{AddWishlistRequest, WishlistItemDto, WishlistList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

#[derive(FromRow)]
struct WishlistProductRow {
    wishlist_id: Uuid,
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    colors: serde_json::Value,
    sizes: serde_json::Value,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

pub async fn list_wishlist(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WishlistList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, WishlistProductRow>(
        r#"
        SELECT w.id AS wishlist_id,
               p.id AS product_id, p.name, p.description, p.price, p.stock,
               p.colors, p.sizes, p.image, p.created_at
        FROM wishlist_items w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wishlist_items WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let items = rows.into_iter().map(wishlist_item_from_row).collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", WishlistList { items }, Some(meta)))
}

/// Saves a product to the wishlist. Saving it twice is fine and returns
/// the existing entry.
pub async fn add_wishlist_item(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddWishlistRequest,
) -> AppResult<ApiResponse<WishlistItemDto>> {
    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;

    if product_exists.is_none() {
        return Err(AppError::BadRequest("Product not found".into()));
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(payload.product_id)
            .fetch_optional(pool)
            .await?;

    let wishlist_id = match existing {
        Some((id,)) => id,
        None => {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO wishlist_items (id, user_id, product_id) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(user.user_id)
            .bind(payload.product_id)
            .execute(pool)
            .await?;
            id
        }
    };

    let row = sqlx::query_as::<_, WishlistProductRow>(
        r#"
        SELECT w.id AS wishlist_id,
               p.id AS product_id, p.name, p.description, p.price, p.stock,
               p.colors, p.sizes, p.image, p.created_at
        FROM wishlist_items w
        JOIN products p ON p.id = w.product_id
        WHERE w.id = $1
        "#,
    )
    .bind(wishlist_id)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "wishlist_add",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": payload.product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Saved to wishlist",
        wishlist_item_from_row(row),
        Some(Meta::empty()),
    ))
}

pub async fn remove_wishlist_item(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "wishlist_remove",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn wishlist_item_from_row(row: WishlistProductRow) -> WishlistItemDto {
    WishlistItemDto {
        id: row.wishlist_id,
        product: Product {
            id: row.product_id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            colors: serde_json::from_value(row.colors).unwrap_or_default(),
            sizes: serde_json::from_value(row.sizes).unwrap_or_default(),
            image: row.image,
            created_at: row.created_at,
        },
    }
}
