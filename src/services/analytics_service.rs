use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::analytics::{
        AnalyticsRangeParams, AnalyticsSummary, TopProduct, TopProductList, TopProductsParams,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct RevenueRow {
    orders: i64,
    revenue: i64,
}

#[derive(FromRow)]
struct TopProductRow {
    product_id: Uuid,
    name: String,
    units_sold: i64,
    revenue: i64,
}

/// Revenue and order count over a window, with growth against the
/// preceding window of the same length. Cancelled orders are excluded
/// everywhere.
pub async fn summary(
    state: &AppState,
    user: &AuthUser,
    params: AnalyticsRangeParams,
) -> AppResult<ApiResponse<AnalyticsSummary>> {
    ensure_admin(user)?;
    let (from, to) = resolve_window(params.from, params.to)?;

    let current = revenue_between(state, from, to).await?;

    let span = to - from;
    let previous = revenue_between(state, from - span, from).await?;

    let growth_percent = if previous.revenue > 0 {
        let delta = (current.revenue - previous.revenue) as f64;
        Some(delta * 100.0 / previous.revenue as f64)
    } else {
        None
    };

    let average_order_value = if current.orders > 0 {
        current.revenue / current.orders
    } else {
        0
    };

    let data = AnalyticsSummary {
        revenue: current.revenue,
        orders: current.orders,
        average_order_value,
        growth_percent,
    };
    Ok(ApiResponse::success(
        "Analytics summary",
        data,
        Some(Meta::empty()),
    ))
}

/// Best sellers by units over a window.
pub async fn top_products(
    state: &AppState,
    user: &AuthUser,
    params: TopProductsParams,
) -> AppResult<ApiResponse<TopProductList>> {
    ensure_admin(user)?;
    let (from, to) = resolve_window(params.from, params.to)?;
    let limit = params.limit.unwrap_or(5).clamp(1, 50);

    let rows = sqlx::query_as::<_, TopProductRow>(
        r#"
        SELECT oi.product_id, oi.name,
               SUM(oi.quantity)::BIGINT AS units_sold,
               SUM(oi.quantity::BIGINT * oi.unit_price)::BIGINT AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.created_at >= $1 AND o.created_at < $2 AND o.status <> 'cancelled'
        GROUP BY oi.product_id, oi.name
        ORDER BY units_sold DESC, revenue DESC
        LIMIT $3
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| TopProduct {
            product_id: row.product_id,
            name: row.name,
            units_sold: row.units_sold,
            revenue: row.revenue,
        })
        .collect();

    Ok(ApiResponse::success(
        "Top products",
        TopProductList { items },
        Some(Meta::empty()),
    ))
}

async fn revenue_between(
    state: &AppState,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<RevenueRow> {
    let row = sqlx::query_as::<_, RevenueRow>(
        r#"
        SELECT COUNT(*) AS orders,
               COALESCE(SUM(total_amount), 0)::BIGINT AS revenue
        FROM orders
        WHERE created_at >= $1 AND created_at < $2 AND status <> 'cancelled'
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(&state.pool)
    .await?;
    Ok(row)
}

fn resolve_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let to = to.unwrap_or_else(Utc::now);
    let from = from.unwrap_or_else(|| to - Duration::days(30));
    if from >= to {
        return Err(AppError::BadRequest("from must be before to".into()));
    }
    Ok((from, to))
}
