use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AnalyticsRangeParams {
    /// Inclusive start of the reporting window; defaults to 30 days ago.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive end of the reporting window; defaults to now.
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TopProductsParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// How many products to return, at most 50. Defaults to 5.
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsSummary {
    pub revenue: i64,
    pub orders: i64,
    pub average_order_value: i64,
    /// Revenue growth versus the preceding window of equal length.
    /// `None` when the preceding window had no revenue to compare against.
    pub growth_percent: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub units_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopProductList {
    pub items: Vec<TopProduct>,
}
