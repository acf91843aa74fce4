use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Discount, DiscountKind};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub min_subtotal: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDiscountRequest {
    pub kind: Option<DiscountKind>,
    pub value: Option<i64>,
    pub min_subtotal: Option<i64>,
    pub active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountList {
    pub items: Vec<Discount>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCheckoutSettingsRequest {
    pub tax_percent: Option<i64>,
    pub shipping_fee: Option<i64>,
    /// 0 clears the threshold, turning free shipping off.
    pub free_shipping_above: Option<i64>,
    pub cod_limit: Option<i64>,
}
