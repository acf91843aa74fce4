use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::cart::{Cart, CartLine};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartLineRequest {
    pub product_id: Uuid,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartLineRequest {
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LineVariantParams {
    pub color: String,
    pub size: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub count: u32,
    pub subtotal: i64,
}

impl CartView {
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().to_vec(),
            count: cart.count(),
            subtotal: cart.subtotal(),
        }
    }
}
