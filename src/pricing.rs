//! Order totals. Pure integer arithmetic in minor units; the checkout
//! service feeds it the cart subtotal, the discount terms it already
//! validated, and the store's checkout settings.

use crate::models::{CheckoutSettings, DiscountKind};

/// The discount terms that affect arithmetic. Applicability (active flag,
/// expiry, minimum subtotal) is the caller's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountTerms {
    pub kind: DiscountKind,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_fee: i64,
    pub tax_amount: i64,
    pub total: i64,
}

/// Discount owed on a subtotal, clamped so it can never exceed it.
pub fn discount_amount(subtotal: i64, terms: DiscountTerms) -> i64 {
    let raw = match terms.kind {
        DiscountKind::Percent => subtotal * terms.value / 100,
        DiscountKind::Fixed => terms.value,
    };
    raw.clamp(0, subtotal)
}

/// Price an order: subtotal, minus discount, plus shipping and tax.
///
/// Shipping is waived when the discounted goods value reaches the
/// free-shipping threshold; tax applies to the discounted goods value,
/// rounded down.
pub fn compute_totals(
    subtotal: i64,
    discount: Option<DiscountTerms>,
    settings: &CheckoutSettings,
) -> OrderTotals {
    let discount_amount = discount
        .map(|terms| self::discount_amount(subtotal, terms))
        .unwrap_or(0);
    let goods_value = subtotal - discount_amount;

    let shipping_fee = match settings.free_shipping_above {
        Some(threshold) if goods_value >= threshold => 0,
        _ => settings.shipping_fee,
    };

    let tax_amount = goods_value * settings.tax_percent / 100;

    OrderTotals {
        subtotal,
        discount_amount,
        shipping_fee,
        tax_amount,
        total: goods_value + shipping_fee + tax_amount,
    }
}
