use chrono::Utc;
use storefront_api::models::{CheckoutSettings, DiscountKind};
use storefront_api::pricing::{DiscountTerms, compute_totals, discount_amount};

fn settings(tax_percent: i64, shipping_fee: i64, free_above: Option<i64>) -> CheckoutSettings {
    CheckoutSettings {
        tax_percent,
        shipping_fee,
        free_shipping_above: free_above,
        cod_limit: 10_000,
        updated_at: Utc::now(),
    }
}

#[test]
fn plain_order_totals() {
    // One unit at 3490 plus two at 3490.
    let subtotal = 3_490 + 2 * 3_490;
    let totals = compute_totals(subtotal, None, &settings(0, 99, None));

    assert_eq!(totals.subtotal, 10_470);
    assert_eq!(totals.discount_amount, 0);
    assert_eq!(totals.shipping_fee, 99);
    assert_eq!(totals.tax_amount, 0);
    assert_eq!(totals.total, 10_569);
}

#[test]
fn percent_discount_applies_before_shipping_and_tax() {
    let terms = DiscountTerms {
        kind: DiscountKind::Percent,
        value: 10,
    };
    let totals = compute_totals(10_000, Some(terms), &settings(10, 99, None));

    assert_eq!(totals.discount_amount, 1_000);
    // Tax on the discounted goods value: 9000 * 10%.
    assert_eq!(totals.tax_amount, 900);
    assert_eq!(totals.total, 9_000 + 99 + 900);
}

#[test]
fn fixed_discount_is_clamped_to_the_subtotal() {
    let terms = DiscountTerms {
        kind: DiscountKind::Fixed,
        value: 5_000,
    };
    assert_eq!(discount_amount(2_000, terms), 2_000);

    let totals = compute_totals(2_000, Some(terms), &settings(0, 99, None));
    assert_eq!(totals.discount_amount, 2_000);
    assert_eq!(totals.total, 99);
}

#[test]
fn free_shipping_threshold_uses_discounted_goods_value() {
    let s = settings(0, 99, Some(5_000));

    // At the threshold shipping is waived.
    let totals = compute_totals(5_000, None, &s);
    assert_eq!(totals.shipping_fee, 0);
    assert_eq!(totals.total, 5_000);

    // A discount can pull the goods value back under the threshold.
    let terms = DiscountTerms {
        kind: DiscountKind::Fixed,
        value: 500,
    };
    let totals = compute_totals(5_000, Some(terms), &s);
    assert_eq!(totals.shipping_fee, 99);
    assert_eq!(totals.total, 4_500 + 99);
}

#[test]
fn tax_rounds_down() {
    let totals = compute_totals(999, None, &settings(7, 0, None));
    // 999 * 7 / 100 = 69.93, truncated.
    assert_eq!(totals.tax_amount, 69);
    assert_eq!(totals.total, 999 + 69);
}

#[test]
fn zero_subtotal_yields_shipping_only() {
    let totals = compute_totals(0, None, &settings(10, 99, Some(2_999)));
    assert_eq!(totals.discount_amount, 0);
    assert_eq!(totals.tax_amount, 0);
    assert_eq!(totals.shipping_fee, 99);
    assert_eq!(totals.total, 99);
}
