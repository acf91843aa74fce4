use std::sync::Arc;

use storefront_api::cart::{
    Cart, CartLine, CartStorage, CartStore, LineKey, MAX_LINE_QUANTITY, MemoryCartStorage,
};
use uuid::Uuid;

fn line(product_id: Uuid, color: &str, size: &str, quantity: u32, unit_price: i64) -> CartLine {
    CartLine {
        product_id,
        color: color.into(),
        size: size.into(),
        quantity,
        unit_price,
        name: format!("Product {product_id}"),
        image: None,
    }
}

#[test]
fn adding_same_key_merges_quantities() {
    let p1 = Uuid::new_v4();
    let mut cart = Cart::new();

    cart.add(line(p1, "red", "m", 2, 3490));
    cart.add(line(p1, "red", "m", 3, 3490));

    assert_eq!(cart.lines().len(), 1);
    let key = LineKey::new(p1, "red", "m");
    assert_eq!(cart.find(&key).unwrap().quantity, 5);
    assert_eq!(cart.count(), 5);
}

#[test]
fn different_variants_are_distinct_lines() {
    let p1 = Uuid::new_v4();
    let mut cart = Cart::new();

    cart.add(line(p1, "red", "m", 1, 3490));
    cart.add(line(p1, "red", "l", 1, 3490));
    cart.add(line(p1, "blue", "m", 1, 3490));

    assert_eq!(cart.lines().len(), 3);
    assert_eq!(cart.count(), 3);
}

#[test]
fn merging_huge_quantities_saturates_at_the_cap() {
    let p1 = Uuid::new_v4();
    let key = LineKey::new(p1, "red", "m");
    let mut cart = Cart::new();

    // Quantities this large only arrive via old snapshots, but the merge
    // must stay defined for them instead of wrapping.
    cart.add(line(p1, "red", "m", u32::MAX, 3490));
    cart.add(line(p1, "red", "m", 2, 3490));

    assert_eq!(cart.find(&key).unwrap().quantity, MAX_LINE_QUANTITY);
    assert_eq!(cart.count(), MAX_LINE_QUANTITY);
}

#[test]
fn merge_clamps_exactly_at_the_cap_boundary() {
    let p1 = Uuid::new_v4();
    let key = LineKey::new(p1, "red", "m");
    let mut cart = Cart::new();

    cart.add(line(p1, "red", "m", MAX_LINE_QUANTITY - 1, 3490));
    cart.add(line(p1, "red", "m", 1, 3490));
    assert_eq!(cart.find(&key).unwrap().quantity, MAX_LINE_QUANTITY);

    cart.add(line(p1, "red", "m", 1, 3490));
    assert_eq!(cart.find(&key).unwrap().quantity, MAX_LINE_QUANTITY);

    assert!(cart.update_quantity(&key, MAX_LINE_QUANTITY + 1));
    assert_eq!(cart.find(&key).unwrap().quantity, MAX_LINE_QUANTITY);
}

#[test]
fn count_saturates_across_oversized_lines() {
    let p1 = Uuid::new_v4();
    let p2 = Uuid::new_v4();
    // Bypasses add() the way snapshot hydration does, so the per-line
    // clamp never ran on these quantities.
    let snapshot = serde_json::to_string(&vec![
        line(p1, "red", "m", u32::MAX, 3490),
        line(p2, "blue", "l", 7, 3490),
    ])
    .unwrap();
    let cart: Cart = serde_json::from_str(&snapshot).unwrap();

    assert_eq!(cart.count(), u32::MAX);
}

#[test]
fn update_overwrites_instead_of_adding() {
    let p1 = Uuid::new_v4();
    let key = LineKey::new(p1, "red", "m");
    let mut cart = Cart::new();
    cart.add(line(p1, "red", "m", 2, 3490));

    assert!(cart.update_quantity(&key, 7));
    assert_eq!(cart.find(&key).unwrap().quantity, 7);
    assert_eq!(cart.count(), 7);
}

#[test]
fn update_to_zero_keeps_the_line() {
    // Observed upstream behavior, preserved deliberately: quantity 0 does
    // not remove the line, only the explicit remove does.
    let p1 = Uuid::new_v4();
    let key = LineKey::new(p1, "red", "m");
    let mut cart = Cart::new();
    cart.add(line(p1, "red", "m", 2, 3490));

    assert!(cart.update_quantity(&key, 0));
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.count(), 0);

    assert!(cart.remove(&key));
    assert!(cart.is_empty());
}

#[test]
fn update_missing_line_reports_false() {
    let mut cart = Cart::new();
    let key = LineKey::new(Uuid::new_v4(), "red", "m");
    assert!(!cart.update_quantity(&key, 3));
}

#[test]
fn remove_missing_line_is_a_noop() {
    let p1 = Uuid::new_v4();
    let mut cart = Cart::new();
    cart.add(line(p1, "red", "m", 1, 3490));

    let other = LineKey::new(p1, "red", "xl");
    assert!(!cart.remove(&other));
    assert_eq!(cart.lines().len(), 1);
}

#[test]
fn count_and_subtotal_track_every_mutation() {
    let p1 = Uuid::new_v4();
    let p2 = Uuid::new_v4();
    let mut cart = Cart::new();

    cart.add(line(p1, "orange", "38", 1, 3490));
    cart.add(line(p2, "magenta", "40", 2, 3490));
    assert_eq!(cart.count(), 3);
    assert_eq!(cart.subtotal(), 10_470);

    cart.update_quantity(&LineKey::new(p2, "magenta", "40"), 1);
    assert_eq!(cart.count(), 2);
    assert_eq!(cart.subtotal(), 6_980);

    cart.clear();
    assert_eq!(cart.count(), 0);
    assert_eq!(cart.subtotal(), 0);
}

#[tokio::test]
async fn snapshot_round_trip_reproduces_the_cart() -> anyhow::Result<()> {
    let storage = Arc::new(MemoryCartStorage::new());
    let session = Uuid::new_v4();
    let p1 = Uuid::new_v4();

    let mut store = CartStore::hydrate(storage.clone(), session).await;
    store.add(line(p1, "red", "m", 2, 3490)).await?;
    store.add(line(p1, "blue", "l", 1, 5990)).await?;

    let rehydrated = CartStore::hydrate(storage, session).await;
    assert_eq!(rehydrated.cart(), store.cart());
    assert_eq!(rehydrated.cart().count(), 3);
    Ok(())
}

#[tokio::test]
async fn corrupt_snapshot_hydrates_empty() -> anyhow::Result<()> {
    let storage = Arc::new(MemoryCartStorage::new());
    let session = Uuid::new_v4();
    storage.write(session, "{not json").await?;

    let store = CartStore::hydrate(storage, session).await;
    assert!(store.cart().is_empty());
    Ok(())
}

#[tokio::test]
async fn emptying_the_cart_deletes_the_snapshot() -> anyhow::Result<()> {
    let storage = Arc::new(MemoryCartStorage::new());
    let session = Uuid::new_v4();
    let p1 = Uuid::new_v4();
    let key = LineKey::new(p1, "red", "m");

    let mut store = CartStore::hydrate(storage.clone(), session).await;
    store.add(line(p1, "red", "m", 2, 3490)).await?;
    assert!(storage.read(session).await?.is_some());

    // Quantity 0 keeps the line, so the snapshot must still exist.
    store.update_quantity(&key, 0).await?;
    assert!(storage.read(session).await?.is_some());

    // The keyed removal empties the cart; the row is deleted, not written
    // as an empty array.
    store.remove(&key).await?;
    assert_eq!(storage.read(session).await?, None);
    Ok(())
}

#[tokio::test]
async fn clear_deletes_the_snapshot() -> anyhow::Result<()> {
    let storage = Arc::new(MemoryCartStorage::new());
    let session = Uuid::new_v4();

    let mut store = CartStore::hydrate(storage.clone(), session).await;
    store.add(line(Uuid::new_v4(), "red", "m", 4, 1000)).await?;
    store.clear().await?;

    assert_eq!(storage.read(session).await?, None);
    assert_eq!(store.cart().count(), 0);
    Ok(())
}
