//! The authoritative cart for one session, with its persistence discipline.
//!
//! Rules, in order of importance:
//!
//! 1. Hydration reads exactly one snapshot. A missing, unreadable or
//!    unparseable snapshot yields an empty cart — never an error.
//! 2. Every mutation is followed by a full-snapshot write.
//! 3. When a mutation leaves the cart empty, the snapshot row is deleted
//!    instead of being written as an empty array, so storage cannot
//!    distinguish "never used" from "emptied".

use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use super::{Cart, CartLine, CartStorage, LineKey};

pub struct CartStore {
    session_id: Uuid,
    cart: Cart,
    storage: Arc<dyn CartStorage>,
}

impl CartStore {
    /// Load the session's cart. Infallible by contract: storage read errors
    /// and corrupt snapshots both degrade to an empty cart.
    pub async fn hydrate(storage: Arc<dyn CartStorage>, session_id: Uuid) -> Self {
        let cart = match storage.read(session_id).await {
            Ok(Some(snapshot)) => match serde_json::from_str::<Cart>(&snapshot) {
                Ok(cart) => cart,
                Err(err) => {
                    tracing::warn!(%session_id, error = %err, "discarding unparseable cart snapshot");
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "cart snapshot unreadable, starting empty");
                Cart::new()
            }
        };

        Self {
            session_id,
            cart,
            storage,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub async fn add(&mut self, line: CartLine) -> Result<()> {
        self.cart.add(line);
        self.persist().await
    }

    /// Overwrite a line's quantity. Returns `Ok(false)` without touching
    /// storage when the key does not match any line.
    pub async fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> Result<bool> {
        if !self.cart.update_quantity(key, quantity) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Remove a line by key. The snapshot is rewritten (or deleted, once
    /// empty) even when nothing matched, which keeps the operation a
    /// harmless no-op rather than an error.
    pub async fn remove(&mut self, key: &LineKey) -> Result<bool> {
        let removed = self.cart.remove(key);
        self.persist().await?;
        Ok(removed)
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.cart.clear();
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        if self.cart.is_empty() {
            return self.storage.delete(self.session_id).await;
        }
        let snapshot = serde_json::to_string(&self.cart)?;
        self.storage.write(self.session_id, &snapshot).await
    }
}
