//! Snapshot storage backends for the cart.
//!
//! One snapshot per session under a single key, read/written as an opaque
//! string. The Postgres backend keeps a row per session in
//! `cart_snapshots`; the in-memory backend exists for the domain tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;

#[async_trait]
pub trait CartStorage: Send + Sync {
    async fn read(&self, session_id: Uuid) -> Result<Option<String>>;
    async fn write(&self, session_id: Uuid, snapshot: &str) -> Result<()>;
    async fn delete(&self, session_id: Uuid) -> Result<()>;
}

pub struct PgCartStorage {
    pool: DbPool,
}

impl PgCartStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStorage for PgCartStorage {
    async fn read(&self, session_id: Uuid) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT snapshot::TEXT FROM cart_snapshots WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(snapshot,)| snapshot))
    }

    async fn write(&self, session_id: Uuid, snapshot: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_snapshots (session_id, snapshot)
            VALUES ($1, $2::JSONB)
            ON CONFLICT (session_id)
            DO UPDATE SET snapshot = EXCLUDED.snapshot, updated_at = now()
            "#,
        )
        .bind(session_id)
        .bind(snapshot)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_snapshots WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// HashMap-backed storage used by tests and local tooling.
#[derive(Default)]
pub struct MemoryCartStorage {
    inner: Mutex<HashMap<Uuid, String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, String>>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("cart storage lock poisoned"))
    }
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn read(&self, session_id: Uuid) -> Result<Option<String>> {
        Ok(self.lock()?.get(&session_id).cloned())
    }

    async fn write(&self, session_id: Uuid, snapshot: &str) -> Result<()> {
        self.lock()?.insert(session_id, snapshot.to_string());
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> Result<()> {
        self.lock()?.remove(&session_id);
        Ok(())
    }
}
