//! Postgres-backed key-value namespaces.
//!
//! Every namespace shares the `kv_entries` table. Writes are upserts, so a
//! retried terminal write for the same URL simply overwrites.

use anyhow::{Context, Result};
use async_trait::async_trait;
use pipeline::KvStore;
use sqlx::PgPool;

/// Namespace holding translated summaries keyed by source URL.
pub const SUMMARY_NAMESPACE: &str = "summary";

/// Namespace holding article links discovered by the listing crawl.
pub const LISTING_NAMESPACE: &str = "listing";

#[derive(Clone)]
pub struct PostgresKvStore {
    pool: PgPool,
    namespace: String,
}

impl PostgresKvStore {
    pub fn new(pool: PgPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl KvStore for PostgresKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM kv_entries WHERE namespace = $1 AND key = $2",
        )
        .bind(&self.namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to read {}/{}", self.namespace, key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (namespace, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (namespace, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write {}/{}", self.namespace, key))?;
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT key FROM kv_entries WHERE namespace = $1 ORDER BY key",
        )
        .bind(&self.namespace)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list keys in {}", self.namespace))
    }
}
