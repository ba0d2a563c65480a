//! Postgres backends for the primary store, migration ledger, and
//! startup-job lock.
//!
//! Asset tables share one shape per kind (see `migrations/`): identity
//! and lifecycle columns plus a JSONB payload. The table name is injected
//! at construction so each asset kind gets its own table through the same
//! code path.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tokio::sync::Mutex;

use atelier_core::error::AssetError;
use atelier_core::migration::MigrationState;
use atelier_core::record::AssetRecord;
use atelier_core::types::{AssetId, Timestamp};

use crate::ledger::MigrationLedger;
use crate::lock::{DistributedLock, LockLease};
use crate::primary::PrimaryStore;

/// Column list for asset-table queries.
const ASSET_COLUMNS: &str =
    "id, created_on, updated_on, deleted_on, is_temporary, is_public, payload";

/// A raw asset row; the JSONB payload is decoded separately.
#[derive(Debug, sqlx::FromRow)]
struct AssetRow {
    id: AssetId,
    created_on: Timestamp,
    updated_on: Timestamp,
    deleted_on: Option<Timestamp>,
    is_temporary: bool,
    is_public: bool,
    payload: serde_json::Value,
}

impl AssetRow {
    fn into_record<T: DeserializeOwned>(self) -> Result<AssetRecord<T>, AssetError> {
        let payload = serde_json::from_value(self.payload)
            .map_err(|e| AssetError::Backend(anyhow::Error::new(e)))?;
        Ok(AssetRecord {
            id: self.id,
            created_on: self.created_on,
            updated_on: self.updated_on,
            deleted_on: self.deleted_on,
            temporary: self.is_temporary,
            public_asset: self.is_public,
            payload,
        })
    }
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// Postgres-backed [`PrimaryStore`] over one asset table.
pub struct PgStore<T> {
    pool: PgPool,
    table: String,
    _kind: std::marker::PhantomData<fn() -> T>,
}

impl<T> PgStore<T> {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            _kind: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T> PrimaryStore<T> for PgStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn get_by_id(&self, id: AssetId) -> Result<Option<AssetRecord<T>>, AssetError> {
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM {} WHERE id = $1",
            self.table
        );
        let row = sqlx::query_as::<_, AssetRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AssetError::backend)?;
        row.map(AssetRow::into_record).transpose()
    }

    async fn find_page(
        &self,
        page: u32,
        page_size: u32,
        include_deleted: bool,
    ) -> Result<Vec<AssetRecord<T>>, AssetError> {
        let filter = if include_deleted {
            ""
        } else {
            "WHERE deleted_on IS NULL "
        };
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM {} {filter}\
             ORDER BY created_on ASC, id ASC LIMIT $1 OFFSET $2",
            self.table
        );
        let rows = sqlx::query_as::<_, AssetRow>(&query)
            .bind(i64::from(page_size))
            .bind(i64::from(page) * i64::from(page_size))
            .fetch_all(&self.pool)
            .await
            .map_err(AssetError::backend)?;
        rows.into_iter().map(AssetRow::into_record).collect()
    }

    async fn save(&self, record: AssetRecord<T>) -> Result<AssetRecord<T>, AssetError> {
        let payload = serde_json::to_value(&record.payload)
            .map_err(|e| AssetError::Backend(anyhow::Error::new(e)))?;
        let query = format!(
            "INSERT INTO {} ({ASSET_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                created_on = EXCLUDED.created_on, \
                updated_on = EXCLUDED.updated_on, \
                deleted_on = EXCLUDED.deleted_on, \
                is_temporary = EXCLUDED.is_temporary, \
                is_public = EXCLUDED.is_public, \
                payload = EXCLUDED.payload",
            self.table
        );
        sqlx::query(&query)
            .bind(record.id)
            .bind(record.created_on)
            .bind(record.updated_on)
            .bind(record.deleted_on)
            .bind(record.temporary)
            .bind(record.public_asset)
            .bind(&payload)
            .execute(&self.pool)
            .await
            .map_err(AssetError::backend)?;
        Ok(record)
    }

    async fn save_all(
        &self,
        records: Vec<AssetRecord<T>>,
    ) -> Result<Vec<AssetRecord<T>>, AssetError> {
        let mut tx = self.pool.begin().await.map_err(AssetError::backend)?;
        let query = format!(
            "INSERT INTO {} ({ASSET_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                created_on = EXCLUDED.created_on, \
                updated_on = EXCLUDED.updated_on, \
                deleted_on = EXCLUDED.deleted_on, \
                is_temporary = EXCLUDED.is_temporary, \
                is_public = EXCLUDED.is_public, \
                payload = EXCLUDED.payload",
            self.table
        );
        for record in &records {
            let payload = serde_json::to_value(&record.payload)
                .map_err(|e| AssetError::Backend(anyhow::Error::new(e)))?;
            sqlx::query(&query)
                .bind(record.id)
                .bind(record.created_on)
                .bind(record.updated_on)
                .bind(record.deleted_on)
                .bind(record.temporary)
                .bind(record.public_asset)
                .bind(&payload)
                .execute(&mut *tx)
                .await
                .map_err(AssetError::backend)?;
        }
        tx.commit().await.map_err(AssetError::backend)?;
        Ok(records)
    }

    async fn exists_non_deleted(&self, id: AssetId) -> Result<bool, AssetError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND deleted_on IS NULL)",
            self.table
        );
        let (exists,): (bool,) = sqlx::query_as(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AssetError::backend)?;
        Ok(exists)
    }
}

// ---------------------------------------------------------------------------
// PgLedger
// ---------------------------------------------------------------------------

/// Postgres-backed [`MigrationLedger`] over the `migration_ledger` table.
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MigrationLedger for PgLedger {
    async fn state_of(&self, target: &str) -> Result<MigrationState, AssetError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT state FROM migration_ledger WHERE target = $1")
                .bind(target)
                .fetch_optional(&self.pool)
                .await
                .map_err(AssetError::backend)?;
        Ok(row
            .and_then(|(s,)| MigrationState::from_str(&s))
            .unwrap_or(MigrationState::Unstarted))
    }

    async fn record(&self, target: &str, state: MigrationState) -> Result<(), AssetError> {
        sqlx::query(
            "INSERT INTO migration_ledger (target, state, updated_on) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (target) DO UPDATE SET \
                state = EXCLUDED.state, updated_on = EXCLUDED.updated_on",
        )
        .bind(target)
        .bind(state.as_str())
        .execute(&self.pool)
        .await
        .map_err(AssetError::backend)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PgAdvisoryLock
// ---------------------------------------------------------------------------

/// Advisory-lock-backed [`DistributedLock`].
///
/// Advisory locks are session-scoped, so each held key pins its pool
/// connection until release; dropping the connection (process death
/// included) releases the lock on the server side, which bounds the
/// effective lease.
pub struct PgAdvisoryLock {
    pool: PgPool,
    held: Mutex<HashMap<String, PoolConnection<Postgres>>>,
}

impl PgAdvisoryLock {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            held: Mutex::new(HashMap::new()),
        }
    }

    /// Stable advisory-lock id for a key; must agree across instances.
    fn lock_id(key: &str) -> i64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as i64
    }
}

#[async_trait]
impl DistributedLock for PgAdvisoryLock {
    async fn try_acquire(&self, key: &str) -> Result<Option<LockLease>, AssetError> {
        let mut conn = self.pool.acquire().await.map_err(AssetError::backend)?;
        let (acquired,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(Self::lock_id(key))
            .fetch_one(&mut *conn)
            .await
            .map_err(AssetError::backend)?;
        if !acquired {
            return Ok(None);
        }
        self.held.lock().await.insert(key.to_string(), conn);
        Ok(Some(LockLease {
            key: key.to_string(),
        }))
    }

    async fn release(&self, lease: LockLease) -> Result<(), AssetError> {
        let conn = self.held.lock().await.remove(&lease.key);
        if let Some(mut conn) = conn {
            sqlx::query("SELECT pg_advisory_unlock($1)")
                .bind(Self::lock_id(&lease.key))
                .execute(&mut *conn)
                .await
                .map_err(AssetError::backend)?;
        }
        Ok(())
    }
}
