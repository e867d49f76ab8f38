//! # Sync Outbox Repository
//!
//! The outbox queue for offline-first mirroring.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  LOCAL OPERATION (e.g. mark_waste)                                  │
//! │    1. write the local rows                                          │
//! │    2. INSERT INTO sync_outbox (entity_type, entity_id, payload)     │
//! │                                                                     │
//! │  BACKGROUND WORKER (kopi-sync)                                      │
//! │    1. SELECT ... WHERE synced_at IS NULL ORDER BY created_at        │
//! │    2. push each entry to the remote document store                  │
//! │    3. success → mark_synced;  failure → attempts += 1, last_error   │
//! │                                                                     │
//! │  Offline? Entries queue up. Back online? The worker drains them.    │
//! │  Local success never waits on the network.                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kopi_core::SyncOutboxEntry;

const OUTBOX_COLUMNS: &str = "id, entity_type, entity_id, payload, attempts, last_error, \
     created_at, attempted_at, synced_at";

/// Repository for sync outbox operations.
#[derive(Debug, Clone)]
pub struct SyncOutboxRepository {
    pool: SqlitePool,
}

impl SyncOutboxRepository {
    /// Creates a new SyncOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncOutboxRepository { pool }
    }

    /// Queues an entity for mirroring.
    ///
    /// ## Arguments
    /// * `entity_type` - one of the `kopi_core::ENTITY_*` tags
    /// * `entity_id` - the entity's durable id
    /// * `payload` - JSON serialization of the full entity
    pub async fn queue_for_sync(
        &self,
        entity_type: &str,
        entity_id: &str,
        payload: &str,
    ) -> DbResult<SyncOutboxEntry> {
        let entry = SyncOutboxEntry {
            id: Uuid::new_v4().to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload: payload.to_string(),
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            attempted_at: None,
            synced_at: None,
        };

        debug!(
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            "Queuing for sync"
        );

        sqlx::query(
            r#"
            INSERT INTO sync_outbox (
                id, entity_type, entity_id, payload,
                attempts, last_error, created_at, attempted_at, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.payload)
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.created_at)
        .bind(entry.attempted_at)
        .bind(entry.synced_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Gets pending entries (oldest first).
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<SyncOutboxEntry>> {
        let sql = format!(
            "SELECT {OUTBOX_COLUMNS} FROM sync_outbox \
             WHERE synced_at IS NULL ORDER BY created_at ASC LIMIT ?1"
        );
        let entries = sqlx::query_as::<_, SyncOutboxEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Gets pending entries still under the attempt cap (oldest first).
    ///
    /// Rows at or over the cap stay pending but are no longer retried
    /// automatically; `get_pending` still sees them.
    pub async fn get_retryable(&self, limit: u32, max_attempts: i64) -> DbResult<Vec<SyncOutboxEntry>> {
        let sql = format!(
            "SELECT {OUTBOX_COLUMNS} FROM sync_outbox \
             WHERE synced_at IS NULL AND attempts < ?2 ORDER BY created_at ASC LIMIT ?1"
        );
        let entries = sqlx::query_as::<_, SyncOutboxEntry>(&sql)
            .bind(limit)
            .bind(max_attempts)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Marks an entry as successfully synced.
    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                synced_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a sync failure.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts pending sync entries.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_outbox WHERE synced_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes synced entries older than `days_old` days. Returns the
    /// number of deleted entries.
    pub async fn cleanup_old_entries(&self, days_old: u32) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sync_outbox
            WHERE synced_at IS NOT NULL
            AND synced_at < datetime('now', '-' || ?1 || ' days')
            "#,
        )
        .bind(days_old)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
