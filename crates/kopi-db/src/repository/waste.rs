//! # Waste Ledger Repository
//!
//! Append-only shrinkage records. The only mutation ever applied is
//! stamping `remote_id`/`synced_at` once the outbox worker has mirrored a
//! row to the remote store.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kopi_core::WasteRecord;

const WASTE_COLUMNS: &str = "id, product_id, product_name, category, quantity, reason, \
     cost_cents_snapshot, recorded_by, recorded_at, remote_id, synced_at";

/// Repository for the append-only waste ledger.
#[derive(Debug, Clone)]
pub struct WasteRepository {
    pool: SqlitePool,
}

impl WasteRepository {
    /// Creates a new WasteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WasteRepository { pool }
    }

    /// Appends one waste record (sync-pending until mirrored).
    pub async fn append(&self, record: &WasteRecord) -> DbResult<()> {
        debug!(
            product = %record.product_name,
            quantity = record.quantity,
            reason = %record.reason,
            "Appending waste record"
        );

        sqlx::query(
            r#"
            INSERT INTO waste_records (
                id, product_id, product_name, category, quantity, reason,
                cost_cents_snapshot, recorded_by, recorded_at, remote_id, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_id)
        .bind(&record.product_name)
        .bind(&record.category)
        .bind(record.quantity)
        .bind(&record.reason)
        .bind(record.cost_cents_snapshot)
        .bind(&record.recorded_by)
        .bind(record.recorded_at)
        .bind(&record.remote_id)
        .bind(record.synced_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists records in a half-open time range `[from, to)`, oldest first.
    pub async fn list_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<WasteRecord>> {
        let sql = format!(
            "SELECT {WASTE_COLUMNS} FROM waste_records \
             WHERE recorded_at >= ?1 AND recorded_at < ?2 ORDER BY recorded_at"
        );
        let records = sqlx::query_as::<_, WasteRecord>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Lists records still awaiting their remote mirror, oldest first.
    pub async fn list_pending_sync(&self, limit: u32) -> DbResult<Vec<WasteRecord>> {
        let sql = format!(
            "SELECT {WASTE_COLUMNS} FROM waste_records \
             WHERE synced_at IS NULL ORDER BY recorded_at LIMIT ?1"
        );
        let records = sqlx::query_as::<_, WasteRecord>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Stamps a record with the remote document id after a successful
    /// mirror.
    pub async fn mark_synced(&self, id: &str, remote_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE waste_records SET
                remote_id = ?2,
                synced_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(remote_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("WasteRecord", id));
        }

        Ok(())
    }

    /// Total shrinkage value in a range (quantity × frozen unit cost).
    pub async fn total_waste_cost_cents(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity * cost_cents_snapshot), 0) FROM waste_records \
             WHERE recorded_at >= ?1 AND recorded_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Generates a new waste record id.
pub fn generate_waste_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use kopi_core::types::CATEGORY_PASTRIES;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn record(id: &str, qty: i64, cost: i64) -> WasteRecord {
        WasteRecord {
            id: id.to_string(),
            product_id: "p-1".to_string(),
            product_name: "Croissant".to_string(),
            category: CATEGORY_PASTRIES.to_string(),
            quantity: qty,
            reason: "Expired".to_string(),
            cost_cents_snapshot: cost,
            recorded_by: "ana".to_string(),
            recorded_at: Utc::now(),
            remote_id: None,
            synced_at: None,
        }
    }

    #[tokio::test]
    async fn test_append_and_pending_sync() {
        let db = test_db().await;
        let repo = db.waste();

        repo.append(&record("w-1", 3, 1500)).await.unwrap();
        repo.append(&record("w-2", 1, 1500)).await.unwrap();

        let pending = repo.list_pending_sync(10).await.unwrap();
        assert_eq!(pending.len(), 2);

        repo.mark_synced("w-1", "doc-abc").await.unwrap();

        let pending = repo.list_pending_sync(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "w-2");
    }

    #[tokio::test]
    async fn test_mark_synced_stamps_remote_id() {
        let db = test_db().await;
        let repo = db.waste();
        repo.append(&record("w-1", 3, 1500)).await.unwrap();

        repo.mark_synced("w-1", "doc-abc").await.unwrap();

        let now = Utc::now();
        let rows = repo
            .list_range(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(rows[0].remote_id.as_deref(), Some("doc-abc"));
        assert!(rows[0].synced_at.is_some());
    }

    #[tokio::test]
    async fn test_waste_cost_aggregation() {
        let db = test_db().await;
        let repo = db.waste();

        repo.append(&record("w-1", 3, 1500)).await.unwrap();
        repo.append(&record("w-2", 2, 2000)).await.unwrap();

        let now = Utc::now();
        let total = repo
            .total_waste_cost_cents(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(total, 3 * 1500 + 2 * 2000);
    }
}
