//! # Audit Trail Repository
//!
//! Append-only audit entries written as a side effect of every
//! state-changing operation. Entries are never edited; the administrative
//! bulk clear is the single delete path.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kopi_core::AuditEntry;

const AUDIT_COLUMNS: &str = "id, actor, action, description, status, online, recorded_at";

/// Repository for the audit trail.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends one audit entry.
    pub async fn append(&self, entry: &AuditEntry) -> DbResult<()> {
        debug!(actor = %entry.actor, action = ?entry.action, "Appending audit entry");

        sqlx::query(
            r#"
            INSERT INTO audit_log (
                id, actor, action, description, status, online, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.actor)
        .bind(entry.action)
        .bind(&entry.description)
        .bind(entry.status)
        .bind(entry.online)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the most recent entries, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<AuditEntry>> {
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log ORDER BY recorded_at DESC LIMIT ?1"
        );
        let entries = sqlx::query_as::<_, AuditEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Administrative bulk clear. Returns the number of deleted entries.
    pub async fn clear_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM audit_log")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Counts all entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new audit entry id.
pub fn generate_audit_id() -> String {
    Uuid::new_v4().to_string()
}
