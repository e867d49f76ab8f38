//! Audit trail helper shared by the engines.

use chrono::Utc;

use kopi_core::{AuditAction, AuditEntry, AuditStatus};
use kopi_db::repository::audit::generate_audit_id;
use kopi_db::{Database, DbResult};

/// Appends one audit entry attributed to `actor`.
///
/// The terminal always records entries as offline; connectivity is only
/// observed by the sync worker when it mirrors the trail.
pub(crate) async fn record(
    db: &Database,
    actor: &str,
    action: AuditAction,
    description: String,
    status: AuditStatus,
) -> DbResult<()> {
    let entry = AuditEntry {
        id: generate_audit_id(),
        actor: actor.to_string(),
        action,
        description,
        status,
        online: false,
        recorded_at: Utc::now(),
    };

    db.audit().append(&entry).await
}
