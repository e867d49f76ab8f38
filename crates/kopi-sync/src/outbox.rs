//! # Outbox Worker
//!
//! Drains the sync outbox to the remote store.
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  every poll_interval:                                               │
//! │    1. load pending rows under the attempt cap, oldest first         │
//! │    2. per row: upsert (or tombstone-delete) the remote document     │
//! │         success ──► mark row synced                                 │
//! │         failure ──► bump attempts, record the error, move on        │
//! │    3. WASTE rows additionally stamp remote_id/synced_at on the      │
//! │       waste record itself                                           │
//! │    4. purge synced rows older than cleanup_after_days               │
//! │                                                                     │
//! │  At-least-once: a crash between remote write and mark_synced        │
//! │  redelivers. Upserts are keyed by the entity's own UUID, so         │
//! │  redelivery converges instead of duplicating.                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows reaching the attempt cap are parked: they stay pending in the
//! table for inspection but stop consuming retries.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use kopi_core::{
    SyncOutboxEntry, ENTITY_AUDIT, ENTITY_PRODUCT, ENTITY_RECIPE, ENTITY_RECIPE_INGREDIENT,
    ENTITY_WASTE,
};
use kopi_db::Database;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::{
    RemoteStore, COLLECTION_AUDIT_TRAIL, COLLECTION_PRODUCTS, COLLECTION_RECIPES,
    COLLECTION_RECIPE_INGREDIENTS, COLLECTION_WASTE_LOGS,
};

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub synced: usize,
    pub failed: usize,
}

impl DrainReport {
    /// True when the pass touched nothing.
    pub fn is_empty(&self) -> bool {
        self.synced == 0 && self.failed == 0
    }
}

/// Background worker draining the outbox to the remote store.
pub struct OutboxProcessor {
    db: Database,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
}

impl OutboxProcessor {
    /// Creates a new OutboxProcessor.
    pub fn new(db: Database, remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        OutboxProcessor { db, remote, config }
    }

    /// Runs the worker until a shutdown signal arrives (or the sender is
    /// dropped).
    pub async fn run(self, mut shutdown: mpsc::Receiver<()>) {
        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            batch_size = self.config.batch_size,
            "Outbox worker started"
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.drain_pending().await {
                        Ok(report) if !report.is_empty() => {
                            info!(
                                synced = report.synced,
                                failed = report.failed,
                                "Outbox drain pass finished"
                            );
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(error = %err, "Outbox drain pass failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Outbox worker shutting down");
                    break;
                }
            }
        }
    }

    /// One drain pass: deliver up to `batch_size` rows, then purge old
    /// synced rows. Per-row failures are recorded on the row, never
    /// propagated; only a failure to read the queue itself errors.
    pub async fn drain_pending(&self) -> SyncResult<DrainReport> {
        let outbox = self.db.sync_outbox();
        let entries = outbox
            .get_retryable(self.config.batch_size, self.config.max_attempts)
            .await?;

        let mut report = DrainReport::default();

        for entry in &entries {
            match self.deliver(entry).await {
                Ok(()) => {
                    outbox.mark_synced(&entry.id).await?;
                    report.synced += 1;
                    debug!(
                        entity_type = %entry.entity_type,
                        entity_id = %entry.entity_id,
                        "Mirrored entity"
                    );
                }
                Err(err) => {
                    outbox.mark_failed(&entry.id, &err.to_string()).await?;
                    report.failed += 1;
                    warn!(
                        entity_type = %entry.entity_type,
                        entity_id = %entry.entity_id,
                        attempts = entry.attempts + 1,
                        error = %err,
                        "Failed to mirror entity"
                    );
                }
            }
        }

        outbox
            .cleanup_old_entries(self.config.cleanup_after_days)
            .await?;

        Ok(report)
    }

    async fn deliver(&self, entry: &SyncOutboxEntry) -> SyncResult<()> {
        let collection = collection_for(&entry.entity_type)?;
        let payload: Value = serde_json::from_str(&entry.payload)?;

        // Tombstone payloads remove the remote copy.
        if payload
            .get("deleted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            self.remote
                .delete_document(collection, &entry.entity_id)
                .await?;
            return Ok(());
        }

        let remote_id = self
            .remote
            .upsert_document(collection, &entry.entity_id, payload)
            .await?;

        // Waste records track their own mirror state for the register's
        // pending-sync badge.
        if entry.entity_type == ENTITY_WASTE {
            self.db
                .waste()
                .mark_synced(&entry.entity_id, &remote_id)
                .await?;
        }

        Ok(())
    }
}

fn collection_for(entity_type: &str) -> SyncResult<&'static str> {
    match entity_type {
        ENTITY_PRODUCT => Ok(COLLECTION_PRODUCTS),
        ENTITY_RECIPE => Ok(COLLECTION_RECIPES),
        ENTITY_RECIPE_INGREDIENT => Ok(COLLECTION_RECIPE_INGREDIENTS),
        ENTITY_WASTE => Ok(COLLECTION_WASTE_LOGS),
        ENTITY_AUDIT => Ok(COLLECTION_AUDIT_TRAIL),
        other => Err(SyncError::UnknownEntityType(other.to_string())),
    }
}
