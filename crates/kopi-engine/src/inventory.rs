//! # Inventory Engine
//!
//! Moving stock between the two tiers, and writing off shrinkage.
//!
//! ## The Two Tiers
//! ```text
//! ┌──────────────────┐   transfer_to_display   ┌──────────────────┐
//! │  inventory_bulk  │ ──────────────────────► │inventory_display │
//! │  (back room)     │                         │ (front of house) │
//! └──────────────────┘                         └────────┬─────────┘
//!                                                       │ mark_waste
//!                                                       ▼
//!                                              waste_records ledger
//! ```
//!
//! Both operations ride the guarded single-statement delta update in the
//! product repository: either the whole movement applies or none of it
//! does, and the derived total stays equal to bulk + display throughout.
//! Transfers conserve that total; waste shrinks it.

use chrono::Utc;
use tracing::info;

use kopi_core::validation::{validate_quantity, validate_waste_reason};
use kopi_core::{AuditAction, AuditStatus, CoreError, WasteRecord, ENTITY_WASTE};
use kopi_db::repository::waste::generate_waste_record_id;
use kopi_db::Database;

use crate::audit;
use crate::error::{EngineError, EngineResult};
use crate::mirror;
use crate::session::SessionHandle;

/// Tier transfers and waste write-offs.
#[derive(Debug, Clone)]
pub struct InventoryEngine {
    db: Database,
    session: SessionHandle,
}

impl InventoryEngine {
    /// Creates a new InventoryEngine.
    pub fn new(db: Database, session: SessionHandle) -> Self {
        InventoryEngine { db, session }
    }

    /// Moves `quantity` units from the bulk tier to the display tier.
    ///
    /// All-or-nothing: if the bulk tier holds less than `quantity`,
    /// nothing moves and the caller gets `InsufficientStock`. The total
    /// quantity is conserved.
    pub async fn transfer_to_display(&self, product_id: &str, quantity: i64) -> EngineResult<()> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let products = self.db.products();
        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::product_not_found(product_id))?;

        let applied = products
            .adjust_tiers(product_id, -quantity, quantity)
            .await?;
        if !applied {
            return Err(CoreError::InsufficientStock {
                name: product.name,
                tier: "bulk",
                available: product.inventory_bulk,
                requested: quantity,
            }
            .into());
        }

        info!(
            product = %product.name,
            quantity,
            "Transferred stock to display"
        );

        audit::record(
            &self.db,
            &self.session.actor(),
            AuditAction::InventoryTransfer,
            format!("Moved {quantity} x {} to display", product.name),
            AuditStatus::Success,
        )
        .await?;
        mirror::queue_product(&self.db, product_id).await?;

        Ok(())
    }

    /// Writes off `quantity` units of display stock as waste.
    ///
    /// Only the display tier shrinks; bulk stock is untouched. The waste
    /// record freezes the per-unit cost at write-off time and stays
    /// sync-pending until the outbox worker mirrors it.
    pub async fn mark_waste(
        &self,
        product_id: &str,
        quantity: i64,
        reason: &str,
    ) -> EngineResult<WasteRecord> {
        validate_quantity(quantity).map_err(CoreError::from)?;
        validate_waste_reason(reason).map_err(CoreError::from)?;

        let products = self.db.products();
        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::product_not_found(product_id))?;

        let applied = products.adjust_tiers(product_id, 0, -quantity).await?;
        if !applied {
            return Err(CoreError::InsufficientStock {
                name: product.name,
                tier: "display",
                available: product.inventory_display,
                requested: quantity,
            }
            .into());
        }

        let record = WasteRecord {
            id: generate_waste_record_id(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            category: product.category.clone(),
            quantity,
            reason: reason.to_string(),
            cost_cents_snapshot: product.cost_per_unit_cents,
            recorded_by: self.session.actor(),
            recorded_at: Utc::now(),
            remote_id: None,
            synced_at: None,
        };
        self.db.waste().append(&record).await?;

        info!(
            product = %product.name,
            quantity,
            reason = %reason,
            "Marked stock as waste"
        );

        audit::record(
            &self.db,
            &self.session.actor(),
            AuditAction::WasteMarked,
            format!("Wasted {quantity} x {} ({reason})", product.name),
            AuditStatus::Success,
        )
        .await?;
        mirror::queue_entity(&self.db, ENTITY_WASTE, &record.id, &record).await?;
        mirror::queue_product(&self.db, product_id).await?;

        Ok(record)
    }
}
