//! Outbox enqueue helpers shared by the engines.
//!
//! Every local mutation queues the full entity JSON in the same flow.
//! The background worker owns delivery; nothing here touches the network.

use kopi_core::ENTITY_PRODUCT;
use kopi_db::Database;

use crate::error::EngineResult;

/// Queues the current state of a product for remote mirroring.
///
/// Reads the row back so the payload reflects the post-mutation state,
/// including the bumped `sync_version`. A product that vanished between
/// the mutation and the read is skipped; its delete was queued elsewhere.
pub(crate) async fn queue_product(db: &Database, product_id: &str) -> EngineResult<()> {
    if let Some(product) = db.products().get_by_id(product_id).await? {
        let payload = serde_json::to_string(&product)?;
        db.sync_outbox()
            .queue_for_sync(ENTITY_PRODUCT, product_id, &payload)
            .await?;
    }

    Ok(())
}

/// Queues an already-serialized entity for remote mirroring.
pub(crate) async fn queue_entity<T: serde::Serialize>(
    db: &Database,
    entity_type: &str,
    entity_id: &str,
    entity: &T,
) -> EngineResult<()> {
    let payload = serde_json::to_string(entity)?;
    db.sync_outbox()
        .queue_for_sync(entity_type, entity_id, &payload)
        .await?;

    Ok(())
}
