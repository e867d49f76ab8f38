//! # Product Repository
//!
//! Database operations for products, including the dual-tier stock
//! mutations the transfer/waste and recipe engines rely on.
//!
//! ## Tier Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Guarded delta update (single statement):                           │
//! │                                                                     │
//! │  UPDATE products SET                                                │
//! │      inventory_bulk    = inventory_bulk    + :bulk_delta,           │
//! │      inventory_display = inventory_display + :display_delta,        │
//! │      quantity          = <new bulk> + <new display>                 │
//! │  WHERE id = :id                                                     │
//! │    AND inventory_bulk    + :bulk_delta    >= 0                      │
//! │    AND inventory_display + :display_delta >= 0                      │
//! │                                                                     │
//! │  rows_affected == 0 means the guard failed: the caller reports      │
//! │  InsufficientStock without any partial mutation having happened.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kopi_core::Product;

const PRODUCT_COLUMNS: &str = "id, name, category, price_cents, cost_per_unit_cents, \
     inventory_bulk, inventory_display, quantity, image_ref, is_active, \
     created_at, updated_at, sync_version";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists active products in a category.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND category = ?1 ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_cents, cost_per_unit_cents,
                inventory_bulk, inventory_display, quantity, image_ref,
                is_active, created_at, updated_at, sync_version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_per_unit_cents)
        .bind(product.inventory_bulk)
        .bind(product.inventory_display)
        .bind(product.quantity)
        .bind(&product.image_ref)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.sync_version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's descriptive fields (not stock).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                price_cents = ?4,
                cost_per_unit_cents = ?5,
                image_ref = ?6,
                is_active = ?7,
                updated_at = ?8,
                sync_version = sync_version + 1
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_per_unit_cents)
        .bind(&product.image_ref)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a guarded delta to both inventory tiers in one statement.
    ///
    /// Returns `Ok(true)` when the update applied, `Ok(false)` when the
    /// non-negative guard rejected it (caller decides which tier ran
    /// short). `quantity` is recomputed as the sum of the new tiers, so
    /// the derived-total invariant holds after every call.
    pub async fn adjust_tiers(
        &self,
        id: &str,
        bulk_delta: i64,
        display_delta: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, bulk_delta, display_delta, "Adjusting inventory tiers");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                inventory_bulk = inventory_bulk + ?2,
                inventory_display = inventory_display + ?3,
                quantity = inventory_bulk + ?2 + inventory_display + ?3,
                updated_at = ?4,
                sync_version = sync_version + 1
            WHERE id = ?1
              AND inventory_bulk + ?2 >= 0
              AND inventory_display + ?3 >= 0
            "#,
        )
        .bind(id)
        .bind(bulk_delta)
        .bind(display_delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets absolute stock levels.
    ///
    /// Used by the recipe engine's clamped deductions and by hydration,
    /// where the new values are computed first (clamping at zero cannot be
    /// expressed as a plain delta). `quantity` is passed explicitly so
    /// legacy rows whose tiers were never populated keep their shape.
    pub async fn set_stock_levels(
        &self,
        id: &str,
        inventory_bulk: i64,
        inventory_display: i64,
        quantity: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                inventory_bulk = ?2,
                inventory_display = ?3,
                quantity = ?4,
                updated_at = ?5,
                sync_version = sync_version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(inventory_bulk)
        .bind(inventory_display)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product.
    ///
    /// Historical ledger rows keep their name snapshots, so the product
    /// row itself is only deactivated.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                is_active = 0,
                updated_at = ?2,
                sync_version = sync_version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new product id.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use kopi_core::types::CATEGORY_PASTRIES;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_product(id: &str, bulk: i64, display: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: CATEGORY_PASTRIES.to_string(),
            price_cents: 5000,
            cost_per_unit_cents: 1500,
            inventory_bulk: bulk,
            inventory_display: display,
            quantity: bulk + display,
            image_ref: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            sync_version: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&sample_product("p-1", 10, 5)).await.unwrap();

        let found = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(found.name, "Product p-1");
        assert_eq!(found.quantity, 15);
        assert!(found.tiers_consistent());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = test_db().await;
        assert!(db.products().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_adjust_tiers_applies_and_recomputes_quantity() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&sample_product("p-1", 10, 5)).await.unwrap();

        let applied = repo.adjust_tiers("p-1", -4, 4).await.unwrap();
        assert!(applied);

        let p = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(p.inventory_bulk, 6);
        assert_eq!(p.inventory_display, 9);
        assert_eq!(p.quantity, 15);
    }

    #[tokio::test]
    async fn test_adjust_tiers_guard_rejects_negative() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&sample_product("p-1", 3, 2)).await.unwrap();

        let applied = repo.adjust_tiers("p-1", -5, 5).await.unwrap();
        assert!(!applied);

        // No partial mutation
        let p = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(p.inventory_bulk, 3);
        assert_eq!(p.inventory_display, 2);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active_list() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&sample_product("p-1", 1, 1)).await.unwrap();
        repo.insert(&sample_product("p-2", 1, 1)).await.unwrap();

        repo.soft_delete("p-1").await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "p-2");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_bumps_sync_version() {
        let db = test_db().await;
        let repo = db.products();
        let mut p = sample_product("p-1", 1, 1);
        repo.insert(&p).await.unwrap();

        p.name = "Renamed".to_string();
        repo.update(&p).await.unwrap();

        let found = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(found.name, "Renamed");
        assert_eq!(found.sync_version, 1);
    }
}
