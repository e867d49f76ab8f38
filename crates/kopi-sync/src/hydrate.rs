//! # Hydration
//!
//! Pull-down resync: replace local catalog state with the remote store's
//! view. Runs at terminal startup, before any local mutation, so the
//! conflict policy is simply last-writer-wins in the remote's favor.
//!
//! Ledgers (sales, waste, audit) are never hydrated: they are
//! append-only local history, mirrored outward only.
//!
//! Remote documents can predate the dual-tier inventory fields, so the
//! product parser tolerates missing fields: tiers default to zero and
//! `quantity` stays authoritative, exactly how legacy rows behave
//! locally. A document too malformed to parse is skipped and logged,
//! never fatal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use kopi_core::{Product, Recipe, RecipeIngredient};
use kopi_db::{Database, DbError};

use crate::error::SyncResult;
use crate::remote::{
    Document, RemoteStore, COLLECTION_PRODUCTS, COLLECTION_RECIPES, COLLECTION_RECIPE_INGREDIENTS,
};

/// What a hydration pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub products: usize,
    pub recipes: usize,
    pub skipped: usize,
}

/// Startup resync from the remote store.
pub struct Hydrator {
    db: Database,
    remote: Arc<dyn RemoteStore>,
}

impl Hydrator {
    /// Creates a new Hydrator.
    pub fn new(db: Database, remote: Arc<dyn RemoteStore>) -> Self {
        Hydrator { db, remote }
    }

    /// Pulls products and recipes down, overwriting local rows.
    pub async fn hydrate(&self) -> SyncResult<HydrationReport> {
        let mut report = HydrationReport::default();

        self.hydrate_products(&mut report).await?;
        self.hydrate_recipes(&mut report).await?;

        info!(
            products = report.products,
            recipes = report.recipes,
            skipped = report.skipped,
            "Hydration finished"
        );

        Ok(report)
    }

    async fn hydrate_products(&self, report: &mut HydrationReport) -> SyncResult<()> {
        let docs = self.remote.fetch_all(COLLECTION_PRODUCTS).await?;
        let products = self.db.products();

        for doc in docs {
            let product = match parse_product(&doc) {
                Ok(product) => product,
                Err(err) => {
                    warn!(id = %doc.id, error = %err, "Skipping malformed product document");
                    report.skipped += 1;
                    continue;
                }
            };

            if products.get_by_id(&product.id).await?.is_some() {
                products.update(&product).await?;
                products
                    .set_stock_levels(
                        &product.id,
                        product.inventory_bulk,
                        product.inventory_display,
                        product.quantity,
                    )
                    .await?;
            } else {
                products.insert(&product).await?;
            }
            report.products += 1;
        }

        Ok(())
    }

    async fn hydrate_recipes(&self, report: &mut HydrationReport) -> SyncResult<()> {
        let recipe_docs = self.remote.fetch_all(COLLECTION_RECIPES).await?;
        let ingredient_docs = self.remote.fetch_all(COLLECTION_RECIPE_INGREDIENTS).await?;
        let recipes = self.db.recipes();

        let mut lines_by_recipe: std::collections::HashMap<String, Vec<RecipeIngredient>> =
            std::collections::HashMap::new();
        for doc in ingredient_docs {
            match parse_ingredient(&doc) {
                Ok(line) => lines_by_recipe
                    .entry(line.recipe_id.clone())
                    .or_default()
                    .push(line),
                Err(err) => {
                    warn!(id = %doc.id, error = %err, "Skipping malformed ingredient document");
                    report.skipped += 1;
                }
            }
        }

        for doc in recipe_docs {
            let recipe = match parse_recipe(&doc) {
                Ok(recipe) => recipe,
                Err(err) => {
                    warn!(id = %doc.id, error = %err, "Skipping malformed recipe document");
                    report.skipped += 1;
                    continue;
                }
            };

            // Replace wholesale; ingredient lines cascade with the old row.
            match recipes.delete(&recipe.id).await {
                Ok(()) | Err(DbError::NotFound { .. }) => {}
                Err(err) => return Err(err.into()),
            }

            let lines = lines_by_recipe.remove(&recipe.id).unwrap_or_default();
            recipes.insert_recipe(&recipe, &lines).await?;
            report.recipes += 1;
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// Product document shape, tolerant of pre-dual-tier mirrors.
#[derive(Debug, Deserialize)]
struct ProductDoc {
    id: Option<String>,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    price_cents: i64,
    #[serde(default)]
    cost_per_unit_cents: i64,
    #[serde(default)]
    inventory_bulk: i64,
    #[serde(default)]
    inventory_display: i64,
    #[serde(default)]
    quantity: i64,
    #[serde(default)]
    image_ref: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    sync_version: i64,
}

fn parse_product(doc: &Document) -> serde_json::Result<Product> {
    let parsed: ProductDoc = serde_json::from_value(doc.data.clone())?;
    let now = Utc::now();

    // Documents that only carried tiers get their total derived;
    // documents that only carried a total keep it authoritative.
    let quantity = if parsed.quantity == 0 {
        parsed.inventory_bulk + parsed.inventory_display
    } else {
        parsed.quantity
    };

    Ok(Product {
        id: parsed.id.unwrap_or_else(|| doc.id.clone()),
        name: parsed.name,
        category: parsed.category,
        price_cents: parsed.price_cents,
        cost_per_unit_cents: parsed.cost_per_unit_cents,
        inventory_bulk: parsed.inventory_bulk,
        inventory_display: parsed.inventory_display,
        quantity,
        image_ref: parsed.image_ref,
        is_active: parsed.is_active,
        created_at: parsed.created_at.unwrap_or(now),
        updated_at: parsed.updated_at.unwrap_or(now),
        sync_version: parsed.sync_version,
    })
}

#[derive(Debug, Deserialize)]
struct RecipeDoc {
    id: Option<String>,
    product_id: String,
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    sync_version: i64,
}

fn parse_recipe(doc: &Document) -> serde_json::Result<Recipe> {
    let parsed: RecipeDoc = serde_json::from_value(doc.data.clone())?;
    let now = Utc::now();

    Ok(Recipe {
        id: parsed.id.unwrap_or_else(|| doc.id.clone()),
        product_id: parsed.product_id,
        product_name: parsed.product_name,
        created_at: parsed.created_at.unwrap_or(now),
        updated_at: parsed.updated_at.unwrap_or(now),
        sync_version: parsed.sync_version,
    })
}

#[derive(Debug, Deserialize)]
struct IngredientDoc {
    id: Option<String>,
    recipe_id: String,
    ingredient_product_id: String,
    #[serde(default)]
    ingredient_name: String,
    quantity_needed: f64,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

fn parse_ingredient(doc: &Document) -> serde_json::Result<RecipeIngredient> {
    let parsed: IngredientDoc = serde_json::from_value(doc.data.clone())?;

    Ok(RecipeIngredient {
        id: parsed.id.unwrap_or_else(|| doc.id.clone()),
        recipe_id: parsed.recipe_id,
        ingredient_product_id: parsed.ingredient_product_id,
        ingredient_name: parsed.ingredient_name,
        quantity_needed: parsed.quantity_needed,
        unit: parsed.unit,
        created_at: parsed.created_at.unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kopi_db::DbConfig;
    use serde_json::json;

    use crate::remote::InMemoryRemoteStore;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_hydrates_full_product_document() {
        let db = test_db().await;
        let remote = InMemoryRemoteStore::new();
        remote.seed(
            COLLECTION_PRODUCTS,
            "p-1",
            json!({
                "id": "p-1",
                "name": "Croissant",
                "category": "Pastries",
                "price_cents": 5500,
                "cost_per_unit_cents": 1500,
                "inventory_bulk": 20,
                "inventory_display": 5,
                "quantity": 25,
                "image_ref": null,
                "is_active": true,
                "created_at": "2026-08-01T08:00:00Z",
                "updated_at": "2026-08-01T08:00:00Z",
                "sync_version": 3
            }),
        );

        let report = Hydrator::new(db.clone(), remote).hydrate().await.unwrap();
        assert_eq!(report.products, 1);

        let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(p.name, "Croissant");
        assert_eq!(p.quantity, 25);
        assert!(p.tiers_consistent());
    }

    #[tokio::test]
    async fn test_legacy_document_keeps_quantity_authoritative() {
        let db = test_db().await;
        let remote = InMemoryRemoteStore::new();
        // Old mirror shape: only a total, no tiers.
        remote.seed(
            COLLECTION_PRODUCTS,
            "p-old",
            json!({ "name": "House Blend", "quantity": 42 }),
        );

        Hydrator::new(db.clone(), remote).hydrate().await.unwrap();

        let p = db.products().get_by_id("p-old").await.unwrap().unwrap();
        assert_eq!(p.quantity, 42);
        assert_eq!(p.inventory_bulk, 0);
        assert_eq!(p.inventory_display, 0);
        assert!(p.is_active);
    }

    #[tokio::test]
    async fn test_remote_overwrites_local() {
        let db = test_db().await;
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: "p-1".to_string(),
                name: "Old Name".to_string(),
                category: "Pastries".to_string(),
                price_cents: 100,
                cost_per_unit_cents: 0,
                inventory_bulk: 1,
                inventory_display: 1,
                quantity: 2,
                image_ref: None,
                is_active: true,
                created_at: now,
                updated_at: now,
                sync_version: 0,
            })
            .await
            .unwrap();

        let remote = InMemoryRemoteStore::new();
        remote.seed(
            COLLECTION_PRODUCTS,
            "p-1",
            json!({ "name": "New Name", "price_cents": 9000, "inventory_bulk": 7, "inventory_display": 3 }),
        );

        Hydrator::new(db.clone(), remote).hydrate().await.unwrap();

        let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(p.name, "New Name");
        assert_eq!(p.price_cents, 9000);
        assert_eq!(p.quantity, 10);
    }

    #[tokio::test]
    async fn test_malformed_document_is_skipped() {
        let db = test_db().await;
        let remote = InMemoryRemoteStore::new();
        remote.seed(COLLECTION_PRODUCTS, "bad", json!({ "price_cents": "not a number" }));
        remote.seed(COLLECTION_PRODUCTS, "good", json!({ "name": "Scone", "quantity": 5 }));

        let report = Hydrator::new(db.clone(), remote).hydrate().await.unwrap();
        assert_eq!(report.products, 1);
        assert_eq!(report.skipped, 1);
        assert!(db.products().get_by_id("good").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hydrates_recipes_with_lines() {
        let db = test_db().await;
        let remote = InMemoryRemoteStore::new();
        remote.seed(
            COLLECTION_RECIPES,
            "r-1",
            json!({ "product_id": "croissant", "product_name": "Croissant" }),
        );
        remote.seed(
            COLLECTION_RECIPE_INGREDIENTS,
            "ri-1",
            json!({
                "recipe_id": "r-1",
                "ingredient_product_id": "flour",
                "ingredient_name": "Flour",
                "quantity_needed": 50.0,
                "unit": "g"
            }),
        );

        let report = Hydrator::new(db.clone(), remote).hydrate().await.unwrap();
        assert_eq!(report.recipes, 1);

        let recipe = db
            .recipes()
            .get_by_product_id("croissant")
            .await
            .unwrap()
            .unwrap();
        let lines = db.recipes().get_ingredients(&recipe.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity_needed, 50.0);
    }

    #[tokio::test]
    async fn test_rehydration_replaces_recipe_wholesale() {
        let db = test_db().await;
        let remote = InMemoryRemoteStore::new();
        remote.seed(
            COLLECTION_RECIPES,
            "r-1",
            json!({ "product_id": "croissant", "product_name": "Croissant" }),
        );
        remote.seed(
            COLLECTION_RECIPE_INGREDIENTS,
            "ri-1",
            json!({ "recipe_id": "r-1", "ingredient_product_id": "flour", "quantity_needed": 50.0 }),
        );

        let hydrator = Hydrator::new(db.clone(), remote.clone());
        hydrator.hydrate().await.unwrap();

        // Remote recipe shrinks to zero lines; rehydration mirrors that.
        remote.delete_document(COLLECTION_RECIPE_INGREDIENTS, "ri-1").await.unwrap();
        hydrator.hydrate().await.unwrap();

        assert!(db.recipes().get_ingredients("r-1").await.unwrap().is_empty());
    }
}
