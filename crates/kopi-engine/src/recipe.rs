//! # Recipe Engine
//!
//! Recipe-driven inventory reconciliation: how many servings can the
//! kitchen still make, and what does selling a serving consume.
//!
//! ## Bottleneck Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  max_servings(product) = min over ingredients of                    │
//! │      floor(available_quantity / quantity_needed)                    │
//! │                                                                     │
//! │  Zero when:                                                         │
//! │    - the product has no recipe                                      │
//! │    - the recipe has no ingredient lines                             │
//! │    - an ingredient product cannot be resolved                       │
//! │    - an ingredient line needs 0 per serving (treated as blocking:   │
//! │      a zero need is a data entry error, not a free ingredient)      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deduction Is Fail-Soft
//! Ingredient deduction runs inside order completion, after payment has
//! been accepted. A deduction failure must never take the sale down with
//! it: the public entry point logs the failure and returns, leaving the
//! ledgers to tell the story. Stock clamps at zero rather than going
//! negative when the recipe claims more than the shelf holds.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use kopi_core::{Product, RecipeIngredient, SalesRecord};
use kopi_db::repository::sales::generate_sales_record_id;
use kopi_db::Database;

use crate::error::EngineResult;
use crate::mirror;

/// Computes servable quantities and consumes ingredients for sales.
#[derive(Debug, Clone)]
pub struct RecipeEngine {
    db: Database,
}

impl RecipeEngine {
    /// Creates a new RecipeEngine.
    pub fn new(db: Database) -> Self {
        RecipeEngine { db }
    }

    /// How many servings of `product_id` the current ingredient stock
    /// supports.
    ///
    /// Read-only: calling this never changes any quantity, so the
    /// register can poll it freely while the cart is being built.
    pub async fn max_servings(&self, product_id: &str) -> EngineResult<i64> {
        let recipes = self.db.recipes();

        let Some(recipe) = recipes.get_by_product_id(product_id).await? else {
            return Ok(0);
        };

        let ingredients = recipes.get_ingredients(&recipe.id).await?;
        if ingredients.is_empty() {
            return Ok(0);
        }

        let products = self.db.products();
        let mut servings = i64::MAX;

        for line in &ingredients {
            let supported = match products.get_by_id(&line.ingredient_product_id).await? {
                Some(ingredient) if line.quantity_needed > 0.0 => {
                    (ingredient.available_quantity() as f64 / line.quantity_needed).floor() as i64
                }
                // Unresolvable ingredient or zero need: block the product.
                _ => 0,
            };

            servings = servings.min(supported);
            if servings == 0 {
                break;
            }
        }

        Ok(servings)
    }

    /// Consumes the ingredients for `servings` servings of `product_id`.
    ///
    /// No-op when the product has no recipe. Failures are logged and
    /// swallowed: the caller's sale has already happened. Returns whether
    /// a recipe accounted for the product, so the order flow knows not to
    /// also deduct the product's own stock.
    pub async fn deduct_ingredients(
        &self,
        product_id: &str,
        servings: i64,
        order_time: DateTime<Utc>,
    ) -> bool {
        match self.try_deduct(product_id, servings, order_time).await {
            Ok(recipe_found) => recipe_found,
            Err(err) => {
                warn!(
                    product_id = %product_id,
                    servings,
                    error = %err,
                    "Ingredient deduction failed; sale stands without it"
                );
                // Conservative: assume the recipe existed so the caller
                // does not double-deduct the product's own stock.
                true
            }
        }
    }

    async fn try_deduct(
        &self,
        product_id: &str,
        servings: i64,
        order_time: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let recipes = self.db.recipes();

        let Some(recipe) = recipes.get_by_product_id(product_id).await? else {
            return Ok(false);
        };

        let ingredients = recipes.get_ingredients(&recipe.id).await?;
        let products = self.db.products();
        let sales = self.db.sales();

        for line in &ingredients {
            let Some(ingredient) = products.get_by_id(&line.ingredient_product_id).await? else {
                warn!(
                    recipe_id = %recipe.id,
                    ingredient_product_id = %line.ingredient_product_id,
                    "Recipe references a missing ingredient; skipping its deduction"
                );
                continue;
            };

            // Fractional needs truncate toward zero per order, matching
            // the whole-unit grain of the stock counters.
            let amount = (line.quantity_needed * servings as f64).trunc() as i64;

            if amount > 0 {
                let (bulk, display, quantity) = clamped_levels(&ingredient, amount);
                products
                    .set_stock_levels(&ingredient.id, bulk, display, quantity)
                    .await?;
                mirror::queue_product(&self.db, &ingredient.id).await?;
            }

            // One synthetic zero-price row per ingredient line keeps
            // consumption visible in quantity reports without touching
            // revenue.
            let record = SalesRecord {
                id: generate_sales_record_id(),
                product_name: ingredient.name.clone(),
                category: ingredient.category.clone(),
                quantity: amount,
                unit_price_cents: 0,
                recorded_at: order_time,
            };
            sales.append(&record).await?;

            debug!(
                ingredient = %ingredient.name,
                amount,
                "Deducted ingredient for recipe"
            );
        }

        Ok(true)
    }
}

/// New stock levels after deducting `amount`, clamped at zero.
///
/// Display-tier stock goes first (the shelf empties before the back
/// room), then bulk. Legacy rows whose tiers were never populated keep
/// tiers at zero and clamp `quantity` directly.
fn clamped_levels(product: &Product, amount: i64) -> (i64, i64, i64) {
    let quantity = (product.quantity - amount).max(0);

    let taken = product.quantity.min(amount);
    let from_display = taken.min(product.inventory_display);
    let from_bulk = (taken - from_display).min(product.inventory_bulk);

    (
        product.inventory_bulk - from_bulk,
        product.inventory_display - from_display,
        quantity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kopi_core::{Recipe, CATEGORY_INGREDIENTS, CATEGORY_PASTRIES};
    use kopi_db::repository::recipe::{generate_ingredient_id, generate_recipe_id};
    use kopi_db::DbConfig;

    async fn test_db() -> Database {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("kopi_engine=debug")
            .with_test_writer()
            .try_init();
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(id: &str, name: &str, category: &str, bulk: i64, display: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price_cents: 0,
            cost_per_unit_cents: 10,
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

    fn ingredient_line(recipe_id: &str, product_id: &str, name: &str, need: f64) -> RecipeIngredient {
        RecipeIngredient {
            id: generate_ingredient_id(),
            recipe_id: recipe_id.to_string(),
            ingredient_product_id: product_id.to_string(),
            ingredient_name: name.to_string(),
            quantity_needed: need,
            unit: "g".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Croissant needs 50 g flour and 20 g sugar per serving; stocks are
    /// 500 g and 100 g.
    async fn croissant_fixture(db: &Database) -> String {
        let products = db.products();
        products
            .insert(&product("croissant", "Croissant", CATEGORY_PASTRIES, 0, 20))
            .await
            .unwrap();
        products
            .insert(&product("flour", "Flour", CATEGORY_INGREDIENTS, 400, 100))
            .await
            .unwrap();
        products
            .insert(&product("sugar", "Sugar", CATEGORY_INGREDIENTS, 0, 100))
            .await
            .unwrap();

        let recipe_id = generate_recipe_id();
        let now = Utc::now();
        let recipe = Recipe {
            id: recipe_id.clone(),
            product_id: "croissant".to_string(),
            product_name: "Croissant".to_string(),
            created_at: now,
            updated_at: now,
            sync_version: 0,
        };
        let lines = vec![
            ingredient_line(&recipe_id, "flour", "Flour", 50.0),
            ingredient_line(&recipe_id, "sugar", "Sugar", 20.0),
        ];
        db.recipes().insert_recipe(&recipe, &lines).await.unwrap();

        recipe_id
    }

    #[tokio::test]
    async fn test_max_servings_takes_bottleneck() {
        let db = test_db().await;
        croissant_fixture(&db).await;
        let engine = RecipeEngine::new(db);

        // min(floor(500 / 50), floor(100 / 20)) = min(10, 5)
        assert_eq!(engine.max_servings("croissant").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_max_servings_is_read_only() {
        let db = test_db().await;
        croissant_fixture(&db).await;
        let engine = RecipeEngine::new(db.clone());

        let first = engine.max_servings("croissant").await.unwrap();
        let second = engine.max_servings("croissant").await.unwrap();
        assert_eq!(first, second);

        let flour = db.products().get_by_id("flour").await.unwrap().unwrap();
        assert_eq!(flour.quantity, 500);
    }

    #[tokio::test]
    async fn test_max_servings_without_recipe_is_zero() {
        let db = test_db().await;
        db.products()
            .insert(&product("tea", "Tea", CATEGORY_PASTRIES, 0, 10))
            .await
            .unwrap();
        let engine = RecipeEngine::new(db);

        assert_eq!(engine.max_servings("tea").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_max_servings_blocks_on_missing_ingredient() {
        let db = test_db().await;
        croissant_fixture(&db).await;
        db.recipes()
            .insert_recipe(
                &Recipe {
                    id: "r-ghost".to_string(),
                    product_id: "croissant2".to_string(),
                    product_name: "Croissant 2".to_string(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                    sync_version: 0,
                },
                &[ingredient_line("r-ghost", "nonexistent", "Ghost", 1.0)],
            )
            .await
            .unwrap();
        let engine = RecipeEngine::new(db);

        assert_eq!(engine.max_servings("croissant2").await.unwrap(), 0);
        // The well-formed fixture recipe still resolves.
        assert_eq!(engine.max_servings("croissant").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_max_servings_blocks_on_zero_need() {
        let db = test_db().await;
        db.products()
            .insert(&product("water", "Water", CATEGORY_INGREDIENTS, 0, 1000))
            .await
            .unwrap();
        db.products()
            .insert(&product("americano", "Americano", CATEGORY_PASTRIES, 0, 0))
            .await
            .unwrap();
        db.recipes()
            .insert_recipe(
                &Recipe {
                    id: "r-1".to_string(),
                    product_id: "americano".to_string(),
                    product_name: "Americano".to_string(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                    sync_version: 0,
                },
                &[ingredient_line("r-1", "water", "Water", 0.0)],
            )
            .await
            .unwrap();
        let engine = RecipeEngine::new(db);

        assert_eq!(engine.max_servings("americano").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deduct_consumes_per_serving_amounts() {
        let db = test_db().await;
        croissant_fixture(&db).await;
        let engine = RecipeEngine::new(db.clone());

        let handled = engine
            .deduct_ingredients("croissant", 3, Utc::now())
            .await;
        assert!(handled);

        let flour = db.products().get_by_id("flour").await.unwrap().unwrap();
        let sugar = db.products().get_by_id("sugar").await.unwrap().unwrap();
        assert_eq!(flour.quantity, 350); // 500 - 50*3
        assert_eq!(sugar.quantity, 40); // 100 - 20*3

        // Exactly one synthetic record per ingredient line.
        let records = db
            .sales()
            .list_range(
                Utc::now() - chrono::Duration::minutes(1),
                Utc::now() + chrono::Duration::minutes(1),
            )
            .await
            .unwrap();
        let synthetic: Vec<_> = records.iter().filter(|r| r.is_synthetic()).collect();
        assert_eq!(synthetic.len(), 2);
        assert!(synthetic.iter().all(|r| r.unit_price_cents == 0));

        let flour_row = synthetic
            .iter()
            .find(|r| r.product_name == "Flour")
            .unwrap();
        assert_eq!(flour_row.quantity, 150);
    }

    #[tokio::test]
    async fn test_deduct_drains_display_before_bulk() {
        let db = test_db().await;
        croissant_fixture(&db).await;
        let engine = RecipeEngine::new(db.clone());

        // Flour: 400 bulk / 100 display. 3 servings need 150.
        engine.deduct_ingredients("croissant", 3, Utc::now()).await;

        let flour = db.products().get_by_id("flour").await.unwrap().unwrap();
        assert_eq!(flour.inventory_display, 0);
        assert_eq!(flour.inventory_bulk, 350);
        assert!(flour.tiers_consistent());
    }

    #[tokio::test]
    async fn test_deduct_clamps_at_zero() {
        let db = test_db().await;
        croissant_fixture(&db).await;
        let engine = RecipeEngine::new(db.clone());

        // 20 servings want 1000 g flour; only 500 exist.
        engine.deduct_ingredients("croissant", 20, Utc::now()).await;

        let flour = db.products().get_by_id("flour").await.unwrap().unwrap();
        assert_eq!(flour.quantity, 0);
        assert_eq!(flour.inventory_bulk, 0);
        assert_eq!(flour.inventory_display, 0);
    }

    #[tokio::test]
    async fn test_deduct_without_recipe_is_noop() {
        let db = test_db().await;
        db.products()
            .insert(&product("tea", "Tea", CATEGORY_PASTRIES, 0, 10))
            .await
            .unwrap();
        let engine = RecipeEngine::new(db.clone());

        let handled = engine.deduct_ingredients("tea", 2, Utc::now()).await;
        assert!(!handled);

        let tea = db.products().get_by_id("tea").await.unwrap().unwrap();
        assert_eq!(tea.quantity, 10);
        assert_eq!(db.sync_outbox().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deduct_truncates_fractional_amounts() {
        let db = test_db().await;
        db.products()
            .insert(&product("milk", "Milk", CATEGORY_INGREDIENTS, 0, 100))
            .await
            .unwrap();
        db.products()
            .insert(&product("latte", "Latte", CATEGORY_PASTRIES, 0, 0))
            .await
            .unwrap();
        db.recipes()
            .insert_recipe(
                &Recipe {
                    id: "r-latte".to_string(),
                    product_id: "latte".to_string(),
                    product_name: "Latte".to_string(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                    sync_version: 0,
                },
                &[ingredient_line("r-latte", "milk", "Milk", 2.5)],
            )
            .await
            .unwrap();
        let engine = RecipeEngine::new(db.clone());

        // 3 servings × 2.5 = 7.5, truncated to 7.
        engine.deduct_ingredients("latte", 3, Utc::now()).await;

        let milk = db.products().get_by_id("milk").await.unwrap().unwrap();
        assert_eq!(milk.quantity, 93);
    }

    #[tokio::test]
    async fn test_deduct_queues_product_mirrors() {
        let db = test_db().await;
        croissant_fixture(&db).await;
        let engine = RecipeEngine::new(db.clone());

        engine.deduct_ingredients("croissant", 1, Utc::now()).await;

        // One outbox row per touched ingredient.
        assert_eq!(db.sync_outbox().count_pending().await.unwrap(), 2);
    }

    #[test]
    fn test_clamped_levels_legacy_row() {
        let mut legacy = product("p", "P", CATEGORY_INGREDIENTS, 0, 0);
        legacy.quantity = 42;

        let (bulk, display, quantity) = clamped_levels(&legacy, 10);
        assert_eq!((bulk, display, quantity), (0, 0, 32));
    }
}
