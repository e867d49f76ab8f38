//! # Order Orchestrator
//!
//! Turns a cart into a receipt: payment check, ingredient accounting,
//! ledger writes, audit trail.
//!
//! ## Completion Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  complete_order(cart, cash)                                         │
//! │                                                                     │
//! │  1. cash >= total?        ── no ──►  InsufficientPayment,           │
//! │                                      zero side effects              │
//! │  2. for each cart line:                                             │
//! │       a. recipe deduction (fail-soft, never blocks the sale)        │
//! │       b. no recipe? deduct the product's own display stock,         │
//! │          clamped at zero (also fail-soft)                           │
//! │       c. append SalesRecord with the shared order timestamp         │
//! │       d. append SaleTransaction audit entry                         │
//! │  3. Receipt { total, cash, change }                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The payment check is the only gate: once cash is accepted, lines are
//! processed independently and stock accounting problems on one line
//! never block the others or the receipt. There is no rollback after
//! step 1.

use chrono::Utc;
use tracing::{info, warn};

use kopi_core::{
    AuditAction, AuditStatus, Cart, CartLine, CoreError, Money, Receipt, SalesRecord,
    ValidationError,
};
use kopi_db::repository::sales::generate_sales_record_id;
use kopi_db::Database;

use crate::audit;
use crate::error::EngineResult;
use crate::recipe::RecipeEngine;
use crate::session::SessionHandle;

/// Completes orders at the register.
#[derive(Debug, Clone)]
pub struct OrderOrchestrator {
    db: Database,
    recipes: RecipeEngine,
    session: SessionHandle,
}

impl OrderOrchestrator {
    /// Creates a new OrderOrchestrator.
    pub fn new(db: Database, session: SessionHandle) -> Self {
        let recipes = RecipeEngine::new(db.clone());
        OrderOrchestrator {
            db,
            recipes,
            session,
        }
    }

    /// Completes the order in `cart` against `cash_received`.
    ///
    /// Fails with `InsufficientPayment` before any side effect when the
    /// cash tendered does not cover the total. All sales records of one
    /// order share a single completion timestamp, which is what groups
    /// them for reporting.
    pub async fn complete_order(&self, cart: &Cart, cash_received: Money) -> EngineResult<Receipt> {
        if cart.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "cart".to_string(),
            })
            .into());
        }

        let total = cart.total();
        if cash_received < total {
            return Err(CoreError::InsufficientPayment {
                total_cents: total.cents(),
                received_cents: cash_received.cents(),
            }
            .into());
        }

        let completed_at = Utc::now();
        let actor = self.session.actor();
        let sales = self.db.sales();

        for line in &cart.lines {
            let recipe_handled = self
                .recipes
                .deduct_ingredients(&line.product_id, line.quantity, completed_at)
                .await;
            if !recipe_handled {
                self.deduct_direct_stock(line).await;
            }

            let record = SalesRecord {
                id: generate_sales_record_id(),
                product_name: line.name.clone(),
                category: line.category.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                recorded_at: completed_at,
            };
            sales.append(&record).await?;

            audit::record(
                &self.db,
                &actor,
                AuditAction::SaleTransaction,
                format!(
                    "Sold {} x {} for {}",
                    line.quantity,
                    line.name,
                    line.line_total()
                ),
                AuditStatus::Success,
            )
            .await?;
        }

        let change = cash_received - total;
        info!(
            lines = cart.lines.len(),
            total = %total,
            change = %change,
            "Order completed"
        );

        Ok(Receipt {
            lines: cart.lines.clone(),
            total_cents: total.cents(),
            cash_received_cents: cash_received.cents(),
            change_cents: change.cents(),
            completed_at,
        })
    }

    /// Deducts a recipe-less product's own display stock, clamped at
    /// zero. Fail-soft for the same reason ingredient deduction is: the
    /// sale has already happened.
    async fn deduct_direct_stock(&self, line: &CartLine) {
        let products = self.db.products();

        let result = async {
            let Some(product) = products.get_by_id(&line.product_id).await? else {
                return Ok(());
            };

            let take = line.quantity.min(product.inventory_display);
            if take > 0 {
                products.adjust_tiers(&product.id, 0, -take).await?;
                crate::mirror::queue_product(&self.db, &product.id).await?;
            }

            EngineResult::Ok(())
        }
        .await;

        if let Err(err) = result {
            warn!(
                product_id = %line.product_id,
                error = %err,
                "Direct stock deduction failed; sale stands without it"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kopi_core::{Product, Recipe, RecipeIngredient, CATEGORY_INGREDIENTS, CATEGORY_PASTRIES};
    use kopi_db::repository::recipe::{generate_ingredient_id, generate_recipe_id};
    use kopi_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn orchestrator(db: &Database) -> OrderOrchestrator {
        OrderOrchestrator::new(db.clone(), SessionHandle::new())
    }

    fn product(id: &str, name: &str, price_cents: i64, bulk: i64, display: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: CATEGORY_PASTRIES.to_string(),
            price_cents,
            cost_per_unit_cents: 0,
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

    async fn seed_croissant_with_recipe(db: &Database) -> Product {
        let croissant = product("croissant", "Croissant", 5000, 0, 20);
        db.products().insert(&croissant).await.unwrap();

        let mut flour = product("flour", "Flour", 0, 400, 100);
        flour.category = CATEGORY_INGREDIENTS.to_string();
        db.products().insert(&flour).await.unwrap();

        let recipe_id = generate_recipe_id();
        let now = Utc::now();
        db.recipes()
            .insert_recipe(
                &Recipe {
                    id: recipe_id.clone(),
                    product_id: "croissant".to_string(),
                    product_name: "Croissant".to_string(),
                    created_at: now,
                    updated_at: now,
                    sync_version: 0,
                },
                &[RecipeIngredient {
                    id: generate_ingredient_id(),
                    recipe_id,
                    ingredient_product_id: "flour".to_string(),
                    ingredient_name: "Flour".to_string(),
                    quantity_needed: 50.0,
                    unit: "g".to_string(),
                    created_at: now,
                }],
            )
            .await
            .unwrap();

        croissant
    }

    #[tokio::test]
    async fn test_insufficient_payment_has_zero_side_effects() {
        let db = test_db().await;
        let croissant = seed_croissant_with_recipe(&db).await;

        let mut cart = Cart::new();
        cart.add_product(&croissant, 2).unwrap(); // total 10000

        let err = orchestrator(&db)
            .complete_order(&cart, Money::from_cents(9000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::Core(CoreError::InsufficientPayment {
                total_cents: 10000,
                received_cents: 9000,
            })
        ));

        // Nothing moved, nothing recorded.
        let flour = db.products().get_by_id("flour").await.unwrap().unwrap();
        assert_eq!(flour.quantity, 500);
        assert_eq!(
            db.sales()
                .sum_quantity(
                    Utc::now() - chrono::Duration::minutes(1),
                    Utc::now() + chrono::Duration::minutes(1),
                )
                .await
                .unwrap(),
            0
        );
        assert_eq!(db.audit().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_payment_gives_zero_change() {
        let db = test_db().await;
        let croissant = seed_croissant_with_recipe(&db).await;

        let mut cart = Cart::new();
        cart.add_product(&croissant, 1).unwrap();

        let receipt = orchestrator(&db)
            .complete_order(&cart, Money::from_cents(5000))
            .await
            .unwrap();
        assert_eq!(receipt.change_cents, 0);
    }

    #[tokio::test]
    async fn test_completed_order_writes_everything() {
        let db = test_db().await;
        let croissant = seed_croissant_with_recipe(&db).await;

        let mut cart = Cart::new();
        cart.add_product(&croissant, 2).unwrap();

        let receipt = orchestrator(&db)
            .complete_order(&cart, Money::from_cents(10050))
            .await
            .unwrap();
        assert_eq!(receipt.total_cents, 10000);
        assert_eq!(receipt.change_cents, 50);

        // Ingredient consumed: 2 x 50 g flour.
        let flour = db.products().get_by_id("flour").await.unwrap().unwrap();
        assert_eq!(flour.quantity, 400);

        // One revenue line + one synthetic flour line, same timestamp.
        let records = db
            .sales()
            .list_range(
                receipt.completed_at - chrono::Duration::seconds(1),
                receipt.completed_at + chrono::Duration::seconds(1),
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.recorded_at == receipt.completed_at));

        let revenue_line = records.iter().find(|r| !r.is_synthetic()).unwrap();
        assert_eq!(revenue_line.product_name, "Croissant");
        assert_eq!(revenue_line.quantity, 2);

        // Audit trail carries the sale.
        let entries = db.audit().list_recent(10).await.unwrap();
        assert!(entries
            .iter()
            .any(|e| e.action == AuditAction::SaleTransaction));
    }

    #[tokio::test]
    async fn test_recipe_less_product_deducts_own_display_stock() {
        let db = test_db().await;
        let tea = product("tea", "Tea", 3000, 10, 6);
        db.products().insert(&tea).await.unwrap();

        let mut cart = Cart::new();
        cart.add_product(&tea, 4).unwrap();

        orchestrator(&db)
            .complete_order(&cart, Money::from_cents(12000))
            .await
            .unwrap();

        let stored = db.products().get_by_id("tea").await.unwrap().unwrap();
        assert_eq!(stored.inventory_display, 2);
        assert_eq!(stored.inventory_bulk, 10);
    }

    #[tokio::test]
    async fn test_recipe_less_deduction_clamps_and_never_blocks() {
        let db = test_db().await;
        let tea = product("tea", "Tea", 3000, 0, 1);
        db.products().insert(&tea).await.unwrap();

        let mut cart = Cart::new();
        cart.add_product(&tea, 5).unwrap();

        // Overselling the shelf still completes the sale.
        let receipt = orchestrator(&db)
            .complete_order(&cart, Money::from_cents(15000))
            .await
            .unwrap();
        assert_eq!(receipt.total_cents, 15000);

        let stored = db.products().get_by_id("tea").await.unwrap().unwrap();
        assert_eq!(stored.inventory_display, 0);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = test_db().await;
        let err = orchestrator(&db)
            .complete_order(&Cart::new(), Money::from_cents(1000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_product_line_still_sells_by_snapshot() {
        let db = test_db().await;
        let cake = product("cake", "Cake", 8000, 0, 3);
        db.products().insert(&cake).await.unwrap();

        let mut cart = Cart::new();
        cart.add_product(&cake, 1).unwrap();

        // Product removed between adding to cart and paying.
        db.products().soft_delete("cake").await.unwrap();

        let receipt = orchestrator(&db)
            .complete_order(&cart, Money::from_cents(8000))
            .await
            .unwrap();
        assert_eq!(receipt.total_cents, 8000);
    }
}
