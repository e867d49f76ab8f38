//! # Domain Types
//!
//! Core domain types for the café POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌────────────────┐   ┌──────────────────┐     │
//! │  │   Product     │   │    Recipe      │   │ RecipeIngredient │     │
//! │  │  ───────────  │   │  ────────────  │   │  ──────────────  │     │
//! │  │  id (UUID)    │◄──│  product_id    │──►│  recipe_id (FK)  │     │
//! │  │  bulk/display │   │  product_name  │   │  quantity_needed │     │
//! │  │  price_cents  │   └────────────────┘   │  unit            │     │
//! │  └───────────────┘                        └──────────────────┘     │
//! │                                                                     │
//! │  ┌───────────────┐   ┌────────────────┐   ┌──────────────────┐     │
//! │  │  SalesRecord  │   │  WasteRecord   │   │   AuditEntry     │     │
//! │  │  append-only  │   │  append-only   │   │   append-only    │     │
//! │  │  name snapshot│   │  cost snapshot │   │   actor + action │     │
//! │  └───────────────┘   └────────────────┘   └──────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity carries a UUID v4 string id, generated locally and reused
//! as the durable id in the remote document store (offline-safe, no
//! coordination needed between terminals).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Categories
// =============================================================================

/// Categories are free-form strings in the data model; these are the three
/// the café ships with. Ingredient products never appear on the register
/// screen but do appear in synthetic sales records.
pub const CATEGORY_PASTRIES: &str = "Pastries";
pub const CATEGORY_BEVERAGES: &str = "Beverages";
pub const CATEGORY_INGREDIENTS: &str = "Ingredients";

// =============================================================================
// Product
// =============================================================================

/// A product: either a finished good sold at the register or an ingredient
/// consumed by recipes.
///
/// ## Dual-Tier Inventory
/// ```text
/// inventory_bulk     back-room stock, replenished externally
/// inventory_display  front-of-house stock, deducted by sales and waste
/// quantity           bulk + display, the total the recipe engine consults
/// ```
/// Legacy rows hydrated from the remote store may carry only `quantity`;
/// `quantity` is authoritative wherever the tiers are not in use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4), shared with the remote store.
    pub id: String,

    /// Display name shown on the register and receipts.
    pub name: String,

    /// Category string ("Pastries", "Beverages", "Ingredients", ...).
    pub category: String,

    /// Unit price in cents. Zero for pure ingredients.
    pub price_cents: i64,

    /// Cost per unit in cents (waste valuation, margin reports).
    pub cost_per_unit_cents: i64,

    /// Back-room tier (inventory A).
    pub inventory_bulk: i64,

    /// Front-of-house tier (inventory B).
    pub inventory_display: i64,

    /// Total stock; equals bulk + display whenever both tiers are in use.
    pub quantity: i64,

    /// Reference to a product image in external storage.
    pub image_ref: Option<String>,

    /// Soft-delete flag: historical ledgers keep their name snapshots.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Incremented on every mutation; used by sync to detect stale mirrors.
    pub sync_version: i64,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the per-unit cost as Money.
    #[inline]
    pub fn cost_per_unit(&self) -> Money {
        Money::from_cents(self.cost_per_unit_cents)
    }

    /// Total stock available to the recipe engine.
    ///
    /// `quantity` is the authoritative field: legacy rows may have never
    /// had their tiers populated.
    #[inline]
    pub fn available_quantity(&self) -> i64 {
        self.quantity
    }

    /// Whether the tier fields are consistent with the derived total.
    pub fn tiers_consistent(&self) -> bool {
        self.quantity == self.inventory_bulk + self.inventory_display
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// Bill-of-materials header linking one finished product to its
/// ingredient lines.
///
/// One recipe per finished product. Lookups take the first match for a
/// product id; uniqueness is an application assumption, not a database
/// constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Recipe {
    pub id: String,

    /// Durable id of the finished product this recipe produces.
    pub product_id: String,

    /// Denormalized product name (report display without a join).
    pub product_name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
}

/// One ingredient line of a recipe: "this serving needs 50 g of flour".
///
/// Lines are exclusively owned by their recipe and cascade-deleted with
/// it. The ingredient product is referenced, never owned: the same flour
/// appears in many recipes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecipeIngredient {
    pub id: String,

    /// Owning recipe (cascade delete).
    pub recipe_id: String,

    /// Durable id of the ingredient product.
    pub ingredient_product_id: String,

    /// Denormalized ingredient name.
    pub ingredient_name: String,

    /// Quantity consumed per serving, in `unit`.
    pub quantity_needed: f64,

    /// Measurement unit ("g", "ml", "pcs").
    pub unit: String,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sales Ledger
// =============================================================================

/// Append-only sale line.
///
/// Carries a name snapshot instead of a product foreign key; reports
/// resolve by name at read time. Ingredient deductions appear as synthetic
/// rows with `unit_price_cents == 0` so consumption is visible in quantity
/// reports without double-charging the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesRecord {
    pub id: String,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price_cents: i64,

    /// Order completion time. All lines of one order share this value,
    /// which is what groups them into an order for reporting.
    pub recorded_at: DateTime<Utc>,
}

impl SalesRecord {
    /// Revenue contributed by this line (zero for synthetic rows).
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.unit_price_cents * self.quantity)
    }

    /// Synthetic ingredient-deduction rows carry a zero price.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.unit_price_cents == 0
    }
}

// =============================================================================
// Waste Ledger
// =============================================================================

/// Append-only shrinkage record.
///
/// `cost_cents_snapshot` freezes the per-unit cost at record time so
/// valuation reports survive later product edits. `remote_id`/`synced_at`
/// stay NULL until the outbox worker mirrors the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WasteRecord {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub reason: String,
    pub cost_cents_snapshot: i64,

    /// Username of the cashier who recorded the waste.
    pub recorded_by: String,

    pub recorded_at: DateTime<Utc>,

    /// Document id assigned by the remote store once mirrored.
    pub remote_id: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl WasteRecord {
    /// Shrinkage value of this record (quantity × frozen unit cost).
    #[inline]
    pub fn waste_cost(&self) -> Money {
        Money::from_cents(self.cost_cents_snapshot * self.quantity)
    }

    /// Whether the record still awaits its remote mirror.
    #[inline]
    pub fn is_pending_sync(&self) -> bool {
        self.synced_at.is_none()
    }
}

// =============================================================================
// Audit Trail
// =============================================================================

/// What happened, for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Logout,
    FailedLogin,
    SaleTransaction,
    ProductAdd,
    ProductEdit,
    ProductDelete,
    RecipeAdd,
    RecipeDelete,
    InventoryTransfer,
    WasteMarked,
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum AuditStatus {
    Success,
    Failed,
}

/// Append-only audit entry, written as a side effect of every
/// state-changing operation. Never mutated; an administrative bulk clear
/// is the only delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditEntry {
    pub id: String,

    /// Username of the acting cashier, or "system".
    pub actor: String,

    pub action: AuditAction,
    pub description: String,
    pub status: AuditStatus,

    /// Whether the terminal had connectivity when the entry was written.
    pub online: bool,

    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Users
// =============================================================================

/// A cashier account. The password is stored as an argon2 hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,

    /// argon2id PHC string. Never serialized to the remote store.
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sync Outbox
// =============================================================================

/// Entity type tags for outbox rows.
pub const ENTITY_PRODUCT: &str = "PRODUCT";
pub const ENTITY_RECIPE: &str = "RECIPE";
pub const ENTITY_RECIPE_INGREDIENT: &str = "RECIPE_INGREDIENT";
pub const ENTITY_WASTE: &str = "WASTE";
pub const ENTITY_AUDIT: &str = "AUDIT";

/// An entry in the sync outbox queue.
///
/// Local mutations enqueue a row here in the same flow that performs the
/// write; the background worker drains pending rows to the remote store.
/// Local success never depends on the mirror succeeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SyncOutboxEntry {
    pub id: String,

    /// One of the `ENTITY_*` tags.
    pub entity_type: String,

    /// Durable id of the mirrored entity.
    pub entity_id: String,

    /// Full entity JSON.
    pub payload: String,

    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub attempted_at: Option<DateTime<Utc>>,
    pub synced_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(bulk: i64, display: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Espresso".to_string(),
            category: CATEGORY_BEVERAGES.to_string(),
            price_cents: 9000,
            cost_per_unit_cents: 2500,
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

    #[test]
    fn test_available_quantity_is_total() {
        let p = product(10, 5);
        assert_eq!(p.available_quantity(), 15);
        assert!(p.tiers_consistent());
    }

    #[test]
    fn test_legacy_row_quantity_only() {
        let mut p = product(0, 0);
        p.quantity = 42;
        assert_eq!(p.available_quantity(), 42);
        assert!(!p.tiers_consistent());
    }

    #[test]
    fn test_sales_record_revenue() {
        let rec = SalesRecord {
            id: "s-1".to_string(),
            product_name: "Espresso".to_string(),
            category: CATEGORY_BEVERAGES.to_string(),
            quantity: 2,
            unit_price_cents: 9000,
            recorded_at: Utc::now(),
        };
        assert_eq!(rec.revenue().cents(), 18000);
        assert!(!rec.is_synthetic());
    }

    #[test]
    fn test_synthetic_record_has_zero_revenue() {
        let rec = SalesRecord {
            id: "s-2".to_string(),
            product_name: "Flour".to_string(),
            category: CATEGORY_INGREDIENTS.to_string(),
            quantity: 150,
            unit_price_cents: 0,
            recorded_at: Utc::now(),
        };
        assert!(rec.is_synthetic());
        assert!(rec.revenue().is_zero());
    }

    #[test]
    fn test_waste_cost_uses_snapshot() {
        let rec = WasteRecord {
            id: "w-1".to_string(),
            product_id: "p-1".to_string(),
            product_name: "Croissant".to_string(),
            category: CATEGORY_PASTRIES.to_string(),
            quantity: 3,
            reason: "Expired".to_string(),
            cost_cents_snapshot: 1500,
            recorded_by: "ana".to_string(),
            recorded_at: Utc::now(),
            remote_id: None,
            synced_at: None,
        };
        assert_eq!(rec.waste_cost().cents(), 4500);
        assert!(rec.is_pending_sync());
    }
}
