//! # kopi-engine: Business Flows for Kopi POS
//!
//! The engines that make the terminal do things: completing orders,
//! reconciling recipe ingredients, moving and writing off stock, and
//! managing the catalog and cashier accounts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          kopi-engine                                │
//! │                                                                     │
//! │  OrderOrchestrator ──► RecipeEngine ──► (stock, synthetic sales)    │
//! │         │                                                           │
//! │         ├──► sales ledger + audit trail                             │
//! │                                                                     │
//! │  InventoryEngine  ──► tier transfers, waste ledger                  │
//! │  CatalogService   ──► products, recipes                             │
//! │  AuthService      ──► users, SessionHandle                          │
//! │  ReportService    ──► read-only ledger aggregation                  │
//! │                                                                     │
//! │  every mutation also queues its entity in the sync outbox;          │
//! │  kopi-sync drains the queue to the remote store                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Engines own no global state: each is constructed from a [`Database`]
//! handle and, where actions need attribution, a [`SessionHandle`].
//!
//! [`Database`]: kopi_db::Database
//! [`SessionHandle`]: session::SessionHandle

pub mod auth;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod order;
pub mod recipe;
pub mod reports;
pub mod session;

mod audit;
mod mirror;

pub use auth::AuthService;
pub use catalog::{CatalogService, NewIngredient, NewProduct};
pub use error::{EngineError, EngineResult};
pub use inventory::InventoryEngine;
pub use order::OrderOrchestrator;
pub use recipe::RecipeEngine;
pub use reports::{ReportService, SalesSummary, WasteSummary};
pub use session::{Session, SessionHandle};
