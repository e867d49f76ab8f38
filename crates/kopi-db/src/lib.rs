//! # kopi-db: Database Layer for Kopi POS
//!
//! SQLite access for the café POS: connection pool, embedded migrations
//! and one repository per entity family.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  kopi-engine operation (complete_order, mark_waste, ...)            │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                    kopi-db (THIS CRATE)                       │ │
//! │  │                                                               │ │
//! │  │  ┌──────────┐  ┌──────────────────────────┐  ┌────────────┐  │ │
//! │  │  │ Database │  │       Repositories       │  │ Migrations │  │ │
//! │  │  │ (pool)   │◄─│ products recipes sales   │  │ (embedded) │  │ │
//! │  │  │ WAL mode │  │ waste audit users outbox │  │            │  │ │
//! │  │  └──────────┘  └──────────────────────────┘  └────────────┘  │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (or :memory: in tests)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kopi_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kopi.db")).await?;
//! let products = db.products().list_active().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::AuditRepository;
pub use repository::product::ProductRepository;
pub use repository::recipe::RecipeRepository;
pub use repository::sales::{ProductRevenue, SalesRepository};
pub use repository::sync::SyncOutboxRepository;
pub use repository::users::UserRepository;
pub use repository::waste::WasteRepository;
