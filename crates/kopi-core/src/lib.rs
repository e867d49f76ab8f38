//! # kopi-core: Pure Business Logic for Kopi POS
//!
//! The heart of the café POS: domain types and business rules as pure
//! code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Kopi POS Architecture                          │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                 ★ kopi-core (THIS CRATE) ★                    │ │
//! │  │                                                               │ │
//! │  │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌────────────┐       │ │
//! │  │  │  types  │  │  money  │  │  cart   │  │ validation │       │ │
//! │  │  │ Product │  │  Money  │  │  Cart   │  │   rules    │       │ │
//! │  │  │ Recipe  │  │  cents  │  │ Receipt │  │   checks   │       │ │
//! │  │  └─────────┘  └─────────┘  └─────────┘  └────────────┘       │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │                              │                                      │
//! │            kopi-db ──── kopi-engine ──── kopi-sync                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: same input, same output, no side effects
//! 2. **Integer money**: all monetary values are cents (i64); ingredient
//!    quantities are f64 because grams are a measurement, not money
//! 3. **Explicit errors**: typed enums via thiserror, never strings

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine, Receipt};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// Prevents runaway carts; generous for a single-register café.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// Guards against a typo (1000 instead of 10) reaching the order flow.
pub const MAX_LINE_QUANTITY: i64 = 999;
