//! # Error Types
//!
//! Domain-specific error types for kopi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  kopi-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  kopi-db errors                                                     │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  kopi-engine errors                                                 │
//! │  └── EngineError      - What operation callers see                  │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → EngineError → caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, quantities, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. User-correctable inputs
/// (insufficient stock, insufficient payment) surface through these
/// variants and must never be silently swallowed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced product does not exist (or was soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Transfer or waste quantity exceeds the available inventory tier.
    ///
    /// `tier` names which tier ran short ("bulk" for transfers,
    /// "display" for waste and sales).
    #[error("Insufficient {tier} stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        tier: &'static str,
        available: i64,
        requested: i64,
    },

    /// Cash tendered is below the order total. Checked before any side
    /// effect of the order.
    #[error("Insufficient payment: total {total_cents} cents, received {received_cents} cents")]
    InsufficientPayment {
        total_cents: i64,
        received_cents: i64,
    },

    /// Cart has exceeded the maximum allowed line count.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (non-finite quantity, malformed id, etc.).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            name: "Croissant".to_string(),
            tier: "display",
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient display stock for Croissant: available 3, requested 5"
        );
    }

    #[test]
    fn test_insufficient_payment_message() {
        let err = CoreError::InsufficientPayment {
            total_cents: 10000,
            received_cents: 9000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient payment: total 10000 cents, received 9000 cents"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
