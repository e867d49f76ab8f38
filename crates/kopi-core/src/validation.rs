//! # Validation Module
//!
//! Input validation for the café POS.
//!
//! ## Validation Strategy
//! Business rules are checked here before any engine runs; the database
//! adds its own NOT NULL / UNIQUE / CHECK constraints as a second layer.
//! Validation errors are user-correctable and always surface to the
//! caller.
//!
//! ## Usage
//! ```rust
//! use kopi_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Butter Croissant").unwrap();
//! validate_quantity(3).unwrap();
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Waste reasons offered by the register UI. `reason` is stored as free
/// text, so this set is suggested, not enforced.
pub const WASTE_REASONS: &[&str] = &[
    "Expired",
    "Spoiled",
    "Damaged",
    "Overproduction",
    "Spillage",
    "Other",
];

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a waste reason.
///
/// Free text, but it must say something.
pub fn validate_waste_reason(reason: &str) -> ValidationResult<()> {
    if reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 50 characters
/// - Alphanumeric, hyphens and underscores only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 || username.len() > 50 {
        return Err(ValidationError::OutOfRange {
            field: "username".to_string(),
            min: 3,
            max: 50,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 8 {
        return Err(ValidationError::OutOfRange {
            field: "password".to_string(),
            min: 8,
            max: 128,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an inventory/sale quantity: strictly positive.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents: non-negative (ingredients carry zero).
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price_cents".to_string(),
        });
    }

    Ok(())
}

/// Validates a recipe ingredient's per-serving need.
///
/// Zero is accepted here and treated as blocking by the recipe engine
/// (conservative policy); NaN and infinities are rejected outright.
pub fn validate_quantity_needed(quantity_needed: f64) -> ValidationResult<()> {
    if !quantity_needed.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "quantity_needed".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if quantity_needed < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity_needed".to_string(),
        });
    }

    Ok(())
}
