//! # Error Types
//!
//! Domain-specific error types for duka-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  duka-core errors (this file)                                          │
//! │  ├── CoreError        - Operator-facing sale / cart failures           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  duka-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - CoreError rejection OR DbError                 │
//! │                                                                         │
//! │  register errors (app)                                                 │
//! │  └── ApiError         - { code, message } shown to the operator        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is recoverable: the register shows it and lets the
//! operator adjust the cart or payment and try again.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart and checkout flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No catalog entry for the barcode.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product has no stock at all.
    #[error("{name} is out of stock")]
    OutOfStock { barcode: String, name: String },

    /// The product has some stock, but less than requested.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan A001, qty 5
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Register shows: "Only 3 Sugar 1kg available in stock"
    /// ```
    #[error("Only {available} {name} available in stock, requested {requested}")]
    InsufficientStock {
        barcode: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Checkout attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Amount paid is negative or could not be parsed.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Non-cash payment submitted without a reference.
    #[error("A payment reference is required for {method} payments")]
    MissingPaymentReference { method: String },

    /// Stock that was sufficient when the item was scanned no longer is.
    ///
    /// Raised inside the checkout transaction, typically because another
    /// terminal sold the same product in the meantime.
    #[error("{name} stock changed: {available} available, {requested} requested")]
    StockChanged {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Undo requested with no recorded additions.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Cart has reached its line limit.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Quantity exceeds the per-addition maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds an `InvalidAmount` error.
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            barcode: "a001".to_string(),
            name: "Sugar 1kg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Only 3 Sugar 1kg available in stock, requested 5"
        );

        let err = CoreError::StockChanged {
            name: "Rice".to_string(),
            available: 0,
            requested: 2,
        };
        assert_eq!(err.to_string(), "Rice stock changed: 0 available, 2 requested");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: barcode is required");
    }
}
