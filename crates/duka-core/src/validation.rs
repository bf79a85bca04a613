//! # Validation Module
//!
//! Input validation for catalog, cart and account operations.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register command                                             │
//! │  ├── Parse operator text (amounts, quantities, payment method)          │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0), CHECK (price_cents >= 0)                   │
//! │  ├── UNIQUE barcode / username                                         │
//! │  └── Guarded decrement at checkout                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use duka_core::validation::{normalize_barcode, validate_barcode, validate_quantity};
//!
//! assert_eq!(normalize_barcode("  A001 "), "a001");
//! validate_barcode("A001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK_LEVEL};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_BARCODE_LEN: usize = 64;
const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 60;
const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Barcode
// =============================================================================

/// Canonical form of a barcode: trimmed and lower-cased.
///
/// Every lookup and every write goes through this, which is what makes
/// barcodes case-insensitive.
pub fn normalize_barcode(barcode: &str) -> String {
    barcode.trim().to_lowercase()
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - No whitespace inside the code
///
/// ```rust
/// use duka_core::validation::validate_barcode;
///
/// assert!(validate_barcode("6001234567890").is_ok());
/// assert!(validate_barcode("   ").is_err());
/// assert!(validate_barcode("AB 12").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.chars().count() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if barcode.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Product Fields
// =============================================================================

/// Validates a product name (1-200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_within("name", name, MAX_NAME_LEN)
}

/// Validates a category label (1-60 characters after trimming).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    required_within("category", category, MAX_CATEGORY_LEN)
}

/// Validates a unit price in minor units. Zero is allowed (free items).
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&price_cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a stock level on save. Zero is allowed, at most [`MAX_STOCK_LEVEL`].
pub fn validate_stock_level(quantity: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_LEVEL).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_LEVEL,
        });
    }
    Ok(())
}

/// Validates a quantity being sold or added to the cart.
///
/// ## Rules
/// - Must be at least 1
/// - At most [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Accounts
// =============================================================================

/// Validates a username.
///
/// ## Rules
/// - 3-32 characters after trimming
/// - Letters, digits, `.`, `_` and `-` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    let len = username.chars().count();
    if len < MIN_USERNAME_LEN {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: MIN_USERNAME_LEN,
        });
    }
    if len > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a new password (at least 6 characters, not all whitespace).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a free-text search query (at most 100 characters).
///
/// Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

fn required_within(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode("ABC-001"), "abc-001");
        assert_eq!(normalize_barcode("  x9 \t"), "x9");
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("A001").is_ok());
        assert!(matches!(
            validate_barcode(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_barcode(&"9".repeat(65)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(matches!(
            validate_barcode("A 1"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_product_fields() {
        assert!(validate_product_name("Sugar 1kg").is_ok());
        assert!(validate_product_name("  ").is_err());
        assert!(validate_category("Grocery").is_ok());
        assert!(validate_category(&"c".repeat(61)).is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_validate_upper_bounds() {
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        // 10^15 major units
        assert!(validate_price_cents(100_000_000_000_000_000).is_err());
        assert!(validate_stock_level(MAX_STOCK_LEVEL).is_ok());
        assert!(validate_stock_level(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_accounts() {
        assert!(validate_username("amina.k").is_ok());
        assert!(matches!(
            validate_username("ab"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(validate_username("bad name").is_err());

        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("       ").is_err());
    }

    #[test]
    fn test_validate_search_query_trims() {
        assert_eq!(validate_search_query("  rice ").unwrap(), "rice");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }
}
