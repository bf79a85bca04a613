//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Duka POS                               │
//! │                                                                         │
//! │  Console                     Command Function                           │
//! │  ───────                     ────────────────                           │
//! │                                                                         │
//! │  scan a001 3 ──────────────► Result<CartView, ApiError>                 │
//! │                                     │                                   │
//! │        Database error? ── DbError ──┤                                   │
//! │        Rule violation? ── CoreError ┼──► ApiError { code, message }     │
//! │        Checkout failed? ─ CheckoutError                                 │
//! │                                     │                                   │
//! │  ◄──────────────────── "[INSUFFICIENT_STOCK] Only 3 Sugar 1kg ..."      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is recoverable: the register prints the message and the
//! operator retries. Storage details are logged, never shown.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use duka_core::{CoreError, ValidationError};
use duka_db::{CheckoutError, DbError};

/// Error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "STOCK_CHANGED",
///   "message": "Sugar 1kg stock changed: 2 available, 3 requested"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    DatabaseError,
    Internal,

    /// Cart limits, nothing to undo
    CartError,

    /// Stock was short when the item was scanned
    InsufficientStock,

    /// Stock fell between scanning and checkout
    StockChanged,

    /// Amount or reference rejected
    PaymentError,

    /// Another checkout is still being committed
    CheckoutInProgress,

    /// Nobody is signed in, or the credentials were wrong
    Unauthorized,

    /// Signed in, but the role does not allow it
    Forbidden,

    /// Settings could not be read or written
    SettingsError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Please sign in first")
    }

    pub fn forbidden(action: &str) -> Self {
        ApiError::new(
            ErrorCode::Forbidden,
            format!("Only an admin can {}", action),
        )
    }

    pub fn checkout_in_progress() -> Self {
        ApiError::new(
            ErrorCode::CheckoutInProgress,
            "A checkout is already being processed",
        )
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::CheckViolation { message } => {
                tracing::warn!("Constraint rejected write: {}", message);
                ApiError::validation("Value rejected by the database")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Credential(e) => {
                tracing::error!("Credential error: {}", e);
                ApiError::internal("Could not process the password")
            }
            DbError::Invalid(e) => e.into(),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts business rule violations to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::ProductNotFound(_) => ErrorCode::NotFound,
            CoreError::OutOfStock { .. } | CoreError::InsufficientStock { .. } => {
                ErrorCode::InsufficientStock
            }
            CoreError::StockChanged { .. } => ErrorCode::StockChanged,
            CoreError::EmptyCart
            | CoreError::NothingToUndo
            | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::InvalidAmount { .. } | CoreError::MissingPaymentReference { .. } => {
                ErrorCode::PaymentError
            }
            CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
        };
        ApiError::new(code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(e) => e.into(),
            CheckoutError::Storage(e) => e.into(),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        tracing::error!("Settings error: {}", err);
        ApiError::new(ErrorCode::SettingsError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = serde_json::to_value(self.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.code));
        write!(f, "[{}] {}", code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Settings Error
// =============================================================================

/// Failure to load, validate or save `settings.toml`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is malformed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Settings could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),

    /// No platform directory and no explicit path.
    #[error("No settings location available")]
    NoLocation,

    #[error("Could not create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err: ApiError = CoreError::StockChanged {
            name: "Sugar 1kg".into(),
            available: 2,
            requested: 3,
        }
        .into();
        assert_eq!(err.code, ErrorCode::StockChanged);
        assert!(err.message.contains("2 available"));

        let err: ApiError = CoreError::MissingPaymentReference {
            method: "Card".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let err: ApiError = CoreError::NothingToUndo.into();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[test]
    fn test_checkout_error_keeps_rejection_code() {
        let err: ApiError = CheckoutError::Rejected(CoreError::EmptyCart).into();
        assert_eq!(err.code, ErrorCode::CartError);

        let err: ApiError = CheckoutError::Storage(DbError::PoolExhausted).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_display_uses_wire_code() {
        let err = ApiError::checkout_in_progress();
        assert_eq!(
            err.to_string(),
            "[CHECKOUT_IN_PROGRESS] A checkout is already being processed"
        );
    }

    #[test]
    fn test_out_of_range_write_is_validation_error() {
        let err: ApiError = DbError::Invalid(ValidationError::OutOfRange {
            field: "quantity".into(),
            min: 0,
            max: 10,
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_query_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.message, "Database operation failed");
    }
}
