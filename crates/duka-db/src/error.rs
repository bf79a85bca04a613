//! # Storage Errors
//!
//! Failures below the register. Storage problems are `DbError`; a sale the
//! rules refused is `CheckoutError::Rejected`.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← categorised: not found, unique, FK, ...       │
//! │       │                                                                 │
//! │       │        CoreError (duka-core) ← business rejection               │
//! │       │             │                                                   │
//! │       ▼             ▼                                                   │
//! │  CheckoutError { Storage | Rejected } ← checkout / quick-sell          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (register) ← { code, message } for the operator              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use duka_core::{CoreError, ValidationError};
use thiserror::Error;

/// A failed repository call.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the given key.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate username, category, ...).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A sale line pointing at a missing header, and similar.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, both change and discount, ...).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Runtime SQL error.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin / commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// All connections in use.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Password hashing or verification failed.
    #[error("Credential error: {0}")]
    Credential(String),

    /// A write whose result falls outside the allowed range.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// SQLite reports constraint failures only through the message text.
///
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → by SQLite constraint message
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// Failure of an atomic sale operation.
///
/// `Rejected` is an operator-facing business condition (empty cart, stock
/// changed, ...). `Storage` means the database itself failed. In both cases
/// nothing was written.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl CheckoutError {
    /// The business rejection, if this was one.
    pub fn as_rejection(&self) -> Option<&CoreError> {
        match self {
            CheckoutError::Rejected(e) => Some(e),
            CheckoutError::Storage(_) => None,
        }
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Storage(err.into())
    }
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;
