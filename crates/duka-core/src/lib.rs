//! # duka-core: Pure Business Logic for Duka POS
//!
//! Everything the register needs to decide *what* a sale looks like, with
//! zero I/O. Persistence lives in `duka-db`; orchestration lives in the
//! register app.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Register (apps/register)                        │   │
//! │  │    scan ──► cart ──► checkout ──► receipt sink                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ duka-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │  money  │ │  cart   │ │ checkout │ │validation│ │receipt │ │   │
//! │  │   │  Money  │ │  Cart   │ │Settlement│ │  rules   │ │  data  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └──────────┘ └────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    duka-db (Database Layer)                     │   │
//! │  │          SQLite, guarded stock decrement, transactions          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Transaction, SaleLine, User, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - In-memory cart with merge and LIFO undo
//! - [`checkout`] - Payment validation and discount / change settlement
//! - [`receipt`] - Receipt data handed to an external emitter
//! - [`session`] - Explicit operator context
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use duka_core::cart::Cart;
//! use duka_core::checkout::Settlement;
//! use duka_core::{Money, Product};
//!
//! let product = Product::new("A001", "Sugar 1kg", Money::from_major(1000), 10, "Grocery");
//!
//! let mut cart = Cart::new();
//! cart.add_item(&product, 2).unwrap();
//! assert_eq!(cart.total(), Money::from_major(2000));
//!
//! let settlement = Settlement::compute(cart.total(), Money::from_major(1500));
//! assert_eq!(settlement.discount, Money::from_major(500));
//! assert!(settlement.change.is_zero());
//! ```

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod receipt;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity accepted in a single cart addition.
///
/// Catches keying mistakes like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted, in minor units (one billion major units).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Highest stock level a product may hold.
///
/// Together with [`MAX_PRICE_CENTS`] this keeps stock value within `i64`.
pub const MAX_STOCK_LEVEL: i64 = 1_000_000;

/// Stock level at or below which a product counts as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
