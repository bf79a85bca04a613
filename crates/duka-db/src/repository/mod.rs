//! # Repository Module
//!
//! Database repositories for Duka POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Register command                                                       │
//! │       │  db.products().get_by_barcode("a001")                          │
//! │       ▼                                                                 │
//! │  ProductRepository ──► SQL ──► SQLite                                   │
//! │                                                                         │
//! │  Primitives that must join a caller's SQL transaction are associated   │
//! │  functions generic over `SqliteExecutor`:                               │
//! │                                                                         │
//! │    ProductRepository::guarded_decrement(&mut *tx, ..)                   │
//! │    TransactionRepository::insert_header(&mut *tx, ..)                   │
//! │    TransactionRepository::insert_line(&mut *tx, ..)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - catalog, stock ledger, adjustments
//! - [`TransactionRepository`](transaction::TransactionRepository) - headers, lines, history
//! - [`SaleRepository`](sale::SaleRepository) - quick-sell and sale-line queries
//! - [`UserRepository`](user::UserRepository) - accounts and shop info
//! - [`CategoryRepository`](category::CategoryRepository) - category labels
//! - [`ReportRepository`](report::ReportRepository) - dashboard and activity

pub mod category;
pub mod product;
pub mod report;
pub mod sale;
pub mod transaction;
pub mod user;
