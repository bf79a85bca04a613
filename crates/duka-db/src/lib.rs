//! # duka-db: Database Layer for Duka POS
//!
//! SQLite persistence via sqlx: catalog, stock ledger, transactions,
//! accounts and reports, plus the atomic checkout.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Data Flow                               │
//! │                                                                         │
//! │  Register command (checkout)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     duka-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│  product      │    │  (embedded)  │   │   │
//! │  │   │               │    │  transaction  │    │              │   │   │
//! │  │   │ SqlitePool    │    │  sale, user   │    │ 001_initial  │   │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘   │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼───────────┐                                         │   │
//! │  │   │ CheckoutProcessor │  guarded decrement + header + lines     │   │
//! │  │   │  (checkout.rs)    │  in ONE SQL transaction                 │   │
//! │  │   └───────────────────┘                                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir)/duka.db                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duka_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("duka.db")).await?;
//! let sugar = db.products().get_by_barcode("A001").await?;
//! let sale = db.checkout(&operator, &cart, &payment, None).await?;
//! ```

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use checkout::CheckoutProcessor;
pub use error::{CheckoutError, CheckoutResult, DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::transaction::{NewTransaction, TransactionDetail, TransactionRepository};
pub use repository::user::UserRepository;
