//! # Commands Module
//!
//! Everything the register front end can ask for.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── product.rs  ◄─── Catalog lookup, search, edits, stock adjustment
//! ├── cart.rs     ◄─── Scan, undo, quantity edits
//! ├── sale.rs     ◄─── Checkout, quick-sell, history, receipts
//! ├── report.rs   ◄─── Dashboard, today's takings, activity, backup
//! └── user.rs     ◄─── Sign-in, staff, shop profile
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs the database
//! product::search_products(&app.db, "sugar", None).await?;
//!
//! // Database, cart and session
//! cart::scan_item(&app.db, &app.cart, &app.session, "a001", 2).await?;
//! ```
//!
//! Every command returns `Result<T, ApiError>`; `T` is serialisable.

pub mod cart;
pub mod product;
pub mod report;
pub mod sale;
pub mod user;

#[cfg(test)]
pub(crate) mod testing {
    use duka_core::session::OperatorContext;
    use duka_core::{Money, Product, Role};
    use duka_db::{Database, DbConfig};

    use crate::state::{AppState, DbState, Settings, SettingsState};

    pub const ADMIN_USER: &str = "owner";
    pub const ADMIN_PASSWORD: &str = "owner-pass";

    /// In-memory register with the admin signed in.
    pub async fn register() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db
            .users()
            .create(ADMIN_USER, ADMIN_PASSWORD, Role::Admin)
            .await
            .unwrap();

        let app = AppState::new(
            DbState::new(db),
            SettingsState::new(Settings::default(), None),
        );
        app.session.sign_in(OperatorContext::from(&admin));
        app
    }

    /// Creates "staff" and signs them in instead of the admin.
    pub async fn sign_in_employee(app: &AppState) {
        let staff = app
            .db
            .inner()
            .users()
            .create("staff", "staff-pass", Role::Employee)
            .await
            .unwrap();
        app.session.sign_in(OperatorContext::from(&staff));
    }

    pub async fn stock(app: &AppState, barcode: &str, name: &str, price: i64, qty: i64) -> Product {
        let product = Product::new(barcode, name, Money::from_major(price), qty, "Grocery");
        app.db.inner().products().upsert(&product).await.unwrap()
    }
}
