//! # State Module
//!
//! Application state for the register.
//!
//! Each concern has its own state type, and every command takes only the
//! states it touches:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐ │
//! │  │   DbState    │  │  CartState   │  │ SessionState │  │SettingsState│ │
//! │  │              │  │              │  │              │  │             │ │
//! │  │  Database    │  │  Arc<Mutex<  │  │  Mutex<      │  │  RwLock<    │ │
//! │  │  (SQLite     │  │    Cart>>    │  │   Option<    │  │   Settings> │ │
//! │  │   pool)      │  │  + checkout  │  │   Operator>> │  │  + file     │ │
//! │  │              │  │    guard     │  │              │  │    path     │ │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘ │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: the pool is shareable                                      │
//! │  • CartState: exclusive access, frozen while a checkout commits        │
//! │  • SessionState / SettingsState: short critical sections, no awaits    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod db;
mod session;
mod settings;

pub use cart::{CartState, CartView, CheckoutGuard};
pub use db::DbState;
pub use session::SessionState;
pub use settings::{Settings, SettingsState};

/// All register state, as built by the binary.
#[derive(Debug)]
pub struct AppState {
    pub db: DbState,
    pub cart: CartState,
    pub session: SessionState,
    pub settings: SettingsState,
}

impl AppState {
    pub fn new(db: DbState, settings: SettingsState) -> Self {
        AppState {
            db,
            cart: CartState::new(),
            session: SessionState::new(),
            settings,
        }
    }
}
