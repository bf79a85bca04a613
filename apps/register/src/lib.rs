//! # Duka Register Library
//!
//! The register application: state, commands and a console front end over
//! `duka-core` and `duka-db`.
//!
//! ## Module Organization
//! ```text
//! duka_register/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState and exports
//! │   ├── db.rs       ◄─── Database wrapper, shop owner lookup
//! │   ├── cart.rs     ◄─── Cart with single-flight checkout guard
//! │   ├── session.rs  ◄─── Signed-in operator
//! │   └── settings.rs ◄─── TOML settings + DUKA_* overrides
//! ├── commands/       ◄─── product, cart, sale, report, user
//! ├── receipt.rs      ◄─── Plain-text receipt files
//! ├── console.rs      ◄─── Line-oriented front end
//! └── error.rs        ◄─── ApiError returned by every command
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr, `RUST_LOG` aware)
//! 2. Load settings from the platform config directory
//! 3. Open the database and run migrations
//! 4. Build `AppState`
//! 5. Read commands from stdin until `quit`

pub mod commands;
pub mod console;
pub mod error;
pub mod receipt;
pub mod state;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use duka_db::{Database, DbConfig};
use state::{AppState, DbState, Settings, SettingsState};

/// Runs the register until stdin closes or the operator quits.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting Duka register");

    let settings_path = Settings::default_path();
    let settings = Settings::load(settings_path.clone()).context("Failed to load settings")?;

    let db_path = settings.database_path()?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path))
        .await
        .context("Failed to open database")?;
    info!("Database connected and migrations applied");

    let app = AppState::new(DbState::new(db), SettingsState::new(settings, settings_path));

    let result = console::run(&app).await;
    app.db.inner().close().await;
    result
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=duka=trace` - Trace for duka crates only
/// - Default: `info,duka=debug,sqlx=warn`
///
/// Logs go to stderr so they never interleave with console replies.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,duka=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
