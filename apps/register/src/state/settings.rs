//! # Register Settings
//!
//! Operator-facing preferences, persisted as `settings.toml`.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Settings Priority                                    │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DUKA_DB_PATH=/srv/duka/duka.db                                     │
//! │     DUKA_CURRENCY=TZS                                                  │
//! │                                                                         │
//! │  2. TOML file                                                          │
//! │     ~/.config/duka-pos/settings.toml (Linux)                           │
//! │     ~/Library/Application Support/com.duka.pos/settings.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Format
//! ```toml
//! database_path = "/srv/duka/duka.db"
//! receipts_dir = "/home/owner/Receipts"
//! currency_code = "TZS"
//! currency_decimals = 2
//! low_stock_threshold = 5
//! open_receipt_after_save = true
//! remembered_username = "owner"
//! ```

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use directories::ProjectDirs;
use duka_core::{Money, DEFAULT_LOW_STOCK_THRESHOLD};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SettingsError, SettingsResult};

const SETTINGS_FILE: &str = "settings.toml";
const DATABASE_FILE: &str = "duka.db";
const RECEIPTS_DIR: &str = "receipts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file. Defaults to `duka.db` in the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Where receipt files are written. Defaults to `receipts/` next to the
    /// database.
    pub receipts_dir: Option<PathBuf>,

    /// Shown before amounts, e.g. "TZS 1,000.00".
    pub currency_code: String,

    /// 0 or 2.
    pub currency_decimals: u8,

    /// Products at or below this quantity count as low stock.
    pub low_stock_threshold: i64,

    /// Print the receipt text after saving it.
    pub open_receipt_after_save: bool,

    /// Pre-filled at the sign-in prompt.
    pub remembered_username: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: None,
            receipts_dir: None,
            currency_code: "TZS".to_string(),
            currency_decimals: 2,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            open_receipt_after_save: true,
            remembered_username: None,
        }
    }
}

impl Settings {
    /// Loads settings from file and environment.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Settings file
    /// 3. Environment variables
    pub fn load(path: Option<PathBuf>) -> SettingsResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub(crate) fn load_with<F>(path: Option<PathBuf>, env: F) -> SettingsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = path.or_else(Self::default_path) {
            if path.exists() {
                info!(?path, "Loading settings from file");
                let contents = std::fs::read_to_string(&path)?;
                settings = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Settings file not found, using defaults");
            }
        }

        settings.apply_overrides(env);
        settings.validate()?;

        Ok(settings)
    }

    /// Loads settings or returns defaults if the file is unusable.
    pub fn load_or_default(path: Option<PathBuf>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Failed to load settings: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, path: Option<PathBuf>) -> SettingsResult<()> {
        let path = path
            .or_else(Self::default_path)
            .ok_or(SettingsError::NoLocation)?;

        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Settings saved");
        Ok(())
    }

    pub fn validate(&self) -> SettingsResult<()> {
        if self.currency_code.trim().is_empty() {
            return Err(SettingsError::Invalid("currency_code cannot be empty".into()));
        }

        if !matches!(self.currency_decimals, 0 | 2) {
            return Err(SettingsError::Invalid(format!(
                "currency_decimals must be 0 or 2, got {}",
                self.currency_decimals
            )));
        }

        if self.low_stock_threshold < 0 {
            return Err(SettingsError::Invalid(
                "low_stock_threshold cannot be negative".into(),
            ));
        }

        Ok(())
    }

    fn apply_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = env("DUKA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(dir) = env("DUKA_RECEIPTS_DIR") {
            self.receipts_dir = Some(PathBuf::from(dir));
        }

        if let Some(code) = env("DUKA_CURRENCY") {
            self.currency_code = code.trim().to_uppercase();
        }

        if let Some(decimals) = env("DUKA_CURRENCY_DECIMALS") {
            match decimals.parse::<u8>() {
                Ok(d) => self.currency_decimals = d,
                Err(_) => warn!(value = %decimals, "Ignoring DUKA_CURRENCY_DECIMALS"),
            }
        }

        if let Some(threshold) = env("DUKA_LOW_STOCK_THRESHOLD") {
            match threshold.parse::<i64>() {
                Ok(t) => self.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring DUKA_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(flag) = env("DUKA_OPEN_RECEIPT") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.open_receipt_after_save = true,
                "0" | "false" | "no" | "off" => self.open_receipt_after_save = false,
                _ => warn!(value = %flag, "Ignoring DUKA_OPEN_RECEIPT"),
            }
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "duka", "pos")
    }

    /// `settings.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Resolved database file. The parent directory is created.
    pub fn database_path(&self) -> SettingsResult<PathBuf> {
        let path = match &self.database_path {
            Some(path) => path.clone(),
            None => Self::project_dirs()
                .ok_or(SettingsError::NoLocation)?
                .data_dir()
                .join(DATABASE_FILE),
        };

        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        Ok(path)
    }

    /// Resolved receipts directory. Not created until a receipt is written.
    pub fn receipts_dir(&self) -> SettingsResult<PathBuf> {
        if let Some(dir) = &self.receipts_dir {
            return Ok(dir.clone());
        }

        let db_path = self.database_path()?;
        let base = db_path.parent().unwrap_or_else(|| Path::new("."));
        Ok(base.join(RECEIPTS_DIR))
    }

    /// Formats an amount in the configured currency.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let settings = Settings::default();
    /// assert_eq!(settings.format_money(Money::from_major(1500)), "TZS 1,500.00");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        let text = amount.to_string();
        let text = if self.currency_decimals == 0 {
            text.split_once('.').map(|(whole, _)| whole).unwrap_or(&text)
        } else {
            &text
        };
        format!("{} {}", self.currency_code, text)
    }
}

fn create_dir(path: &Path) -> SettingsResult<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|source| SettingsError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// Settings State
// =============================================================================

/// Live settings plus the file they are saved to.
#[derive(Debug)]
pub struct SettingsState {
    settings: RwLock<Settings>,
    path: Option<PathBuf>,
}

impl SettingsState {
    /// `path` of `None` keeps changes in memory only.
    pub fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        SettingsState {
            settings: RwLock::new(settings),
            path,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self) -> Settings {
        self.read().clone()
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.read().low_stock_threshold
    }

    pub fn format_money(&self, amount: Money) -> String {
        self.read().format_money(amount)
    }

    /// Applies `f`, validates, then persists. Invalid changes are discarded.
    pub fn update<F>(&self, f: F) -> SettingsResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        candidate.validate()?;

        if let Some(path) = &self.path {
            candidate.save(Some(path.clone()))?;
        }

        *self.write() = candidate.clone();
        Ok(candidate)
    }
}
