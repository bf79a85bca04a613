//! # Report Commands
//!
//! Dashboard figures, the day's takings, recent activity and backups.

use std::path::{Path, PathBuf};

use tracing::info;

use duka_core::{ActivityEntry, DailySummary, DashboardStats, SaleLine};

use crate::error::ApiError;
use crate::state::{DbState, SessionState, SettingsState};

const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

pub async fn dashboard(db: &DbState, settings: &SettingsState) -> Result<DashboardStats, ApiError> {
    let threshold = settings.low_stock_threshold();
    Ok(db.inner().reports().dashboard(threshold).await?)
}

/// Units sold and revenue since local midnight.
pub async fn today_summary(db: &DbState) -> Result<DailySummary, ApiError> {
    Ok(db.inner().reports().today_summary().await?)
}

/// Every sale line recorded today, checkout and quick-sell alike.
pub async fn todays_sales(db: &DbState) -> Result<Vec<SaleLine>, ApiError> {
    Ok(db.inner().sales().today().await?)
}

pub async fn recent_activity(
    db: &DbState,
    limit: Option<u32>,
) -> Result<Vec<ActivityEntry>, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, 100);
    Ok(db.inner().reports().recent_activity(limit).await?)
}

/// Copies the database to `destination`. Refuses to overwrite.
pub async fn backup_database(
    db: &DbState,
    session: &SessionState,
    destination: &Path,
) -> Result<PathBuf, ApiError> {
    let operator = session.require_admin("back up the database")?;

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ApiError::validation(format!(
                "Folder does not exist: {}",
                parent.display()
            )));
        }
    }

    db.inner().backup_to(destination).await?;

    info!(
        operator = %operator.username,
        destination = %destination.display(),
        "Backup written"
    );
    Ok(destination.to_path_buf())
}
