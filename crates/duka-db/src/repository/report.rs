//! # Report Repository
//!
//! Read-only figures for the owner's dashboard.
//!
//! ## Time Windows
//! Days and months follow the shop's local clock. Bounds are converted to
//! UTC before querying, since timestamps are stored in UTC:
//! ```text
//! local 2024-03-09 00:00 (+03:00) ──► 2024-03-08T21:00:00Z  (inclusive)
//! local 2024-03-10 00:00 (+03:00) ──► 2024-03-09T21:00:00Z  (exclusive)
//! ```

use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;

use duka_core::{ActivityEntry, ActivityKind, DailySummary, DashboardStats};

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Headline numbers.
    ///
    /// `monthly_sales_cents` counts checkout totals (after discount) plus
    /// quick-sell lines since the start of the local month.
    pub async fn dashboard(&self, low_stock_threshold: i64) -> DbResult<DashboardStats> {
        let (product_count, inventory_value_cents, low_stock_count): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(price_cents * quantity), 0),
                    COALESCE(SUM(CASE WHEN quantity <= ?1 THEN 1 ELSE 0 END), 0)
                FROM products
                "#,
            )
            .bind(low_stock_threshold)
            .fetch_one(&self.pool)
            .await?;

        let (month_start, month_end) = local_month_bounds(Local::now());
        let monthly_sales_cents = self.revenue_between(month_start, month_end).await?;

        Ok(DashboardStats {
            product_count,
            monthly_sales_cents,
            inventory_value_cents,
            low_stock_count,
        })
    }

    /// Units sold and revenue for the current local day.
    pub async fn today_summary(&self) -> DbResult<DailySummary> {
        let (start, end) = local_day_bounds(Local::now());
        self.summary_between(start, end).await
    }

    /// Units sold and revenue in `[from, to)`.
    pub async fn summary_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<DailySummary> {
        let items_sold: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM sales WHERE sold_at >= ?1 AND sold_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let total_cents = self.revenue_between(from, to).await?;

        Ok(DailySummary {
            items_sold,
            total_cents,
        })
    }

    /// Newest first: product additions and sales, merged.
    pub async fn recent_activity(&self, limit: u32) -> DbResult<Vec<ActivityEntry>> {
        let products: Vec<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT name, created_at FROM products ORDER BY created_at DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        let sales: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT product_name, sold_at FROM sales ORDER BY sold_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(merge_activity(products, sales, limit))
    }

    /// Checkout totals plus quick-sell line totals in `[from, to)`.
    async fn revenue_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<i64> {
        let revenue: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total_cents - discount_cents), 0)
                   FROM transactions
                  WHERE created_at >= ?1 AND created_at < ?2)
              + (SELECT COALESCE(SUM(line_total_cents), 0)
                   FROM sales
                  WHERE transaction_id IS NULL AND sold_at >= ?1 AND sold_at < ?2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(revenue)
    }
}

// =============================================================================
// Local calendar bounds
// =============================================================================

/// `[start of day, start of next day)` in UTC for `now`'s local date.
pub(crate) fn local_day_bounds(now: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (local_midnight(today, now), local_midnight(tomorrow, now))
}

/// `[first of month, first of next month)` in UTC for `now`'s local date.
pub(crate) fn local_month_bounds(now: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    let next = first.checked_add_months(Months::new(1)).unwrap_or(first);
    (local_midnight(first, now), local_midnight(next, now))
}

/// Local midnight of `date` in UTC. Falls back to `fallback` on a DST gap.
fn local_midnight(date: NaiveDate, fallback: DateTime<Local>) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .unwrap_or(fallback)
        .with_timezone(&Utc)
}

/// Merges both feeds newest first, sales ahead of additions on equal timestamps.
fn merge_activity(
    products: Vec<(String, DateTime<Utc>)>,
    sales: Vec<(String, DateTime<Utc>)>,
    limit: u32,
) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = sales
        .into_iter()
        .map(|(name, at)| ActivityEntry {
            kind: ActivityKind::Sale,
            name,
            at,
        })
        .chain(products.into_iter().map(|(name, at)| ActivityEntry {
            kind: ActivityKind::ProductAdded,
            name,
            at,
        }))
        .collect();

    // sort_by is stable, so the chain order decides ties
    entries.sort_by(|a, b| b.at.cmp(&a.at));
    entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    entries
}
