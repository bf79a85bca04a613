//! # Sale Repository
//!
//! Sale-line queries and quick-sell mode.
//!
//! ## Quick-Sell
//! ```text
//! quick_sell(barcode, qty)              undo_quick_sale(barcode)
//! ────────────────────────              ────────────────────────
//! BEGIN                                 BEGIN
//!   guarded decrement                     DELETE latest header-less line
//!     0 rows → classify, ROLLBACK           RETURNING it ── none → NothingToUndo
//!   INSERT line (no header)               restore stock by its quantity
//! COMMIT                                COMMIT
//! ```
//! Both directions are single SQL transactions: stock and the sale row
//! always move together. Each opens with a write, so two terminals selling
//! at once queue on `busy_timeout` rather than failing the lock upgrade.

use chrono::{DateTime, Local, Utc};
use sqlx::SqlitePool;
use tracing::info;

use duka_core::cart::CartLine;
use duka_core::validation::{normalize_barcode, validate_quantity};
use duka_core::{CoreError, SaleLine, MAX_ITEM_QUANTITY};

use crate::error::{CheckoutError, CheckoutResult, DbResult};
use crate::repository::product::ProductRepository;
use crate::repository::report::local_day_bounds;
use crate::repository::transaction::{TransactionRepository, SALE_LINE_COLUMNS};

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Sells `quantity` of one product immediately, without a cart or header.
    pub async fn quick_sell(&self, barcode: &str, quantity: i64) -> CheckoutResult<SaleLine> {
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }
        validate_quantity(quantity).map_err(CoreError::from)?;

        let barcode = normalize_barcode(barcode);
        let mut tx = self.pool.begin().await?;

        if !ProductRepository::guarded_decrement(&mut *tx, &barcode, quantity).await? {
            let err = match ProductRepository::fetch(&mut *tx, &barcode).await? {
                None => CoreError::ProductNotFound(barcode),
                Some(product) if product.quantity <= 0 => CoreError::OutOfStock {
                    barcode,
                    name: product.name,
                },
                Some(product) => CoreError::InsufficientStock {
                    barcode,
                    name: product.name,
                    available: product.quantity,
                    requested: quantity,
                },
            };
            return Err(CheckoutError::Rejected(err));
        }

        let product = ProductRepository::fetch(&mut *tx, &barcode)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(barcode.clone()))?;

        let line = CartLine {
            barcode: barcode.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
        };
        let sold_at = Utc::now();
        let id = TransactionRepository::insert_line(&mut *tx, None, &line, sold_at).await?;

        tx.commit().await?;

        info!(barcode = %barcode, quantity, line_id = id, "Quick sale recorded");

        Ok(SaleLine {
            id,
            transaction_id: None,
            barcode,
            product_name: line.name.clone(),
            quantity,
            unit_price_cents: line.unit_price_cents,
            line_total_cents: line.subtotal().cents(),
            sold_at,
        })
    }

    /// Reverses the most recent quick sale of `barcode`.
    ///
    /// Lines written by a full checkout are never touched.
    pub async fn undo_quick_sale(&self, barcode: &str) -> CheckoutResult<SaleLine> {
        let barcode = normalize_barcode(barcode);
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "DELETE FROM sales WHERE id = ( \
                 SELECT id FROM sales \
                 WHERE barcode = ?1 AND transaction_id IS NULL \
                 ORDER BY sold_at DESC, id DESC LIMIT 1 \
             ) RETURNING {SALE_LINE_COLUMNS}"
        );
        let line = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(&barcode)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NothingToUndo)?;

        if !ProductRepository::restore(&mut *tx, &barcode, line.quantity).await? {
            return Err(CoreError::ProductNotFound(barcode).into());
        }

        tx.commit().await?;

        info!(barcode = %barcode, quantity = line.quantity, "Quick sale undone");
        Ok(line)
    }

    /// Sale lines (checkout and quick-sell) in `[from, to)`, oldest first.
    pub async fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {SALE_LINE_COLUMNS} FROM sales \
             WHERE sold_at >= ?1 AND sold_at < ?2 ORDER BY sold_at, id"
        );
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Sale lines of the current local day.
    pub async fn today(&self) -> DbResult<Vec<SaleLine>> {
        let (start, end) = local_day_bounds(Local::now());
        self.between(start, end).await
    }

    /// Most recent sale lines first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {SALE_LINE_COLUMNS} FROM sales ORDER BY sold_at DESC, id DESC LIMIT ?1"
        );
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }
}
