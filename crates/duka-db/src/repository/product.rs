//! # Product Repository
//!
//! Catalog and stock-ledger operations.
//!
//! ## Key Operations
//! - Upsert keyed on the normalised barcode
//! - Substring search over name, barcode and category
//! - The guarded decrement used by checkout and quick-sell
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │     SET quantity = quantity - :qty                                      │
//! │   WHERE barcode = :barcode AND quantity >= :qty                         │
//! │                                                                         │
//! │  rows_affected = 1  → stock taken                                       │
//! │  rows_affected = 0  → insufficient (or product gone), nothing changed   │
//! │                                                                         │
//! │  Terminal A wants 3 ─┐                                                  │
//! │                      ├── stock 5 ── only one of them can match ──► 2|1  │
//! │  Terminal B wants 4 ─┘                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The check and the write are one statement, so there is no window in which
//! two sales can both pass a stale check.

use chrono::Utc;
use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;
use tracing::{debug, info};

use duka_core::validation::normalize_barcode;
use duka_core::{Product, StockUpdate};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str =
    "barcode, name, price_cents, quantity, category, image_path, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Executor-generic primitives (run on the pool or inside a transaction)
    // =========================================================================

    /// Loads a product by barcode on any executor.
    pub async fn fetch<'e, E>(executor: E, barcode: &str) -> DbResult<Option<Product>>
    where
        E: SqliteExecutor<'e>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(normalize_barcode(barcode))
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Quantity on hand, `None` if the product does not exist.
    pub async fn stock_level<'e, E>(executor: E, barcode: &str) -> DbResult<Option<i64>>
    where
        E: SqliteExecutor<'e>,
    {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM products WHERE barcode = ?1")
                .bind(normalize_barcode(barcode))
                .fetch_optional(executor)
                .await?;
        Ok(quantity)
    }

    /// Decrements stock only if at least `quantity` is on hand.
    ///
    /// Returns `false` when nothing was changed.
    pub async fn guarded_decrement<'e, E>(
        executor: E,
        barcode: &str,
        quantity: i64,
    ) -> DbResult<bool>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - ?2,
                updated_at = ?3
            WHERE barcode = ?1 AND quantity >= ?2
            "#,
        )
        .bind(normalize_barcode(barcode))
        .bind(quantity)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Adds `quantity` back to stock. Returns `false` if the product is gone.
    pub async fn restore<'e, E>(executor: E, barcode: &str, quantity: i64) -> DbResult<bool>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE products SET quantity = quantity + ?2, updated_at = ?3 WHERE barcode = ?1",
        )
        .bind(normalize_barcode(barcode))
        .bind(quantity)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Catalog Store
    // =========================================================================

    /// Case-insensitive lookup by barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        Self::fetch(&self.pool, barcode).await
    }

    /// Current quantity on hand.
    pub async fn current_stock(&self, barcode: &str) -> DbResult<Option<i64>> {
        Self::stock_level(&self.pool, barcode).await
    }

    /// Standalone guarded decrement (outside any checkout).
    pub async fn decrement_if_available(&self, barcode: &str, quantity: i64) -> DbResult<bool> {
        let taken = Self::guarded_decrement(&self.pool, barcode, quantity).await?;
        debug!(barcode = %barcode, quantity, taken, "Guarded decrement");
        Ok(taken)
    }

    /// Inserts or replaces a product keyed on its barcode.
    ///
    /// `created_at` of an existing product is kept. The category is added to
    /// the category list if new.
    pub async fn upsert(&self, product: &Product) -> DbResult<Product> {
        let barcode = normalize_barcode(&product.barcode);
        let now = Utc::now();

        debug!(barcode = %barcode, name = %product.name, "Saving product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                barcode, name, price_cents, quantity, category, image_path,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (barcode) DO UPDATE SET
                name = excluded.name,
                price_cents = excluded.price_cents,
                quantity = excluded.quantity,
                category = excluded.category,
                image_path = COALESCE(excluded.image_path, products.image_path),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&barcode)
        .bind(product.name.trim())
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(product.category.trim())
        .bind(product.image_path.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if !product.category.trim().is_empty() {
            sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?1)")
                .bind(product.category.trim())
                .execute(&mut *tx)
                .await?;
        }

        let saved = Self::fetch(&mut *tx, &barcode)
            .await?
            .ok_or_else(|| DbError::not_found("Product", barcode.as_str()))?;

        tx.commit().await?;
        Ok(saved)
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Substring search over name, barcode and category.
    ///
    /// An empty query lists the catalog.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit, "Searching products");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE lower(name) LIKE ?1 ESCAPE '\'
               OR barcode LIKE ?1 ESCAPE '\'
               OR lower(category) LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Deletes a product. Past sale lines keep their snapshot.
    pub async fn delete(&self, barcode: &str) -> DbResult<()> {
        let barcode = normalize_barcode(barcode);
        let result = sqlx::query("DELETE FROM products WHERE barcode = ?1")
            .bind(&barcode)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", barcode));
        }

        info!(barcode = %barcode, "Product deleted");
        Ok(())
    }

    /// Sets or clears the image reference.
    pub async fn set_image(&self, barcode: &str, image_path: Option<&str>) -> DbResult<()> {
        let barcode = normalize_barcode(barcode);
        let result =
            sqlx::query("UPDATE products SET image_path = ?2, updated_at = ?3 WHERE barcode = ?1")
                .bind(&barcode)
                .bind(image_path)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", barcode));
        }
        Ok(())
    }

    // =========================================================================
    // Stock Adjustment
    // =========================================================================

    /// Applies a manual stock / price correction.
    ///
    /// The transaction opens with a write, taking the SQLite write lock
    /// before anything is read. The resulting quantity is clamped at zero
    /// and must stay within the stock and price limits.
    pub async fn adjust_stock(&self, barcode: &str, update: StockUpdate) -> DbResult<Product> {
        let barcode = normalize_barcode(barcode);
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE products SET updated_at = ?2 WHERE barcode = ?1")
            .bind(&barcode)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Product", barcode));
        }

        let current = Self::fetch(&mut *tx, &barcode)
            .await?
            .ok_or_else(|| DbError::not_found("Product", barcode.as_str()))?;

        let (quantity, price_cents) = update.apply(current.quantity, current.price_cents)?;

        sqlx::query(
            r#"
            UPDATE products
            SET quantity = ?2, price_cents = ?3, updated_at = ?4
            WHERE barcode = ?1
            "#,
        )
        .bind(&barcode)
        .bind(quantity)
        .bind(price_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = Self::fetch(&mut *tx, &barcode)
            .await?
            .ok_or_else(|| DbError::not_found("Product", barcode.as_str()))?;

        tx.commit().await?;

        info!(
            barcode = %barcode,
            from = current.quantity,
            to = updated.quantity,
            "Stock adjusted"
        );
        Ok(updated)
    }

    /// Sets the absolute quantity on hand.
    pub async fn set_quantity(&self, barcode: &str, quantity: i64) -> DbResult<Product> {
        self.adjust_stock(barcode, StockUpdate::set(quantity)).await
    }

    // =========================================================================
    // Queries for reports
    // =========================================================================

    /// Products at or below `threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE quantity <= ?1 ORDER BY quantity, name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Escapes `%`, `_` and `\` for a LIKE pattern with `ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

// =============================================================================
// Tests
// =============================================================================
