//! # Transaction Repository
//!
//! Checkout headers and their sale lines.
//!
//! ## Snapshot Pattern
//! Sale lines copy barcode, name and unit price at sale time. History stays
//! correct after the product is repriced, renamed or deleted.
//!
//! `insert_header` and `insert_line` are generic over the executor so the
//! checkout runs them inside its own SQL transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;
use tracing::debug;

use duka_core::cart::CartLine;
use duka_core::checkout::Settlement;
use duka_core::{PaymentMethod, SaleLine, Transaction};

use crate::error::DbResult;

const TRANSACTION_COLUMNS: &str = "id, created_at, operator_id, operator_name, customer_name, \
     payment_method, payment_reference, total_cents, paid_cents, change_cents, discount_cents";

pub(crate) const SALE_LINE_COLUMNS: &str = "id, transaction_id, barcode, product_name, quantity, \
     unit_price_cents, line_total_cents, sold_at";

/// A header about to be written.
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub created_at: DateTime<Utc>,
    pub operator_id: i64,
    pub operator_name: &'a str,
    pub customer_name: Option<&'a str>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<&'a str>,
    pub settlement: Settlement,
}

/// A header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub lines: Vec<SaleLine>,
}

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a header and returns its generated id.
    pub async fn insert_header<'e, E>(executor: E, header: &NewTransaction<'_>) -> DbResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        let s = &header.settlement;
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                created_at, operator_id, operator_name, customer_name,
                payment_method, payment_reference,
                total_cents, paid_cents, change_cents, discount_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(header.created_at)
        .bind(header.operator_id)
        .bind(header.operator_name)
        .bind(header.customer_name)
        .bind(header.payment_method)
        .bind(header.payment_reference)
        .bind(s.total.cents())
        .bind(s.paid.cents())
        .bind(s.change.cents())
        .bind(s.discount.cents())
        .execute(executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!(transaction_id = id, total = s.total.cents(), "Transaction header inserted");
        Ok(id)
    }

    /// Inserts one sale line. `transaction_id` is `None` for quick-sell rows.
    pub async fn insert_line<'e, E>(
        executor: E,
        transaction_id: Option<i64>,
        line: &CartLine,
        sold_at: DateTime<Utc>,
    ) -> DbResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                transaction_id, barcode, product_name, quantity,
                unit_price_cents, line_total_cents, sold_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(transaction_id)
        .bind(&line.barcode)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.subtotal().cents())
        .bind(sold_at)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(transaction)
    }

    /// Lines of a transaction in insertion order.
    pub async fn lines(&self, transaction_id: i64) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {SALE_LINE_COLUMNS} FROM sales WHERE transaction_id = ?1 ORDER BY id"
        );
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Header plus lines, `None` if the id is unknown.
    pub async fn detail(&self, id: i64) -> DbResult<Option<TransactionDetail>> {
        let Some(transaction) = self.get(id).await? else {
            return Ok(None);
        };
        let lines = self.lines(id).await?;
        Ok(Some(TransactionDetail { transaction, lines }))
    }

    /// Most recent transactions first.
    pub async fn history(&self, limit: u32) -> DbResult<Vec<Transaction>> {
        let sql =
            format!("SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY id DESC LIMIT ?1");
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(transactions)
    }

    /// Transactions in `[from, to)`, oldest first.
    pub async fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE created_at >= ?1 AND created_at < ?2 ORDER BY id"
        );
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(transactions)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use duka_core::Money;

    fn line(barcode: &str, price_cents: i64, quantity: i64) -> CartLine {
        CartLine {
            barcode: barcode.to_string(),
            name: format!("Item {barcode}"),
            unit_price_cents: price_cents,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_header_and_lines_round_trip_through_detail() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let header = NewTransaction {
            created_at: now,
            operator_id: 1,
            operator_name: "owner",
            customer_name: Some("Baraka"),
            payment_method: PaymentMethod::MobileMoney,
            payment_reference: Some("MM-1"),
            settlement: Settlement::compute(Money::from_cents(2500), Money::from_cents(3000)),
        };

        let id = TransactionRepository::insert_header(db.pool(), &header)
            .await
            .unwrap();
        TransactionRepository::insert_line(db.pool(), Some(id), &line("a1", 1000, 2), now)
            .await
            .unwrap();
        TransactionRepository::insert_line(db.pool(), Some(id), &line("b2", 500, 1), now)
            .await
            .unwrap();

        let detail = db.transactions().detail(id).await.unwrap().unwrap();
        assert_eq!(detail.transaction.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(detail.transaction.change(), Money::from_cents(500));
        assert_eq!(detail.transaction.discount(), Money::zero());
        assert_eq!(detail.transaction.created_at, now);
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.lines[0].line_total_cents, 2000);
        assert_eq!(detail.lines[1].transaction_id, Some(id));

        assert!(db.transactions().detail(id + 1).await.unwrap().is_none());
        assert_eq!(db.transactions().history(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schema_rejects_reference_less_card_payment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let header = NewTransaction {
            created_at: Utc::now(),
            operator_id: 1,
            operator_name: "owner",
            customer_name: None,
            payment_method: PaymentMethod::Card,
            payment_reference: None,
            settlement: Settlement::compute(Money::from_cents(100), Money::from_cents(100)),
        };

        assert!(TransactionRepository::insert_header(db.pool(), &header)
            .await
            .is_err());
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }
}
