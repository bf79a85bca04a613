//! # Checkout Processor
//!
//! Turns a cart into a durable transaction as one SQL transaction.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_checkout(cart, payment)      EmptyCart / InvalidAmount /      │
//! │       │                                MissingPaymentReference          │
//! │       ▼                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────────┐  │
//! │  │ for each line:                                                   │  │
//! │  │    guarded decrement ── 0 rows ──► re-read stock                 │  │
//! │  │                                    ├── gone   → ProductNotFound  │  │
//! │  │                                    └── short  → StockChanged     │  │
//! │  │ settlement = compute(total, paid)                                │  │
//! │  │ INSERT header → id                                               │  │
//! │  │ INSERT line × n (transaction_id = id)                            │  │
//! │  COMMIT ◄───────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: SQLite rolls back      │
//! │  every decrement and insert. There is no manual compensation path.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is the first statement of the transaction, so the write
//! lock is taken up front and a concurrent checkout waits (`busy_timeout`)
//! instead of working from a stale snapshot.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use duka_core::cart::Cart;
use duka_core::checkout::{validate_checkout, CompletedSale, Payment, Settlement};
use duka_core::session::OperatorContext;
use duka_core::CoreError;

use crate::error::{CheckoutError, CheckoutResult};
use crate::repository::product::ProductRepository;
use crate::repository::transaction::{NewTransaction, TransactionRepository};

/// Commits carts against one database.
#[derive(Debug, Clone)]
pub struct CheckoutProcessor {
    pool: SqlitePool,
}

impl CheckoutProcessor {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutProcessor { pool }
    }

    /// Commits `cart` for `operator`.
    ///
    /// The cart is only read. Clearing it after success is the caller's job,
    /// so a failed checkout leaves it intact for retry.
    pub async fn commit(
        &self,
        operator: &OperatorContext,
        cart: &Cart,
        payment: &Payment,
        customer_name: Option<&str>,
    ) -> CheckoutResult<CompletedSale> {
        validate_checkout(cart, payment)?;

        let customer_name = customer_name.map(str::trim).filter(|c| !c.is_empty());
        let payment_reference = if payment.method.requires_reference() {
            payment.reference()
        } else {
            None
        };

        let mut tx = self.pool.begin().await?;

        for line in cart.lines() {
            let taken =
                ProductRepository::guarded_decrement(&mut *tx, &line.barcode, line.quantity)
                    .await?;
            if taken {
                continue;
            }

            let err = match ProductRepository::stock_level(&mut *tx, &line.barcode).await? {
                None => CoreError::ProductNotFound(line.barcode.clone()),
                Some(available) => CoreError::StockChanged {
                    name: line.name.clone(),
                    available,
                    requested: line.quantity,
                },
            };
            warn!(barcode = %line.barcode, error = %err, "Checkout rejected");
            return Err(CheckoutError::Rejected(err));
        }

        let settlement = Settlement::compute(cart.total(), payment.amount_paid);
        let created_at = Utc::now();

        let header = NewTransaction {
            created_at,
            operator_id: operator.user_id,
            operator_name: &operator.username,
            customer_name,
            payment_method: payment.method,
            payment_reference,
            settlement,
        };
        let transaction_id = TransactionRepository::insert_header(&mut *tx, &header).await?;

        for line in cart.lines() {
            TransactionRepository::insert_line(&mut *tx, Some(transaction_id), line, created_at)
                .await?;
        }

        tx.commit().await?;

        info!(
            transaction_id,
            operator = %operator.username,
            lines = cart.item_count(),
            total = settlement.total.cents(),
            discount = settlement.discount.cents(),
            change = settlement.change.cents(),
            "Checkout committed"
        );

        Ok(CompletedSale {
            transaction_id,
            created_at,
            operator_id: operator.user_id,
            operator_name: operator.username.clone(),
            customer_name: customer_name.map(str::to_string),
            payment_method: payment.method,
            payment_reference: payment_reference.map(str::to_string),
            settlement,
            lines: cart.lines().to_vec(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use duka_core::{Money, PaymentMethod, Product, Role};

    fn operator() -> OperatorContext {
        OperatorContext::new(1, "owner", Role::Admin)
    }

    async fn shop_with(products: &[(&str, i64, i64)]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (barcode, price_cents, stock) in products {
            db.products()
                .upsert(&Product::new(
                    barcode,
                    &format!("Item {barcode}"),
                    Money::from_cents(*price_cents),
                    *stock,
                    "General",
                ))
                .await
                .unwrap();
        }
        db
    }

    async fn cart_of(db: &Database, items: &[(&str, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (barcode, qty) in items {
            let product = db.products().get_by_barcode(barcode).await.unwrap().unwrap();
            cart.add_item(&product, *qty).unwrap();
        }
        cart
    }

    async fn stock(db: &Database, barcode: &str) -> i64 {
        db.products().current_stock(barcode).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_exact_cash_payment() {
        let db = shop_with(&[("A001", 1000, 10)]).await;
        let cart = cart_of(&db, &[("A001", 3)]).await;
        assert_eq!(cart.total(), Money::from_cents(3000));

        let sale = db
            .checkout(&operator(), &cart, &Payment::cash(Money::from_cents(3000)), None)
            .await
            .unwrap();

        assert_eq!(stock(&db, "A001").await, 7);
        assert!(sale.settlement.discount.is_zero());
        assert!(sale.settlement.change.is_zero());

        let detail = db.transactions().detail(sale.transaction_id).await.unwrap().unwrap();
        assert_eq!(detail.transaction.total_cents, 3000);
        assert_eq!(detail.transaction.operator_name, "owner");
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_underpayment_becomes_discount() {
        let db = shop_with(&[("A001", 1000, 10)]).await;
        let cart = cart_of(&db, &[("A001", 2)]).await;

        let sale = db
            .checkout(&operator(), &cart, &Payment::cash(Money::from_cents(1500)), Some("  "))
            .await
            .unwrap();

        assert_eq!(sale.settlement.discount, Money::from_cents(500));
        assert!(sale.settlement.change.is_zero());
        assert_eq!(sale.customer_name, None);
        assert_eq!(stock(&db, "A001").await, 8);

        let tx = db.transactions().get(sale.transaction_id).await.unwrap().unwrap();
        assert_eq!(tx.discount_cents, 500);
        assert_eq!(tx.change_cents, 0);
    }

    #[tokio::test]
    async fn test_empty_cart_touches_nothing() {
        let db = shop_with(&[("A001", 1000, 10)]).await;

        let err = db
            .checkout(&operator(), &Cart::new(), &Payment::cash(Money::from_cents(1000)), None)
            .await
            .unwrap_err();

        assert_eq!(err.as_rejection(), Some(&CoreError::EmptyCart));
        assert_eq!(stock(&db, "A001").await, 10);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_payment_preconditions() {
        let db = shop_with(&[("A001", 1000, 10)]).await;
        let cart = cart_of(&db, &[("A001", 1)]).await;

        let err = db
            .checkout(&operator(), &cart, &Payment::cash(Money::from_cents(-5)), None)
            .await
            .unwrap_err();
        assert!(matches!(err.as_rejection(), Some(CoreError::InvalidAmount { .. })));

        let card = Payment::new(PaymentMethod::Card, Money::from_cents(1000), None);
        let err = db.checkout(&operator(), &cart, &card, None).await.unwrap_err();
        assert!(matches!(
            err.as_rejection(),
            Some(CoreError::MissingPaymentReference { .. })
        ));

        assert_eq!(stock(&db, "A001").await, 10);

        let card = Payment::new(
            PaymentMethod::Card,
            Money::from_cents(1000),
            Some(" 7781 ".to_string()),
        );
        let sale = db
            .checkout(&operator(), &cart, &card, Some("Baraka"))
            .await
            .unwrap();
        assert_eq!(sale.payment_reference.as_deref(), Some("7781"));
        assert_eq!(sale.customer_name.as_deref(), Some("Baraka"));
    }

    #[tokio::test]
    async fn test_stock_changed_since_scan_rolls_back_every_line() {
        let db = shop_with(&[("A001", 1000, 10), ("B002", 500, 4)]).await;
        let cart = cart_of(&db, &[("A001", 2), ("B002", 3)]).await;

        // Another terminal sells two B002 after the cart was built.
        assert!(db.products().decrement_if_available("B002", 2).await.unwrap());

        let err = db
            .checkout(&operator(), &cart, &Payment::cash(Money::from_cents(3500)), None)
            .await
            .unwrap_err();

        assert_eq!(
            err.as_rejection(),
            Some(&CoreError::StockChanged {
                name: "Item B002".to_string(),
                available: 2,
                requested: 3,
            })
        );
        // A001 was decremented first, then rolled back.
        assert_eq!(stock(&db, "A001").await, 10);
        assert_eq!(stock(&db, "B002").await, 2);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_vanished_product_is_not_found() {
        let db = shop_with(&[("A001", 1000, 10)]).await;
        let cart = cart_of(&db, &[("A001", 1)]).await;
        db.products().delete("A001").await.unwrap();

        let err = db
            .checkout(&operator(), &cart, &Payment::cash(Money::from_cents(1000)), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_rejection(),
            Some(&CoreError::ProductNotFound("a001".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failure_after_decrement_rolls_back() {
        let db = shop_with(&[("A001", 1000, 10)]).await;
        let cart = cart_of(&db, &[("A001", 4)]).await;

        // Fails the header insert, which runs after every decrement.
        sqlx::query(
            "CREATE TRIGGER fail_header BEFORE INSERT ON transactions \
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db
            .checkout(&operator(), &cart, &Payment::cash(Money::from_cents(4000)), None)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Storage(_)));
        assert_eq!(stock(&db, "A001").await, 10);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
        assert!(db.sales().today().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_cannot_oversell() {
        let db = shop_with(&[("A001", 1000, 5)]).await;
        let cart_three = cart_of(&db, &[("A001", 3)]).await;
        let cart_four = cart_of(&db, &[("A001", 4)]).await;

        let op = operator();
        let pay_three = Payment::cash(Money::from_cents(3000));
        let pay_four = Payment::cash(Money::from_cents(4000));

        let (first, second) = tokio::join!(
            db.checkout(&op, &cart_three, &pay_three, None),
            db.checkout(&op, &cart_four, &pay_four, None),
        );

        let succeeded = [first.is_ok(), second.is_ok()];
        assert_eq!(succeeded.iter().filter(|ok| **ok).count(), 1);

        let failure = if first.is_ok() { second } else { first };
        assert!(matches!(
            failure.unwrap_err().as_rejection(),
            Some(CoreError::StockChanged { .. })
        ));

        let remaining = stock(&db, "A001").await;
        assert!(remaining == 2 || remaining == 1, "remaining = {remaining}");
        assert_eq!(db.transactions().count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simultaneous_checkouts_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("duka.db")))
            .await
            .unwrap();

        for round in 0..10 {
            let barcode = format!("R{round:02}");
            db.products()
                .upsert(&Product::new(&barcode, "Milk 500ml", Money::from_cents(1000), 5, "Dairy"))
                .await
                .unwrap();

            let mut handles = Vec::new();
            for qty in [3, 4] {
                let db = db.clone();
                let cart = cart_of(&db, &[(barcode.as_str(), qty)]).await;
                let payment = Payment::cash(Money::from_cents(1000 * qty));
                handles.push(tokio::spawn(async move {
                    db.checkout(&operator(), &cart, &payment, None).await
                }));
            }

            let mut outcomes = Vec::new();
            for handle in handles {
                outcomes.push(handle.await.unwrap());
            }

            let (won, lost): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(Result::is_ok);
            assert_eq!(won.len(), 1, "round {round}");
            let loser = lost.into_iter().next().unwrap().unwrap_err();
            assert!(matches!(
                loser.as_rejection(),
                Some(CoreError::StockChanged { .. })
            ));

            let remaining = stock(&db, &barcode).await;
            assert!(remaining == 2 || remaining == 1, "remaining = {remaining}");
        }

        assert_eq!(db.transactions().count().await.unwrap(), 10);
        db.close().await;
    }
}
