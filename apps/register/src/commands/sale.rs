//! # Sale Commands
//!
//! Checkout, quick-sell and sale history.
//!
//! ## Checkout Flow
//! ```text
//! checkout()
//!   │
//!   ├── session.current()          UNAUTHORIZED if nobody signed in
//!   ├── cart.begin_checkout()      CHECKOUT_IN_PROGRESS if one is running
//!   ├── cart empty?                CART_ERROR, before any payment text is read
//!   ├── Payment::parse()           PAYMENT_ERROR / VALIDATION_ERROR
//!   ├── db.checkout(snapshot)      one SQL transaction; nothing written on error
//!   ├── guard.complete()           cart cleared only after commit
//!   └── emitter.emit(receipt)      failure is logged, the sale stands
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use duka_core::cart::{Cart, CartLine};
use duka_core::checkout::{CompletedSale, Payment, Settlement};
use duka_core::receipt::{ReceiptData, ReceiptEmitter};
use duka_core::{CoreError, Money, SaleLine, ShopInfo, Transaction};
use duka_db::TransactionDetail;

use crate::error::ApiError;
use crate::receipt::PlainTextReceipt;
use crate::state::{CartState, DbState, SessionState, SettingsState};

const DEFAULT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// "cash", "mobile_money", "card" (and common spellings)
    pub method: String,
    /// Operator-entered amount, e.g. "5,000" or "2500.50"
    pub amount_paid: String,
    pub reference: Option<String>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub transaction_id: i64,
    pub receipt_number: String,
    pub total: Money,
    pub paid: Money,
    pub discount: Money,
    pub change: Money,
    pub items_sold: i64,
    pub receipt: ReceiptData,
    /// `None` when the receipt could not be written.
    pub receipt_path: Option<PathBuf>,
}

/// Commits the cart and writes a plain-text receipt.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    settings: &SettingsState,
    request: CheckoutRequest,
) -> Result<CheckoutResponse, ApiError> {
    let emitter = receipt_emitter(settings)?;
    checkout_with(db, cart, session, &emitter, request).await
}

/// Commits the cart and hands the receipt to `emitter`.
pub async fn checkout_with<E>(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    emitter: &E,
    request: CheckoutRequest,
) -> Result<CheckoutResponse, ApiError>
where
    E: ReceiptEmitter<Output = PathBuf>,
{
    let operator = session.current()?;
    let guard = cart.begin_checkout()?;

    debug!(
        operator = %operator.username,
        method = %request.method,
        "checkout command"
    );

    if cart.with_cart(Cart::is_empty) {
        return Err(CoreError::EmptyCart.into());
    }

    let payment = Payment::parse(
        &request.method,
        &request.amount_paid,
        request.reference.as_deref(),
    )?;
    let customer = request
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let snapshot = cart.snapshot();
    let sale = db
        .inner()
        .checkout(&operator, &snapshot, &payment, customer)
        .await?;

    guard.complete();

    info!(
        transaction_id = sale.transaction_id,
        total = %sale.settlement.total,
        items = sale.items_sold(),
        "Checkout completed"
    );

    let receipt = ReceiptData::from_sale(&sale, &shop_or_default(db).await);
    let receipt_path = match emitter.emit(&receipt) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(transaction_id = sale.transaction_id, "Receipt not written: {}", e);
            None
        }
    };

    Ok(CheckoutResponse {
        transaction_id: sale.transaction_id,
        receipt_number: receipt.receipt_number.clone(),
        total: sale.settlement.total,
        paid: sale.settlement.paid,
        discount: sale.settlement.discount,
        change: sale.settlement.change,
        items_sold: sale.items_sold(),
        receipt,
        receipt_path,
    })
}

/// Sells one product immediately, outside the cart.
pub async fn quick_sell(
    db: &DbState,
    session: &SessionState,
    barcode: &str,
    quantity: i64,
) -> Result<SaleLine, ApiError> {
    session.current()?;
    Ok(db.inner().sales().quick_sell(barcode, quantity).await?)
}

/// Reverses the latest quick sale of `barcode`.
pub async fn undo_quick_sale(
    db: &DbState,
    session: &SessionState,
    barcode: &str,
) -> Result<SaleLine, ApiError> {
    session.current()?;
    Ok(db.inner().sales().undo_quick_sale(barcode).await?)
}

/// Latest transactions, newest first.
pub async fn transaction_history(
    db: &DbState,
    limit: Option<u32>,
) -> Result<Vec<Transaction>, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 500);
    Ok(db.inner().transactions().history(limit).await?)
}

pub async fn transaction_detail(db: &DbState, id: i64) -> Result<TransactionDetail, ApiError> {
    db.inner()
        .transactions()
        .detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction", &id.to_string()))
}

/// Writes the receipt of a past transaction again.
pub async fn reprint_receipt(
    db: &DbState,
    settings: &SettingsState,
    id: i64,
) -> Result<CheckoutResponse, ApiError> {
    let detail = transaction_detail(db, id).await?;
    let sale = completed_from_detail(&detail);

    let receipt = ReceiptData::from_sale(&sale, &shop_or_default(db).await);
    let path = receipt_emitter(settings)?
        .emit(&receipt)
        .map_err(|e| ApiError::internal(format!("Could not write receipt: {}", e)))?;

    Ok(CheckoutResponse {
        transaction_id: sale.transaction_id,
        receipt_number: receipt.receipt_number.clone(),
        total: sale.settlement.total,
        paid: sale.settlement.paid,
        discount: sale.settlement.discount,
        change: sale.settlement.change,
        items_sold: sale.items_sold(),
        receipt,
        receipt_path: Some(path),
    })
}

fn receipt_emitter(settings: &SettingsState) -> Result<PlainTextReceipt, ApiError> {
    let current = settings.get();
    Ok(PlainTextReceipt::new(
        current.receipts_dir()?,
        current.currency_code,
    ))
}

async fn shop_or_default(db: &DbState) -> ShopInfo {
    db.receipt_shop().await.unwrap_or_else(|e| {
        warn!("Shop info unavailable for receipt: {}", e);
        ShopInfo::default()
    })
}

fn completed_from_detail(detail: &TransactionDetail) -> CompletedSale {
    let tx = &detail.transaction;
    CompletedSale {
        transaction_id: tx.id,
        created_at: tx.created_at,
        operator_id: tx.operator_id,
        operator_name: tx.operator_name.clone(),
        customer_name: tx.customer_name.clone(),
        payment_method: tx.payment_method,
        payment_reference: tx.payment_reference.clone(),
        settlement: Settlement {
            total: tx.total(),
            paid: tx.paid(),
            discount: tx.discount(),
            change: tx.change(),
        },
        lines: detail
            .lines
            .iter()
            .map(|l| CartLine {
                barcode: l.barcode.clone(),
                name: l.product_name.clone(),
                unit_price_cents: l.unit_price_cents,
                quantity: l.quantity,
            })
            .collect(),
    }
}
