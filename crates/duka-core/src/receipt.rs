//! # Receipt Data
//!
//! Everything a receipt shows, assembled from a [`CompletedSale`] and the
//! shop's identity. Rendering is the job of a [`ReceiptEmitter`]; this crate
//! never formats a document.
//!
//! ## Flow
//! ```text
//! CompletedSale ──┐
//!                 ├──► ReceiptData::from_sale() ──► ReceiptEmitter::emit()
//! ShopInfo ───────┘                                   │
//!                                                     ├── plain-text file
//!                                                     └── (printer, PDF, ...)
//! ```
//!
//! ## Numbering
//! - Receipt number: `YYYYMMDD-NNNNNN` (sale date + zero-padded transaction id)
//! - File name: `Receipt_<id>_<yyyyMMdd_HHmmss>.txt`

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::checkout::CompletedSale;
use crate::money::Money;
use crate::types::{PaymentMethod, ShopInfo};

/// One printed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// The data handed to a receipt emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub shop: ShopInfo,
    pub receipt_number: String,
    pub transaction_id: i64,
    pub issued_at: DateTime<Local>,
    pub operator_name: String,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub discount: Money,
    pub paid: Money,
    pub change: Money,
}

impl ReceiptData {
    /// Builds receipt data in local shop time.
    pub fn from_sale(sale: &CompletedSale, shop: &ShopInfo) -> Self {
        let issued_at = sale.created_at.with_timezone(&Local);

        ReceiptData {
            shop: shop.clone(),
            receipt_number: receipt_number(sale.transaction_id, &issued_at),
            transaction_id: sale.transaction_id,
            issued_at,
            operator_name: sale.operator_name.clone(),
            customer_name: sale.customer_name.clone(),
            payment_method: sale.payment_method,
            payment_reference: sale.payment_reference.clone(),
            lines: sale
                .lines
                .iter()
                .map(|l| ReceiptLine {
                    name: l.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price(),
                    line_total: l.subtotal(),
                })
                .collect(),
            total: sale.settlement.total,
            discount: sale.settlement.discount,
            paid: sale.settlement.paid,
            change: sale.settlement.change,
        }
    }

    /// File name for this receipt.
    pub fn file_name(&self) -> String {
        receipt_file_name(self.transaction_id, &self.issued_at)
    }

    /// Customer line, falling back to "Walk-in".
    pub fn customer_display(&self) -> &str {
        self.customer_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Walk-in")
    }
}

/// `YYYYMMDD-NNNNNN`
pub fn receipt_number<Tz>(transaction_id: i64, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}-{:06}", at.format("%Y%m%d"), transaction_id)
}

/// `Receipt_<id>_<yyyyMMdd_HHmmss>.txt`
pub fn receipt_file_name<Tz>(transaction_id: i64, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("Receipt_{}_{}.txt", transaction_id, at.format("%Y%m%d_%H%M%S"))
}

// =============================================================================
// Emitter Seam
// =============================================================================

/// Produces a document from receipt data.
///
/// Implementations decide the medium (text file, printer, PDF). A failing
/// emitter never affects the committed sale.
pub trait ReceiptEmitter {
    /// What the emitter produced, e.g. a file path.
    type Output;
    type Error: std::error::Error;

    fn emit(&self, receipt: &ReceiptData) -> Result<Self::Output, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::checkout::Settlement;
    use crate::types::Product;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::convert::Infallible;

    fn sale() -> CompletedSale {
        let mut cart = Cart::new();
        cart.add_item(
            &Product::new("A001", "Sugar 1kg", Money::from_major(1000), 10, "Grocery"),
            2,
        )
        .unwrap();

        CompletedSale {
            transaction_id: 42,
            created_at: Utc::now(),
            operator_id: 1,
            operator_name: "owner".to_string(),
            customer_name: Some("  ".to_string()),
            payment_method: PaymentMethod::Cash,
            payment_reference: None,
            settlement: Settlement::compute(cart.total(), Money::from_major(2500)),
            lines: cart.lines().to_vec(),
        }
    }

    #[test]
    fn test_receipt_number_and_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(receipt_number(42, &at), "20240309-000042");
        assert_eq!(receipt_file_name(42, &at), "Receipt_42_20240309_140507.txt");
        assert_eq!(receipt_number(1_234_567, &at), "20240309-1234567");
    }

    #[test]
    fn test_from_sale() {
        let data = ReceiptData::from_sale(&sale(), &ShopInfo::default());

        assert_eq!(data.lines.len(), 1);
        assert_eq!(data.lines[0].line_total, Money::from_major(2000));
        assert_eq!(data.total, Money::from_major(2000));
        assert_eq!(data.change, Money::from_major(500));
        assert!(data.discount.is_zero());
        assert!(data.receipt_number.ends_with("-000042"));
        assert!(data.file_name().starts_with("Receipt_42_"));
        assert_eq!(data.customer_display(), "Walk-in");
        assert_eq!(data.shop.shop_name, "Unknown Shop");
    }

    struct Collecting(RefCell<Vec<String>>);

    impl ReceiptEmitter for Collecting {
        type Output = usize;
        type Error = Infallible;

        fn emit(&self, receipt: &ReceiptData) -> Result<usize, Infallible> {
            let mut seen = self.0.borrow_mut();
            seen.push(receipt.receipt_number.clone());
            Ok(seen.len())
        }
    }

    #[test]
    fn test_emitter_receives_data() {
        let emitter = Collecting(RefCell::new(Vec::new()));
        let data = ReceiptData::from_sale(&sale(), &ShopInfo::default());

        assert_eq!(emitter.emit(&data).unwrap(), 1);
        assert_eq!(emitter.0.borrow()[0], data.receipt_number);
    }
}
