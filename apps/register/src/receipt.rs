//! # Plain-Text Receipts
//!
//! Writes each completed sale to `<receipts_dir>/Receipt_<id>_<stamp>.txt`.
//!
//! ```text
//!               Mama Duka
//!            Fresh every day
//! ----------------------------------------
//! Receipt:  20261019-000042
//! Date:     2026-10-19 14:03
//! Cashier:  amina
//! Customer: Walk-in
//! ----------------------------------------
//! Sugar 1kg
//!   3 x 1,000.00                  3,000.00
//! ----------------------------------------
//! TOTAL                      TZS 3,000.00
//! ...
//! ```

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use duka_core::receipt::{ReceiptData, ReceiptEmitter};
use duka_core::{Money, PaymentMethod};
use tracing::info;

const DEFAULT_WIDTH: usize = 40;

#[derive(Debug, Clone)]
pub struct PlainTextReceipt {
    dir: PathBuf,
    currency_code: String,
    width: usize,
}

impl PlainTextReceipt {
    pub fn new(dir: impl Into<PathBuf>, currency_code: impl Into<String>) -> Self {
        PlainTextReceipt {
            dir: dir.into(),
            currency_code: currency_code.into(),
            width: DEFAULT_WIDTH,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(24);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Renders the receipt body.
    pub fn render(&self, receipt: &ReceiptData) -> String {
        let mut out = String::new();
        let rule = "-".repeat(self.width);

        for header in [
            receipt.shop.shop_name.as_str(),
            receipt.shop.tagline.as_str(),
            receipt.shop.address.as_str(),
            receipt.shop.contact.as_str(),
        ] {
            if !header.trim().is_empty() {
                let _ = writeln!(out, "{}", self.center(header.trim()));
            }
        }

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Receipt:  {}", receipt.receipt_number);
        let _ = writeln!(out, "Date:     {}", receipt.issued_at.format("%Y-%m-%d %H:%M"));
        let _ = writeln!(out, "Cashier:  {}", receipt.operator_name);
        let _ = writeln!(out, "Customer: {}", receipt.customer_display());
        let _ = writeln!(out, "{rule}");

        for line in &receipt.lines {
            let _ = writeln!(out, "{}", line.name);
            let qty = format!("  {} x {}", line.quantity, line.unit_price);
            let _ = writeln!(out, "{}", self.columns(&qty, &line.line_total.to_string()));
        }

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", self.columns("TOTAL", &self.money(receipt.total)));
        if receipt.discount.is_positive() {
            let _ = writeln!(out, "{}", self.columns("DISCOUNT", &self.money(receipt.discount)));
        }
        let _ = writeln!(out, "{}", self.columns("PAID", &self.money(receipt.paid)));
        let _ = writeln!(out, "{}", self.columns("CHANGE", &self.money(receipt.change)));
        let _ = writeln!(out, "{rule}");

        let _ = writeln!(out, "Payment:  {}", method_label(receipt.payment_method));
        if let Some(reference) = &receipt.payment_reference {
            let _ = writeln!(out, "Ref:      {}", reference);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.center("Thank you for shopping with us!"));
        out
    }

    fn money(&self, amount: Money) -> String {
        format!("{} {}", self.currency_code, amount)
    }

    fn center(&self, text: &str) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return text.to_string();
        }
        format!("{}{}", " ".repeat((self.width - len) / 2), text)
    }

    fn columns(&self, left: &str, right: &str) -> String {
        let used = left.chars().count() + right.chars().count();
        let gap = self.width.saturating_sub(used).max(1);
        format!("{}{}{}", left, " ".repeat(gap), right)
    }
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::MobileMoney => "Mobile Money",
        PaymentMethod::Card => "Card",
    }
}

impl ReceiptEmitter for PlainTextReceipt {
    type Output = PathBuf;
    type Error = io::Error;

    fn emit(&self, receipt: &ReceiptData) -> Result<PathBuf, io::Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(receipt.file_name());
        fs::write(&path, self.render(receipt))?;

        info!(
            transaction_id = receipt.transaction_id,
            path = %path.display(),
            "Receipt saved"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use duka_core::cart::CartLine;
    use duka_core::checkout::{CompletedSale, Settlement};
    use duka_core::ShopInfo;
    use tempfile::tempdir;

    fn sale(paid: i64, method: PaymentMethod, reference: Option<&str>) -> CompletedSale {
        let lines = vec![
            CartLine {
                barcode: "a001".into(),
                name: "Sugar 1kg".into(),
                unit_price_cents: Money::from_major(1000).cents(),
                quantity: 3,
            },
            CartLine {
                barcode: "b002".into(),
                name: "Salt 500g".into(),
                unit_price_cents: Money::from_major(200).cents(),
                quantity: 1,
            },
        ];
        CompletedSale {
            transaction_id: 42,
            created_at: Utc.with_ymd_and_hms(2026, 10, 19, 11, 3, 0).unwrap(),
            operator_id: 2,
            operator_name: "amina".into(),
            customer_name: None,
            payment_method: method,
            payment_reference: reference.map(str::to_string),
            settlement: Settlement::compute(Money::from_major(3200), Money::from_major(paid)),
            lines,
        }
    }

    fn shop() -> ShopInfo {
        ShopInfo {
            shop_name: "Mama Duka".into(),
            tagline: "Fresh every day".into(),
            address: String::new(),
            contact: "0712 000 000".into(),
        }
    }

    #[test]
    fn test_render_cash_with_change() {
        let receipt = ReceiptData::from_sale(&sale(5000, PaymentMethod::Cash, None), &shop());
        let text = PlainTextReceipt::new("unused", "TZS").render(&receipt);

        assert!(text.contains("Mama Duka"));
        assert!(text.contains("Customer: Walk-in"));
        assert!(text.contains("  3 x 1,000.00"));
        assert!(text.contains("TZS 3,200.00"));
        assert!(text.contains("TZS 1,800.00"));
        assert!(!text.contains("DISCOUNT"));
        assert!(!text.contains("Ref:"));
    }

    #[test]
    fn test_render_discount_and_reference() {
        let receipt = ReceiptData::from_sale(
            &sale(3000, PaymentMethod::MobileMoney, Some("MP123")),
            &shop(),
        );
        let text = PlainTextReceipt::new("unused", "TZS").render(&receipt);

        assert!(text.contains("DISCOUNT"));
        assert!(text.contains("TZS 200.00"));
        assert!(text.contains("Payment:  Mobile Money"));
        assert!(text.contains("Ref:      MP123"));
    }

    #[test]
    fn test_emit_writes_named_file() {
        let dir = tempdir().unwrap();
        let emitter = PlainTextReceipt::new(dir.path().join("receipts"), "TZS");
        let receipt = ReceiptData::from_sale(&sale(3200, PaymentMethod::Cash, None), &shop());

        let path = emitter.emit(&receipt).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Receipt_42_"));
        assert!(name.ends_with(".txt"));
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains(&receipt.receipt_number));
    }
}
