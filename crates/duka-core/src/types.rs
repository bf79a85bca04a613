//! # Domain Types
//!
//! Core domain types used throughout Duka POS.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Transaction   │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode (key)  │   │  id (rowid)     │   │  transaction_id │       │
//! │  │  name           │   │  operator       │   │  barcode        │       │
//! │  │  price_cents    │   │  payment_method │   │  name snapshot  │       │
//! │  │  quantity       │   │  total / paid   │   │  unit price     │       │
//! │  │  category       │   │  change/discount│   │  line total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PaymentMethod   │   │      Role       │   │   StockUpdate   │       │
//! │  │  Cash           │   │  Admin          │   │  relative or    │       │
//! │  │  MobileMoney    │   │  Employee       │   │  absolute qty   │       │
//! │  │  Card           │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! A product is identified by its barcode alone, normalised with
//! [`normalize_barcode`](crate::validation::normalize_barcode). Saving a product
//! with an existing barcode replaces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_price_cents, validate_stock_level, ValidationResult};
use crate::validation::normalize_barcode;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Normalised barcode (trimmed, lower-case). Sole identity key.
    pub barcode: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price in minor units. Never negative.
    pub price_cents: i64,

    /// Quantity on hand. Never negative.
    pub quantity: i64,

    /// Category label.
    pub category: String,

    /// Optional path to a product image.
    pub image_path: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with a normalised barcode and trimmed labels.
    pub fn new(
        barcode: &str,
        name: &str,
        price: Money,
        quantity: i64,
        category: &str,
    ) -> Self {
        let now = Utc::now();
        Product {
            barcode: normalize_barcode(barcode),
            name: name.trim().to_string(),
            price_cents: price.cents(),
            quantity,
            category: category.trim().to_string(),
            image_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the stock value (price × quantity on hand).
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }

    /// Checks if the product is at or below the low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Mobile money transfer; needs the transfer reference.
    MobileMoney,
    /// Card on an external terminal; needs the approval reference.
    Card,
}

impl PaymentMethod {
    /// All methods, in the order the register offers them.
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::MobileMoney,
        PaymentMethod::Card,
    ];

    /// Non-cash payments must carry a reference.
    #[inline]
    pub const fn requires_reference(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::MobileMoney => "MobileMoney",
            PaymentMethod::Card => "Card",
        };
        f.write_str(label)
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "mobilemoney" | "mobile" => Ok(PaymentMethod::MobileMoney),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed checkout header.
///
/// Created atomically with its [`SaleLine`] rows and never updated.
/// At most one of `change_cents` / `discount_cents` is positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub operator_id: i64,
    /// Operator username at time of sale (frozen).
    pub operator_name: String,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub change_cents: i64,
    pub discount_cents: i64,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// One product sold.
///
/// Uses the snapshot pattern: name and price are frozen at sale time.
/// `transaction_id` is `None` for rows written by quick-sell mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub transaction_id: Option<i64>,
    pub barcode: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price_cents × quantity
    pub line_total_cents: i64,
    pub sold_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Users
// =============================================================================

/// Operator role.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shop owner: catalog, reports, staff management.
    Admin,
    /// Salesperson: register only.
    Employee,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Employee => f.write_str("employee"),
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "owner" => Ok(Role::Admin),
            "employee" | "salesperson" => Ok(Role::Employee),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".to_string(), "employee".to_string()],
            }),
        }
    }
}

/// An operator account (credentials are never loaded into this type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Shop identity printed at the top of receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShopInfo {
    pub shop_name: String,
    pub tagline: String,
    pub address: String,
    pub contact: String,
}

impl Default for ShopInfo {
    fn default() -> Self {
        ShopInfo {
            shop_name: "Unknown Shop".to_string(),
            tagline: String::new(),
            address: String::new(),
            contact: String::new(),
        }
    }
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// A manual stock / price correction from the catalog screen.
///
/// `new_quantity` wins over `quantity_change` when both are given. The
/// resulting quantity is clamped at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub quantity_change: Option<i64>,
    pub new_quantity: Option<i64>,
    pub new_price_cents: Option<i64>,
}

impl StockUpdate {
    /// Relative change (e.g. +24 on delivery, -1 for breakage).
    pub fn change(delta: i64) -> Self {
        StockUpdate {
            quantity_change: Some(delta),
            ..Default::default()
        }
    }

    /// Absolute stock count (e.g. after a stock take).
    pub fn set(quantity: i64) -> Self {
        StockUpdate {
            new_quantity: Some(quantity),
            ..Default::default()
        }
    }

    /// Also reprice the product.
    pub fn with_price(mut self, price: Money) -> Self {
        self.new_price_cents = Some(price.cents());
        self
    }

    /// Returns `(quantity, price_cents)` after applying to current values.
    ///
    /// Fails when the result would exceed the stock or price limits.
    pub fn apply(
        &self,
        current_quantity: i64,
        current_price_cents: i64,
    ) -> ValidationResult<(i64, i64)> {
        let quantity = self
            .new_quantity
            .unwrap_or_else(|| current_quantity.saturating_add(self.quantity_change.unwrap_or(0)))
            .max(0);
        let price = self.new_price_cents.unwrap_or(current_price_cents);
        validate_stock_level(quantity)?;
        validate_price_cents(price)?;
        Ok((quantity, price))
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Headline figures for the owner's dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub product_count: i64,
    /// Sales recorded since the start of the current month.
    pub monthly_sales_cents: i64,
    /// Σ price × quantity over the catalog.
    pub inventory_value_cents: i64,
    pub low_stock_count: i64,
}

/// Units and revenue for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub items_sold: i64,
    pub total_cents: i64,
}

/// One entry of the recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub name: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ProductAdded,
    Sale,
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ActivityKind::ProductAdded => "Product Added",
            ActivityKind::Sale => "Sale",
        };
        write!(f, "{} ➤ {} ({})", kind, self.name, self.at.format("%Y-%m-%d %H:%M"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_new_normalises_identity() {
        let p = Product::new("  ABC-001 ", " Sugar 1kg ", Money::from_major(1000), 10, " Grocery ");
        assert_eq!(p.barcode, "abc-001");
        assert_eq!(p.name, "Sugar 1kg");
        assert_eq!(p.category, "Grocery");
        assert_eq!(p.stock_value(), Money::from_major(10_000));
        assert!(!p.is_low_stock(5));
    }

    #[test]
    fn test_payment_method_parse_and_display() {
        assert_eq!("Cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(
            "mobile money".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::MobileMoney
        );
        assert_eq!(
            "MobileMoney".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::MobileMoney
        );
        assert_eq!("CARD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());

        assert_eq!(PaymentMethod::MobileMoney.to_string(), "MobileMoney");
        assert!(!PaymentMethod::Cash.requires_reference());
        assert!(PaymentMethod::Card.requires_reference());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_stock_update_apply() {
        assert_eq!(StockUpdate::change(5).apply(10, 100).unwrap(), (15, 100));
        assert_eq!(StockUpdate::change(-20).apply(10, 100).unwrap(), (0, 100));
        assert_eq!(StockUpdate::set(3).apply(10, 100).unwrap(), (3, 100));
        assert_eq!(
            StockUpdate::set(7)
                .with_price(Money::from_cents(250))
                .apply(10, 100)
                .unwrap(),
            (7, 250)
        );

        let both = StockUpdate {
            quantity_change: Some(5),
            new_quantity: Some(1),
            new_price_cents: None,
        };
        assert_eq!(both.apply(10, 100).unwrap(), (1, 100));
    }

    #[test]
    fn test_stock_update_rejects_out_of_range_results() {
        assert!(matches!(
            StockUpdate::change(i64::MAX).apply(5, 100),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(StockUpdate::change(i64::MIN).apply(5, 100).unwrap(), (0, 100));
        assert!(StockUpdate::set(5)
            .with_price(Money::from_cents(i64::MAX))
            .apply(5, 100)
            .is_err());
    }
}
