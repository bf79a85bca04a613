//! # Checkout Rules
//!
//! The pure half of checkout: payment preconditions and settlement.
//! The atomic commit (stock decrement, header and line inserts) lives in
//! `duka-db`.
//!
//! ## Settlement
//! ```text
//!   paid < total                     paid >= total
//!   ────────────                     ─────────────
//!   discount = total - paid          discount = 0
//!   change   = 0                     change   = paid - total
//! ```
//!
//! Underpayment is absorbed as a discount rather than rejected. `discount`
//! and `change` are never both positive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;

// =============================================================================
// Payment
// =============================================================================

/// What the customer handed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount_paid: Money,
    /// Mobile-money transfer id or card approval code.
    pub reference: Option<String>,
}

impl Payment {
    /// Cash payment of `amount_paid`.
    pub fn cash(amount_paid: Money) -> Self {
        Payment {
            method: PaymentMethod::Cash,
            amount_paid,
            reference: None,
        }
    }

    /// Payment by any method with an optional reference.
    pub fn new(method: PaymentMethod, amount_paid: Money, reference: Option<String>) -> Self {
        Payment {
            method,
            amount_paid,
            reference,
        }
    }

    /// Builds a payment from operator-entered text.
    ///
    /// An amount that does not parse is an `InvalidAmount`; an unknown method
    /// is a validation error.
    pub fn parse(method: &str, amount_paid: &str, reference: Option<&str>) -> CoreResult<Self> {
        let method: PaymentMethod = method.parse()?;
        let amount_paid = Money::parse(amount_paid)?;
        Ok(Payment::new(method, amount_paid, reference.map(str::to_string)))
    }

    /// Trimmed reference, if non-blank.
    pub fn reference(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Checks amount sign and reference presence.
    pub fn validate(&self) -> CoreResult<()> {
        if self.amount_paid.is_negative() {
            return Err(CoreError::invalid_amount("amount paid cannot be negative"));
        }

        if self.method.requires_reference() && self.reference().is_none() {
            return Err(CoreError::MissingPaymentReference {
                method: self.method.to_string(),
            });
        }

        Ok(())
    }
}

/// Preconditions checked before any storage is touched.
///
/// ## Order
/// 1. `EmptyCart`
/// 2. `InvalidAmount`
/// 3. `MissingPaymentReference`
pub fn validate_checkout(cart: &Cart, payment: &Payment) -> CoreResult<()> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    payment.validate()
}

// =============================================================================
// Settlement
// =============================================================================

/// Total, paid and the resulting discount or change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub total: Money,
    pub paid: Money,
    pub discount: Money,
    pub change: Money,
}

impl Settlement {
    pub fn compute(total: Money, paid: Money) -> Self {
        if paid < total {
            Settlement {
                total,
                paid,
                discount: total - paid,
                change: Money::zero(),
            }
        } else {
            Settlement {
                total,
                paid,
                discount: Money::zero(),
                change: paid - total,
            }
        }
    }
}

// =============================================================================
// Completed Sale
// =============================================================================

/// The result of a committed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSale {
    pub transaction_id: i64,
    pub created_at: DateTime<Utc>,
    pub operator_id: i64,
    pub operator_name: String,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub settlement: Settlement,
    pub lines: Vec<CartLine>,
}

impl CompletedSale {
    pub fn items_sold(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;

    fn cart_with(price_cents: i64, qty: i64) -> Cart {
        let mut cart = Cart::new();
        let p = Product::new("A001", "Sugar 1kg", Money::from_cents(price_cents), 10, "Grocery");
        cart.add_item(&p, qty).unwrap();
        cart
    }

    #[test]
    fn test_settlement_exact_cash() {
        let s = Settlement::compute(Money::from_cents(3000), Money::from_cents(3000));
        assert!(s.discount.is_zero());
        assert!(s.change.is_zero());
    }

    #[test]
    fn test_settlement_underpayment_is_discount() {
        let s = Settlement::compute(Money::from_cents(2000), Money::from_cents(1500));
        assert_eq!(s.discount, Money::from_cents(500));
        assert!(s.change.is_zero());
    }

    #[test]
    fn test_settlement_overpayment_is_change() {
        let s = Settlement::compute(Money::from_cents(2000), Money::from_cents(5000));
        assert!(s.discount.is_zero());
        assert_eq!(s.change, Money::from_cents(3000));
    }

    #[test]
    fn test_discount_and_change_are_exclusive() {
        let amounts = [0, 1, 99, 100, 1500, 2000, 2001, 1_000_000];
        for total in amounts {
            for paid in amounts {
                let s = Settlement::compute(Money::from_cents(total), Money::from_cents(paid));
                assert!(
                    s.discount.is_zero() || s.change.is_zero(),
                    "total={total} paid={paid}"
                );
                assert!(!s.discount.is_negative() && !s.change.is_negative());
                assert_eq!(s.total - s.discount + s.change, s.paid);
            }
        }
    }

    #[test]
    fn test_validate_checkout_empty_cart_first() {
        let payment = Payment::new(PaymentMethod::Card, Money::from_cents(-1), None);
        assert_eq!(
            validate_checkout(&Cart::new(), &payment).unwrap_err(),
            CoreError::EmptyCart
        );
    }

    #[test]
    fn test_validate_checkout_negative_amount() {
        let cart = cart_with(1000, 1);
        let err = validate_checkout(&cart, &Payment::cash(Money::from_cents(-100))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_validate_checkout_reference_rules() {
        let cart = cart_with(1000, 1);

        let blank = Payment::new(
            PaymentMethod::MobileMoney,
            Money::from_major(10),
            Some("   ".to_string()),
        );
        assert_eq!(
            validate_checkout(&cart, &blank).unwrap_err(),
            CoreError::MissingPaymentReference {
                method: "MobileMoney".to_string()
            }
        );

        let card = Payment::new(
            PaymentMethod::Card,
            Money::from_major(10),
            Some(" AUTH-991 ".to_string()),
        );
        assert!(validate_checkout(&cart, &card).is_ok());
        assert_eq!(card.reference(), Some("AUTH-991"));

        assert!(validate_checkout(&cart, &Payment::cash(Money::zero())).is_ok());
    }

    #[test]
    fn test_payment_parse() {
        let p = Payment::parse("mobile money", "1,500", Some("MM123")).unwrap();
        assert_eq!(p.method, PaymentMethod::MobileMoney);
        assert_eq!(p.amount_paid, Money::from_major(1500));

        let err = Payment::parse("cash", "lots", None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));

        let err = Payment::parse("barter", "10", None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
