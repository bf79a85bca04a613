//! # Cart State
//!
//! Holds the active sale's cart and the single-flight checkout guard.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` because several commands may touch
//! it and only one may modify it at a time. The lock is never held across an
//! `.await`: checkout works on a snapshot and clears the cart afterwards.
//!
//! ## Checkout Guard
//! ```text
//! checkout #1 ──► begin_checkout() ──► Ok(guard) ──► commit ... ──► drop(guard)
//! checkout #2 ──► begin_checkout() ──► Err(CHECKOUT_IN_PROGRESS)
//! scan        ──► with_cart_mut()  ──► Err(CHECKOUT_IN_PROGRESS)
//! ```
//! A second submission is rejected rather than queued, and the cart is frozen
//! while a commit is in flight so the post-commit clear cannot drop a scan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use duka_core::cart::{Cart, CartRow, CartTotals};
use serde::Serialize;

use crate::error::ApiError;

/// Cart contents as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub rows: Vec<CartRow>,
    pub totals: CartTotals,
    pub can_undo: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            rows: cart.rows(),
            totals: CartTotals::from(cart),
            can_undo: cart.can_undo(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
    checkout_in_flight: Arc<AtomicBool>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // Cart methods validate before mutating; a poisoned cart is still whole.
        self.cart.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the cart.
    ///
    /// Rejected while a checkout is being committed.
    pub fn with_cart_mut<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut Cart) -> R,
    {
        if self.is_checking_out() {
            return Err(ApiError::checkout_in_progress());
        }
        Ok(f(&mut self.lock()))
    }

    /// A copy of the cart to hand to the checkout processor.
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    pub fn view(&self) -> CartView {
        self.with_cart(|cart| CartView::from(cart))
    }

    pub fn is_checking_out(&self) -> bool {
        self.checkout_in_flight.load(Ordering::Acquire)
    }

    /// Claims the checkout slot. The slot is released when the guard drops.
    pub fn begin_checkout(&self) -> Result<CheckoutGuard, ApiError> {
        self.checkout_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ApiError::checkout_in_progress())?;

        Ok(CheckoutGuard {
            cart: Arc::clone(&self.cart),
            flag: Arc::clone(&self.checkout_in_flight),
        })
    }
}

/// Held for the duration of one checkout.
#[derive(Debug)]
pub struct CheckoutGuard {
    cart: Arc<Mutex<Cart>>,
    flag: Arc<AtomicBool>,
}

impl CheckoutGuard {
    /// Clears the cart after a committed sale. Consumes the guard.
    pub fn complete(self) {
        self.cart.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duka_core::{Money, Product};

    fn product(barcode: &str, price: i64, qty: i64) -> Product {
        Product::new(barcode, "Item", Money::from_major(price), qty, "Grocery")
    }

    #[test]
    fn test_view_reflects_cart() {
        let state = CartState::new();
        state
            .with_cart_mut(|c| c.add_item(&product("A001", 1000, 10), 2))
            .unwrap()
            .unwrap();

        let view = state.view();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.totals.total, Money::from_major(2000));
        assert!(view.can_undo);
    }

    #[test]
    fn test_second_checkout_is_rejected() {
        let state = CartState::new();
        let guard = state.begin_checkout().unwrap();

        let err = state.begin_checkout().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::CheckoutInProgress);

        drop(guard);
        assert!(state.begin_checkout().is_ok());
    }

    #[test]
    fn test_cart_frozen_during_checkout() {
        let state = CartState::new();
        let _guard = state.begin_checkout().unwrap();

        let result = state.with_cart_mut(|c| c.clear());
        assert!(result.is_err());
    }

    #[test]
    fn test_complete_clears_and_releases() {
        let state = CartState::new();
        state
            .with_cart_mut(|c| c.add_item(&product("A001", 1000, 10), 1))
            .unwrap()
            .unwrap();

        let guard = state.begin_checkout().unwrap();
        guard.complete();

        assert!(!state.is_checking_out());
        assert!(state.with_cart(|c| c.is_empty()));
        assert!(!state.view().can_undo);
    }
}
