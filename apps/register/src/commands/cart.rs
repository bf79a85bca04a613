//! # Cart Commands
//!
//! Building the pending sale. Product lookups happen here, against the
//! catalog; the cart itself only applies the rules.

use serde::Serialize;
use tracing::debug;

use duka_core::cart::CartEntry;
use duka_core::validation::{normalize_barcode, validate_barcode};
use duka_core::CoreError;

use crate::error::ApiError;
use crate::state::{CartState, CartView, DbState, SessionState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResponse {
    pub undone: CartEntry,
    pub cart: CartView,
}

pub fn get_cart(cart: &CartState) -> CartView {
    cart.view()
}

/// Looks the barcode up and adds `quantity` units to the cart.
///
/// ## Errors
/// - `NOT_FOUND`: no product with this barcode
/// - `INSUFFICIENT_STOCK`: out of stock, or fewer units than requested
/// - `CART_ERROR` / `VALIDATION_ERROR`: cart or quantity limits
pub async fn scan_item(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    barcode: &str,
    quantity: i64,
) -> Result<CartView, ApiError> {
    session.current()?;
    validate_barcode(barcode)?;
    debug!(barcode = %barcode, quantity, "scan_item command");

    let product = db
        .inner()
        .products()
        .get_by_barcode(barcode)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(barcode.trim().to_string()))?;

    cart.with_cart_mut(|c| c.add_item(&product, quantity))??;
    Ok(cart.view())
}

/// Reverses the most recent scan.
pub fn undo_last_item(cart: &CartState) -> Result<UndoResponse, ApiError> {
    let undone = cart.with_cart_mut(|c| c.undo_last())??;
    debug!(barcode = %undone.barcode, quantity = undone.quantity, "Scan undone");

    Ok(UndoResponse {
        undone,
        cart: cart.view(),
    })
}

/// Sets a line's quantity after checking it against current stock.
///
/// Quantities below 1 are treated as 1.
pub async fn update_cart_quantity(
    db: &DbState,
    cart: &CartState,
    barcode: &str,
    quantity: i64,
) -> Result<CartView, ApiError> {
    let quantity = quantity.max(1);

    let (name, in_cart) = cart.with_cart(|c| {
        c.line(barcode)
            .map(|l| (l.name.clone(), true))
            .unwrap_or_default()
    });
    if !in_cart {
        return Err(CoreError::ProductNotFound(barcode.trim().to_string()).into());
    }

    let available = db
        .inner()
        .products()
        .current_stock(barcode)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(barcode.trim().to_string()))?;

    if available < quantity {
        return Err(CoreError::InsufficientStock {
            barcode: normalize_barcode(barcode),
            name,
            available,
            requested: quantity,
        }
        .into());
    }

    cart.with_cart_mut(|c| c.update_quantity(barcode, quantity))??;
    Ok(cart.view())
}

pub fn remove_from_cart(cart: &CartState, barcode: &str) -> Result<CartView, ApiError> {
    cart.with_cart_mut(|c| c.remove_line(barcode))??;
    Ok(cart.view())
}

pub fn clear_cart(cart: &CartState) -> Result<CartView, ApiError> {
    cart.with_cart_mut(|c| c.clear())?;
    Ok(cart.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{register, stock};
    use crate::error::ErrorCode;
    use duka_core::Money;

    #[tokio::test]
    async fn test_scan_merges_lines() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 10).await;

        scan_item(&app.db, &app.cart, &app.session, "A001", 2).await.unwrap();
        let view = scan_item(&app.db, &app.cart, &app.session, "a001", 3)
            .await
            .unwrap();

        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].quantity, 5);
        assert_eq!(view.totals.total, Money::from_major(5000));
    }

    #[tokio::test]
    async fn test_scan_errors() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 3).await;
        stock(&app, "B002", "Salt 500g", 200, 0).await;

        let err = scan_item(&app.db, &app.cart, &app.session, "zzz", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = scan_item(&app.db, &app.cart, &app.session, "B002", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("out of stock"));

        let err = scan_item(&app.db, &app.cart, &app.session, "A001", 5)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Only 3"));

        assert!(get_cart(&app.cart).rows.is_empty());
    }

    #[tokio::test]
    async fn test_scan_requires_sign_in() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 3).await;
        app.session.sign_out();

        let err = scan_item(&app.db, &app.cart, &app.session, "A001", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_undo_in_reverse_order() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 10).await;
        stock(&app, "B002", "Salt 500g", 200, 10).await;

        scan_item(&app.db, &app.cart, &app.session, "A001", 2).await.unwrap();
        scan_item(&app.db, &app.cart, &app.session, "B002", 1).await.unwrap();

        let first = undo_last_item(&app.cart).unwrap();
        assert_eq!(first.undone.barcode, "b002");
        assert_eq!(first.cart.rows.len(), 1);

        let second = undo_last_item(&app.cart).unwrap();
        assert_eq!(second.undone.quantity, 2);
        assert!(second.cart.rows.is_empty());

        let err = undo_last_item(&app.cart).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_update_quantity_checks_stock() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 4).await;
        scan_item(&app.db, &app.cart, &app.session, "A001", 1).await.unwrap();

        let err = update_cart_quantity(&app.db, &app.cart, "A001", 9)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let view = update_cart_quantity(&app.db, &app.cart, "A001", 0)
            .await
            .unwrap();
        assert_eq!(view.rows[0].quantity, 1);

        let view = update_cart_quantity(&app.db, &app.cart, "A001", 4)
            .await
            .unwrap();
        assert_eq!(view.totals.total, Money::from_major(4000));

        let err = update_cart_quantity(&app.db, &app.cart, "B002", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let app = register().await;
        stock(&app, "A001", "Sugar 1kg", 1000, 4).await;
        stock(&app, "B002", "Salt 500g", 200, 4).await;
        scan_item(&app.db, &app.cart, &app.session, "A001", 1).await.unwrap();
        scan_item(&app.db, &app.cart, &app.session, "B002", 1).await.unwrap();

        let view = remove_from_cart(&app.cart, "A001").unwrap();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].position, 1);

        let view = clear_cart(&app.cart).unwrap();
        assert!(view.rows.is_empty());
        assert!(!view.can_undo);
    }
}
