//! # Product Commands
//!
//! Catalog lookup for every operator; catalog changes for admins.

use serde::Deserialize;
use tracing::{debug, info};

use duka_core::validation::{
    validate_barcode, validate_category, validate_price_cents, validate_product_name,
    validate_search_query, validate_stock_level,
};
use duka_core::{Money, Product, StockUpdate};

use crate::error::ApiError;
use crate::state::{DbState, SessionState, SettingsState};

const DEFAULT_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProductRequest {
    pub barcode: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub category: String,
}

/// Creates or replaces a product keyed on its barcode.
pub async fn save_product(
    db: &DbState,
    session: &SessionState,
    request: SaveProductRequest,
) -> Result<Product, ApiError> {
    session.require_admin("edit the catalog")?;

    validate_barcode(&request.barcode)?;
    validate_product_name(&request.name)?;
    validate_category(&request.category)?;
    validate_price_cents(request.price.cents())?;
    validate_stock_level(request.quantity)?;

    let product = Product::new(
        &request.barcode,
        &request.name,
        request.price,
        request.quantity,
        &request.category,
    );
    let saved = db.inner().products().upsert(&product).await?;

    info!(barcode = %saved.barcode, quantity = saved.quantity, "Product saved");
    Ok(saved)
}

pub async fn get_product(db: &DbState, barcode: &str) -> Result<Product, ApiError> {
    db.inner()
        .products()
        .get_by_barcode(barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", barcode.trim()))
}

/// Searches name, barcode and category. An empty query lists the catalog.
pub async fn search_products(
    db: &DbState,
    query: &str,
    limit: Option<u32>,
) -> Result<Vec<Product>, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 500);
    debug!(query = %query, limit, "search_products command");

    if query.trim().is_empty() {
        return Ok(db.inner().products().list(limit).await?);
    }

    let query = validate_search_query(query)?;
    Ok(db.inner().products().search(&query, limit).await?)
}

pub async fn delete_product(
    db: &DbState,
    session: &SessionState,
    barcode: &str,
) -> Result<(), ApiError> {
    session.require_admin("delete products")?;
    db.inner().products().delete(barcode).await?;
    Ok(())
}

/// Sets or clears a product's image reference.
pub async fn set_product_image(
    db: &DbState,
    session: &SessionState,
    barcode: &str,
    image_path: Option<&str>,
) -> Result<(), ApiError> {
    session.require_admin("change product images")?;
    let image_path = image_path.map(str::trim).filter(|p| !p.is_empty());
    db.inner().products().set_image(barcode, image_path).await?;
    Ok(())
}

/// Applies a relative or absolute stock correction, optionally repricing.
pub async fn adjust_stock(
    db: &DbState,
    session: &SessionState,
    barcode: &str,
    update: StockUpdate,
) -> Result<Product, ApiError> {
    session.require_admin("adjust stock")?;

    if let Some(quantity) = update.new_quantity {
        validate_stock_level(quantity)?;
    }
    if let Some(price) = update.new_price_cents {
        validate_price_cents(price)?;
    }

    Ok(db.inner().products().adjust_stock(barcode, update).await?)
}

pub async fn list_categories(db: &DbState) -> Result<Vec<String>, ApiError> {
    Ok(db.inner().categories().list().await?)
}

/// Adds a category. Returns `false` when it already existed.
pub async fn add_category(
    db: &DbState,
    session: &SessionState,
    name: &str,
) -> Result<bool, ApiError> {
    session.require_admin("add categories")?;
    validate_category(name)?;
    Ok(db.inner().categories().add(name).await?)
}

/// Products at or below the configured threshold.
pub async fn low_stock_products(
    db: &DbState,
    settings: &SettingsState,
) -> Result<Vec<Product>, ApiError> {
    let threshold = settings.low_stock_threshold();
    Ok(db.inner().products().low_stock(threshold).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{register, sign_in_employee};
    use crate::error::ErrorCode;

    fn request(barcode: &str, price: i64, quantity: i64) -> SaveProductRequest {
        SaveProductRequest {
            barcode: barcode.into(),
            name: "Sugar 1kg".into(),
            price: Money::from_major(price),
            quantity,
            category: "Grocery".into(),
        }
    }

    #[tokio::test]
    async fn test_save_and_get_normalises_barcode() {
        let app = register().await;

        let saved = save_product(&app.db, &app.session, request(" A001 ", 1000, 10))
            .await
            .unwrap();
        assert_eq!(saved.barcode, "a001");

        let fetched = get_product(&app.db, "A001").await.unwrap();
        assert_eq!(fetched.quantity, 10);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_input() {
        let app = register().await;

        let err = save_product(&app.db, &app.session, request("A001", -5, 10))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = save_product(&app.db, &app.session, request("", 1000, 10))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_employee_cannot_edit_catalog() {
        let app = register().await;
        sign_in_employee(&app).await;

        let err = save_product(&app.db, &app.session, request("A001", 1000, 10))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_adjust_stock_clamps_at_zero() {
        let app = register().await;
        save_product(&app.db, &app.session, request("A001", 1000, 3))
            .await
            .unwrap();

        let updated = adjust_stock(&app.db, &app.session, "a001", StockUpdate::change(-10))
            .await
            .unwrap();
        assert_eq!(updated.quantity, 0);

        let updated = adjust_stock(
            &app.db,
            &app.session,
            "a001",
            StockUpdate::set(24).with_price(Money::from_major(1100)),
        )
        .await
        .unwrap();
        assert_eq!(updated.quantity, 24);
        assert_eq!(updated.price(), Money::from_major(1100));
    }

    #[tokio::test]
    async fn test_out_of_range_stock_and_price_are_rejected() {
        let app = register().await;
        save_product(&app.db, &app.session, request("A001", 1000, 3))
            .await
            .unwrap();

        let err = adjust_stock(&app.db, &app.session, "A001", StockUpdate::change(i64::MAX))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut pricey = request("B002", 0, 1);
        pricey.price = Money::parse("1000000000000000").unwrap();
        let err = save_product(&app.db, &app.session, pricey)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let kept = get_product(&app.db, "A001").await.unwrap();
        assert_eq!(kept.quantity, 3);
    }

    #[tokio::test]
    async fn test_search_and_low_stock() {
        let app = register().await;
        save_product(&app.db, &app.session, request("A001", 1000, 2))
            .await
            .unwrap();

        let found = search_products(&app.db, "sugar", None).await.unwrap();
        assert_eq!(found.len(), 1);

        let everything = search_products(&app.db, "  ", Some(10)).await.unwrap();
        assert_eq!(everything.len(), 1);

        let low = low_stock_products(&app.db, &app.settings).await.unwrap();
        assert_eq!(low.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let app = register().await;
        let err = delete_product(&app.db, &app.session, "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_categories() {
        let app = register().await;
        assert!(add_category(&app.db, &app.session, "Stationery").await.unwrap());
        assert!(!add_category(&app.db, &app.session, "stationery").await.unwrap());
        assert!(list_categories(&app.db)
            .await
            .unwrap()
            .contains(&"Stationery".to_string()));
    }
}
