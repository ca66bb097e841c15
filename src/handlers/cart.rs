use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    cart::{Cart, CartItemRequest, CartSummary},
    database::Database,
    error::{AppError, AppJson, AppResult, FieldError},
    middleware::CurrentUser,
    models::Product,
    utils::validation::{max_order_amount, MAX_ITEM_QUANTITY},
};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CartItemRequest>,
}

/// Prices a prospective cart against current product data.
pub async fn quote(
    State(db): State<Database>,
    _current_user: CurrentUser,
    AppJson(form): AppJson<QuoteRequest>,
) -> AppResult<Json<CartSummary>> {
    let products = load_products(&db, &form.items).await?;
    let cart = build_cart(&form.items, &products)?;
    Ok(Json(cart.into_summary()))
}

pub async fn load_products(
    db: &Database,
    items: &[CartItemRequest],
) -> Result<HashMap<Uuid, Product>, sqlx::Error> {
    let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();

    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = ANY($1) AND is_active = true",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Builds a priced cart, reporting every missing product or bad quantity.
/// Merged lines and the order total must fit the order columns.
pub fn build_cart(items: &[CartItemRequest], products: &HashMap<Uuid, Product>) -> AppResult<Cart> {
    let mut errors = Vec::new();
    if items.is_empty() {
        errors.push(FieldError::new("items", "At least one item is required"));
    }

    let mut cart = Cart::new();
    for (i, item) in items.iter().enumerate() {
        let field = format!("items[{i}].quantity");
        if item.quantity <= 0 {
            errors.push(FieldError::new(field, "quantity must be greater than 0"));
            continue;
        }
        let Some(product) = products.get(&item.product_id) else {
            errors.push(FieldError::new(
                format!("items[{i}].product_id"),
                "Product not found or unavailable",
            ));
            continue;
        };
        match cart.add(product, item.quantity) {
            Some(merged) if merged <= MAX_ITEM_QUANTITY => {}
            _ => errors.push(FieldError::new(
                field,
                format!("quantity must be at most {MAX_ITEM_QUANTITY}"),
            )),
        }
    }

    if errors.is_empty() && cart.total_amount() > max_order_amount() {
        errors.push(FieldError::new(
            "items",
            format!("Order total must be at most {}", max_order_amount()),
        ));
    }

    if errors.is_empty() {
        Ok(cart)
    } else {
        Err(AppError::Validation(errors))
    }
}
