use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppJson, AppResult},
    middleware::CurrentUser,
    models::{CreateProduct, Product, UpdateProduct, UserRole},
};

pub async fn list_products(State(db): State<Database>) -> AppResult<Json<Vec<Product>>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_active = true ORDER BY name",
    )
    .fetch_all(&db)
    .await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(db): State<Database>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = fetch_product(&db, product_id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(db): State<Database>,
    current_user: CurrentUser,
    AppJson(form): AppJson<CreateProduct>,
) -> AppResult<Json<Product>> {
    current_user.require_role(&[UserRole::Admin])?;
    form.validate()?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            name, description, category, unit, base_price, image_url,
            bulk_discount_threshold, bulk_discount_percentage
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(&form.description)
    .bind(form.category.trim())
    .bind(form.unit.trim())
    .bind(form.base_price)
    .bind(&form.image_url)
    .bind(form.bulk_discount_threshold)
    .bind(form.bulk_discount_percentage)
    .fetch_one(&db)
    .await?;

    log::info!("Product {} created by {}", product.id, current_user.id);
    Ok(Json(product))
}

pub async fn update_product(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    AppJson(form): AppJson<UpdateProduct>,
) -> AppResult<Json<Product>> {
    current_user.require_role(&[UserRole::Admin])?;

    let existing = fetch_product(&db, product_id).await?;
    let merged = form.apply(existing)?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products SET
            name = $1, description = $2, category = $3, unit = $4, base_price = $5,
            image_url = $6, bulk_discount_threshold = $7, bulk_discount_percentage = $8,
            is_active = $9, updated_at = NOW()
        WHERE id = $10
        RETURNING *
        "#,
    )
    .bind(&merged.name)
    .bind(&merged.description)
    .bind(&merged.category)
    .bind(&merged.unit)
    .bind(merged.base_price)
    .bind(&merged.image_url)
    .bind(merged.bulk_discount_threshold)
    .bind(merged.bulk_discount_percentage)
    .bind(merged.is_active)
    .bind(product_id)
    .fetch_one(&db)
    .await?;

    Ok(Json(product))
}

/// Soft delete: order items keep pointing at the row.
pub async fn delete_product(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    current_user.require_role(&[UserRole::Admin])?;

    let affected = sqlx::query(
        "UPDATE products SET is_active = false, updated_at = NOW() WHERE id = $1",
    )
    .bind(product_id)
    .execute(&db)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(AppError::NotFound("Product"));
    }

    log::info!("Product {} deactivated by {}", product_id, current_user.id);
    Ok(Json(serde_json::json!({ "message": "Product deleted successfully" })))
}

async fn fetch_product(db: &Database, product_id: Uuid) -> AppResult<Product> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("Product"))
}
