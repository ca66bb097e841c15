//! Row builders for the database-backed handler tests.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    middleware::CurrentUser,
    models::{Product, User, UserRole},
};

pub async fn user(pool: &PgPool, role: UserRole) -> CurrentUser {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, role)
        VALUES ($1, 'not-a-hash', 'Test', $2, $3)
        RETURNING *
        "#,
    )
    .bind(format!("{}@mandi.test", Uuid::new_v4()))
    .bind(role.as_str())
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    CurrentUser::from_user(user)
}

pub async fn product(pool: &PgPool, base_price: Decimal, threshold: i32, percentage: Decimal) -> Product {
    sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, category, unit, base_price, bulk_discount_threshold, bulk_discount_percentage)
        VALUES ('Red Onions', 'Vegetables', 'kg', $1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(base_price)
    .bind(threshold)
    .bind(percentage)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// `(total, fulfilled, remaining)` for a product on a day, if a row exists.
pub async fn demand(pool: &PgPool, product_id: Uuid, date: chrono::NaiveDate) -> Option<(i64, i64, i64)> {
    sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT total_demand, fulfilled_quantity, remaining_demand FROM daily_demand WHERE product_id = $1 AND date = $2",
    )
    .bind(product_id)
    .bind(date)
    .fetch_optional(pool)
    .await
    .unwrap()
}
