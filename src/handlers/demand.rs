//! Daily demand endpoint and the per product/day counter updates used by
//! order placement, order cancellation and supply fulfilment.
//!
//! Each update is one statement that rewrites `remaining_demand` from the
//! row's own counters, so the stored row always satisfies
//! `remaining = total - fulfilled`.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    database::Database,
    error::AppResult,
    middleware::CurrentUser,
    models::{DailyDemand, DailyDemandWithProduct, DemandQuery, UserRole},
};

pub async fn daily_demand(
    State(db): State<Database>,
    current_user: CurrentUser,
    Query(query): Query<DemandQuery>,
) -> AppResult<Json<Vec<DailyDemandWithProduct>>> {
    current_user.require_role(&[UserRole::Supplier, UserRole::Admin])?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let demands = sqlx::query_as::<_, DailyDemandWithProduct>(
        r#"
        SELECT
            d.*,
            p.name,
            p.category,
            p.unit,
            p.base_price
        FROM daily_demand d
        JOIN products p ON p.id = d.product_id
        WHERE d.date = $1
        ORDER BY d.remaining_demand DESC, p.name
        "#,
    )
    .bind(date)
    .fetch_all(&db)
    .await?;

    Ok(Json(demands))
}

/// Adds ordered quantity to a product's demand for `date`.
pub async fn record_demand(
    conn: &mut PgConnection,
    product_id: Uuid,
    date: NaiveDate,
    quantity: i32,
) -> Result<DailyDemand, sqlx::Error> {
    let demand = sqlx::query_as::<_, DailyDemand>(
        r#"
        INSERT INTO daily_demand (product_id, date, total_demand, fulfilled_quantity, remaining_demand)
        VALUES ($1, $2, $3, 0, $3)
        ON CONFLICT (product_id, date) DO UPDATE SET
            total_demand = daily_demand.total_demand + EXCLUDED.total_demand,
            remaining_demand = daily_demand.total_demand + EXCLUDED.total_demand
                - daily_demand.fulfilled_quantity,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(date)
    .bind(i64::from(quantity))
    .fetch_one(conn)
    .await?;

    log::debug!(
        "Demand for {} on {} is now {} ({} remaining)",
        product_id, date, demand.total_demand, demand.remaining_demand
    );
    Ok(demand)
}

/// Gives back quantity from a cancelled order. Missing rows are ignored.
pub async fn release_demand(
    conn: &mut PgConnection,
    product_id: Uuid,
    date: NaiveDate,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE daily_demand SET
            total_demand = GREATEST(total_demand - $3, 0),
            remaining_demand = GREATEST(total_demand - $3, 0) - fulfilled_quantity,
            updated_at = NOW()
        WHERE product_id = $1 AND date = $2
        "#,
    )
    .bind(product_id)
    .bind(date)
    .bind(i64::from(quantity))
    .execute(conn)
    .await?;

    Ok(())
}

/// Counts supplied quantity against a product's demand for `date`, creating
/// a zero-demand row when nobody has ordered the product that day.
pub async fn record_fulfillment(
    conn: &mut PgConnection,
    product_id: Uuid,
    date: NaiveDate,
    quantity: i32,
) -> Result<DailyDemand, sqlx::Error> {
    let demand = sqlx::query_as::<_, DailyDemand>(
        r#"
        INSERT INTO daily_demand (product_id, date, total_demand, fulfilled_quantity, remaining_demand)
        VALUES ($1, $2, 0, $3, -$3)
        ON CONFLICT (product_id, date) DO UPDATE SET
            fulfilled_quantity = daily_demand.fulfilled_quantity + EXCLUDED.fulfilled_quantity,
            remaining_demand = daily_demand.total_demand
                - (daily_demand.fulfilled_quantity + EXCLUDED.fulfilled_quantity),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(date)
    .bind(i64::from(quantity))
    .fetch_one(conn)
    .await?;

    log::info!(
        "Fulfilled {} of {} on {} ({} remaining)",
        quantity, product_id, date, demand.remaining_demand
    );
    Ok(demand)
}
