use axum::{extract::State, Json};
use chrono::{Datelike, Duration, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::{
    database::Database,
    error::AppResult,
    middleware::CurrentUser,
    models::{
        analytics::fulfillment_rate, AdminStats, SupplierStats, SupplyOfferStatus, UserRole,
        VendorStats,
    },
};

pub async fn vendor_stats(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<VendorStats>> {
    current_user.require_role(&[UserRole::Vendor])?;

    let now = Utc::now();
    let month_start = Utc.from_utc_datetime(
        &now.date_naive()
            .with_day(1)
            .unwrap_or_else(|| now.date_naive())
            .and_time(NaiveTime::MIN),
    );

    let (total_orders, total_spent, orders_this_month) = sqlx::query_as::<_, (i64, Decimal, i64)>(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(total_amount), 0),
            COUNT(*) FILTER (WHERE created_at >= $2)
        FROM orders
        WHERE vendor_id = $1
        "#,
    )
    .bind(current_user.id)
    .bind(month_start)
    .fetch_one(&db)
    .await?;

    Ok(Json(VendorStats {
        total_orders,
        total_spent,
        orders_this_month,
    }))
}

pub async fn supplier_stats(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<SupplierStats>> {
    current_user.require_role(&[UserRole::Supplier])?;

    let (total_supplies, fulfilled, revenue) = sqlx::query_as::<_, (i64, i64, Decimal)>(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE status = $2),
            COALESCE(SUM(available_quantity * price_per_unit) FILTER (WHERE status = $2), 0)
        FROM supply_offers
        WHERE supplier_id = $1
        "#,
    )
    .bind(current_user.id)
    .bind(SupplyOfferStatus::Fulfilled)
    .fetch_one(&db)
    .await?;

    Ok(Json(SupplierStats {
        total_supplies,
        revenue,
        fulfillment_rate: fulfillment_rate(total_supplies, fulfilled),
    }))
}

pub async fn admin_stats(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<AdminStats>> {
    current_user.require_role(&[UserRole::Admin])?;

    let today = Utc.from_utc_datetime(&Utc::now().date_naive().and_time(NaiveTime::MIN));
    let tomorrow = today + Duration::days(1);

    let (total_vendors, total_suppliers) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE role = 'vendor'),
            COUNT(*) FILTER (WHERE role = 'supplier')
        FROM users
        "#,
    )
    .fetch_one(&db)
    .await?;

    let (total_orders, orders_today, revenue_today) = sqlx::query_as::<_, (i64, i64, Decimal)>(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE created_at >= $1 AND created_at < $2),
            COALESCE(SUM(total_amount) FILTER (WHERE created_at >= $1 AND created_at < $2), 0)
        FROM orders
        "#,
    )
    .bind(today)
    .bind(tomorrow)
    .fetch_one(&db)
    .await?;

    Ok(Json(AdminStats {
        total_vendors,
        total_suppliers,
        total_orders,
        orders_today,
        revenue_today,
    }))
}
