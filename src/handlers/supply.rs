use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppJson, AppResult},
    handlers::demand::record_fulfillment,
    middleware::CurrentUser,
    models::{
        CreateSupplyOffer, SupplyOffer, SupplyOfferDetail, SupplyOfferStatus,
        UpdateSupplyOfferStatus, UserRole,
    },
};

const OFFER_DETAIL_SELECT: &str = r#"
    SELECT
        s.*,
        p.name AS product_name,
        p.unit AS product_unit,
        CONCAT(u.first_name, ' ', u.last_name) AS supplier_name
    FROM supply_offers s
    JOIN products p ON p.id = s.product_id
    JOIN users u ON u.id = s.supplier_id
"#;

pub async fn create_offer(
    State(db): State<Database>,
    current_user: CurrentUser,
    AppJson(form): AppJson<CreateSupplyOffer>,
) -> AppResult<Json<SupplyOffer>> {
    current_user.require_role(&[UserRole::Supplier])?;
    form.validate()?;

    let product_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND is_active = true)",
    )
    .bind(form.product_id)
    .fetch_one(&db)
    .await?;

    if !product_exists {
        return Err(AppError::validation("product_id", "Product not found or unavailable"));
    }

    let offer = sqlx::query_as::<_, SupplyOffer>(
        r#"
        INSERT INTO supply_offers (supplier_id, product_id, available_quantity, price_per_unit, delivery_date, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(current_user.id)
    .bind(form.product_id)
    .bind(form.available_quantity)
    .bind(form.price_per_unit)
    .bind(form.delivery_date)
    .bind(&form.notes)
    .fetch_one(&db)
    .await?;

    log::info!(
        "Supplier {} offered {} of product {}",
        current_user.id, offer.available_quantity, offer.product_id
    );
    Ok(Json(offer))
}

pub async fn list_offers(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<SupplyOfferDetail>>> {
    current_user.require_role(&[UserRole::Supplier, UserRole::Admin])?;

    let sql = if current_user.is_admin() {
        format!("{OFFER_DETAIL_SELECT} ORDER BY s.created_at DESC")
    } else {
        format!("{OFFER_DETAIL_SELECT} WHERE s.supplier_id = $1 ORDER BY s.created_at DESC")
    };

    let mut query = sqlx::query_as::<_, SupplyOfferDetail>(&sql);
    if !current_user.is_admin() {
        query = query.bind(current_user.id);
    }
    let offers = query.fetch_all(&db).await?;

    Ok(Json(offers))
}

/// Admins accept, reject or fulfil offers; a supplier may only mark its own
/// accepted offer fulfilled. Fulfilment counts the offered quantity against
/// the product's demand on the delivery day.
pub async fn update_offer_status(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(offer_id): Path<Uuid>,
    AppJson(form): AppJson<UpdateSupplyOfferStatus>,
) -> AppResult<Json<SupplyOffer>> {
    current_user.require_role(&[UserRole::Supplier, UserRole::Admin])?;

    let mut tx = db.begin().await?;

    let current = sqlx::query_as::<_, SupplyOffer>(
        "SELECT * FROM supply_offers WHERE id = $1 FOR UPDATE",
    )
    .bind(offer_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Supply offer"))?;

    if !current_user.is_admin()
        && (current.supplier_id != current_user.id || form.status != SupplyOfferStatus::Fulfilled)
    {
        return Err(AppError::Forbidden);
    }

    if !current.status.can_transition_to(form.status) {
        return Err(AppError::BusinessRule(format!(
            "Cannot change supply offer status from {} to {}",
            current.status.as_str(),
            form.status.as_str()
        )));
    }

    let offer = sqlx::query_as::<_, SupplyOffer>(
        "UPDATE supply_offers SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(form.status)
    .bind(offer_id)
    .fetch_one(&mut *tx)
    .await?;

    if offer.status == SupplyOfferStatus::Fulfilled {
        record_fulfillment(
            &mut tx,
            offer.product_id,
            offer.delivery_date.date_naive(),
            offer.available_quantity,
        )
        .await?;
    }

    tx.commit().await?;
    Ok(Json(offer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{demand::record_demand, fixtures};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    fn status(status: SupplyOfferStatus) -> AppJson<UpdateSupplyOfferStatus> {
        AppJson(UpdateSupplyOfferStatus { status })
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn fulfilled_offer_counts_against_delivery_day_demand(pool: PgPool) {
        let supplier = fixtures::user(&pool, UserRole::Supplier).await;
        let admin = fixtures::user(&pool, UserRole::Admin).await;
        let onions = fixtures::product(&pool, dec!(40), 0, dec!(0)).await;
        let delivery = Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        record_demand(&mut conn, onions.id, delivery.date_naive(), 100).await.unwrap();
        drop(conn);

        let Json(offer) = create_offer(
            State(pool.clone()),
            supplier.clone(),
            AppJson(CreateSupplyOffer {
                product_id: onions.id,
                available_quantity: 70,
                price_per_unit: dec!(32.50),
                delivery_date: delivery,
                notes: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(offer.status, SupplyOfferStatus::Pending);

        // Suppliers cannot accept their own offers
        let self_accept = update_offer_status(
            State(pool.clone()),
            supplier.clone(),
            Path(offer.id),
            status(SupplyOfferStatus::Accepted),
        )
        .await;
        assert!(matches!(self_accept, Err(AppError::Forbidden)));

        update_offer_status(State(pool.clone()), admin, Path(offer.id), status(SupplyOfferStatus::Accepted))
            .await
            .unwrap();
        let Json(fulfilled) = update_offer_status(
            State(pool.clone()),
            supplier,
            Path(offer.id),
            status(SupplyOfferStatus::Fulfilled),
        )
        .await
        .unwrap();
        assert_eq!(fulfilled.status, SupplyOfferStatus::Fulfilled);

        assert_eq!(
            fixtures::demand(&pool, onions.id, delivery.date_naive()).await,
            Some((100, 70, 30))
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn skipping_acceptance_is_refused(pool: PgPool) {
        let supplier = fixtures::user(&pool, UserRole::Supplier).await;
        let admin = fixtures::user(&pool, UserRole::Admin).await;
        let onions = fixtures::product(&pool, dec!(40), 0, dec!(0)).await;

        let Json(offer) = create_offer(
            State(pool.clone()),
            supplier,
            AppJson(CreateSupplyOffer {
                product_id: onions.id,
                available_quantity: 10,
                price_per_unit: dec!(30),
                delivery_date: Utc::now(),
                notes: None,
            }),
        )
        .await
        .unwrap();

        match update_offer_status(State(pool.clone()), admin, Path(offer.id), status(SupplyOfferStatus::Fulfilled)).await {
            Err(AppError::BusinessRule(message)) => {
                assert_eq!(message, "Cannot change supply offer status from pending to fulfilled")
            }
            other => panic!("expected business rule error, got {other:?}"),
        }

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_demand")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_product_is_a_field_error(pool: PgPool) {
        let supplier = fixtures::user(&pool, UserRole::Supplier).await;
        let result = create_offer(
            State(pool),
            supplier,
            AppJson(CreateSupplyOffer {
                product_id: Uuid::new_v4(),
                available_quantity: 10,
                price_per_unit: dec!(30),
                delivery_date: Utc::now(),
                notes: None,
            }),
        )
        .await;

        match result {
            Err(AppError::Validation(errors)) => assert_eq!(errors[0].field, "product_id"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
