use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppJson, AppResult},
    middleware::CurrentUser,
    models::{
        CreateSpecialRequest, DecideResponse, RespondToRequest, ResponseDetail, ResponseStatus,
        SpecialRequest, SpecialRequestDetail, SpecialRequestResponse, SpecialRequestRow,
        SpecialRequestStatus, UserRole,
    },
};

pub async fn create_request(
    State(db): State<Database>,
    current_user: CurrentUser,
    AppJson(form): AppJson<CreateSpecialRequest>,
) -> AppResult<Json<SpecialRequest>> {
    current_user.require_role(&[UserRole::Vendor])?;
    form.validate()?;

    let request = sqlx::query_as::<_, SpecialRequest>(
        r#"
        INSERT INTO special_requests (vendor_id, item_name, description, quantity, unit, budget_per_unit, urgency)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(current_user.id)
    .bind(form.item_name.trim())
    .bind(form.description.trim())
    .bind(form.quantity)
    .bind(form.unit.trim())
    .bind(form.budget_per_unit)
    .bind(form.urgency)
    .fetch_one(&db)
    .await?;

    log::info!("Special request {} opened by {}", request.id, current_user.id);
    Ok(Json(request))
}

/// Vendors see their own requests; suppliers and admins see every request
/// with the vendor name and all responses.
pub async fn list_requests(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<SpecialRequestDetail>>> {
    let rows = match current_user.role {
        UserRole::Vendor => {
            sqlx::query_as::<_, SpecialRequestRow>(
                r#"
                SELECT r.*, CONCAT(u.first_name, ' ', u.last_name) AS vendor_name
                FROM special_requests r
                JOIN users u ON u.id = r.vendor_id
                WHERE r.vendor_id = $1
                ORDER BY r.created_at DESC
                "#,
            )
            .bind(current_user.id)
            .fetch_all(&db)
            .await?
        }
        UserRole::Supplier | UserRole::Admin => {
            sqlx::query_as::<_, SpecialRequestRow>(
                r#"
                SELECT r.*, CONCAT(u.first_name, ' ', u.last_name) AS vendor_name
                FROM special_requests r
                JOIN users u ON u.id = r.vendor_id
                ORDER BY r.created_at DESC
                "#,
            )
            .fetch_all(&db)
            .await?
        }
    };

    let details = attach_responses(&db, rows).await?;
    Ok(Json(details))
}

pub async fn vendor_requests(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<SpecialRequest>>> {
    current_user.require_role(&[UserRole::Vendor])?;

    let requests = sqlx::query_as::<_, SpecialRequest>(
        "SELECT * FROM special_requests WHERE vendor_id = $1 ORDER BY created_at DESC",
    )
    .bind(current_user.id)
    .fetch_all(&db)
    .await?;

    Ok(Json(requests))
}

pub async fn respond_to_request(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    AppJson(form): AppJson<RespondToRequest>,
) -> AppResult<Json<SpecialRequestResponse>> {
    current_user.require_role(&[UserRole::Supplier])?;
    form.validate()?;

    let mut tx = db.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    if !request.status.is_open() {
        return Err(AppError::BusinessRule(
            "Special request is no longer accepting responses".to_string(),
        ));
    }

    let response = sqlx::query_as::<_, SpecialRequestResponse>(
        r#"
        INSERT INTO special_request_responses (request_id, supplier_id, available_quantity, price_per_unit, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(request_id)
    .bind(current_user.id)
    .bind(form.available_quantity)
    .bind(form.price_per_unit)
    .bind(&form.message)
    .fetch_one(&mut *tx)
    .await?;

    if request.status == SpecialRequestStatus::Open {
        set_request_status(&mut tx, request_id, SpecialRequestStatus::Responded).await?;
    }

    tx.commit().await?;
    Ok(Json(response))
}

/// The requesting vendor accepts or rejects a supplier's reply. Accepting
/// settles the request and turns down the other pending replies.
pub async fn decide_response(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path((request_id, response_id)): Path<(Uuid, Uuid)>,
    AppJson(form): AppJson<DecideResponse>,
) -> AppResult<Json<SpecialRequestResponse>> {
    current_user.require_role(&[UserRole::Vendor])?;

    if form.status == ResponseStatus::Pending {
        return Err(AppError::validation("status", "status must be accepted or rejected"));
    }

    let mut tx = db.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    if request.vendor_id != current_user.id {
        return Err(AppError::Forbidden);
    }
    if !request.status.is_open() {
        return Err(AppError::BusinessRule("Special request is already closed".to_string()));
    }

    let existing = sqlx::query_as::<_, SpecialRequestResponse>(
        "SELECT * FROM special_request_responses WHERE id = $1 AND request_id = $2",
    )
    .bind(response_id)
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Response"))?;

    if existing.status != ResponseStatus::Pending {
        return Err(AppError::BusinessRule("Response has already been decided".to_string()));
    }

    let response = sqlx::query_as::<_, SpecialRequestResponse>(
        "UPDATE special_request_responses SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(form.status)
    .bind(response_id)
    .fetch_one(&mut *tx)
    .await?;

    if response.status == ResponseStatus::Accepted {
        sqlx::query(
            r#"
            UPDATE special_request_responses SET status = $1, updated_at = NOW()
            WHERE request_id = $2 AND id <> $3 AND status = $4
            "#,
        )
        .bind(ResponseStatus::Rejected)
        .bind(request_id)
        .bind(response_id)
        .bind(ResponseStatus::Pending)
        .execute(&mut *tx)
        .await?;

        set_request_status(&mut tx, request_id, SpecialRequestStatus::Fulfilled).await?;
        log::info!("Special request {} fulfilled by response {}", request_id, response_id);
    }

    tx.commit().await?;
    Ok(Json(response))
}

pub async fn cancel_request(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<SpecialRequest>> {
    current_user.require_role(&[UserRole::Vendor])?;

    let mut tx = db.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    if request.vendor_id != current_user.id {
        return Err(AppError::Forbidden);
    }
    if !request.status.is_open() {
        return Err(AppError::BusinessRule("Special request is already closed".to_string()));
    }

    let cancelled = set_request_status(&mut tx, request_id, SpecialRequestStatus::Cancelled).await?;
    tx.commit().await?;

    Ok(Json(cancelled))
}

async fn lock_request(
    conn: &mut sqlx::PgConnection,
    request_id: Uuid,
) -> AppResult<SpecialRequest> {
    sqlx::query_as::<_, SpecialRequest>("SELECT * FROM special_requests WHERE id = $1 FOR UPDATE")
        .bind(request_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound("Special request"))
}

async fn set_request_status(
    conn: &mut sqlx::PgConnection,
    request_id: Uuid,
    status: SpecialRequestStatus,
) -> Result<SpecialRequest, sqlx::Error> {
    sqlx::query_as::<_, SpecialRequest>(
        "UPDATE special_requests SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(request_id)
    .fetch_one(conn)
    .await
}

async fn attach_responses(
    db: &Database,
    rows: Vec<SpecialRequestRow>,
) -> Result<Vec<SpecialRequestDetail>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.request.id).collect();
    let responses = sqlx::query_as::<_, ResponseDetail>(
        r#"
        SELECT sr.*, CONCAT(u.first_name, ' ', u.last_name) AS supplier_name
        FROM special_request_responses sr
        JOIN users u ON u.id = sr.supplier_id
        WHERE sr.request_id = ANY($1)
        ORDER BY sr.created_at
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_request: HashMap<Uuid, Vec<ResponseDetail>> = HashMap::new();
    for response in responses {
        by_request
            .entry(response.response.request_id)
            .or_default()
            .push(response);
    }

    Ok(rows
        .into_iter()
        .map(|row| SpecialRequestDetail {
            responses: by_request.remove(&row.request.id).unwrap_or_default(),
            vendor_name: row.vendor_name,
            request: row.request,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{handlers::fixtures, models::special_request::Urgency};
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    fn saffron() -> AppJson<CreateSpecialRequest> {
        AppJson(CreateSpecialRequest {
            item_name: "Saffron".into(),
            description: "Kashmiri, grade A".into(),
            quantity: 2,
            unit: "kg".into(),
            budget_per_unit: Some(dec!(250000)),
            urgency: Urgency::High,
        })
    }

    fn reply(price: rust_decimal::Decimal) -> AppJson<RespondToRequest> {
        AppJson(RespondToRequest {
            available_quantity: 2,
            price_per_unit: price,
            message: None,
        })
    }

    async fn status_of(pool: &PgPool, response_id: Uuid) -> ResponseStatus {
        sqlx::query_scalar("SELECT status FROM special_request_responses WHERE id = $1")
            .bind(response_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn accepting_one_response_rejects_the_rest(pool: PgPool) {
        let vendor = fixtures::user(&pool, UserRole::Vendor).await;
        let first = fixtures::user(&pool, UserRole::Supplier).await;
        let second = fixtures::user(&pool, UserRole::Supplier).await;

        let Json(request) = create_request(State(pool.clone()), vendor.clone(), saffron()).await.unwrap();
        assert_eq!(request.status, SpecialRequestStatus::Open);

        let Json(cheap) = respond_to_request(State(pool.clone()), first, Path(request.id), reply(dec!(240000)))
            .await
            .unwrap();
        let Json(dear) = respond_to_request(State(pool.clone()), second.clone(), Path(request.id), reply(dec!(260000)))
            .await
            .unwrap();

        let Json(listed) = vendor_requests(State(pool.clone()), vendor.clone()).await.unwrap();
        assert_eq!(listed[0].status, SpecialRequestStatus::Responded);

        let Json(accepted) = decide_response(
            State(pool.clone()),
            vendor.clone(),
            Path((request.id, cheap.id)),
            AppJson(DecideResponse { status: ResponseStatus::Accepted }),
        )
        .await
        .unwrap();
        assert_eq!(accepted.status, ResponseStatus::Accepted);
        assert_eq!(status_of(&pool, dear.id).await, ResponseStatus::Rejected);

        let Json(all) = list_requests(State(pool.clone()), vendor).await.unwrap();
        assert_eq!(all[0].request.status, SpecialRequestStatus::Fulfilled);
        assert_eq!(all[0].responses.len(), 2);

        let late = respond_to_request(State(pool.clone()), second, Path(request.id), reply(dec!(1))).await;
        assert!(matches!(late, Err(AppError::BusinessRule(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_the_requesting_vendor_decides(pool: PgPool) {
        let vendor = fixtures::user(&pool, UserRole::Vendor).await;
        let stranger = fixtures::user(&pool, UserRole::Vendor).await;
        let supplier = fixtures::user(&pool, UserRole::Supplier).await;

        let Json(request) = create_request(State(pool.clone()), vendor.clone(), saffron()).await.unwrap();
        let Json(response) = respond_to_request(State(pool.clone()), supplier, Path(request.id), reply(dec!(240000)))
            .await
            .unwrap();

        let hijack = decide_response(
            State(pool.clone()),
            stranger.clone(),
            Path((request.id, response.id)),
            AppJson(DecideResponse { status: ResponseStatus::Accepted }),
        )
        .await;
        assert!(matches!(hijack, Err(AppError::Forbidden)));
        assert_eq!(status_of(&pool, response.id).await, ResponseStatus::Pending);

        let cancel = cancel_request(State(pool.clone()), stranger, Path(request.id)).await;
        assert!(matches!(cancel, Err(AppError::Forbidden)));

        let Json(cancelled) = cancel_request(State(pool.clone()), vendor, Path(request.id)).await.unwrap();
        assert_eq!(cancelled.status, SpecialRequestStatus::Cancelled);
    }
}
