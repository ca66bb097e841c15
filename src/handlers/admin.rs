use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppJson, AppResult},
    handlers::orders::load_order_details,
    middleware::CurrentUser,
    models::{Order, OrderDetail, UpdateUserStatus, User, UserResponse, UserRole},
};

pub async fn users_list(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    current_user.require_role(&[UserRole::Admin])?;

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn update_user_status(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
    AppJson(form): AppJson<UpdateUserStatus>,
) -> AppResult<Json<UserResponse>> {
    current_user.require_role(&[UserRole::Admin])?;

    if user_id == current_user.id && !form.is_active {
        return Err(AppError::BusinessRule("You cannot deactivate your own account".to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(form.is_active)
    .bind(user_id)
    .fetch_optional(&db)
    .await?
    .ok_or(AppError::NotFound("User"))?;

    log::info!(
        "User {} {} by {}",
        user.id,
        if user.is_active { "activated" } else { "deactivated" },
        current_user.id
    );
    Ok(Json(user.into()))
}

pub async fn orders_list(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<OrderDetail>>> {
    current_user.require_role(&[UserRole::Admin])?;

    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&db)
        .await?;

    let details = load_order_details(&db, orders, true).await?;
    Ok(Json(details))
}
