use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppJson, AppResult},
    handlers::{
        cart::{build_cart, load_products},
        demand::{record_demand, release_demand},
    },
    middleware::CurrentUser,
    models::{
        Order, OrderDetail, OrderItem, OrderItemDetail, OrderStatus, PlaceOrderRequest,
        UpdateOrderStatus, UserRole, UserSummary,
    },
    utils::validation::{Validator, MAX_TEXT_LEN},
};

/// Places a cash-on-delivery order. Prices come from the product table, not
/// from the request.
pub async fn place_order(
    State(db): State<Database>,
    current_user: CurrentUser,
    AppJson(form): AppJson<PlaceOrderRequest>,
) -> AppResult<Json<OrderDetail>> {
    current_user.require_role(&[UserRole::Vendor])?;

    Validator::new()
        .required_text(&form.delivery_address, "delivery_address", MAX_TEXT_LEN)
        .optional_text(form.notes.as_deref(), "notes", MAX_TEXT_LEN)
        .finish()?;

    let products = load_products(&db, &form.items).await?;
    let cart = build_cart(&form.items, &products)?;

    let mut tx = db.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (vendor_id, total_amount, status, delivery_address, payment_method, delivery_date, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(current_user.id)
    .bind(cart.total_amount())
    .bind(OrderStatus::Pending)
    .bind(form.delivery_address.trim())
    .bind(form.payment_method)
    .bind(form.delivery_date)
    .bind(&form.notes)
    .fetch_one(&mut *tx)
    .await?;

    let demand_date = order.order_date.date_naive();
    let mut items = Vec::with_capacity(cart.lines().len());

    for line in cart.lines() {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price, total_price, discount_applied)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(line.product_id)
        .bind(line.pricing.quantity)
        .bind(line.pricing.unit_price)
        .bind(line.pricing.total_price)
        .bind(line.pricing.discount_applied)
        .fetch_one(&mut *tx)
        .await?;

        record_demand(&mut tx, line.product_id, demand_date, line.pricing.quantity).await?;

        items.push(OrderItemDetail {
            item,
            product_name: line.product_name.clone(),
            product_unit: line.unit.clone(),
        });
    }

    tx.commit().await?;

    log::info!(
        "Order {} placed by {}: {} items, total {}",
        order.id,
        current_user.id,
        items.len(),
        order.total_amount
    );

    Ok(Json(OrderDetail {
        order,
        vendor: None,
        items,
    }))
}

pub async fn list_orders(
    State(db): State<Database>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<OrderDetail>>> {
    let orders = match current_user.role {
        UserRole::Vendor => {
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE vendor_id = $1 ORDER BY created_at DESC",
            )
            .bind(current_user.id)
            .fetch_all(&db)
            .await?
        }
        UserRole::Admin => {
            sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
                .fetch_all(&db)
                .await?
        }
        UserRole::Supplier => return Err(AppError::Forbidden),
    };

    let details = load_order_details(&db, orders, current_user.is_admin()).await?;
    Ok(Json(details))
}

pub async fn get_order(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    current_user.require_role(&[UserRole::Vendor, UserRole::Admin])?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&db)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if !current_user.is_admin() && order.vendor_id != current_user.id {
        return Err(AppError::Forbidden);
    }

    let mut details = load_order_details(&db, vec![order], current_user.is_admin()).await?;
    details.pop().map(Json).ok_or(AppError::NotFound("Order"))
}

/// Admin status change. Cancelling hands the order's quantities back to the
/// daily demand of the day it was placed.
pub async fn update_order_status(
    State(db): State<Database>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    AppJson(form): AppJson<UpdateOrderStatus>,
) -> AppResult<Json<Order>> {
    current_user.require_role(&[UserRole::Admin])?;

    let mut tx = db.begin().await?;

    let current = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if !current.status.can_transition_to(form.status) {
        return Err(AppError::BusinessRule(format!(
            "Cannot change order status from {} to {}",
            current.status.as_str(),
            form.status.as_str()
        )));
    }
    if current.status == form.status {
        return Ok(Json(current));
    }

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(form.status)
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;

    if order.status == OrderStatus::Cancelled {
        let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

        let demand_date = order.order_date.date_naive();
        for item in &items {
            release_demand(&mut tx, item.product_id, demand_date, item.quantity).await?;
        }
    }

    tx.commit().await?;

    log::info!(
        "Order {} moved from {} to {} by {}",
        order.id,
        current.status.as_str(),
        order.status.as_str(),
        current_user.id
    );
    Ok(Json(order))
}

/// Attaches items (and optionally the vendor) to each order with one query
/// per table.
pub async fn load_order_details(
    db: &Database,
    orders: Vec<Order>,
    with_vendor: bool,
) -> Result<Vec<OrderDetail>, sqlx::Error> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let rows = sqlx::query_as::<_, OrderItemDetail>(
        r#"
        SELECT oi.*, p.name AS product_name, p.unit AS product_unit
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.created_at
        "#,
    )
    .bind(&order_ids)
    .fetch_all(db)
    .await?;

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    for row in rows {
        items_by_order.entry(row.item.order_id).or_default().push(row);
    }

    let mut vendors: HashMap<Uuid, UserSummary> = HashMap::new();
    if with_vendor {
        let vendor_ids: Vec<Uuid> = orders.iter().map(|o| o.vendor_id).collect();
        vendors = sqlx::query_as::<_, UserSummary>(
            "SELECT id, email, first_name, last_name FROM users WHERE id = ANY($1)",
        )
        .bind(&vendor_ids)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetail {
            vendor: vendors.get(&order.vendor_id).cloned(),
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}
