pub mod admin;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod demand;
pub mod orders;
pub mod products;
pub mod special_requests;
pub mod supply;

#[cfg(test)]
pub(crate) mod fixtures;

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
