use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    error::AppResult,
    utils::validation::{Validator, MAX_NAME_LEN, MAX_TEXT_LEN, MAX_UNIT_LEN},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum SpecialRequestStatus {
    Open,
    Responded,
    Fulfilled,
    Cancelled,
}

impl SpecialRequestStatus {
    /// Requests stay open to supplier replies until settled.
    pub fn is_open(self) -> bool {
        matches!(self, SpecialRequestStatus::Open | SpecialRequestStatus::Responded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpecialRequest {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub item_name: String,
    pub description: String,
    pub quantity: i32,
    pub unit: String,
    pub budget_per_unit: Option<Decimal>,
    pub urgency: Urgency,
    pub status: SpecialRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpecialRequestResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub supplier_id: Uuid,
    pub available_quantity: i32,
    pub price_per_unit: Decimal,
    pub message: Option<String>,
    pub status: ResponseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResponseDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub response: SpecialRequestResponse,
    pub supplier_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SpecialRequestRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: SpecialRequest,
    pub vendor_name: String,
}

#[derive(Debug, Serialize)]
pub struct SpecialRequestDetail {
    #[serde(flatten)]
    pub request: SpecialRequest,
    pub vendor_name: String,
    pub responses: Vec<ResponseDetail>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSpecialRequest {
    pub item_name: String,
    pub description: String,
    pub quantity: i32,
    pub unit: String,
    pub budget_per_unit: Option<Decimal>,
    #[serde(default)]
    pub urgency: Urgency,
}

impl CreateSpecialRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required_text(&self.item_name, "item_name", MAX_NAME_LEN)
            .required_text(&self.description, "description", MAX_TEXT_LEN)
            .quantity(self.quantity, "quantity")
            .required_text(&self.unit, "unit", MAX_UNIT_LEN);
        if let Some(budget) = self.budget_per_unit {
            v.unit_price(budget, "budget_per_unit");
        }
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct RespondToRequest {
    pub available_quantity: i32,
    pub price_per_unit: Decimal,
    pub message: Option<String>,
}

impl RespondToRequest {
    pub fn validate(&self) -> AppResult<()> {
        Validator::new()
            .quantity(self.available_quantity, "available_quantity")
            .unit_price(self.price_per_unit, "price_per_unit")
            .optional_text(self.message.as_deref(), "message", MAX_TEXT_LEN)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct DecideResponse {
    pub status: ResponseStatus,
}
