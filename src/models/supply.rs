use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    error::AppResult,
    utils::validation::{Validator, MAX_TEXT_LEN},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum SupplyOfferStatus {
    Pending,
    Accepted,
    Rejected,
    Fulfilled,
}

impl SupplyOfferStatus {
    pub fn can_transition_to(self, next: SupplyOfferStatus) -> bool {
        use SupplyOfferStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted) | (Pending, Rejected) | (Accepted, Fulfilled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SupplyOfferStatus::Pending => "pending",
            SupplyOfferStatus::Accepted => "accepted",
            SupplyOfferStatus::Rejected => "rejected",
            SupplyOfferStatus::Fulfilled => "fulfilled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupplyOffer {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    pub available_quantity: i32,
    pub price_per_unit: Decimal,
    pub delivery_date: DateTime<Utc>,
    pub status: SupplyOfferStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplyOfferDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub offer: SupplyOffer,
    pub product_name: String,
    pub product_unit: String,
    pub supplier_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplyOffer {
    pub product_id: Uuid,
    pub available_quantity: i32,
    pub price_per_unit: Decimal,
    pub delivery_date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl CreateSupplyOffer {
    pub fn validate(&self) -> AppResult<()> {
        Validator::new()
            .quantity(self.available_quantity, "available_quantity")
            .unit_price(self.price_per_unit, "price_per_unit")
            .optional_text(self.notes.as_deref(), "notes", MAX_TEXT_LEN)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSupplyOfferStatus {
    pub status: SupplyOfferStatus,
}
