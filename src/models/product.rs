use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    error::AppResult,
    pricing::BulkDiscount,
    utils::validation::{Validator, MAX_NAME_LEN, MAX_TEXT_LEN, MAX_UNIT_LEN},
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: String,
    pub base_price: Decimal,
    pub image_url: Option<String>,
    pub bulk_discount_threshold: i32,
    pub bulk_discount_percentage: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn bulk_discount(&self) -> BulkDiscount {
        BulkDiscount {
            threshold: self.bulk_discount_threshold,
            percentage: self.bulk_discount_percentage,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: String,
    pub base_price: Decimal,
    pub image_url: Option<String>,
    #[serde(default)]
    pub bulk_discount_threshold: i32,
    #[serde(default)]
    pub bulk_discount_percentage: Decimal,
}

impl CreateProduct {
    pub fn validate(&self) -> AppResult<()> {
        validate_product_fields(
            &self.name,
            self.description.as_deref(),
            &self.category,
            &self.unit,
            self.base_price,
            self.bulk_discount_threshold,
            self.bulk_discount_percentage,
        )
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub base_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub bulk_discount_threshold: Option<i32>,
    pub bulk_discount_percentage: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl UpdateProduct {
    /// Merges the update into `product` and validates the result.
    pub fn apply(self, mut product: Product) -> AppResult<Product> {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(unit) = self.unit {
            product.unit = unit;
        }
        if let Some(base_price) = self.base_price {
            product.base_price = base_price;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(threshold) = self.bulk_discount_threshold {
            product.bulk_discount_threshold = threshold;
        }
        if let Some(percentage) = self.bulk_discount_percentage {
            product.bulk_discount_percentage = percentage;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }

        validate_product_fields(
            &product.name,
            product.description.as_deref(),
            &product.category,
            &product.unit,
            product.base_price,
            product.bulk_discount_threshold,
            product.bulk_discount_percentage,
        )?;
        Ok(product)
    }
}

fn validate_product_fields(
    name: &str,
    description: Option<&str>,
    category: &str,
    unit: &str,
    base_price: Decimal,
    threshold: i32,
    percentage: Decimal,
) -> AppResult<()> {
    Validator::new()
        .required_text(name, "name", MAX_NAME_LEN)
        .optional_text(description, "description", MAX_TEXT_LEN)
        .required_text(category, "category", 100)
        .required_text(unit, "unit", MAX_UNIT_LEN)
        .unit_price(base_price, "base_price")
        .check(
            threshold >= 0,
            "bulk_discount_threshold",
            "bulk_discount_threshold must not be negative",
        )
        .check(
            percentage >= Decimal::ZERO && percentage <= Decimal::ONE_HUNDRED,
            "bulk_discount_percentage",
            "bulk_discount_percentage must be between 0 and 100",
        )
        .finish()
}
