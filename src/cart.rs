//! Cart aggregation.
//!
//! Lines are keyed by product and kept in insertion order. Every change to a
//! line's quantity re-prices the whole line, so crossing a bulk threshold
//! discounts all of its units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::Product,
    pricing::{price_line, BulkDiscount, PricedLine},
};

/// One `{product_id, quantity}` pair as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit: String,
    #[serde(flatten)]
    pub pricing: PricedLine,
    #[serde(skip)]
    discount: BulkDiscount,
}

impl CartLine {
    fn new(product: &Product, quantity: i32) -> Self {
        let discount = product.bulk_discount();
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            unit: product.unit.clone(),
            pricing: price_line(product.base_price, &discount, quantity),
            discount,
        }
    }

    fn reprice(&mut self, quantity: i32) {
        self.pricing = price_line(self.pricing.base_price, &self.discount, quantity);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub total_items: i64,
    pub total_amount: Decimal,
    pub total_savings: Decimal,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units, merging with an existing line for the product,
    /// and returns the line's new quantity. Non-positive quantities and merges
    /// that would overflow leave the cart untouched and return `None`.
    pub fn add(&mut self, product: &Product, quantity: i32) -> Option<i32> {
        if quantity <= 0 {
            return None;
        }

        match self.lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => {
                let merged = line.pricing.quantity.checked_add(quantity)?;
                line.reprice(merged);
                Some(merged)
            }
            None => {
                self.lines.push(CartLine::new(product, quantity));
                Some(quantity)
            }
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.pricing.quantity)).sum()
    }

    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(|line| line.pricing.total_price).sum()
    }

    pub fn total_savings(&self) -> Decimal {
        self.lines.iter().map(|line| line.pricing.savings()).sum()
    }

    pub fn into_summary(self) -> CartSummary {
        CartSummary {
            total_items: self.total_items(),
            total_amount: self.total_amount(),
            total_savings: self.total_savings(),
            items: self.lines,
        }
    }
}
