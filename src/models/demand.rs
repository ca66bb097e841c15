use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Per product/day counters. `remaining_demand` is rewritten from the other
/// two on every update and goes negative when supply exceeds orders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyDemand {
    pub id: Uuid,
    pub product_id: Uuid,
    pub date: NaiveDate,
    pub total_demand: i64,
    pub fulfilled_quantity: i64,
    pub remaining_demand: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DemandProduct {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub base_price: Decimal,
}

/// Demand row with its product nested under `product`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyDemandWithProduct {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub demand: DailyDemand,
    #[sqlx(flatten)]
    pub product: DemandProduct,
}

#[derive(Debug, Deserialize)]
pub struct DemandQuery {
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn query_parses_iso_date() {
        let q: DemandQuery = serde_json::from_str(r#"{"date":"2025-03-14"}"#).unwrap();
        assert_eq!(q.date, NaiveDate::from_ymd_opt(2025, 3, 14));
    }

    #[test]
    fn product_serializes_nested() {
        let now = Utc::now();
        let row = DailyDemandWithProduct {
            demand: DailyDemand {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                date: now.date_naive(),
                total_demand: 40,
                fulfilled_quantity: 25,
                remaining_demand: 15,
                created_at: now,
                updated_at: now,
            },
            product: DemandProduct {
                name: "Red Onions".into(),
                category: "Vegetables".into(),
                unit: "kg".into(),
                base_price: dec!(40),
            },
        };

        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["remaining_demand"], 15);
        assert_eq!(json["product"]["name"], "Red Onions");
        assert_eq!(json["product"]["unit"], "kg");
        assert!(json.get("product_name").is_none());
    }
}
