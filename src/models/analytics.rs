use serde::Serialize;
use rust_decimal::Decimal;

#[derive(Debug, Serialize)]
pub struct VendorStats {
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub orders_this_month: i64,
}

#[derive(Debug, Serialize)]
pub struct SupplierStats {
    pub total_supplies: i64,
    pub revenue: Decimal,
    pub fulfillment_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_vendors: i64,
    pub total_suppliers: i64,
    pub total_orders: i64,
    pub orders_today: i64,
    pub revenue_today: Decimal,
}

/// Share of fulfilled offers as a whole percentage, rounded half up.
pub fn fulfillment_rate(total: i64, fulfilled: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (fulfilled * 200 + total) / (total * 2)
}
