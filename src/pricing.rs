//! Bulk discount pricing.
//!
//! A product may carry a quantity threshold and a flat percentage. Ordering
//! at least the threshold discounts every unit by that percentage; below it
//! the base price applies. Prices are kept at two decimal places, rounding
//! half away from zero, to match the `NUMERIC(_, 2)` columns they land in.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulkDiscount {
    pub threshold: i32,
    pub percentage: Decimal,
}

impl BulkDiscount {
    /// A zero threshold or zero percentage means the product has no offer.
    pub fn is_configured(&self) -> bool {
        self.threshold > 0 && self.percentage > Decimal::ZERO
    }

    pub fn percentage_for(&self, quantity: i32) -> Decimal {
        if self.is_configured() && quantity >= self.threshold {
            self.percentage
        } else {
            Decimal::ZERO
        }
    }
}

pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `base × (1 − pct/100)`, rounded to cents.
pub fn discounted_unit_price(base_price: Decimal, percentage: Decimal) -> Decimal {
    let factor = Decimal::ONE - percentage / Decimal::ONE_HUNDRED;
    round_price(base_price * factor)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLine {
    pub quantity: i32,
    pub base_price: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount_applied: Decimal,
}

impl PricedLine {
    pub fn undiscounted_total(&self) -> Decimal {
        self.base_price * Decimal::from(self.quantity)
    }

    pub fn savings(&self) -> Decimal {
        self.undiscounted_total() - self.total_price
    }
}

pub fn price_line(base_price: Decimal, discount: &BulkDiscount, quantity: i32) -> PricedLine {
    let discount_applied = discount.percentage_for(quantity);
    let unit_price = discounted_unit_price(base_price, discount_applied);

    PricedLine {
        quantity,
        base_price,
        unit_price,
        total_price: unit_price * Decimal::from(quantity),
        discount_applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ten_off_at_fifty() -> BulkDiscount {
        BulkDiscount {
            threshold: 50,
            percentage: dec!(10),
        }
    }

    #[test]
    fn below_threshold_pays_base_price() {
        let line = price_line(dec!(40.00), &ten_off_at_fifty(), 49);
        assert_eq!(line.discount_applied, Decimal::ZERO);
        assert_eq!(line.unit_price, dec!(40.00));
        assert_eq!(line.total_price, dec!(1960.00));
        assert_eq!(line.savings(), Decimal::ZERO);
    }

    #[test]
    fn threshold_is_inclusive() {
        let line = price_line(dec!(40.00), &ten_off_at_fifty(), 50);
        assert_eq!(line.discount_applied, dec!(10));
        assert_eq!(line.unit_price, dec!(36.00));
        assert_eq!(line.total_price, dec!(1800.00));
        assert_eq!(line.savings(), dec!(200.00));
    }

    #[test]
    fn unconfigured_discount_never_applies() {
        let zero_pct = BulkDiscount {
            threshold: 10,
            percentage: Decimal::ZERO,
        };
        let zero_threshold = BulkDiscount {
            threshold: 0,
            percentage: dec!(15),
        };
        assert_eq!(zero_pct.percentage_for(1_000), Decimal::ZERO);
        assert_eq!(zero_threshold.percentage_for(1_000), Decimal::ZERO);
    }

    #[test]
    fn unit_price_rounds_to_cents() {
        // 33.33 * 0.875 = 29.16375
        assert_eq!(discounted_unit_price(dec!(33.33), dec!(12.5)), dec!(29.16));
        // 0.15 * 0.5 = 0.075, midpoint goes up
        assert_eq!(discounted_unit_price(dec!(0.15), dec!(50)), dec!(0.08));
    }

    #[test]
    fn total_is_unit_price_times_quantity() {
        let discount = BulkDiscount {
            threshold: 3,
            percentage: dec!(7.5),
        };
        for quantity in [1, 2, 3, 17, 250] {
            let line = price_line(dec!(19.99), &discount, quantity);
            assert_eq!(line.total_price, line.unit_price * Decimal::from(quantity));
        }
    }

    #[test]
    fn full_discount_is_free() {
        let line = price_line(
            dec!(12.00),
            &BulkDiscount {
                threshold: 1,
                percentage: dec!(100),
            },
            4,
        );
        assert_eq!(line.total_price, Decimal::ZERO);
        assert_eq!(line.savings(), dec!(48.00));
    }
}
