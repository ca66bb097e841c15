//! Request validation helpers.
//!
//! A [`Validator`] collects every failed check so a request reports all of
//! its field errors at once instead of the first one.

use rust_decimal::Decimal;

use crate::error::{AppError, FieldError};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PERSON_NAME_LEN: usize = 100;
pub const MAX_UNIT_LEN: usize = 20;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_TEXT_LEN: usize = 2000;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Largest quantity a single order line, offer or request may carry.
pub const MAX_ITEM_QUANTITY: i32 = 100_000;

/// Upper bound for per-unit prices, stored as `NUMERIC(10, 2)`.
pub fn max_unit_price() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

/// Upper bound for order and line totals, stored as `NUMERIC(12, 2)`.
pub fn max_order_amount() -> Decimal {
    Decimal::new(9_999_999_999_99, 2)
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn required_text(&mut self, value: &str, field: &str, max_len: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.check(false, field, format!("{field} is required"))
        } else {
            self.check(
                value.chars().count() <= max_len,
                field,
                format!("{field} must be at most {max_len} characters"),
            )
        }
    }

    pub fn optional_text(&mut self, value: Option<&str>, field: &str, max_len: usize) -> &mut Self {
        match value {
            Some(v) => self.check(
                v.chars().count() <= max_len,
                field,
                format!("{field} must be at most {max_len} characters"),
            ),
            None => self,
        }
    }

    pub fn email(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(
            is_valid_email(value) && value.len() <= MAX_EMAIL_LEN,
            field,
            "Invalid email address",
        )
    }

    pub fn quantity(&mut self, value: i32, field: &str) -> &mut Self {
        if value <= 0 {
            self.check(false, field, format!("{field} must be greater than 0"))
        } else {
            self.check(
                value <= MAX_ITEM_QUANTITY,
                field,
                format!("{field} must be at most {MAX_ITEM_QUANTITY}"),
            )
        }
    }

    pub fn unit_price(&mut self, value: Decimal, field: &str) -> &mut Self {
        if value <= Decimal::ZERO {
            self.check(false, field, format!("{field} must be greater than 0"))
        } else {
            let max = max_unit_price();
            self.check(value <= max, field, format!("{field} must be at most {max}"))
        }
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Shape check only: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !value.chars().any(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("vendor@mandi.in"));
        assert!(!is_valid_email("vendor"));
        assert!(!is_valid_email("vendor@localhost"));
        assert!(!is_valid_email("a@b@c.in"));
        assert!(!is_valid_email("with space@mandi.in"));
        assert!(!is_valid_email("@mandi.in"));
    }

    #[test]
    fn collects_every_failure() {
        let err = Validator::new()
            .required_text("  ", "name", MAX_NAME_LEN)
            .quantity(0, "quantity")
            .unit_price(dec!(-1.50), "price_per_unit")
            .finish()
            .unwrap_err();

        match err {
            AppError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "quantity", "price_per_unit"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn passes_when_clean() {
        assert!(Validator::new()
            .required_text("Onions", "name", MAX_NAME_LEN)
            .optional_text(None, "notes", MAX_TEXT_LEN)
            .quantity(5, "quantity")
            .finish()
            .is_ok());
    }

    #[test]
    fn quantities_and_prices_are_capped() {
        let err = Validator::new()
            .quantity(MAX_ITEM_QUANTITY, "ok_quantity")
            .quantity(MAX_ITEM_QUANTITY + 1, "quantity")
            .unit_price(max_unit_price(), "ok_price")
            .unit_price(dec!(100000000), "price_per_unit")
            .finish()
            .unwrap_err();

        match err {
            AppError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["quantity", "price_per_unit"]);
                assert_eq!(errors[0].message, "quantity must be at most 100000");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_overlong_text() {
        let long = "x".repeat(MAX_UNIT_LEN + 1);
        assert!(Validator::new()
            .required_text(&long, "unit", MAX_UNIT_LEN)
            .finish()
            .is_err());
    }
}
