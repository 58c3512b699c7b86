//! Decimal money helpers.
//!
//! All monetary values are `rust_decimal::Decimal`. Amounts are rounded to two
//! places with half-to-even ("banker's") rounding where the model stores a
//! computed value, and rendered as fixed-point strings with two decimals.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult, FieldErrors};

/// Monetary amount.
pub type Amount = Decimal;

/// Number of decimal places stored for money.
pub const MONEY_SCALE: u32 = 2;

/// Largest magnitude a stored amount may hold (`NUMERIC(14, 2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Largest percentage a stock receipt may carry (`NUMERIC(7, 2)`).
pub const MAX_PERCENT: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 2);

/// Largest quantity accepted on a single line or movement.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Round to [`MONEY_SCALE`] places, half to even.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Fixed-point rendering with exactly two decimals (`"35.00"`, `"-70.00"`).
pub fn format_money(value: Decimal) -> String {
    let mut v = round_money(value);
    v.rescale(MONEY_SCALE);
    v.to_string()
}

/// `quantity × unit_price`, exact. Fails when the product does not fit a
/// stored amount.
pub fn line_total(quantity: i64, unit_price: Decimal) -> DomainResult<Decimal> {
    let total = Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(|| DomainError::validation("line total is out of range"))?;
    ensure_amount("line total", total)
}

/// Add two amounts, failing instead of leaving the stored range.
pub fn checked_add(what: &str, a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    let total = a
        .checked_add(b)
        .ok_or_else(|| DomainError::validation(format!("{what} is out of range")))?;
    ensure_amount(what, total)
}

/// Sum of `values`, bounded like [`checked_add`].
pub fn checked_sum<I>(what: &str, values: I) -> DomainResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(what, acc, v))
}

/// Reject a computed amount whose magnitude exceeds [`MAX_AMOUNT`].
pub fn ensure_amount(what: &str, value: Decimal) -> DomainResult<Decimal> {
    if value.abs() > MAX_AMOUNT {
        return Err(DomainError::validation(format!(
            "{what} exceeds the maximum amount of {MAX_AMOUNT}"
        )));
    }
    Ok(value)
}

/// `base × (1 + percent / 100)`, exact (not rounded).
pub fn with_markup(base: Decimal, percent: Decimal) -> Decimal {
    base * (Decimal::ONE + percent / Decimal::ONE_HUNDRED)
}

/// Validation helper: at most two decimal places and within [`MAX_AMOUNT`].
/// Sign is not checked.
pub fn check_amount(errors: &mut FieldErrors, field: &str, value: Decimal) {
    check_scale(errors, field, value);
    if value.abs() > MAX_AMOUNT {
        errors.add(
            field,
            format!("Ensure this value is less than or equal to {MAX_AMOUNT}."),
        );
    }
}

/// Validation helper: amount must be `>= 0`.
pub fn check_non_negative(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
    }
    check_amount(errors, field, value);
}

/// Validation helper: amount must be `> 0`.
pub fn check_positive(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value <= Decimal::ZERO {
        errors.add(field, "Ensure this value is greater than 0.");
    }
    check_amount(errors, field, value);
}

/// Validation helper: percentage in `0..=MAX_PERCENT` with two decimals.
pub fn check_percent(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
    }
    check_scale(errors, field, value);
    if value > MAX_PERCENT {
        errors.add(
            field,
            format!("Ensure this value is less than or equal to {MAX_PERCENT}."),
        );
    }
}

/// Validation helper: quantity in `1..=MAX_QUANTITY`.
pub fn check_quantity(errors: &mut FieldErrors, field: &str, value: i64) {
    if value <= 0 {
        errors.add(field, "Ensure this value is greater than 0.");
    } else if value > MAX_QUANTITY {
        errors.add(
            field,
            format!("Ensure this value is less than or equal to {MAX_QUANTITY}."),
        );
    }
}

fn check_scale(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value.normalize().scale() > MONEY_SCALE {
        errors.add(field, "Ensure that there are no more than 2 decimal places.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_money(dec!(2.675)), dec!(2.68));
        assert_eq!(round_money(dec!(2.665)), dec!(2.66));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.00));
    }

    #[test]
    fn format_pads_to_two_decimals() {
        assert_eq!(format_money(dec!(35)), "35.00");
        assert_eq!(format_money(dec!(34.5)), "34.50");
        assert_eq!(format_money(dec!(-70)), "-70.00");
        assert_eq!(format_money(Decimal::ZERO), "0.00");
    }

    #[test]
    fn markup_applies_percent() {
        assert_eq!(with_markup(dec!(100), dec!(10)), dec!(110));
        assert_eq!(with_markup(dec!(100), Decimal::ZERO), dec!(100));
    }

    #[test]
    fn amount_checks_record_field_messages() {
        let mut errors = FieldErrors::new();
        check_non_negative(&mut errors, "discount", dec!(-0.01));
        check_non_negative(&mut errors, "shipping", Decimal::ZERO);
        check_positive(&mut errors, "amount", Decimal::ZERO);

        assert!(errors.get("discount").is_some());
        assert!(errors.get("shipping").is_none());
        assert!(errors.get("amount").is_some());
    }

    #[test]
    fn bounds_match_stored_precision() {
        assert_eq!(MAX_AMOUNT, dec!(999999999999.99));
        assert_eq!(MAX_PERCENT, dec!(99999.99));
    }

    #[test]
    fn amounts_with_more_than_two_places_are_rejected() {
        let mut errors = FieldErrors::new();
        check_non_negative(&mut errors, "price", dec!(0.125));
        check_positive(&mut errors, "amount", dec!(10.001));
        check_percent(&mut errors, "buying_percent", dec!(12.345));
        check_non_negative(&mut errors, "shipping", dec!(1.50));
        check_non_negative(&mut errors, "discount", dec!(2.100000));

        assert!(errors.get("price").is_some());
        assert!(errors.get("amount").is_some());
        assert!(errors.get("buying_percent").is_some());
        assert!(errors.get("shipping").is_none());
        assert!(errors.get("discount").is_none());
    }

    #[test]
    fn oversized_values_are_rejected() {
        let mut errors = FieldErrors::new();
        check_non_negative(&mut errors, "price", dec!(100000000000000.00));
        check_positive(&mut errors, "amount", MAX_AMOUNT);
        check_amount(&mut errors, "opening_balance", -MAX_AMOUNT - dec!(0.01));
        check_percent(&mut errors, "buying_percent", dec!(100000));
        check_quantity(&mut errors, "quantity", i64::MAX);
        check_quantity(&mut errors, "stock_quantity", MAX_QUANTITY);

        assert!(errors.get("price").is_some());
        assert!(errors.get("amount").is_none());
        assert!(errors.get("opening_balance").is_some());
        assert!(errors.get("buying_percent").is_some());
        assert!(errors.get("quantity").is_some());
        assert!(errors.get("stock_quantity").is_none());
    }

    #[test]
    fn line_total_overflow_is_an_error() {
        assert_eq!(line_total(3, dec!(10.00)).unwrap(), dec!(30.00));
        assert!(matches!(
            line_total(i64::MAX, dec!(100000000000.00)),
            Err(DomainError::Validation(_))
        ));
        assert!(line_total(MAX_QUANTITY, MAX_AMOUNT).is_err());
    }

    #[test]
    fn checked_sum_stops_at_max_amount() {
        assert_eq!(checked_sum("total", [dec!(1), dec!(2.50)]).unwrap(), dec!(3.50));
        assert!(checked_sum("total", [MAX_AMOUNT, dec!(0.01)]).is_err());
        assert!(checked_add("total", Decimal::MAX, Decimal::MAX).is_err());
    }
}
