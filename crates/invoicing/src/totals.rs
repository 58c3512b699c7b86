//! Invoice aggregator.
//!
//! Totals are computed exactly in decimal; nothing is floored or clamped. A
//! negative `grand_total` (discount larger than the items) and a negative
//! `remaining_payment` (overpayment) are both legitimate values. Every figure
//! must still fit a stored amount; sums that leave that range are rejected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::{MAX_QUANTITY, checked_add, checked_sum, ensure_amount, line_total};
use shopbooks_core::{DomainError, DomainResult};

/// The part of a line item the aggregator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmount {
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl LineAmount {
    pub fn new(quantity: i64, unit_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
        }
    }

    pub fn total(&self) -> DomainResult<Decimal> {
        line_total(self.quantity, self.unit_price)
    }
}

/// Derived invoice figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_quantity: i64,
    pub sub_total: Decimal,
    pub grand_total: Decimal,
    /// `paid_amount + Σ installments`.
    pub total_paid: Decimal,
    pub remaining_payment: Decimal,
}

impl Totals {
    pub fn is_fully_paid(&self) -> bool {
        self.remaining_payment <= Decimal::ZERO
    }

    /// Amount paid beyond the grand total (customer credit), zero otherwise.
    pub fn overpayment(&self) -> Decimal {
        if self.remaining_payment < Decimal::ZERO {
            -self.remaining_payment
        } else {
            Decimal::ZERO
        }
    }
}

/// Recompute every derived invoice figure from its inputs.
pub fn recalculate(
    lines: &[LineAmount],
    discount: Decimal,
    shipping: Decimal,
    paid_amount: Decimal,
    installments: &[Decimal],
) -> DomainResult<Totals> {
    let mut total_quantity = 0i64;
    let mut sub_total = Decimal::ZERO;
    for line in lines {
        total_quantity = total_quantity
            .checked_add(line.quantity)
            .filter(|q| *q <= MAX_QUANTITY)
            .ok_or_else(|| DomainError::validation("total quantity is out of range"))?;
        sub_total = checked_add("sub total", sub_total, line.total()?)?;
    }

    let grand_total = checked_add("grand total", sub_total, shipping)?;
    let grand_total = checked_add("grand total", grand_total, -discount)?;
    let total_paid = checked_add(
        "total paid",
        paid_amount,
        checked_sum("total paid", installments.iter().copied())?,
    )?;
    let remaining_payment = ensure_amount("remaining payment", grand_total - total_paid)?;

    Ok(Totals {
        total_quantity,
        sub_total,
        grand_total,
        total_paid,
        remaining_payment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reference_invoice() {
        let lines = [LineAmount::new(3, dec!(10.00)), LineAmount::new(1, dec!(5.00))];
        let t = recalculate(&lines, dec!(2.00), dec!(1.00), dec!(20.00), &[]).unwrap();

        assert_eq!(t.total_quantity, 4);
        assert_eq!(t.sub_total, dec!(35.00));
        assert_eq!(t.grand_total, dec!(34.00));
        assert_eq!(t.remaining_payment, dec!(14.00));
        assert!(!t.is_fully_paid());
    }

    #[test]
    fn discount_above_sub_total_gives_negative_grand_total() {
        let t = recalculate(
            &[LineAmount::new(1, dec!(5.00))],
            dec!(8.00),
            Decimal::ZERO,
            Decimal::ZERO,
            &[],
        )
        .unwrap();
        assert_eq!(t.grand_total, dec!(-3.00));
        assert!(t.is_fully_paid());
    }

    #[test]
    fn installments_count_toward_payment() {
        let t = recalculate(
            &[LineAmount::new(2, dec!(50))],
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(20),
            &[dec!(30), dec!(50)],
        )
        .unwrap();
        assert_eq!(t.total_paid, dec!(100));
        assert_eq!(t.remaining_payment, Decimal::ZERO);
        assert!(t.is_fully_paid());
        assert_eq!(t.overpayment(), Decimal::ZERO);
    }

    #[test]
    fn overpayment_is_surfaced_not_clamped() {
        let t = recalculate(
            &[LineAmount::new(1, dec!(10))],
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(15),
            &[],
        )
        .unwrap();
        assert_eq!(t.remaining_payment, dec!(-5));
        assert_eq!(t.overpayment(), dec!(5));
    }

    #[test]
    fn oversized_line_is_rejected_not_panicking() {
        let lines = [LineAmount::new(i64::MAX, dec!(100000000000.00))];
        let err = recalculate(&lines, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, &[]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn sums_beyond_stored_range_are_rejected() {
        let big = LineAmount::new(1, dec!(999999999999.99));
        assert!(recalculate(&[big], Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, &[]).is_ok());
        assert!(recalculate(&[big, big], Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, &[]).is_err());
        assert!(recalculate(&[big], Decimal::ZERO, dec!(1), Decimal::ZERO, &[]).is_err());

        let many = [LineAmount::new(MAX_QUANTITY, dec!(0)), LineAmount::new(1, dec!(0))];
        assert!(recalculate(&many, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, &[]).is_err());

        let paid = [dec!(999999999999.99)];
        assert!(recalculate(&[big], Decimal::ZERO, Decimal::ZERO, dec!(1), &paid).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn cents(max: i64) -> impl Strategy<Value = Decimal> {
            (0..max).prop_map(|c| Decimal::new(c, 2))
        }

        fn line() -> impl Strategy<Value = LineAmount> {
            (1i64..500, cents(1_000_000)).prop_map(|(q, p)| LineAmount::new(q, p))
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: sub_total is the exact sum of quantity × price.
            #[test]
            fn sub_total_is_exact(lines in prop::collection::vec(line(), 0..20)) {
                let t = recalculate(&lines, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, &[]).unwrap();
                let mut expected = Decimal::ZERO;
                let mut qty = 0i64;
                for l in &lines {
                    expected += Decimal::from(l.quantity) * l.unit_price;
                    qty += l.quantity;
                }
                prop_assert_eq!(t.sub_total, expected);
                prop_assert_eq!(t.total_quantity, qty);
            }

            /// Property: grand_total = sub_total − discount + shipping, even when
            /// the discount exceeds the sub total.
            #[test]
            fn grand_total_formula(
                lines in prop::collection::vec(line(), 0..10),
                discount in cents(100_000_000),
                shipping in cents(1_000_000),
            ) {
                let t = recalculate(&lines, discount, shipping, Decimal::ZERO, &[]).unwrap();
                prop_assert_eq!(t.grand_total, t.sub_total - discount + shipping);
            }

            /// Property: each installment of A lowers remaining_payment by exactly A.
            #[test]
            fn installment_lowers_remaining_by_its_amount(
                lines in prop::collection::vec(line(), 1..10),
                paid in cents(1_000_000),
                installments in prop::collection::vec(cents(1_000_000), 0..10),
                extra in cents(1_000_000),
            ) {
                let before = recalculate(&lines, Decimal::ZERO, Decimal::ZERO, paid, &installments).unwrap();
                let mut more = installments.clone();
                more.push(extra);
                let after = recalculate(&lines, Decimal::ZERO, Decimal::ZERO, paid, &more).unwrap();

                prop_assert_eq!(
                    before.remaining_payment,
                    before.grand_total - (paid + installments.iter().copied().sum::<Decimal>())
                );
                prop_assert_eq!(before.remaining_payment - after.remaining_payment, extra);
            }
        }
    }
}
