use serde::{Deserialize, Serialize};

use shopbooks_core::{DomainError, DomainResult, ProductId};

use crate::movement::{StockIn, StockOut};

/// Stock derived from movement history.
///
/// `available` may be negative when more was issued than received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub stocked_in: i64,
    pub stocked_out: i64,
    pub available: i64,
}

impl StockLevel {
    pub fn new(stocked_in: i64, stocked_out: i64) -> Self {
        Self {
            stocked_in,
            stocked_out,
            available: stocked_in.saturating_sub(stocked_out),
        }
    }

    /// Aggregate the movements belonging to `product`; other products are ignored.
    ///
    /// Fails when either total leaves the `i64` range.
    pub fn from_movements<'a, I, O>(product: ProductId, ins: I, outs: O) -> DomainResult<Self>
    where
        I: IntoIterator<Item = &'a StockIn>,
        O: IntoIterator<Item = &'a StockOut>,
    {
        let stocked_in = total(
            ins.into_iter()
                .filter(|s| s.product_id == product)
                .map(|s| s.stock_quantity),
        )?;
        let stocked_out = total(
            outs.into_iter()
                .filter(|s| s.product_id == product)
                .map(|s| s.quantity),
        )?;
        Ok(Self::new(stocked_in, stocked_out))
    }

    /// Value the cached counter should hold for this level.
    pub fn expected_counter(&self) -> i64 {
        self.available.max(0)
    }

    /// Whether issuing `quantity` more units would exceed what is available.
    pub fn would_oversell(&self, quantity: i64) -> bool {
        quantity > self.available
    }
}

fn total(mut quantities: impl Iterator<Item = i64>) -> DomainResult<i64> {
    quantities.try_fold(0i64, |acc, q| {
        acc.checked_add(q)
            .ok_or_else(|| DomainError::invariant("stock movement total is out of range"))
    })
}

/// Outcome of reconciling a product's cached counter with its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReconciliation {
    pub product_id: ProductId,
    pub level: StockLevel,
    pub cached_before: i64,
    pub cached_after: i64,
}

impl StockReconciliation {
    pub fn new(product_id: ProductId, level: StockLevel, cached_before: i64) -> Self {
        Self {
            product_id,
            level,
            cached_before,
            cached_after: level.expected_counter(),
        }
    }

    /// The cached counter differed from the history before reconciliation.
    pub fn drifted(&self) -> bool {
        self.cached_before != self.cached_after
    }

    /// Units issued beyond what was ever received (0 when not oversold).
    pub fn oversold_by(&self) -> i64 {
        (-self.level.available).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{NewStockIn, NewStockOut};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shopbooks_core::{StockInId, StockOutId};

    fn stock_in(product: ProductId, quantity: i64) -> StockIn {
        NewStockIn {
            product_id: product,
            stock_quantity: quantity,
            buying_price_item: Decimal::ONE,
            buying_percent: Decimal::ZERO,
            selling_price_item: Decimal::ONE,
            date: None,
        }
        .into_stock_in(StockInId::new(), Utc::now())
        .unwrap()
    }

    fn stock_out(product: ProductId, quantity: i64) -> StockOut {
        NewStockOut {
            product_id: product,
            quantity,
            invoice_id: None,
            date: None,
        }
        .into_stock_out(StockOutId::new(), Utc::now().date_naive())
        .unwrap()
    }

    #[test]
    fn no_movements_is_zero() {
        let ins: Vec<StockIn> = Vec::new();
        let outs: Vec<StockOut> = Vec::new();
        let level = StockLevel::from_movements(ProductId::new(), &ins, &outs).unwrap();
        assert_eq!(level, StockLevel::default());
    }

    #[test]
    fn level_ignores_other_products() {
        let p = ProductId::new();
        let other = ProductId::new();
        let ins = vec![stock_in(p, 50), stock_in(other, 7)];
        let outs = vec![stock_out(p, 10), stock_out(other, 2)];

        let level = StockLevel::from_movements(p, &ins, &outs).unwrap();
        assert_eq!(level, StockLevel::new(50, 10));
        assert_eq!(level.available, 40);
    }

    #[test]
    fn oversold_history_reports_drift() {
        let p = ProductId::new();
        let level = StockLevel::from_movements(p, &[stock_in(p, 5)], &[stock_out(p, 8)]).unwrap();
        assert_eq!(level.available, -3);
        assert!(level.would_oversell(1));

        let rec = StockReconciliation::new(p, level, 2);
        assert!(rec.drifted());
        assert_eq!(rec.cached_after, 0);
        assert_eq!(rec.oversold_by(), 3);
    }

    #[test]
    fn overflowing_history_is_an_error() {
        let p = ProductId::new();
        let mut huge = stock_in(p, 1);
        huge.stock_quantity = i64::MAX;
        let ins = vec![huge, stock_in(p, 1)];
        let outs: Vec<StockOut> = Vec::new();

        assert!(matches!(
            StockLevel::from_movements(p, &ins, &outs),
            Err(DomainError::InvariantViolation(_))
        ));
        assert_eq!(StockLevel::new(0, i64::MAX).available, -i64::MAX);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Movement {
            In(i64),
            Out(i64),
        }

        fn movement() -> impl Strategy<Value = Movement> {
            prop_oneof![
                (1i64..1_000).prop_map(Movement::In),
                (1i64..1_000).prop_map(Movement::Out),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: available = Σ in − Σ out for any interleaving, and
            /// reading twice gives the same answer.
            #[test]
            fn available_is_in_minus_out(moves in prop::collection::vec(movement(), 0..40)) {
                let p = ProductId::new();
                let mut ins = Vec::new();
                let mut outs = Vec::new();
                let mut expected = 0i64;

                for m in moves {
                    match m {
                        Movement::In(q) => {
                            expected += q;
                            ins.push(stock_in(p, q));
                        }
                        Movement::Out(q) => {
                            expected -= q;
                            outs.push(stock_out(p, q));
                        }
                    }
                }

                let first = StockLevel::from_movements(p, &ins, &outs).unwrap();
                let second = StockLevel::from_movements(p, &ins, &outs).unwrap();
                prop_assert_eq!(first.available, expected);
                prop_assert_eq!(first, second);
                prop_assert!(first.expected_counter() >= 0);
            }
        }
    }
}
