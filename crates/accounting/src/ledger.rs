use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::check_positive;
use shopbooks_core::{CustomerId, DomainResult, FieldErrors, LedgerEntryId, impl_entity};

const DETAIL_MAX: usize = 255;

/// One row of a customer's ledger. Append-only.
///
/// Debit = amount charged to the customer, credit = amount the customer paid.
/// Exactly one side is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub detail: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl_entity!(LedgerEntry, LedgerEntryId);

/// Input for a debit or credit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub amount: Decimal,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewLedgerEntry {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        check_positive(&mut errors, "amount", self.amount);
        errors.require("detail", &self.detail);
        errors.max_len("detail", &self.detail, DETAIL_MAX);
        errors.into_result()
    }

    pub fn into_debit(
        self,
        id: LedgerEntryId,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> DomainResult<LedgerEntry> {
        let amount = self.amount;
        self.into_entry(id, customer_id, now, amount, Decimal::ZERO)
    }

    pub fn into_credit(
        self,
        id: LedgerEntryId,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> DomainResult<LedgerEntry> {
        let amount = self.amount;
        self.into_entry(id, customer_id, now, Decimal::ZERO, amount)
    }

    fn into_entry(
        self,
        id: LedgerEntryId,
        customer_id: CustomerId,
        now: DateTime<Utc>,
        debit_amount: Decimal,
        credit_amount: Decimal,
    ) -> DomainResult<LedgerEntry> {
        self.validate()?;
        Ok(LedgerEntry {
            id,
            customer_id,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            detail: self.detail.trim().to_string(),
            debit_amount,
            credit_amount,
            created_at: now,
        })
    }
}

/// Aggregated ledger sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl LedgerTotals {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        entries.into_iter().fold(Self::default(), |acc, e| Self {
            total_debit: acc.total_debit + e.debit_amount,
            total_credit: acc.total_credit + e.credit_amount,
        })
    }

    /// `Σ credit − Σ debit`. Negative means the customer owes that amount.
    pub fn balance(&self) -> Decimal {
        self.total_credit - self.total_debit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use shopbooks_core::DomainError;

    fn entry(amount: Decimal, detail: &str) -> NewLedgerEntry {
        NewLedgerEntry {
            amount,
            detail: detail.to_string(),
            date: None,
        }
    }

    #[test]
    fn no_rows_balance_is_zero() {
        let rows: Vec<LedgerEntry> = Vec::new();
        let totals = LedgerTotals::from_entries(&rows);
        assert_eq!(totals.balance(), Decimal::ZERO);
    }

    #[test]
    fn customer_who_owes_has_negative_balance() {
        let customer = CustomerId::new();
        let now = Utc::now();
        let rows = vec![
            entry(dec!(100), "sale")
                .into_debit(LedgerEntryId::new(), customer, now)
                .unwrap(),
            entry(dec!(40), "payment")
                .into_credit(LedgerEntryId::new(), customer, now)
                .unwrap(),
            entry(dec!(10), "delivery")
                .into_debit(LedgerEntryId::new(), customer, now)
                .unwrap(),
        ];

        let totals = LedgerTotals::from_entries(&rows);
        assert_eq!(totals.total_debit, dec!(110));
        assert_eq!(totals.total_credit, dec!(40));
        assert_eq!(totals.balance(), dec!(-70));
    }

    #[test]
    fn rows_have_one_side_only() {
        let e = entry(dec!(12.50), "cash")
            .into_credit(LedgerEntryId::new(), CustomerId::new(), Utc::now())
            .unwrap();
        assert_eq!(e.debit_amount, Decimal::ZERO);
        assert_eq!(e.credit_amount, dec!(12.50));
    }

    #[test]
    fn invalid_input_collects_field_errors() {
        let err = entry(Decimal::ZERO, "")
            .into_debit(LedgerEntryId::new(), CustomerId::new(), Utc::now())
            .unwrap_err();
        match err {
            DomainError::InvalidFields(f) => {
                assert!(f.get("amount").is_some());
                assert!(f.get("detail").is_some());
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }

        assert!(entry(dec!(1), &"x".repeat(256)).validate().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: balance is always Σ credit − Σ debit, whatever the order.
        #[test]
        fn balance_is_credit_minus_debit(
            rows in prop::collection::vec((1i64..10_000_000, any::<bool>()), 0..30)
        ) {
            let customer = CustomerId::new();
            let now = Utc::now();
            let mut debit = Decimal::ZERO;
            let mut credit = Decimal::ZERO;
            let mut entries = Vec::new();

            for (cents, is_debit) in rows {
                let amount = Decimal::new(cents, 2);
                let new = entry(amount, "row");
                let e = if is_debit {
                    debit += amount;
                    new.into_debit(LedgerEntryId::new(), customer, now).unwrap()
                } else {
                    credit += amount;
                    new.into_credit(LedgerEntryId::new(), customer, now).unwrap()
                };
                entries.push(e);
            }

            let totals = LedgerTotals::from_entries(&entries);
            prop_assert_eq!(totals.balance(), credit - debit);

            entries.reverse();
            prop_assert_eq!(LedgerTotals::from_entries(&entries), totals);
        }
    }
}
