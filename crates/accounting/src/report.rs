//! Period summaries: sales against expenses over a date range.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::{DomainError, DomainResult};

use crate::expense::Expense;

/// Sales, expenses and profit over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub invoice_count: u64,
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    pub profit_loss: Decimal,
}

impl PeriodSummary {
    /// `sales` are `(date, grand_total)` pairs; rows outside the range are ignored.
    pub fn compute<'a, S, E>(from: NaiveDate, to: NaiveDate, sales: S, expenses: E) -> Self
    where
        S: IntoIterator<Item = (NaiveDate, Decimal)>,
        E: IntoIterator<Item = &'a Expense>,
    {
        let in_range = |d: NaiveDate| d >= from && d <= to;

        let mut invoice_count = 0u64;
        let mut total_sales = Decimal::ZERO;
        for (date, grand_total) in sales {
            if in_range(date) {
                invoice_count += 1;
                total_sales += grand_total;
            }
        }

        let total_expenses = expenses
            .into_iter()
            .filter(|e| in_range(e.date))
            .fold(Decimal::ZERO, |acc, e| acc + e.amount);

        Self {
            from,
            to,
            invoice_count,
            total_sales,
            total_expenses,
            profit_loss: total_sales - total_expenses,
        }
    }

    pub fn is_profit(&self) -> bool {
        self.profit_loss >= Decimal::ZERO
    }
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> DomainResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::validation(format!("invalid month {year}-{month:02}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| DomainError::validation(format!("invalid month {year}-{month:02}")))?;
    let last = next
        .pred_opt()
        .ok_or_else(|| DomainError::validation("date out of range"))?;
    Ok((first, last))
}
