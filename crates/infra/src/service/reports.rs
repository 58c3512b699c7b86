use chrono::{NaiveDate, Utc};
use tracing::info;

use shopbooks_accounting::{
    Expense, ExpenseCategory, NewExpense, NewExpenseCategory, PeriodSummary, month_bounds,
};
use shopbooks_core::{DomainError, ExpenseCategoryId, ExpenseId};

use super::BackOffice;
use crate::error::{StoreError, StoreResult};
use crate::repository::{ExpenseRepository, InvoiceRepository};

fn check_range(from: NaiveDate, to: NaiveDate) -> StoreResult<()> {
    if from > to {
        return Err(DomainError::validation(format!("empty date range {from}..{to}")).into());
    }
    Ok(())
}

impl BackOffice {
    pub async fn create_expense_category(
        &self,
        new: NewExpenseCategory,
    ) -> StoreResult<ExpenseCategory> {
        let category = new.into_category(ExpenseCategoryId::new())?;
        let mut tx = self.begin().await?;
        tx.insert_expense_category(&category).await?;
        tx.commit().await?;
        Ok(category)
    }

    pub async fn expense_categories(&self) -> StoreResult<Vec<ExpenseCategory>> {
        let mut tx = self.begin().await?;
        tx.expense_categories().await
    }

    pub async fn create_expense(&self, new: NewExpense) -> StoreResult<Expense> {
        let mut tx = self.begin().await?;
        if let Some(category) = new.category_id {
            if tx.expense_category(category).await?.is_none() {
                return Err(StoreError::not_found(format!("expense category {category}")));
            }
        }
        let expense = new.into_expense(ExpenseId::new(), Utc::now())?;
        tx.insert_expense(&expense).await?;
        tx.commit().await?;

        info!(expense_id = %expense.id, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    /// Expenses dated within `[from, to]`, newest first.
    pub async fn expenses(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Expense>> {
        check_range(from, to)?;
        let mut tx = self.begin().await?;
        tx.expenses_between(from, to).await
    }

    /// Sales, expenses and profit or loss over `[from, to]`.
    pub async fn period_summary(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<PeriodSummary> {
        check_range(from, to)?;
        let mut tx = self.begin().await?;
        let sales = tx.sales_between(from, to).await?;
        let expenses = tx.expenses_between(from, to).await?;
        Ok(PeriodSummary::compute(from, to, sales, &expenses))
    }

    pub async fn monthly_report(&self, year: i32, month: u32) -> StoreResult<PeriodSummary> {
        let (from, to) = month_bounds(year, month)?;
        self.period_summary(from, to).await
    }

    pub async fn daily_log(&self, date: NaiveDate) -> StoreResult<PeriodSummary> {
        self.period_summary(date, date).await
    }
}
