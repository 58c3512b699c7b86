use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::check_positive;
use shopbooks_core::{DomainError, DomainResult, ExpenseCategoryId, ExpenseId, FieldErrors, impl_entity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: ExpenseCategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl_entity!(ExpenseCategory, ExpenseCategoryId);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpenseCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewExpenseCategory {
    pub fn into_category(self, id: ExpenseCategoryId) -> DomainResult<ExpenseCategory> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, 100);
        errors.into_result()?;

        Ok(ExpenseCategory {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
        }
    }
}

impl core::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "bank" => Ok(PaymentMethod::Bank),
            other => Err(DomainError::validation(format!("unknown payment method '{other}'"))),
        }
    }
}

/// Money spent by the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub category_id: Option<ExpenseCategoryId>,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl_entity!(Expense, ExpenseId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    #[serde(default)]
    pub category_id: Option<ExpenseCategoryId>,
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl NewExpense {
    pub fn into_expense(self, id: ExpenseId, now: DateTime<Utc>) -> DomainResult<Expense> {
        let mut errors = FieldErrors::new();
        errors.require("description", &self.description);
        check_positive(&mut errors, "amount", self.amount);
        errors.into_result()?;

        Ok(Expense {
            id,
            category_id: self.category_id,
            description: self.description.trim().to_string(),
            amount: self.amount,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            payment_method: self.payment_method,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn expense_defaults_to_cash_today() {
        let now = Utc::now();
        let e = NewExpense {
            category_id: None,
            description: " Electricity bill ".to_string(),
            amount: dec!(3200),
            date: None,
            payment_method: PaymentMethod::default(),
        }
        .into_expense(ExpenseId::new(), now)
        .unwrap();

        assert_eq!(e.description, "Electricity bill");
        assert_eq!(e.payment_method, PaymentMethod::Cash);
        assert_eq!(e.date, now.date_naive());
    }

    #[test]
    fn expense_needs_description_and_amount() {
        let r = NewExpense {
            category_id: None,
            description: String::new(),
            amount: Decimal::ZERO,
            date: None,
            payment_method: PaymentMethod::Bank,
        }
        .into_expense(ExpenseId::new(), Utc::now());
        assert!(r.is_err());
    }
}
