use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::{check_amount, check_non_negative, check_positive};
use shopbooks_core::{
    BankAccountId, BankDetailId, BankId, BankTransactionId, DomainError, DomainResult, FieldErrors,
    impl_entity,
};

const NAME_MAX: usize = 200;

/// A bank the business deals with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    pub branch: Option<String>,
}

impl_entity!(Bank, BankId);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBank {
    pub name: String,
    #[serde(default)]
    pub branch: Option<String>,
}

impl NewBank {
    pub fn into_bank(self, id: BankId) -> DomainResult<Bank> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, NAME_MAX);
        if let Some(branch) = &self.branch {
            errors.max_len("branch", branch, NAME_MAX);
        }
        errors.into_result()?;

        Ok(Bank {
            id,
            name: self.name.trim().to_string(),
            branch: self.branch.filter(|b| !b.trim().is_empty()),
        })
    }
}

/// A debit/credit row against a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetail {
    pub id: BankDetailId,
    pub bank_id: BankId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl_entity!(BankDetail, BankDetailId);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBankDetail {
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewBankDetail {
    pub fn into_detail(
        self,
        id: BankDetailId,
        bank_id: BankId,
        today: NaiveDate,
    ) -> DomainResult<BankDetail> {
        let mut errors = FieldErrors::new();
        check_non_negative(&mut errors, "debit", self.debit);
        check_non_negative(&mut errors, "credit", self.credit);
        if self.debit.is_zero() && self.credit.is_zero() {
            errors.add("amount", "Either debit or credit must be non-zero.");
        }
        errors.into_result()?;

        Ok(BankDetail {
            id,
            bank_id,
            debit: self.debit,
            credit: self.credit,
            description: self.description,
            date: self.date.unwrap_or(today),
        })
    }
}

/// `Σ credit − Σ debit` over the bank's detail rows.
pub fn bank_balance<'a, I>(details: I) -> Decimal
where
    I: IntoIterator<Item = &'a BankDetail>,
{
    details
        .into_iter()
        .fold(Decimal::ZERO, |acc, d| acc + d.credit - d.debit)
}

/// An account held by the business, with a materialized balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub name: String,
    pub account_number: String,
    pub opening_balance: Decimal,
    /// Maintained by transactions; see [`BankAccount::recompute_balance`].
    pub current_balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl_entity!(BankAccount, BankAccountId);

impl BankAccount {
    /// Authoritative balance: `opening + Σ deposits − Σ withdrawals`.
    pub fn recompute_balance<'a, I>(&self, transactions: I) -> Decimal
    where
        I: IntoIterator<Item = &'a BankTransaction>,
    {
        transactions
            .into_iter()
            .filter(|t| t.account_id == self.id)
            .fold(self.opening_balance, |acc, t| acc + t.signed_amount())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBankAccount {
    pub name: String,
    pub account_number: String,
    #[serde(default)]
    pub opening_balance: Decimal,
}

impl NewBankAccount {
    pub fn into_account(self, id: BankAccountId, now: DateTime<Utc>) -> DomainResult<BankAccount> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, NAME_MAX);
        errors.require("account_number", &self.account_number);
        errors.max_len("account_number", &self.account_number, 50);
        check_amount(&mut errors, "opening_balance", self.opening_balance);
        errors.into_result()?;

        Ok(BankAccount {
            id,
            name: self.name.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            opening_balance: self.opening_balance,
            current_balance: self.opening_balance,
            is_active: true,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

impl core::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            other => Err(DomainError::validation(format!("unknown transaction type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: BankTransactionId,
    pub account_id: BankAccountId,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl_entity!(BankTransaction, BankTransactionId);

impl BankTransaction {
    /// Effect on the account balance: `+amount` for deposits, `−amount` otherwise.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Deposit => self.amount,
            TransactionType::Withdrawal => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBankTransaction {
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewBankTransaction {
    pub fn into_transaction(
        self,
        id: BankTransactionId,
        account_id: BankAccountId,
        now: DateTime<Utc>,
    ) -> DomainResult<BankTransaction> {
        let mut errors = FieldErrors::new();
        check_positive(&mut errors, "amount", self.amount);
        errors.into_result()?;

        Ok(BankTransaction {
            id,
            account_id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            description: self.description,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        })
    }
}
