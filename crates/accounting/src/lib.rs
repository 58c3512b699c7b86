//! Accounting module: customer ledgers, banking, expenses and period reports.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. Balances
//! are derived from rows on read; the only materialized balance is a bank
//! account's `current_balance`, which has an authoritative recomputation.

pub mod bank;
pub mod expense;
pub mod ledger;
pub mod report;

pub use bank::{
    Bank, BankAccount, BankDetail, BankTransaction, NewBank, NewBankAccount, NewBankDetail,
    NewBankTransaction, TransactionType, bank_balance,
};
pub use expense::{Expense, ExpenseCategory, NewExpense, NewExpenseCategory, PaymentMethod};
pub use ledger::{LedgerEntry, LedgerTotals, NewLedgerEntry};
pub use report::{PeriodSummary, month_bounds};
