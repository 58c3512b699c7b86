//! `shopbooks-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model and decimal money helpers.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldErrors};
pub use id::{
    BankAccountId, BankDetailId, BankId, BankTransactionId, CategoryId, CustomerId,
    ExpenseCategoryId, ExpenseId, InstallmentId, InvoiceId, InvoiceItemId, LedgerEntryId,
    ProductId, StockInId, StockOutId,
};
pub use money::Amount;
