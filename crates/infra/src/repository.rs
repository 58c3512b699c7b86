//! Transactional storage boundary.
//!
//! A [`Database`] hands out [`Transaction`]s. Every repository call made through
//! a transaction is invisible to other callers until [`Transaction::commit`];
//! dropping a transaction without committing discards all of its writes.
//!
//! Listings documented as "newest first" order by `(date, id)` descending. Ids
//! are UUIDv7, so the id breaks ties in creation order.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use shopbooks_accounting::{
    Bank, BankAccount, BankDetail, BankTransaction, Expense, ExpenseCategory, LedgerEntry,
};
use shopbooks_core::{
    BankAccountId, BankId, CategoryId, CustomerId, ExpenseCategoryId, InvoiceId, InvoiceItemId,
    ProductId, StockOutId,
};
use shopbooks_inventory::{StockIn, StockLevel, StockOut};
use shopbooks_invoicing::{Invoice, InvoiceInstallment, InvoiceItem};
use shopbooks_parties::Customer;
use shopbooks_products::{Category, Product};

use crate::error::StoreResult;

#[async_trait]
pub trait CustomerRepository: Send {
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()>;
    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<()>;
    async fn customer(&mut self, id: CustomerId) -> StoreResult<Option<Customer>>;
    async fn customers(&mut self) -> StoreResult<Vec<Customer>>;
    /// Remove the customer and their ledger rows. Their invoices are kept with
    /// the customer reference cleared. Returns `false` when nothing matched.
    async fn delete_customer(&mut self, id: CustomerId) -> StoreResult<bool>;

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()>;
    /// Newest first.
    async fn ledger_entries(&mut self, customer: CustomerId) -> StoreResult<Vec<LedgerEntry>>;
}

#[async_trait]
pub trait CatalogRepository: Send {
    async fn insert_category(&mut self, category: &Category) -> StoreResult<()>;
    async fn category(&mut self, id: CategoryId) -> StoreResult<Option<Category>>;
    async fn categories(&mut self) -> StoreResult<Vec<Category>>;

    async fn insert_product(&mut self, product: &Product) -> StoreResult<()>;
    /// Write every column except the cached `stock` counter.
    async fn update_product(&mut self, product: &Product) -> StoreResult<()>;
    async fn product(&mut self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn products(&mut self) -> StoreResult<Vec<Product>>;
    /// Remove the product together with its stock movements.
    async fn delete_product(&mut self, id: ProductId) -> StoreResult<bool>;
    /// Whether any invoice item references the product.
    async fn product_is_invoiced(&mut self, id: ProductId) -> StoreResult<bool>;

    /// Atomically add `delta` to the cached counter, flooring at zero, and
    /// return the new value.
    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> StoreResult<i64>;
    async fn set_stock(&mut self, id: ProductId, stock: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait StockRepository: Send {
    async fn insert_stock_in(&mut self, stock_in: &StockIn) -> StoreResult<()>;
    async fn insert_stock_out(&mut self, stock_out: &StockOut) -> StoreResult<()>;
    async fn resize_stock_out(&mut self, id: StockOutId, quantity: i64) -> StoreResult<()>;
    async fn delete_stock_out(&mut self, id: StockOutId) -> StoreResult<()>;

    /// Σ in and Σ out for the product, read from movement history.
    async fn stock_level(&mut self, product: ProductId) -> StoreResult<StockLevel>;
    /// Newest first, optionally restricted to one product.
    async fn stock_ins(&mut self, product: Option<ProductId>) -> StoreResult<Vec<StockIn>>;
    /// Newest first, optionally restricted to one product.
    async fn stock_outs(&mut self, product: Option<ProductId>) -> StoreResult<Vec<StockOut>>;
    async fn stock_out_for_item(&mut self, item: InvoiceItemId) -> StoreResult<Option<StockOut>>;
    async fn stock_outs_for_invoice(&mut self, invoice: InvoiceId) -> StoreResult<Vec<StockOut>>;
}

#[async_trait]
pub trait InvoiceRepository: Send {
    /// Allocate the next display number. Numbers are unique and increasing;
    /// gaps are allowed.
    async fn next_invoice_number(&mut self) -> StoreResult<u64>;
    async fn insert_invoice(&mut self, invoice: &Invoice) -> StoreResult<()>;
    async fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<()>;
    async fn invoice(&mut self, id: InvoiceId) -> StoreResult<Option<Invoice>>;
    /// Newest first.
    async fn invoices(&mut self) -> StoreResult<Vec<Invoice>>;
    /// Remove the invoice with its items, installments and stock-outs.
    async fn delete_invoice(&mut self, id: InvoiceId) -> StoreResult<bool>;

    async fn insert_invoice_item(&mut self, item: &InvoiceItem) -> StoreResult<()>;
    async fn update_invoice_item(&mut self, item: &InvoiceItem) -> StoreResult<()>;
    async fn delete_invoice_item(&mut self, id: InvoiceItemId) -> StoreResult<()>;
    async fn invoice_item(&mut self, id: InvoiceItemId) -> StoreResult<Option<InvoiceItem>>;
    /// In insertion order.
    async fn invoice_items(&mut self, invoice: InvoiceId) -> StoreResult<Vec<InvoiceItem>>;

    async fn insert_installment(&mut self, installment: &InvoiceInstallment) -> StoreResult<()>;
    /// Newest first.
    async fn installments(&mut self, invoice: InvoiceId) -> StoreResult<Vec<InvoiceInstallment>>;

    /// `(date, grand_total)` of every invoice dated within `[from, to]`.
    async fn sales_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<(NaiveDate, Decimal)>>;
}

#[async_trait]
pub trait BankRepository: Send {
    async fn insert_bank(&mut self, bank: &Bank) -> StoreResult<()>;
    async fn bank(&mut self, id: BankId) -> StoreResult<Option<Bank>>;
    async fn banks(&mut self) -> StoreResult<Vec<Bank>>;
    async fn insert_bank_detail(&mut self, detail: &BankDetail) -> StoreResult<()>;
    /// Newest first.
    async fn bank_details(&mut self, bank: BankId) -> StoreResult<Vec<BankDetail>>;

    async fn insert_bank_account(&mut self, account: &BankAccount) -> StoreResult<()>;
    async fn bank_account(&mut self, id: BankAccountId) -> StoreResult<Option<BankAccount>>;
    async fn bank_accounts(&mut self) -> StoreResult<Vec<BankAccount>>;
    /// Atomically add `delta` to `current_balance` (no floor) and return it.
    async fn adjust_account_balance(
        &mut self,
        id: BankAccountId,
        delta: Decimal,
    ) -> StoreResult<Decimal>;
    async fn set_account_balance(&mut self, id: BankAccountId, balance: Decimal)
    -> StoreResult<()>;
    async fn insert_bank_transaction(&mut self, transaction: &BankTransaction) -> StoreResult<()>;
    /// Newest first.
    async fn bank_transactions(&mut self, account: BankAccountId)
    -> StoreResult<Vec<BankTransaction>>;
}

#[async_trait]
pub trait ExpenseRepository: Send {
    async fn insert_expense_category(&mut self, category: &ExpenseCategory) -> StoreResult<()>;
    async fn expense_category(
        &mut self,
        id: ExpenseCategoryId,
    ) -> StoreResult<Option<ExpenseCategory>>;
    async fn expense_categories(&mut self) -> StoreResult<Vec<ExpenseCategory>>;
    async fn insert_expense(&mut self, expense: &Expense) -> StoreResult<()>;
    /// Expenses dated within `[from, to]`, newest first.
    async fn expenses_between(&mut self, from: NaiveDate, to: NaiveDate)
    -> StoreResult<Vec<Expense>>;
}

/// One all-or-nothing unit of work.
#[async_trait]
pub trait Transaction:
    CustomerRepository
    + CatalogRepository
    + StockRepository
    + InvoiceRepository
    + BankRepository
    + ExpenseRepository
    + Send
{
    /// Make every write of this transaction visible, or fail and keep none.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>>;

    /// Short backend name for logs (`memory`, `postgres`).
    fn backend_name(&self) -> &'static str;

    /// The primary data file, when the backend keeps one.
    fn data_file(&self) -> Option<PathBuf>;
}
