use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use shopbooks_accounting::{
    Bank, BankAccount, BankDetail, BankTransaction, Expense, ExpenseCategory, LedgerEntry,
};
use shopbooks_core::{
    BankAccountId, BankDetailId, BankId, BankTransactionId, CategoryId, CustomerId,
    ExpenseCategoryId, ExpenseId, InstallmentId, InvoiceId, InvoiceItemId, LedgerEntryId,
    ProductId, StockInId, StockOutId,
};
use shopbooks_inventory::{StockIn, StockOut};
use shopbooks_invoicing::{Invoice, InvoiceInstallment, InvoiceItem};
use shopbooks_parties::Customer;
use shopbooks_products::{Category, Product};

/// Whole store state. This is also the shape of the JSON data file.
///
/// Maps are keyed by UUIDv7 ids, so iteration follows creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub last_invoice_number: u64,
    pub customers: BTreeMap<CustomerId, Customer>,
    pub ledger_entries: BTreeMap<LedgerEntryId, LedgerEntry>,
    pub categories: BTreeMap<CategoryId, Category>,
    pub products: BTreeMap<ProductId, Product>,
    pub stock_ins: BTreeMap<StockInId, StockIn>,
    pub stock_outs: BTreeMap<StockOutId, StockOut>,
    pub invoices: BTreeMap<InvoiceId, Invoice>,
    pub invoice_items: BTreeMap<InvoiceItemId, InvoiceItem>,
    pub installments: BTreeMap<InstallmentId, InvoiceInstallment>,
    pub banks: BTreeMap<BankId, Bank>,
    pub bank_details: BTreeMap<BankDetailId, BankDetail>,
    pub bank_accounts: BTreeMap<BankAccountId, BankAccount>,
    pub bank_transactions: BTreeMap<BankTransactionId, BankTransaction>,
    pub expense_categories: BTreeMap<ExpenseCategoryId, ExpenseCategory>,
    pub expenses: BTreeMap<ExpenseId, Expense>,
}

/// Sort rows newest first by `(date, id)`.
pub fn newest_first<T, K, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}
