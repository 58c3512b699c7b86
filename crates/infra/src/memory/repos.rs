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
use shopbooks_core::money::checked_add;
use shopbooks_inventory::{StockIn, StockLevel, StockOut};
use shopbooks_invoicing::{Invoice, InvoiceInstallment, InvoiceItem};
use shopbooks_parties::Customer;
use shopbooks_products::{Category, Product};

use super::MemoryTransaction;
use super::tables::newest_first;
use crate::error::{StoreError, StoreResult};
use crate::repository::{
    BankRepository, CatalogRepository, CustomerRepository, ExpenseRepository, InvoiceRepository,
    StockRepository,
};

fn missing(what: &str, id: impl core::fmt::Display) -> StoreError {
    StoreError::not_found(format!("{what} {id}"))
}

#[async_trait]
impl CustomerRepository for MemoryTransaction {
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        self.write().customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        let slot = self
            .write()
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| missing("customer", customer.id))?;
        *slot = customer.clone();
        Ok(())
    }

    async fn customer(&mut self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.read().customers.get(&id).cloned())
    }

    async fn customers(&mut self) -> StoreResult<Vec<Customer>> {
        Ok(self.read().customers.values().cloned().collect())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> StoreResult<bool> {
        if !self.read().customers.contains_key(&id) {
            return Ok(false);
        }
        let t = self.write();
        t.customers.remove(&id);
        t.ledger_entries.retain(|_, e| e.customer_id != id);
        for invoice in t.invoices.values_mut() {
            if invoice.customer_id == Some(id) {
                invoice.customer_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        self.write().ledger_entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn ledger_entries(&mut self, customer: CustomerId) -> StoreResult<Vec<LedgerEntry>> {
        let rows = self
            .read()
            .ledger_entries
            .values()
            .filter(|e| e.customer_id == customer)
            .cloned()
            .collect();
        Ok(newest_first(rows, |e: &LedgerEntry| (e.date, e.id)))
    }
}

#[async_trait]
impl CatalogRepository for MemoryTransaction {
    async fn insert_category(&mut self, category: &Category) -> StoreResult<()> {
        self.write().categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn category(&mut self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.read().categories.get(&id).cloned())
    }

    async fn categories(&mut self) -> StoreResult<Vec<Category>> {
        Ok(self.read().categories.values().cloned().collect())
    }

    async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
        self.write().products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> StoreResult<()> {
        let slot = self
            .write()
            .products
            .get_mut(&product.id)
            .ok_or_else(|| missing("product", product.id))?;
        let stock = slot.stock;
        *slot = product.clone();
        slot.stock = stock;
        Ok(())
    }

    async fn product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read().products.get(&id).cloned())
    }

    async fn products(&mut self) -> StoreResult<Vec<Product>> {
        Ok(self.read().products.values().cloned().collect())
    }

    async fn delete_product(&mut self, id: ProductId) -> StoreResult<bool> {
        if !self.read().products.contains_key(&id) {
            return Ok(false);
        }
        let t = self.write();
        t.products.remove(&id);
        t.stock_ins.retain(|_, s| s.product_id != id);
        t.stock_outs.retain(|_, s| s.product_id != id);
        Ok(true)
    }

    async fn product_is_invoiced(&mut self, id: ProductId) -> StoreResult<bool> {
        Ok(self
            .read()
            .invoice_items
            .values()
            .any(|i| i.product_id == id))
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> StoreResult<i64> {
        let product = self
            .write()
            .products
            .get_mut(&id)
            .ok_or_else(|| missing("product", id))?;
        product.stock = product.stock_after(delta)?;
        Ok(product.stock)
    }

    async fn set_stock(&mut self, id: ProductId, stock: i64) -> StoreResult<()> {
        let product = self
            .write()
            .products
            .get_mut(&id)
            .ok_or_else(|| missing("product", id))?;
        product.stock = stock;
        Ok(())
    }
}

#[async_trait]
impl StockRepository for MemoryTransaction {
    async fn insert_stock_in(&mut self, stock_in: &StockIn) -> StoreResult<()> {
        self.write().stock_ins.insert(stock_in.id, stock_in.clone());
        Ok(())
    }

    async fn insert_stock_out(&mut self, stock_out: &StockOut) -> StoreResult<()> {
        self.write().stock_outs.insert(stock_out.id, stock_out.clone());
        Ok(())
    }

    async fn resize_stock_out(&mut self, id: StockOutId, quantity: i64) -> StoreResult<()> {
        let out = self
            .write()
            .stock_outs
            .get_mut(&id)
            .ok_or_else(|| missing("stock out", id))?;
        out.quantity = quantity;
        Ok(())
    }

    async fn delete_stock_out(&mut self, id: StockOutId) -> StoreResult<()> {
        self.write().stock_outs.remove(&id);
        Ok(())
    }

    async fn stock_level(&mut self, product: ProductId) -> StoreResult<StockLevel> {
        let t = self.read();
        let level =
            StockLevel::from_movements(product, t.stock_ins.values(), t.stock_outs.values())?;
        Ok(level)
    }

    async fn stock_ins(&mut self, product: Option<ProductId>) -> StoreResult<Vec<StockIn>> {
        let rows = self
            .read()
            .stock_ins
            .values()
            .filter(|s| product.is_none_or(|p| s.product_id == p))
            .cloned()
            .collect();
        Ok(newest_first(rows, |s: &StockIn| (s.date, s.id)))
    }

    async fn stock_outs(&mut self, product: Option<ProductId>) -> StoreResult<Vec<StockOut>> {
        let rows = self
            .read()
            .stock_outs
            .values()
            .filter(|s| product.is_none_or(|p| s.product_id == p))
            .cloned()
            .collect();
        Ok(newest_first(rows, |s: &StockOut| (s.date, s.id)))
    }

    async fn stock_out_for_item(&mut self, item: InvoiceItemId) -> StoreResult<Option<StockOut>> {
        Ok(self
            .read()
            .stock_outs
            .values()
            .find(|s| s.invoice_item_id == Some(item))
            .cloned())
    }

    async fn stock_outs_for_invoice(&mut self, invoice: InvoiceId) -> StoreResult<Vec<StockOut>> {
        Ok(self
            .read()
            .stock_outs
            .values()
            .filter(|s| s.invoice_id == Some(invoice))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InvoiceRepository for MemoryTransaction {
    async fn next_invoice_number(&mut self) -> StoreResult<u64> {
        let t = self.write();
        t.last_invoice_number += 1;
        Ok(t.last_invoice_number)
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> StoreResult<()> {
        self.write().invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<()> {
        let slot = self
            .write()
            .invoices
            .get_mut(&invoice.id)
            .ok_or_else(|| missing("invoice", invoice.id))?;
        *slot = invoice.clone();
        Ok(())
    }

    async fn invoice(&mut self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        Ok(self.read().invoices.get(&id).cloned())
    }

    async fn invoices(&mut self) -> StoreResult<Vec<Invoice>> {
        let rows = self.read().invoices.values().cloned().collect();
        Ok(newest_first(rows, |i: &Invoice| (i.date, i.id)))
    }

    async fn delete_invoice(&mut self, id: InvoiceId) -> StoreResult<bool> {
        if !self.read().invoices.contains_key(&id) {
            return Ok(false);
        }
        let t = self.write();
        t.invoices.remove(&id);
        t.invoice_items.retain(|_, i| i.invoice_id != id);
        t.installments.retain(|_, i| i.invoice_id != id);
        t.stock_outs.retain(|_, s| s.invoice_id != Some(id));
        Ok(true)
    }

    async fn insert_invoice_item(&mut self, item: &InvoiceItem) -> StoreResult<()> {
        self.write().invoice_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_invoice_item(&mut self, item: &InvoiceItem) -> StoreResult<()> {
        let slot = self
            .write()
            .invoice_items
            .get_mut(&item.id)
            .ok_or_else(|| missing("invoice item", item.id))?;
        *slot = item.clone();
        Ok(())
    }

    async fn delete_invoice_item(&mut self, id: InvoiceItemId) -> StoreResult<()> {
        let t = self.write();
        t.invoice_items.remove(&id);
        t.stock_outs.retain(|_, s| s.invoice_item_id != Some(id));
        Ok(())
    }

    async fn invoice_item(&mut self, id: InvoiceItemId) -> StoreResult<Option<InvoiceItem>> {
        Ok(self.read().invoice_items.get(&id).cloned())
    }

    async fn invoice_items(&mut self, invoice: InvoiceId) -> StoreResult<Vec<InvoiceItem>> {
        Ok(self
            .read()
            .invoice_items
            .values()
            .filter(|i| i.invoice_id == invoice)
            .cloned()
            .collect())
    }

    async fn insert_installment(&mut self, installment: &InvoiceInstallment) -> StoreResult<()> {
        self.write()
            .installments
            .insert(installment.id, installment.clone());
        Ok(())
    }

    async fn installments(&mut self, invoice: InvoiceId) -> StoreResult<Vec<InvoiceInstallment>> {
        let rows = self
            .read()
            .installments
            .values()
            .filter(|i| i.invoice_id == invoice)
            .cloned()
            .collect();
        Ok(newest_first(rows, |i: &InvoiceInstallment| (i.date, i.id)))
    }

    async fn sales_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<(NaiveDate, Decimal)>> {
        Ok(self
            .read()
            .invoices
            .values()
            .filter(|i| i.date >= from && i.date <= to)
            .map(|i| (i.date, i.grand_total))
            .collect())
    }
}

#[async_trait]
impl BankRepository for MemoryTransaction {
    async fn insert_bank(&mut self, bank: &Bank) -> StoreResult<()> {
        self.write().banks.insert(bank.id, bank.clone());
        Ok(())
    }

    async fn bank(&mut self, id: BankId) -> StoreResult<Option<Bank>> {
        Ok(self.read().banks.get(&id).cloned())
    }

    async fn banks(&mut self) -> StoreResult<Vec<Bank>> {
        Ok(self.read().banks.values().cloned().collect())
    }

    async fn insert_bank_detail(&mut self, detail: &BankDetail) -> StoreResult<()> {
        self.write().bank_details.insert(detail.id, detail.clone());
        Ok(())
    }

    async fn bank_details(&mut self, bank: BankId) -> StoreResult<Vec<BankDetail>> {
        let rows = self
            .read()
            .bank_details
            .values()
            .filter(|d| d.bank_id == bank)
            .cloned()
            .collect();
        Ok(newest_first(rows, |d: &BankDetail| (d.date, d.id)))
    }

    async fn insert_bank_account(&mut self, account: &BankAccount) -> StoreResult<()> {
        self.write().bank_accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn bank_account(&mut self, id: BankAccountId) -> StoreResult<Option<BankAccount>> {
        Ok(self.read().bank_accounts.get(&id).cloned())
    }

    async fn bank_accounts(&mut self) -> StoreResult<Vec<BankAccount>> {
        Ok(self.read().bank_accounts.values().cloned().collect())
    }

    async fn adjust_account_balance(
        &mut self,
        id: BankAccountId,
        delta: Decimal,
    ) -> StoreResult<Decimal> {
        let account = self
            .write()
            .bank_accounts
            .get_mut(&id)
            .ok_or_else(|| missing("bank account", id))?;
        account.current_balance = checked_add("account balance", account.current_balance, delta)?;
        Ok(account.current_balance)
    }

    async fn set_account_balance(
        &mut self,
        id: BankAccountId,
        balance: Decimal,
    ) -> StoreResult<()> {
        let account = self
            .write()
            .bank_accounts
            .get_mut(&id)
            .ok_or_else(|| missing("bank account", id))?;
        account.current_balance = balance;
        Ok(())
    }

    async fn insert_bank_transaction(&mut self, transaction: &BankTransaction) -> StoreResult<()> {
        self.write()
            .bank_transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn bank_transactions(
        &mut self,
        account: BankAccountId,
    ) -> StoreResult<Vec<BankTransaction>> {
        let rows = self
            .read()
            .bank_transactions
            .values()
            .filter(|t| t.account_id == account)
            .cloned()
            .collect();
        Ok(newest_first(rows, |t: &BankTransaction| (t.date, t.id)))
    }
}

#[async_trait]
impl ExpenseRepository for MemoryTransaction {
    async fn insert_expense_category(&mut self, category: &ExpenseCategory) -> StoreResult<()> {
        self.write()
            .expense_categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn expense_category(
        &mut self,
        id: ExpenseCategoryId,
    ) -> StoreResult<Option<ExpenseCategory>> {
        Ok(self.read().expense_categories.get(&id).cloned())
    }

    async fn expense_categories(&mut self) -> StoreResult<Vec<ExpenseCategory>> {
        Ok(self.read().expense_categories.values().cloned().collect())
    }

    async fn insert_expense(&mut self, expense: &Expense) -> StoreResult<()> {
        self.write().expenses.insert(expense.id, expense.clone());
        Ok(())
    }

    async fn expenses_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Expense>> {
        let rows = self
            .read()
            .expenses
            .values()
            .filter(|e| e.date >= from && e.date <= to)
            .cloned()
            .collect();
        Ok(newest_first(rows, |e: &Expense| (e.date, e.id)))
    }
}
