use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::instrument;

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

use super::{PgTransaction, map_sqlx_error, rows};
use crate::error::{StoreError, StoreResult};
use crate::repository::{
    BankRepository, CatalogRepository, CustomerRepository, ExpenseRepository, InvoiceRepository,
    StockRepository,
};

/// Decode every row with `f`.
fn decode_all<T>(
    operation: &str,
    rows: Vec<sqlx::postgres::PgRow>,
    f: fn(&sqlx::postgres::PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(|r| f(r).map_err(|e| map_sqlx_error(operation, e)))
        .collect()
}

fn decode_opt<T>(
    operation: &str,
    row: Option<sqlx::postgres::PgRow>,
    f: fn(&sqlx::postgres::PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Option<T>> {
    row.as_ref()
        .map(f)
        .transpose()
        .map_err(|e| map_sqlx_error(operation, e))
}

fn ensure_updated(affected: u64, what: &str, id: impl core::fmt::Display) -> StoreResult<()> {
    if affected == 0 {
        return Err(StoreError::not_found(format!("{what} {id}")));
    }
    Ok(())
}

#[async_trait]
impl CustomerRepository for PgTransaction {
    async fn insert_customer(&mut self, c: &Customer) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers
                (id, name, father_name, cnic, mobile, resident, address, city, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(c.id.as_uuid())
        .bind(&c.name)
        .bind(&c.father_name)
        .bind(&c.cnic)
        .bind(&c.mobile)
        .bind(&c.resident)
        .bind(&c.address)
        .bind(&c.city)
        .bind(c.date)
        .bind(c.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;
        Ok(())
    }

    async fn update_customer(&mut self, c: &Customer) -> StoreResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, father_name = $3, cnic = $4, mobile = $5,
                resident = $6, address = $7, city = $8, date = $9
            WHERE id = $1
            "#,
        )
        .bind(c.id.as_uuid())
        .bind(&c.name)
        .bind(&c.father_name)
        .bind(&c.cnic)
        .bind(&c.mobile)
        .bind(&c.resident)
        .bind(&c.address)
        .bind(&c.city)
        .bind(c.date)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;
        ensure_updated(done.rows_affected(), "customer", c.id)
    }

    async fn customer(&mut self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("customer", e))?;
        decode_opt("customer", row, rows::customer)
    }

    async fn customers(&mut self) -> StoreResult<Vec<Customer>> {
        let found = sqlx::query("SELECT * FROM customers ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("customers", e))?;
        decode_all("customers", found, rows::customer)
    }

    #[instrument(skip(self), err)]
    async fn delete_customer(&mut self, id: CustomerId) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        Ok(done.rows_affected() > 0)
    }

    async fn insert_ledger_entry(&mut self, e: &LedgerEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries
                (id, customer_id, date, detail, debit_amount, credit_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(e.id.as_uuid())
        .bind(e.customer_id.as_uuid())
        .bind(e.date)
        .bind(&e.detail)
        .bind(e.debit_amount)
        .bind(e.credit_amount)
        .bind(e.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|err| map_sqlx_error("insert_ledger_entry", err))?;
        Ok(())
    }

    async fn ledger_entries(&mut self, customer: CustomerId) -> StoreResult<Vec<LedgerEntry>> {
        let found = sqlx::query(
            "SELECT * FROM ledger_entries WHERE customer_id = $1 ORDER BY date DESC, id DESC",
        )
        .bind(customer.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("ledger_entries", e))?;
        decode_all("ledger_entries", found, rows::ledger_entry)
    }
}

#[async_trait]
impl CatalogRepository for PgTransaction {
    async fn insert_category(&mut self, c: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, description, date) VALUES ($1, $2, $3, $4)")
            .bind(c.id.as_uuid())
            .bind(&c.name)
            .bind(&c.description)
            .bind(c.date)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(())
    }

    async fn category(&mut self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("category", e))?;
        decode_opt("category", row, rows::category)
    }

    async fn categories(&mut self) -> StoreResult<Vec<Category>> {
        let found = sqlx::query("SELECT * FROM categories ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("categories", e))?;
        decode_all("categories", found, rows::category)
    }

    async fn insert_product(&mut self, p: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, stock, buying_price, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(p.id.as_uuid())
        .bind(p.category_id.as_uuid())
        .bind(&p.name)
        .bind(p.stock)
        .bind(p.buying_price)
        .bind(p.date)
        .bind(p.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn update_product(&mut self, p: &Product) -> StoreResult<()> {
        let done = sqlx::query(
            "UPDATE products SET category_id = $2, name = $3, buying_price = $4, date = $5 WHERE id = $1",
        )
        .bind(p.id.as_uuid())
        .bind(p.category_id.as_uuid())
        .bind(&p.name)
        .bind(p.buying_price)
        .bind(p.date)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        ensure_updated(done.rows_affected(), "product", p.id)
    }

    async fn product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        decode_opt("product", row, rows::product)
    }

    async fn products(&mut self) -> StoreResult<Vec<Product>> {
        let found = sqlx::query("SELECT * FROM products ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("products", e))?;
        decode_all("products", found, rows::product)
    }

    #[instrument(skip(self), err)]
    async fn delete_product(&mut self, id: ProductId) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(done.rows_affected() > 0)
    }

    async fn product_is_invoiced(&mut self, id: ProductId) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM invoice_items WHERE product_id = $1) AS invoiced",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("product_is_invoiced", e))?;
        row.try_get("invoiced")
            .map_err(|e| map_sqlx_error("product_is_invoiced", e))
    }

    #[instrument(skip(self), err)]
    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> StoreResult<i64> {
        let row = sqlx::query(
            "UPDATE products SET stock = GREATEST(stock + $2, 0) WHERE id = $1 RETURNING stock",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("adjust_stock", e))?;
        match row {
            Some(row) => row
                .try_get("stock")
                .map_err(|e| map_sqlx_error("adjust_stock", e)),
            None => Err(StoreError::not_found(format!("product {id}"))),
        }
    }

    async fn set_stock(&mut self, id: ProductId, stock: i64) -> StoreResult<()> {
        let done = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(stock)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_stock", e))?;
        ensure_updated(done.rows_affected(), "product", id)
    }
}

#[async_trait]
impl StockRepository for PgTransaction {
    async fn insert_stock_in(&mut self, s: &StockIn) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_ins
                (id, product_id, stock_quantity, buying_price_item, buying_percent,
                 selling_price_item, total_buying_amount, total_selling_amount, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(s.id.as_uuid())
        .bind(s.product_id.as_uuid())
        .bind(s.stock_quantity)
        .bind(s.buying_price_item)
        .bind(s.buying_percent)
        .bind(s.selling_price_item)
        .bind(s.total_buying_amount)
        .bind(s.total_selling_amount)
        .bind(s.date)
        .bind(s.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_stock_in", e))?;
        Ok(())
    }

    async fn insert_stock_out(&mut self, s: &StockOut) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_outs (id, product_id, invoice_id, invoice_item_id, quantity, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(s.id.as_uuid())
        .bind(s.product_id.as_uuid())
        .bind(s.invoice_id.map(|i| *i.as_uuid()))
        .bind(s.invoice_item_id.map(|i| *i.as_uuid()))
        .bind(s.quantity)
        .bind(s.date)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_stock_out", e))?;
        Ok(())
    }

    async fn resize_stock_out(&mut self, id: StockOutId, quantity: i64) -> StoreResult<()> {
        let done = sqlx::query("UPDATE stock_outs SET quantity = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("resize_stock_out", e))?;
        ensure_updated(done.rows_affected(), "stock out", id)
    }

    async fn delete_stock_out(&mut self, id: StockOutId) -> StoreResult<()> {
        sqlx::query("DELETE FROM stock_outs WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_stock_out", e))?;
        Ok(())
    }

    async fn stock_level(&mut self, product: ProductId) -> StoreResult<StockLevel> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COALESCE(SUM(stock_quantity), 0)::BIGINT FROM stock_ins WHERE product_id = $1) AS stocked_in,
                (SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM stock_outs WHERE product_id = $1) AS stocked_out
            "#,
        )
        .bind(product.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("stock_level", e))?;
        let stocked_in: i64 = row
            .try_get("stocked_in")
            .map_err(|e| map_sqlx_error("stock_level", e))?;
        let stocked_out: i64 = row
            .try_get("stocked_out")
            .map_err(|e| map_sqlx_error("stock_level", e))?;
        Ok(StockLevel::new(stocked_in, stocked_out))
    }

    async fn stock_ins(&mut self, product: Option<ProductId>) -> StoreResult<Vec<StockIn>> {
        let found = sqlx::query(
            r#"
            SELECT * FROM stock_ins
            WHERE $1::UUID IS NULL OR product_id = $1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(product.map(|p| *p.as_uuid()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("stock_ins", e))?;
        decode_all("stock_ins", found, rows::stock_in)
    }

    async fn stock_outs(&mut self, product: Option<ProductId>) -> StoreResult<Vec<StockOut>> {
        let found = sqlx::query(
            r#"
            SELECT * FROM stock_outs
            WHERE $1::UUID IS NULL OR product_id = $1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(product.map(|p| *p.as_uuid()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("stock_outs", e))?;
        decode_all("stock_outs", found, rows::stock_out)
    }

    async fn stock_out_for_item(&mut self, item: InvoiceItemId) -> StoreResult<Option<StockOut>> {
        let row = sqlx::query("SELECT * FROM stock_outs WHERE invoice_item_id = $1 LIMIT 1")
            .bind(item.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("stock_out_for_item", e))?;
        decode_opt("stock_out_for_item", row, rows::stock_out)
    }

    async fn stock_outs_for_invoice(&mut self, invoice: InvoiceId) -> StoreResult<Vec<StockOut>> {
        let found = sqlx::query("SELECT * FROM stock_outs WHERE invoice_id = $1 ORDER BY id")
            .bind(invoice.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("stock_outs_for_invoice", e))?;
        decode_all("stock_outs_for_invoice", found, rows::stock_out)
    }
}

#[async_trait]
impl InvoiceRepository for PgTransaction {
    async fn next_invoice_number(&mut self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT nextval('invoice_number_seq') AS number")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("next_invoice_number", e))?;
        let number: i64 = row
            .try_get("number")
            .map_err(|e| map_sqlx_error("next_invoice_number", e))?;
        u64::try_from(number).map_err(|e| StoreError::backend(format!("invoice number: {e}")))
    }

    async fn insert_invoice(&mut self, i: &Invoice) -> StoreResult<()> {
        let number = i64::try_from(i.number)
            .map_err(|e| StoreError::backend(format!("invoice number: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO invoices
                (id, number, customer_id, bank_id, payment_type, total_quantity, sub_total,
                 discount, shipping, grand_total, paid_amount, remaining_payment,
                 cash_payment, cash_returned, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(i.id.as_uuid())
        .bind(number)
        .bind(i.customer_id.map(|c| *c.as_uuid()))
        .bind(i.bank_id.map(|b| *b.as_uuid()))
        .bind(i.payment_type.as_str())
        .bind(i.total_quantity)
        .bind(i.sub_total)
        .bind(i.discount)
        .bind(i.shipping)
        .bind(i.grand_total)
        .bind(i.paid_amount)
        .bind(i.remaining_payment)
        .bind(i.cash_payment)
        .bind(i.cash_returned)
        .bind(i.date)
        .bind(i.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_invoice", e))?;
        Ok(())
    }

    async fn update_invoice(&mut self, i: &Invoice) -> StoreResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE invoices
            SET customer_id = $2, bank_id = $3, payment_type = $4, total_quantity = $5,
                sub_total = $6, discount = $7, shipping = $8, grand_total = $9,
                paid_amount = $10, remaining_payment = $11, cash_payment = $12,
                cash_returned = $13, date = $14
            WHERE id = $1
            "#,
        )
        .bind(i.id.as_uuid())
        .bind(i.customer_id.map(|c| *c.as_uuid()))
        .bind(i.bank_id.map(|b| *b.as_uuid()))
        .bind(i.payment_type.as_str())
        .bind(i.total_quantity)
        .bind(i.sub_total)
        .bind(i.discount)
        .bind(i.shipping)
        .bind(i.grand_total)
        .bind(i.paid_amount)
        .bind(i.remaining_payment)
        .bind(i.cash_payment)
        .bind(i.cash_returned)
        .bind(i.date)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_invoice", e))?;
        ensure_updated(done.rows_affected(), "invoice", i.id)
    }

    async fn invoice(&mut self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query("SELECT * FROM invoices WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("invoice", e))?;
        decode_opt("invoice", row, rows::invoice)
    }

    async fn invoices(&mut self) -> StoreResult<Vec<Invoice>> {
        let found = sqlx::query("SELECT * FROM invoices ORDER BY date DESC, id DESC")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("invoices", e))?;
        decode_all("invoices", found, rows::invoice)
    }

    #[instrument(skip(self), err)]
    async fn delete_invoice(&mut self, id: InvoiceId) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_invoice", e))?;
        Ok(done.rows_affected() > 0)
    }

    async fn insert_invoice_item(&mut self, item: &InvoiceItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (id, invoice_id, product_id, quantity, price, total, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.invoice_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.total)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_invoice_item", e))?;
        Ok(())
    }

    async fn update_invoice_item(&mut self, item: &InvoiceItem) -> StoreResult<()> {
        let done =
            sqlx::query("UPDATE invoice_items SET quantity = $2, price = $3, total = $4 WHERE id = $1")
                .bind(item.id.as_uuid())
                .bind(item.quantity)
                .bind(item.price)
                .bind(item.total)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("update_invoice_item", e))?;
        ensure_updated(done.rows_affected(), "invoice item", item.id)
    }

    async fn delete_invoice_item(&mut self, id: InvoiceItemId) -> StoreResult<()> {
        sqlx::query("DELETE FROM invoice_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_invoice_item", e))?;
        Ok(())
    }

    async fn invoice_item(&mut self, id: InvoiceItemId) -> StoreResult<Option<InvoiceItem>> {
        let row = sqlx::query("SELECT * FROM invoice_items WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("invoice_item", e))?;
        decode_opt("invoice_item", row, rows::invoice_item)
    }

    async fn invoice_items(&mut self, invoice: InvoiceId) -> StoreResult<Vec<InvoiceItem>> {
        let found = sqlx::query("SELECT * FROM invoice_items WHERE invoice_id = $1 ORDER BY id")
            .bind(invoice.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("invoice_items", e))?;
        decode_all("invoice_items", found, rows::invoice_item)
    }

    async fn insert_installment(&mut self, i: &InvoiceInstallment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoice_installments (id, invoice_id, paid_amount, description, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(i.id.as_uuid())
        .bind(i.invoice_id.as_uuid())
        .bind(i.paid_amount)
        .bind(&i.description)
        .bind(i.date)
        .bind(i.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_installment", e))?;
        Ok(())
    }

    async fn installments(&mut self, invoice: InvoiceId) -> StoreResult<Vec<InvoiceInstallment>> {
        let found = sqlx::query(
            "SELECT * FROM invoice_installments WHERE invoice_id = $1 ORDER BY date DESC, id DESC",
        )
        .bind(invoice.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("installments", e))?;
        decode_all("installments", found, rows::installment)
    }

    async fn sales_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<(NaiveDate, Decimal)>> {
        let found = sqlx::query("SELECT date, grand_total FROM invoices WHERE date BETWEEN $1 AND $2")
            .bind(from)
            .bind(to)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("sales_between", e))?;
        found
            .iter()
            .map(|r| Ok((r.try_get("date")?, r.try_get("grand_total")?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("sales_between", e))
    }
}

#[async_trait]
impl BankRepository for PgTransaction {
    async fn insert_bank(&mut self, b: &Bank) -> StoreResult<()> {
        sqlx::query("INSERT INTO banks (id, name, branch) VALUES ($1, $2, $3)")
            .bind(b.id.as_uuid())
            .bind(&b.name)
            .bind(&b.branch)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_bank", e))?;
        Ok(())
    }

    async fn bank(&mut self, id: BankId) -> StoreResult<Option<Bank>> {
        let row = sqlx::query("SELECT * FROM banks WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("bank", e))?;
        decode_opt("bank", row, rows::bank)
    }

    async fn banks(&mut self) -> StoreResult<Vec<Bank>> {
        let found = sqlx::query("SELECT * FROM banks ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("banks", e))?;
        decode_all("banks", found, rows::bank)
    }

    async fn insert_bank_detail(&mut self, d: &BankDetail) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bank_details (id, bank_id, debit, credit, description, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(d.id.as_uuid())
        .bind(d.bank_id.as_uuid())
        .bind(d.debit)
        .bind(d.credit)
        .bind(&d.description)
        .bind(d.date)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_bank_detail", e))?;
        Ok(())
    }

    async fn bank_details(&mut self, bank: BankId) -> StoreResult<Vec<BankDetail>> {
        let found =
            sqlx::query("SELECT * FROM bank_details WHERE bank_id = $1 ORDER BY date DESC, id DESC")
                .bind(bank.as_uuid())
                .fetch_all(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("bank_details", e))?;
        decode_all("bank_details", found, rows::bank_detail)
    }

    async fn insert_bank_account(&mut self, a: &BankAccount) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bank_accounts
                (id, name, account_number, opening_balance, current_balance, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(a.id.as_uuid())
        .bind(&a.name)
        .bind(&a.account_number)
        .bind(a.opening_balance)
        .bind(a.current_balance)
        .bind(a.is_active)
        .bind(a.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_bank_account", e))?;
        Ok(())
    }

    async fn bank_account(&mut self, id: BankAccountId) -> StoreResult<Option<BankAccount>> {
        let row = sqlx::query("SELECT * FROM bank_accounts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("bank_account", e))?;
        decode_opt("bank_account", row, rows::bank_account)
    }

    async fn bank_accounts(&mut self) -> StoreResult<Vec<BankAccount>> {
        let found = sqlx::query("SELECT * FROM bank_accounts ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("bank_accounts", e))?;
        decode_all("bank_accounts", found, rows::bank_account)
    }

    #[instrument(skip(self), err)]
    async fn adjust_account_balance(
        &mut self,
        id: BankAccountId,
        delta: Decimal,
    ) -> StoreResult<Decimal> {
        let row = sqlx::query(
            "UPDATE bank_accounts SET current_balance = current_balance + $2 WHERE id = $1 RETURNING current_balance",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("adjust_account_balance", e))?;
        match row {
            Some(row) => row
                .try_get("current_balance")
                .map_err(|e| map_sqlx_error("adjust_account_balance", e)),
            None => Err(StoreError::not_found(format!("bank account {id}"))),
        }
    }

    async fn set_account_balance(
        &mut self,
        id: BankAccountId,
        balance: Decimal,
    ) -> StoreResult<()> {
        let done = sqlx::query("UPDATE bank_accounts SET current_balance = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(balance)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_account_balance", e))?;
        ensure_updated(done.rows_affected(), "bank account", id)
    }

    async fn insert_bank_transaction(&mut self, t: &BankTransaction) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bank_transactions
                (id, account_id, transaction_type, amount, description, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(t.id.as_uuid())
        .bind(t.account_id.as_uuid())
        .bind(t.transaction_type.as_str())
        .bind(t.amount)
        .bind(&t.description)
        .bind(t.date)
        .bind(t.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_bank_transaction", e))?;
        Ok(())
    }

    async fn bank_transactions(
        &mut self,
        account: BankAccountId,
    ) -> StoreResult<Vec<BankTransaction>> {
        let found = sqlx::query(
            "SELECT * FROM bank_transactions WHERE account_id = $1 ORDER BY date DESC, id DESC",
        )
        .bind(account.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("bank_transactions", e))?;
        decode_all("bank_transactions", found, rows::bank_transaction)
    }
}

#[async_trait]
impl ExpenseRepository for PgTransaction {
    async fn insert_expense_category(&mut self, c: &ExpenseCategory) -> StoreResult<()> {
        sqlx::query("INSERT INTO expense_categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(c.id.as_uuid())
            .bind(&c.name)
            .bind(&c.description)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_expense_category", e))?;
        Ok(())
    }

    async fn expense_category(
        &mut self,
        id: ExpenseCategoryId,
    ) -> StoreResult<Option<ExpenseCategory>> {
        let row = sqlx::query("SELECT * FROM expense_categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("expense_category", e))?;
        decode_opt("expense_category", row, rows::expense_category)
    }

    async fn expense_categories(&mut self) -> StoreResult<Vec<ExpenseCategory>> {
        let found = sqlx::query("SELECT * FROM expense_categories ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("expense_categories", e))?;
        decode_all("expense_categories", found, rows::expense_category)
    }

    async fn insert_expense(&mut self, e: &Expense) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO expenses
                (id, category_id, description, amount, date, payment_method, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(e.id.as_uuid())
        .bind(e.category_id.map(|c| *c.as_uuid()))
        .bind(&e.description)
        .bind(e.amount)
        .bind(e.date)
        .bind(e.payment_method.as_str())
        .bind(e.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|err| map_sqlx_error("insert_expense", err))?;
        Ok(())
    }

    async fn expenses_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Expense>> {
        let found = sqlx::query(
            "SELECT * FROM expenses WHERE date BETWEEN $1 AND $2 ORDER BY date DESC, id DESC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("expenses_between", e))?;
        decode_all("expenses_between", found, rows::expense)
    }
}
