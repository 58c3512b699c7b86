//! Row decoding.
//!
//! Domain types live in other crates, so rows are mapped by hand with
//! `try_get` rather than through `FromRow` impls.

use core::str::FromStr;

use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use shopbooks_accounting::{
    Bank, BankAccount, BankDetail, BankTransaction, Expense, ExpenseCategory, LedgerEntry,
};
use shopbooks_inventory::{StockIn, StockOut};
use shopbooks_invoicing::{Invoice, InvoiceInstallment, InvoiceItem};
use shopbooks_parties::Customer;
use shopbooks_products::{Category, Product};

type RowResult<T> = Result<T, sqlx::Error>;

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn id<T: From<Uuid>>(row: &PgRow, column: &str) -> RowResult<T> {
    Ok(T::from(row.try_get::<Uuid, _>(column)?))
}

fn opt_id<T: From<Uuid>>(row: &PgRow, column: &str) -> RowResult<Option<T>> {
    Ok(row.try_get::<Option<Uuid>, _>(column)?.map(T::from))
}

fn parsed<T>(row: &PgRow, column: &str) -> RowResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(decode_err)
}

pub fn customer(row: &PgRow) -> RowResult<Customer> {
    Ok(Customer {
        id: id(row, "id")?,
        name: row.try_get("name")?,
        father_name: row.try_get("father_name")?,
        cnic: row.try_get("cnic")?,
        mobile: row.try_get("mobile")?,
        resident: row.try_get("resident")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn ledger_entry(row: &PgRow) -> RowResult<LedgerEntry> {
    Ok(LedgerEntry {
        id: id(row, "id")?,
        customer_id: id(row, "customer_id")?,
        date: row.try_get("date")?,
        detail: row.try_get("detail")?,
        debit_amount: row.try_get("debit_amount")?,
        credit_amount: row.try_get("credit_amount")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn category(row: &PgRow) -> RowResult<Category> {
    Ok(Category {
        id: id(row, "id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
    })
}

pub fn product(row: &PgRow) -> RowResult<Product> {
    Ok(Product {
        id: id(row, "id")?,
        category_id: id(row, "category_id")?,
        name: row.try_get("name")?,
        stock: row.try_get("stock")?,
        buying_price: row.try_get("buying_price")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn stock_in(row: &PgRow) -> RowResult<StockIn> {
    Ok(StockIn {
        id: id(row, "id")?,
        product_id: id(row, "product_id")?,
        stock_quantity: row.try_get("stock_quantity")?,
        buying_price_item: row.try_get("buying_price_item")?,
        buying_percent: row.try_get("buying_percent")?,
        selling_price_item: row.try_get("selling_price_item")?,
        total_buying_amount: row.try_get("total_buying_amount")?,
        total_selling_amount: row.try_get("total_selling_amount")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn stock_out(row: &PgRow) -> RowResult<StockOut> {
    Ok(StockOut {
        id: id(row, "id")?,
        product_id: id(row, "product_id")?,
        invoice_id: opt_id(row, "invoice_id")?,
        invoice_item_id: opt_id(row, "invoice_item_id")?,
        quantity: row.try_get("quantity")?,
        date: row.try_get("date")?,
    })
}

pub fn invoice(row: &PgRow) -> RowResult<Invoice> {
    let number: i64 = row.try_get("number")?;
    Ok(Invoice {
        id: id(row, "id")?,
        number: u64::try_from(number).map_err(decode_err)?,
        customer_id: opt_id(row, "customer_id")?,
        bank_id: opt_id(row, "bank_id")?,
        payment_type: parsed(row, "payment_type")?,
        total_quantity: row.try_get("total_quantity")?,
        sub_total: row.try_get("sub_total")?,
        discount: row.try_get("discount")?,
        shipping: row.try_get("shipping")?,
        grand_total: row.try_get("grand_total")?,
        paid_amount: row.try_get("paid_amount")?,
        remaining_payment: row.try_get("remaining_payment")?,
        cash_payment: row.try_get("cash_payment")?,
        cash_returned: row.try_get("cash_returned")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn invoice_item(row: &PgRow) -> RowResult<InvoiceItem> {
    Ok(InvoiceItem {
        id: id(row, "id")?,
        invoice_id: id(row, "invoice_id")?,
        product_id: id(row, "product_id")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
        total: row.try_get("total")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn installment(row: &PgRow) -> RowResult<InvoiceInstallment> {
    Ok(InvoiceInstallment {
        id: id(row, "id")?,
        invoice_id: id(row, "invoice_id")?,
        paid_amount: row.try_get("paid_amount")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn bank(row: &PgRow) -> RowResult<Bank> {
    Ok(Bank {
        id: id(row, "id")?,
        name: row.try_get("name")?,
        branch: row.try_get("branch")?,
    })
}

pub fn bank_detail(row: &PgRow) -> RowResult<BankDetail> {
    Ok(BankDetail {
        id: id(row, "id")?,
        bank_id: id(row, "bank_id")?,
        debit: row.try_get("debit")?,
        credit: row.try_get("credit")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
    })
}

pub fn bank_account(row: &PgRow) -> RowResult<BankAccount> {
    Ok(BankAccount {
        id: id(row, "id")?,
        name: row.try_get("name")?,
        account_number: row.try_get("account_number")?,
        opening_balance: row.try_get("opening_balance")?,
        current_balance: row.try_get("current_balance")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn bank_transaction(row: &PgRow) -> RowResult<BankTransaction> {
    Ok(BankTransaction {
        id: id(row, "id")?,
        account_id: id(row, "account_id")?,
        transaction_type: parsed(row, "transaction_type")?,
        amount: row.try_get("amount")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn expense_category(row: &PgRow) -> RowResult<ExpenseCategory> {
    Ok(ExpenseCategory {
        id: id(row, "id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

pub fn expense(row: &PgRow) -> RowResult<Expense> {
    Ok(Expense {
        id: id(row, "id")?,
        category_id: opt_id(row, "category_id")?,
        description: row.try_get("description")?,
        amount: row.try_get("amount")?,
        date: row.try_get("date")?,
        payment_method: parsed(row, "payment_method")?,
        created_at: row.try_get("created_at")?,
    })
}
