use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use shopbooks_accounting::{
    Bank, BankAccount, BankDetail, BankTransaction, Expense, ExpenseCategory, LedgerEntry,
    LedgerTotals, NewLedgerEntry, PeriodSummary,
};
use shopbooks_core::money::format_money;
use shopbooks_core::{DomainError, FieldErrors};
use shopbooks_infra::{CustomerLedger, InvoiceDetail};
use shopbooks_inventory::{StockIn, StockLevel, StockOut, StockReconciliation};
use shopbooks_invoicing::{Invoice, InvoiceInstallment, InvoiceItem};
use shopbooks_parties::Customer;
use shopbooks_products::{Category, Product};

use crate::app::errors::ApiError;

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse::<T>()?)
}

fn money(value: Decimal) -> String {
    format_money(value)
}

// -------------------------
// Request DTOs
// -------------------------

/// Loosely typed ledger form so that missing or malformed fields come back
/// as field errors instead of a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LedgerEntryRequest {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl LedgerEntryRequest {
    pub fn into_entry(self) -> Result<NewLedgerEntry, DomainError> {
        let mut errors = FieldErrors::new();

        let amount = match self.amount {
            None | Some(Value::Null) => {
                errors.add("amount", "This field is required.");
                None
            }
            Some(Value::String(raw)) if raw.trim().is_empty() => {
                errors.add("amount", "This field is required.");
                None
            }
            Some(Value::String(raw)) => parse_amount(&mut errors, raw.trim()),
            Some(Value::Number(n)) => parse_amount(&mut errors, &n.to_string()),
            Some(_) => {
                errors.add("amount", "Enter a number.");
                None
            }
        };

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.add("date", "Enter a valid date.");
                    None
                }
            },
        };

        let detail = self.detail.unwrap_or_default();
        if !errors.is_empty() {
            errors.require("detail", &detail);
        }
        errors.into_result()?;

        Ok(NewLedgerEntry {
            amount: amount.unwrap_or_default(),
            detail,
            date,
        })
    }
}

fn parse_amount(errors: &mut FieldErrors, raw: &str) -> Option<Decimal> {
    match Decimal::from_str(raw) {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add("amount", "Enter a number.");
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// -------------------------
// Response mapping
// -------------------------

pub fn customer_to_json(c: &Customer) -> Value {
    json!({
        "id": c.id.to_string(),
        "name": c.name,
        "father_name": c.father_name,
        "cnic": c.cnic,
        "mobile": c.mobile,
        "resident": c.resident,
        "address": c.address,
        "city": c.city,
        "date": c.date,
        "created_at": c.created_at.to_rfc3339(),
    })
}

/// One ledger row as the ledger endpoints render it.
pub fn ledger_entry_to_json(e: &LedgerEntry) -> Value {
    json!({
        "id": e.id.to_string(),
        "date": e.date.format("%Y-%m-%d").to_string(),
        "detail": e.detail,
        "debit_amount": money(e.debit_amount),
        "credit_amount": money(e.credit_amount),
    })
}

pub fn ledger_write_to_json(entry: &LedgerEntry, totals: &LedgerTotals) -> Value {
    json!({
        "success": true,
        "entry": ledger_entry_to_json(entry),
        "total_debit": money(totals.total_debit),
        "total_credit": money(totals.total_credit),
    })
}

pub fn ledger_to_json(ledger: &CustomerLedger) -> Value {
    json!({
        "customer": customer_to_json(&ledger.customer),
        "entries": ledger.entries.iter().map(ledger_entry_to_json).collect::<Vec<_>>(),
        "total_debit": money(ledger.totals.total_debit),
        "total_credit": money(ledger.totals.total_credit),
        "balance": money(ledger.balance()),
    })
}

pub fn category_to_json(c: &Category) -> Value {
    json!({
        "id": c.id.to_string(),
        "name": c.name,
        "description": c.description,
        "date": c.date,
    })
}

pub fn product_to_json(p: &Product) -> Value {
    json!({
        "id": p.id.to_string(),
        "category_id": p.category_id.to_string(),
        "name": p.name,
        "stock": p.stock,
        "buying_price": money(p.buying_price),
        "date": p.date,
        "created_at": p.created_at.to_rfc3339(),
    })
}

pub fn stock_in_to_json(s: &StockIn) -> Value {
    json!({
        "id": s.id.to_string(),
        "product_id": s.product_id.to_string(),
        "stock_quantity": s.stock_quantity,
        "buying_price_item": money(s.buying_price_item),
        "buying_percent": s.buying_percent.to_string(),
        "selling_price_item": money(s.selling_price_item),
        "total_buying_amount": money(s.total_buying_amount),
        "total_selling_amount": money(s.total_selling_amount),
        "date": s.date,
    })
}

pub fn stock_out_to_json(s: &StockOut) -> Value {
    json!({
        "id": s.id.to_string(),
        "product_id": s.product_id.to_string(),
        "invoice_id": s.invoice_id.map(|id| id.to_string()),
        "invoice_item_id": s.invoice_item_id.map(|id| id.to_string()),
        "quantity": s.quantity,
        "date": s.date,
    })
}

pub fn stock_level_to_json(product: &Product, level: &StockLevel) -> Value {
    json!({
        "product_id": product.id.to_string(),
        "stocked_in": level.stocked_in,
        "stocked_out": level.stocked_out,
        "available": level.available,
        "cached": product.stock,
    })
}

pub fn reconciliation_to_json(r: &StockReconciliation) -> Value {
    json!({
        "product_id": r.product_id.to_string(),
        "available": r.level.available,
        "cached_before": r.cached_before,
        "cached_after": r.cached_after,
        "drifted": r.drifted(),
        "oversold_by": r.oversold_by(),
    })
}

pub fn invoice_to_json(i: &Invoice) -> Value {
    json!({
        "id": i.id.to_string(),
        "number": i.display_number(),
        "customer_id": i.customer_id.map(|id| id.to_string()),
        "bank_id": i.bank_id.map(|id| id.to_string()),
        "payment_type": i.payment_type.as_str(),
        "total_quantity": i.total_quantity,
        "sub_total": money(i.sub_total),
        "discount": money(i.discount),
        "shipping": money(i.shipping),
        "grand_total": money(i.grand_total),
        "paid_amount": money(i.paid_amount),
        "remaining_payment": money(i.remaining_payment),
        "cash_payment": money(i.cash_payment),
        "cash_returned": money(i.cash_returned),
        "date": i.date,
        "created_at": i.created_at.to_rfc3339(),
    })
}

pub fn invoice_item_to_json(i: &InvoiceItem) -> Value {
    json!({
        "id": i.id.to_string(),
        "product_id": i.product_id.to_string(),
        "quantity": i.quantity,
        "price": money(i.price),
        "total": money(i.total),
    })
}

pub fn installment_to_json(i: &InvoiceInstallment) -> Value {
    json!({
        "id": i.id.to_string(),
        "invoice_id": i.invoice_id.to_string(),
        "paid_amount": money(i.paid_amount),
        "description": i.description,
        "date": i.date,
    })
}

pub fn invoice_detail_to_json(d: &InvoiceDetail) -> Value {
    let mut body = invoice_to_json(&d.invoice);
    body["items"] = d.items.iter().map(invoice_item_to_json).collect();
    body["installments"] = d.installments.iter().map(installment_to_json).collect();
    body["total_paid"] = Value::from(money(d.total_paid()));
    body
}

pub fn bank_to_json(b: &Bank) -> Value {
    json!({
        "id": b.id.to_string(),
        "name": b.name,
        "branch": b.branch,
    })
}

pub fn bank_detail_to_json(d: &BankDetail) -> Value {
    json!({
        "id": d.id.to_string(),
        "bank_id": d.bank_id.to_string(),
        "debit": money(d.debit),
        "credit": money(d.credit),
        "description": d.description,
        "date": d.date,
    })
}

pub fn account_to_json(a: &BankAccount) -> Value {
    json!({
        "id": a.id.to_string(),
        "name": a.name,
        "account_number": a.account_number,
        "opening_balance": money(a.opening_balance),
        "current_balance": money(a.current_balance),
        "is_active": a.is_active,
    })
}

pub fn bank_transaction_to_json(t: &BankTransaction) -> Value {
    json!({
        "id": t.id.to_string(),
        "account_id": t.account_id.to_string(),
        "transaction_type": t.transaction_type.as_str(),
        "amount": money(t.amount),
        "description": t.description,
        "date": t.date,
    })
}

pub fn expense_category_to_json(c: &ExpenseCategory) -> Value {
    json!({
        "id": c.id.to_string(),
        "name": c.name,
        "description": c.description,
    })
}

pub fn expense_to_json(e: &Expense) -> Value {
    json!({
        "id": e.id.to_string(),
        "category_id": e.category_id.map(|id| id.to_string()),
        "description": e.description,
        "amount": money(e.amount),
        "date": e.date,
        "payment_method": e.payment_method.as_str(),
    })
}

pub fn summary_to_json(s: &PeriodSummary) -> Value {
    json!({
        "from": s.from,
        "to": s.to,
        "invoice_count": s.invoice_count,
        "total_sales": money(s.total_sales),
        "total_expenses": money(s.total_expenses),
        "profit_loss": money(s.profit_loss),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> LedgerEntryRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn ledger_request_accepts_strings_and_numbers() {
        let entry = request(json!({ "amount": "100.50", "detail": "goods" }))
            .into_entry()
            .unwrap();
        assert_eq!(entry.amount, Decimal::new(10050, 2));
        assert_eq!(entry.date, None);

        let entry = request(json!({ "amount": 40, "detail": "cash", "date": "2024-05-01" }))
            .into_entry()
            .unwrap();
        assert_eq!(entry.amount, Decimal::from(40));
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn ledger_request_reports_field_errors() {
        let err = request(json!({ "amount": "abc", "date": "01/05/2024" }))
            .into_entry()
            .unwrap_err();
        let DomainError::InvalidFields(fields) = err else {
            panic!("expected field errors, got {err:?}");
        };
        assert_eq!(fields.get("amount"), Some(&["Enter a number.".to_string()][..]));
        assert_eq!(fields.get("date"), Some(&["Enter a valid date.".to_string()][..]));
        assert!(fields.get("detail").is_some());
    }

    #[test]
    fn money_renders_two_decimals() {
        let entry = LedgerEntry {
            id: shopbooks_core::LedgerEntryId::new(),
            customer_id: shopbooks_core::CustomerId::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            detail: "x".into(),
            debit_amount: Decimal::from(35),
            credit_amount: Decimal::ZERO,
            created_at: chrono::Utc::now(),
        };
        let body = ledger_entry_to_json(&entry);
        assert_eq!(body["debit_amount"], "35.00");
        assert_eq!(body["credit_amount"], "0.00");
        assert_eq!(body["date"], "2024-01-02");
    }
}
