use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::{
    check_non_negative, check_percent, check_quantity, ensure_amount, round_money, with_markup,
};
use shopbooks_core::{
    DomainError, DomainResult, FieldErrors, InvoiceId, InvoiceItemId, ProductId, StockInId,
    StockOutId, impl_entity,
};

/// A receipt of stock for a product. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIn {
    pub id: StockInId,
    pub product_id: ProductId,
    pub stock_quantity: i64,
    pub buying_price_item: Decimal,
    /// Markup applied on top of the buying price, in percent.
    pub buying_percent: Decimal,
    pub selling_price_item: Decimal,
    pub total_buying_amount: Decimal,
    pub total_selling_amount: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl_entity!(StockIn, StockInId);

/// Input for recording a stock receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockIn {
    pub product_id: ProductId,
    pub stock_quantity: i64,
    pub buying_price_item: Decimal,
    #[serde(default)]
    pub buying_percent: Decimal,
    pub selling_price_item: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewStockIn {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        check_quantity(&mut errors, "stock_quantity", self.stock_quantity);
        check_non_negative(&mut errors, "buying_price_item", self.buying_price_item);
        check_percent(&mut errors, "buying_percent", self.buying_percent);
        check_non_negative(&mut errors, "selling_price_item", self.selling_price_item);
        errors.into_result()
    }

    /// `round(unit_buying_price × quantity × (1 + percent / 100))`.
    pub fn total_buying_amount(&self) -> DomainResult<Decimal> {
        let unit = with_markup(self.buying_price_item, self.buying_percent);
        self.extended("total buying amount", unit)
    }

    /// `round(unit_selling_price × quantity)`.
    pub fn total_selling_amount(&self) -> DomainResult<Decimal> {
        self.extended("total selling amount", self.selling_price_item)
    }

    fn extended(&self, what: &str, unit: Decimal) -> DomainResult<Decimal> {
        let total = unit
            .checked_mul(Decimal::from(self.stock_quantity))
            .ok_or_else(|| DomainError::validation(format!("{what} is out of range")))?;
        ensure_amount(what, round_money(total))
    }

    pub fn into_stock_in(self, id: StockInId, now: DateTime<Utc>) -> DomainResult<StockIn> {
        self.validate()?;
        Ok(StockIn {
            id,
            product_id: self.product_id,
            stock_quantity: self.stock_quantity,
            total_buying_amount: self.total_buying_amount()?,
            total_selling_amount: self.total_selling_amount()?,
            buying_price_item: self.buying_price_item,
            buying_percent: self.buying_percent,
            selling_price_item: self.selling_price_item,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        })
    }
}

/// An issue of stock, usually generated by an invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOut {
    pub id: StockOutId,
    pub product_id: ProductId,
    pub invoice_id: Option<InvoiceId>,
    pub invoice_item_id: Option<InvoiceItemId>,
    pub quantity: i64,
    pub date: NaiveDate,
}

impl_entity!(StockOut, StockOutId);

/// Input for issuing stock.
///
/// Carries no item link: a stock-out tied to an invoice line is created only
/// through [`NewStockOut::into_item_stock_out`] when the line is sold, so
/// each item has at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStockOut {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewStockOut {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        check_quantity(&mut errors, "quantity", self.quantity);
        errors.into_result()
    }

    pub fn into_stock_out(self, id: StockOutId, today: NaiveDate) -> DomainResult<StockOut> {
        self.validate()?;
        Ok(StockOut {
            id,
            product_id: self.product_id,
            invoice_id: self.invoice_id,
            invoice_item_id: None,
            quantity: self.quantity,
            date: self.date.unwrap_or(today),
        })
    }

    /// Stock-out generated by selling `item`; requires the invoice link.
    pub fn into_item_stock_out(
        self,
        id: StockOutId,
        item: InvoiceItemId,
        today: NaiveDate,
    ) -> DomainResult<StockOut> {
        if self.invoice_id.is_none() {
            return Err(DomainError::validation("an item stock-out needs its invoice"));
        }
        let mut out = self.into_stock_out(id, today)?;
        out.invoice_item_id = Some(item);
        Ok(out)
    }
}
