use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::{check_non_negative, check_quantity, line_total};
use shopbooks_core::{
    BankId, CustomerId, DomainError, DomainResult, FieldErrors, InvoiceId, InvoiceItemId, ProductId, impl_entity,
};

use crate::installment::InvoiceInstallment;
use crate::totals::{LineAmount, Totals, recalculate};

/// Human-facing invoice number, zero-padded to seven digits.
pub fn format_invoice_number(number: u64) -> String {
    format!("{number:07}")
}

/// How the customer settles the invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    #[default]
    Cash,
    Installment,
    Check,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "Cash",
            PaymentType::Installment => "Installment",
            PaymentType::Check => "Check",
        }
    }
}

impl core::str::FromStr for PaymentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentType::Cash),
            "Installment" => Ok(PaymentType::Installment),
            "Check" => Ok(PaymentType::Check),
            other => Err(DomainError::validation(format!("unknown payment type '{other}'"))),
        }
    }
}

/// Sales invoice header.
///
/// The derived figures (`total_quantity`, `sub_total`, `grand_total`,
/// `remaining_payment`) are stored, and refreshed through [`Invoice::apply_totals`]
/// whenever items or installments change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: u64,
    pub customer_id: Option<CustomerId>,
    pub bank_id: Option<BankId>,
    pub payment_type: PaymentType,
    pub total_quantity: i64,
    pub sub_total: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub grand_total: Decimal,
    pub paid_amount: Decimal,
    pub remaining_payment: Decimal,
    pub cash_payment: Decimal,
    pub cash_returned: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl_entity!(Invoice, InvoiceId);

impl Invoice {
    pub fn display_number(&self) -> String {
        format_invoice_number(self.number)
    }

    /// Derive totals from the given items and installments.
    pub fn recalculate(
        &self,
        items: &[InvoiceItem],
        installments: &[InvoiceInstallment],
    ) -> DomainResult<Totals> {
        let lines: Vec<LineAmount> = items.iter().map(InvoiceItem::line_amount).collect();
        let paid: Vec<Decimal> = installments.iter().map(|i| i.paid_amount).collect();
        recalculate(&lines, self.discount, self.shipping, self.paid_amount, &paid)
    }

    pub fn apply_totals(&mut self, totals: &Totals) {
        self.total_quantity = totals.total_quantity;
        self.sub_total = totals.sub_total;
        self.grand_total = totals.grand_total;
        self.remaining_payment = totals.remaining_payment;
    }

    /// `paid_amount + Σ installments`.
    pub fn total_paid(&self, installments: &[InvoiceInstallment]) -> Decimal {
        installments
            .iter()
            .fold(self.paid_amount, |acc, i| acc + i.paid_amount)
    }
}

/// A product line on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: InvoiceItemId,
    pub invoice_id: InvoiceId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Decimal,
    /// Always `quantity × price`.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl_entity!(InvoiceItem, InvoiceItemId);

impl InvoiceItem {
    pub fn from_line(
        id: InvoiceItemId,
        invoice_id: InvoiceId,
        line: &NewInvoiceLine,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        line.validate()?;
        Ok(Self {
            id,
            invoice_id,
            product_id: line.product_id,
            quantity: line.quantity,
            price: line.price,
            total: line_total(line.quantity, line.price)?,
            created_at: now,
        })
    }

    pub fn line_amount(&self) -> LineAmount {
        LineAmount::new(self.quantity, self.price)
    }

    /// Apply an edit and return the change in quantity (new − old).
    pub fn apply_update(&mut self, update: InvoiceItemUpdate) -> DomainResult<i64> {
        let line = NewInvoiceLine {
            product_id: self.product_id,
            quantity: update.quantity.unwrap_or(self.quantity),
            price: update.price.unwrap_or(self.price),
        };
        line.validate()?;
        let total = line_total(line.quantity, line.price)?;

        let delta = line.quantity - self.quantity;
        self.quantity = line.quantity;
        self.price = line.price;
        self.total = total;
        Ok(delta)
    }
}

/// One line of a new invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Decimal,
}

impl NewInvoiceLine {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        self.collect_errors(&mut errors, "");
        errors.into_result()
    }

    fn collect_errors(&self, errors: &mut FieldErrors, prefix: &str) {
        check_quantity(errors, &format!("{prefix}quantity"), self.quantity);
        check_non_negative(errors, &format!("{prefix}price"), self.price);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItemUpdate {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Input for a sale: header fields plus the lines sold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub bank_id: Option<BankId>,
    #[serde(default)]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub lines: Vec<NewInvoiceLine>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub cash_payment: Decimal,
    #[serde(default)]
    pub cash_returned: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewInvoice {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if self.lines.is_empty() {
            errors.add("lines", "An invoice needs at least one line.");
        }
        for (i, line) in self.lines.iter().enumerate() {
            line.collect_errors(&mut errors, &format!("lines[{i}]."));
        }
        check_non_negative(&mut errors, "discount", self.discount);
        check_non_negative(&mut errors, "shipping", self.shipping);
        check_non_negative(&mut errors, "paid_amount", self.paid_amount);
        check_non_negative(&mut errors, "cash_payment", self.cash_payment);
        check_non_negative(&mut errors, "cash_returned", self.cash_returned);
        errors.into_result()
    }

    /// Up-front payment recorded as the first installment.
    ///
    /// Installment sales keep their advance only as an installment row, so it
    /// is counted once in `total_paid`.
    pub fn advance_installment(&self) -> Option<Decimal> {
        (self.payment_type == PaymentType::Installment && self.paid_amount > Decimal::ZERO)
            .then_some(self.paid_amount)
    }

    /// Build the header with zero totals; callers add items and apply totals.
    pub fn header(&self, id: InvoiceId, number: u64, now: DateTime<Utc>) -> Invoice {
        let paid_amount = if self.advance_installment().is_some() {
            Decimal::ZERO
        } else {
            self.paid_amount
        };
        Invoice {
            id,
            number,
            customer_id: self.customer_id,
            bank_id: self.bank_id,
            payment_type: self.payment_type,
            total_quantity: 0,
            sub_total: Decimal::ZERO,
            discount: self.discount,
            shipping: self.shipping,
            grand_total: Decimal::ZERO,
            paid_amount,
            remaining_payment: Decimal::ZERO,
            cash_payment: self.cash_payment,
            cash_returned: self.cash_returned,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installment::NewInstallment;
    use rust_decimal_macros::dec;
    use shopbooks_core::InstallmentId;

    fn line(quantity: i64, price: Decimal) -> NewInvoiceLine {
        NewInvoiceLine {
            product_id: ProductId::new(),
            quantity,
            price,
        }
    }

    fn sale(lines: Vec<NewInvoiceLine>) -> NewInvoice {
        NewInvoice {
            lines,
            discount: dec!(2.00),
            shipping: dec!(1.00),
            paid_amount: dec!(20.00),
            ..NewInvoice::default()
        }
    }

    fn build(new: &NewInvoice) -> (Invoice, Vec<InvoiceItem>) {
        let now = Utc::now();
        let invoice = new.header(InvoiceId::new(), 42, now);
        let items = new
            .lines
            .iter()
            .map(|l| InvoiceItem::from_line(InvoiceItemId::new(), invoice.id, l, now).unwrap())
            .collect();
        (invoice, items)
    }

    #[test]
    fn number_is_zero_padded() {
        let (invoice, _) = build(&sale(vec![line(1, dec!(1))]));
        assert_eq!(invoice.display_number(), "0000042");
        assert_eq!(format_invoice_number(1234567), "1234567");
    }

    #[test]
    fn cash_sale_totals() {
        let new = sale(vec![line(3, dec!(10.00)), line(1, dec!(5.00))]);
        let (mut invoice, items) = build(&new);
        let totals = invoice.recalculate(&items, &[]).unwrap();
        invoice.apply_totals(&totals);

        assert_eq!(items[0].total, dec!(30.00));
        assert_eq!(invoice.sub_total, dec!(35.00));
        assert_eq!(invoice.grand_total, dec!(34.00));
        assert_eq!(invoice.paid_amount, dec!(20.00));
        assert_eq!(invoice.remaining_payment, dec!(14.00));
    }

    #[test]
    fn installment_advance_is_not_counted_twice() {
        let new = NewInvoice {
            payment_type: PaymentType::Installment,
            ..sale(vec![line(3, dec!(10.00)), line(1, dec!(5.00))])
        };
        assert_eq!(new.advance_installment(), Some(dec!(20.00)));

        let (mut invoice, items) = build(&new);
        assert_eq!(invoice.paid_amount, Decimal::ZERO);

        let advance = NewInstallment {
            paid_amount: dec!(20.00),
            description: Some("advance".to_string()),
            date: None,
        }
        .into_installment(InstallmentId::new(), invoice.id, Utc::now())
        .unwrap();
        let installments = vec![advance];

        let totals = invoice.recalculate(&items, &installments).unwrap();
        invoice.apply_totals(&totals);
        assert_eq!(invoice.total_paid(&installments), dec!(20.00));
        assert_eq!(invoice.remaining_payment, dec!(14.00));
    }

    #[test]
    fn empty_invoice_is_rejected() {
        let err = sale(vec![]).validate().unwrap_err();
        match err {
            DomainError::InvalidFields(f) => assert!(f.get("lines").is_some()),
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn bad_line_is_reported_by_index() {
        let err = sale(vec![line(1, dec!(1)), line(0, dec!(-1))])
            .validate()
            .unwrap_err();
        match err {
            DomainError::InvalidFields(f) => {
                assert!(f.get("lines[1].quantity").is_some());
                assert!(f.get("lines[1].price").is_some());
                assert!(f.get("lines[0].quantity").is_none());
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn item_update_recomputes_total_and_reports_delta() {
        let (_, mut items) = build(&sale(vec![line(3, dec!(10.00))]));
        let item = &mut items[0];

        let delta = item
            .apply_update(InvoiceItemUpdate {
                quantity: Some(5),
                price: None,
            })
            .unwrap();
        assert_eq!(delta, 2);
        assert_eq!(item.total, dec!(50.00));

        let delta = item
            .apply_update(InvoiceItemUpdate {
                quantity: Some(1),
                price: Some(dec!(7.50)),
            })
            .unwrap();
        assert_eq!(delta, -4);
        assert_eq!(item.total, dec!(7.50));

        assert!(item
            .apply_update(InvoiceItemUpdate {
                quantity: Some(0),
                price: None,
            })
            .is_err());
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn sub_cent_prices_are_rejected() {
        let err = line(3, dec!(0.125)).validate().unwrap_err();
        match err {
            DomainError::InvalidFields(f) => assert!(f.get("price").is_some()),
            other => panic!("expected InvalidFields, got {other:?}"),
        }
        assert!(line(3, dec!(0.12)).validate().is_ok());
    }

    #[test]
    fn oversized_lines_fail_validation_instead_of_overflowing() {
        let err = line(i64::MAX, dec!(100000000000.00)).validate().unwrap_err();
        match err {
            DomainError::InvalidFields(f) => {
                assert!(f.get("quantity").is_some());
                assert!(f.get("price").is_none());
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }

        // each field in range, product too large to store
        let big = line(1_000_000, dec!(999999999.99));
        assert!(big.validate().is_ok());
        let err = InvoiceItem::from_line(InvoiceItemId::new(), InvoiceId::new(), &big, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn failed_item_update_leaves_item_untouched() {
        let (_, mut items) = build(&sale(vec![line(3, dec!(10.00))]));
        let item = &mut items[0];
        let err = item
            .apply_update(InvoiceItemUpdate {
                quantity: Some(1_000_000_000),
                price: Some(dec!(999999999999.99)),
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item.quantity, 3);
        assert_eq!(item.total, dec!(30.00));
    }
}
