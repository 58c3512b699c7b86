use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use shopbooks_core::{
    BankId, DomainError, DomainResult, InstallmentId, InvoiceId, InvoiceItemId, ProductId,
    StockOutId,
};
use shopbooks_inventory::NewStockOut;
use shopbooks_invoicing::{
    Invoice, InvoiceInstallment, InvoiceItem, InvoiceItemUpdate, NewInstallment, NewInvoice,
    NewInvoiceLine, Totals,
};

use super::{BackOffice, require_customer, require_invoice, require_product};
use crate::error::{StoreError, StoreResult};
use crate::repository::{
    BankRepository, CatalogRepository, InvoiceRepository, StockRepository, Transaction,
};

const ADVANCE_DESCRIPTION: &str = "Advance payment";

/// An invoice with its lines and installments.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    /// Newest first.
    pub installments: Vec<InvoiceInstallment>,
}

impl InvoiceDetail {
    /// `paid_amount + Σ installments`.
    pub fn total_paid(&self) -> Decimal {
        self.invoice.total_paid(&self.installments)
    }

    pub fn totals(&self) -> DomainResult<Totals> {
        self.invoice.recalculate(&self.items, &self.installments)
    }
}

async fn require_bank(tx: &mut dyn Transaction, id: BankId) -> StoreResult<()> {
    match tx.bank(id).await? {
        Some(_) => Ok(()),
        None => Err(StoreError::not_found(format!("bank {id}"))),
    }
}

/// Re-derive the invoice totals from its stored items and installments and
/// persist them.
async fn refresh_totals(tx: &mut dyn Transaction, mut invoice: Invoice) -> StoreResult<InvoiceDetail> {
    let items = tx.invoice_items(invoice.id).await?;
    let installments = tx.installments(invoice.id).await?;
    let totals = invoice.recalculate(&items, &installments)?;
    invoice.apply_totals(&totals);
    tx.update_invoice(&invoice).await?;
    Ok(InvoiceDetail {
        invoice,
        items,
        installments,
    })
}

async fn require_item(
    tx: &mut dyn Transaction,
    invoice: InvoiceId,
    item: InvoiceItemId,
) -> StoreResult<InvoiceItem> {
    tx.invoice_item(item)
        .await?
        .filter(|i| i.invoice_id == invoice)
        .ok_or_else(|| StoreError::not_found(format!("invoice item {item}")))
}

impl BackOffice {
    /// Record a sale.
    ///
    /// Header, items, one stock-out per item, the optional advance
    /// installment and the final totals are written in one transaction. A
    /// missing customer, bank or product aborts the whole sale.
    #[instrument(skip(self, sale), fields(lines = sale.lines.len()), err)]
    pub async fn create_invoice(&self, sale: NewInvoice) -> StoreResult<InvoiceDetail> {
        sale.validate()?;

        let mut tx = self.begin().await?;
        if let Some(customer) = sale.customer_id {
            require_customer(tx.as_mut(), customer).await?;
        }
        if let Some(bank) = sale.bank_id {
            require_bank(tx.as_mut(), bank).await?;
        }

        let now = Utc::now();
        let number = tx.next_invoice_number().await?;
        let invoice = sale.header(InvoiceId::new(), number, now);
        tx.insert_invoice(&invoice).await?;

        for line in &sale.lines {
            self.sell_line(tx.as_mut(), &invoice, line, now).await?;
        }

        if let Some(advance) = sale.advance_installment() {
            let installment = NewInstallment {
                paid_amount: advance,
                description: Some(ADVANCE_DESCRIPTION.to_string()),
                date: Some(invoice.date),
            }
            .into_installment(InstallmentId::new(), invoice.id, now)?;
            tx.insert_installment(&installment).await?;
        }

        let detail = refresh_totals(tx.as_mut(), invoice).await?;
        tx.commit().await?;

        info!(
            invoice_id = %detail.invoice.id,
            number = %detail.invoice.display_number(),
            grand_total = %detail.invoice.grand_total,
            remaining = %detail.invoice.remaining_payment,
            "invoice created"
        );
        Ok(detail)
    }

    /// Insert one item and the stock-out it generates.
    async fn sell_line(
        &self,
        tx: &mut dyn Transaction,
        invoice: &Invoice,
        line: &NewInvoiceLine,
        now: DateTime<Utc>,
    ) -> StoreResult<InvoiceItem> {
        let product = require_product(tx, line.product_id).await?;
        let item = InvoiceItem::from_line(InvoiceItemId::new(), invoice.id, line, now)?;
        tx.insert_invoice_item(&item).await?;
        let stock_out = NewStockOut {
            product_id: product.id,
            quantity: item.quantity,
            invoice_id: Some(invoice.id),
            date: Some(invoice.date),
        }
        .into_item_stock_out(StockOutId::new(), item.id, invoice.date)?;
        self.issue_stock(tx, &product, &stock_out).await?;
        Ok(item)
    }

    pub async fn invoice(&self, id: InvoiceId) -> StoreResult<InvoiceDetail> {
        let mut tx = self.begin().await?;
        let invoice = require_invoice(tx.as_mut(), id).await?;
        let items = tx.invoice_items(id).await?;
        let installments = tx.installments(id).await?;
        Ok(InvoiceDetail {
            invoice,
            items,
            installments,
        })
    }

    /// Newest first.
    pub async fn invoices(&self) -> StoreResult<Vec<Invoice>> {
        let mut tx = self.begin().await?;
        tx.invoices().await
    }

    /// Delete an invoice with its items, installments and stock-outs, then
    /// reset the cached stock of every product it sold from history.
    #[instrument(skip(self), err)]
    pub async fn delete_invoice(&self, id: InvoiceId) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        require_invoice(tx.as_mut(), id).await?;
        let products: BTreeSet<ProductId> = tx
            .stock_outs_for_invoice(id)
            .await?
            .into_iter()
            .map(|s| s.product_id)
            .collect();

        tx.delete_invoice(id).await?;
        for product in &products {
            let level = tx.stock_level(*product).await?;
            tx.set_stock(*product, level.expected_counter()).await?;
        }
        tx.commit().await?;

        info!(invoice_id = %id, products = products.len(), "invoice deleted");
        Ok(())
    }

    /// Add a line to an existing invoice.
    #[instrument(skip(self, line), err)]
    pub async fn add_invoice_item(
        &self,
        invoice: InvoiceId,
        line: NewInvoiceLine,
    ) -> StoreResult<InvoiceDetail> {
        line.validate()?;

        let mut tx = self.begin().await?;
        let found = require_invoice(tx.as_mut(), invoice).await?;
        self.sell_line(tx.as_mut(), &found, &line, Utc::now()).await?;
        let detail = refresh_totals(tx.as_mut(), found).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Change an item's quantity and/or price.
    ///
    /// The linked stock-out is resized and the cached stock moves by the
    /// quantity difference. An item without a stock-out gets one for its full
    /// quantity.
    #[instrument(skip(self, update), err)]
    pub async fn update_invoice_item(
        &self,
        invoice: InvoiceId,
        item: InvoiceItemId,
        update: InvoiceItemUpdate,
    ) -> StoreResult<InvoiceDetail> {
        let mut tx = self.begin().await?;
        let found = require_invoice(tx.as_mut(), invoice).await?;
        let mut row = require_item(tx.as_mut(), invoice, item).await?;
        let product = require_product(tx.as_mut(), row.product_id).await?;

        let delta = row.apply_update(update)?;
        tx.update_invoice_item(&row).await?;

        match tx.stock_out_for_item(item).await? {
            Some(linked) => {
                if delta > 0 {
                    self.check_issue(tx.as_mut(), &product, delta).await?;
                }
                if delta != 0 {
                    tx.resize_stock_out(linked.id, row.quantity).await?;
                    tx.adjust_stock(product.id, -delta).await?;
                }
            }
            None => {
                let stock_out = NewStockOut {
                    product_id: product.id,
                    quantity: row.quantity,
                    invoice_id: Some(invoice),
                    date: Some(found.date),
                }
                .into_item_stock_out(StockOutId::new(), item, found.date)?;
                self.issue_stock(tx.as_mut(), &product, &stock_out).await?;
            }
        }

        let detail = refresh_totals(tx.as_mut(), found).await?;
        tx.commit().await?;

        info!(invoice_id = %invoice, item_id = %item, delta, "invoice item updated");
        Ok(detail)
    }

    /// Remove a line. Its stock-out goes with it and the quantity returns to
    /// the cached stock. The last line cannot be removed.
    #[instrument(skip(self), err)]
    pub async fn remove_invoice_item(
        &self,
        invoice: InvoiceId,
        item: InvoiceItemId,
    ) -> StoreResult<InvoiceDetail> {
        let mut tx = self.begin().await?;
        let found = require_invoice(tx.as_mut(), invoice).await?;
        let row = require_item(tx.as_mut(), invoice, item).await?;
        if tx.invoice_items(invoice).await?.len() <= 1 {
            return Err(DomainError::validation(
                "cannot remove the last item of an invoice; delete the invoice instead",
            )
            .into());
        }

        let linked = tx.stock_out_for_item(item).await?;
        if let Some(linked) = &linked {
            tx.delete_stock_out(linked.id).await?;
        }
        tx.delete_invoice_item(item).await?;
        if let Some(linked) = linked {
            tx.adjust_stock(row.product_id, linked.quantity).await?;
        }

        let detail = refresh_totals(tx.as_mut(), found).await?;
        tx.commit().await?;

        info!(invoice_id = %invoice, item_id = %item, "invoice item removed");
        Ok(detail)
    }

    /// Record a partial payment and recompute the remaining balance.
    #[instrument(skip(self, payment), err)]
    pub async fn add_installment(
        &self,
        invoice: InvoiceId,
        payment: NewInstallment,
    ) -> StoreResult<(InvoiceInstallment, Invoice)> {
        payment.validate()?;

        let mut tx = self.begin().await?;
        let found = require_invoice(tx.as_mut(), invoice).await?;
        let installment = payment.into_installment(InstallmentId::new(), invoice, Utc::now())?;
        tx.insert_installment(&installment).await?;
        let detail = refresh_totals(tx.as_mut(), found).await?;
        tx.commit().await?;

        info!(
            invoice_id = %invoice,
            amount = %installment.paid_amount,
            remaining = %detail.invoice.remaining_payment,
            "installment recorded"
        );
        Ok((installment, detail.invoice))
    }

    /// Newest first.
    pub async fn installments(&self, invoice: InvoiceId) -> StoreResult<Vec<InvoiceInstallment>> {
        let mut tx = self.begin().await?;
        require_invoice(tx.as_mut(), invoice).await?;
        tx.installments(invoice).await
    }

    /// `paid_amount + Σ installments`.
    pub async fn total_paid(&self, invoice: InvoiceId) -> StoreResult<Decimal> {
        Ok(self.invoice(invoice).await?.total_paid())
    }
}
