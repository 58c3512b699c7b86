use chrono::Utc;
use tracing::{info, instrument, warn};

use shopbooks_core::{ProductId, StockInId, StockOutId};
use shopbooks_inventory::{NewStockIn, NewStockOut, StockIn, StockLevel, StockOut, StockReconciliation};
use shopbooks_products::Product;

use super::{BackOffice, require_invoice, require_product};
use crate::error::StoreResult;
use crate::repository::{CatalogRepository, StockRepository, Transaction};

impl BackOffice {
    /// Receive stock. The product's cached counter grows by the quantity in
    /// the same transaction.
    #[instrument(skip(self, receipt), fields(product_id = %receipt.product_id), err)]
    pub async fn record_stock_in(&self, receipt: NewStockIn) -> StoreResult<StockIn> {
        receipt.validate()?;

        let mut tx = self.begin().await?;
        require_product(tx.as_mut(), receipt.product_id).await?;
        let stock_in = receipt.into_stock_in(StockInId::new(), Utc::now())?;
        tx.insert_stock_in(&stock_in).await?;
        let stock = tx
            .adjust_stock(stock_in.product_id, stock_in.stock_quantity)
            .await?;
        tx.commit().await?;

        info!(
            product_id = %stock_in.product_id,
            quantity = stock_in.stock_quantity,
            stock,
            "stock received"
        );
        Ok(stock_in)
    }

    /// Issue stock outside of an invoice flow. It may reference an invoice
    /// but never one of its items; item stock-outs come from selling lines.
    #[instrument(skip(self, issue), fields(product_id = %issue.product_id), err)]
    pub async fn record_stock_out(&self, issue: NewStockOut) -> StoreResult<StockOut> {
        issue.validate()?;

        let mut tx = self.begin().await?;
        let product = require_product(tx.as_mut(), issue.product_id).await?;
        if let Some(invoice) = issue.invoice_id {
            require_invoice(tx.as_mut(), invoice).await?;
        }
        let stock_out = issue.into_stock_out(StockOutId::new(), Utc::now().date_naive())?;
        self.issue_stock(tx.as_mut(), &product, &stock_out).await?;
        tx.commit().await?;
        Ok(stock_out)
    }

    /// Write a stock-out and take its quantity off the cached counter.
    ///
    /// The oversell policy is checked against the movement history, not the
    /// cached counter. Under `permit` an oversell is logged and recorded; the
    /// counter floors at zero.
    pub(crate) async fn issue_stock(
        &self,
        tx: &mut dyn Transaction,
        product: &Product,
        stock_out: &StockOut,
    ) -> StoreResult<i64> {
        self.check_issue(tx, product, stock_out.quantity).await?;
        tx.insert_stock_out(stock_out).await?;
        let stock = tx.adjust_stock(product.id, -stock_out.quantity).await?;
        info!(
            product_id = %product.id,
            quantity = stock_out.quantity,
            invoice_id = ?stock_out.invoice_id,
            stock,
            "stock issued"
        );
        Ok(stock)
    }

    /// Apply the oversell policy to issuing `quantity` more units.
    pub(crate) async fn check_issue(
        &self,
        tx: &mut dyn Transaction,
        product: &Product,
        quantity: i64,
    ) -> StoreResult<()> {
        let level = tx.stock_level(product.id).await?;
        self.oversell.check(product.id, &level, quantity)?;
        if level.would_oversell(quantity) {
            warn!(
                product_id = %product.id,
                requested = quantity,
                available = level.available,
                "stock oversold"
            );
        }
        Ok(())
    }

    /// Σ in, Σ out and their difference, read from movement history.
    pub async fn available_stock(&self, product: ProductId) -> StoreResult<StockLevel> {
        let mut tx = self.begin().await?;
        require_product(tx.as_mut(), product).await?;
        tx.stock_level(product).await
    }

    /// Reset the cached counter from history and report what changed.
    #[instrument(skip(self), err)]
    pub async fn reconcile_stock(&self, product: ProductId) -> StoreResult<StockReconciliation> {
        let mut tx = self.begin().await?;
        let found = require_product(tx.as_mut(), product).await?;
        let level = tx.stock_level(product).await?;
        let report = StockReconciliation::new(product, level, found.stock);
        if report.drifted() {
            tx.set_stock(product, report.cached_after).await?;
            tx.commit().await?;
            warn!(
                product_id = %product,
                cached_before = report.cached_before,
                cached_after = report.cached_after,
                available = level.available,
                "stock counter drifted from movement history"
            );
        }
        Ok(report)
    }

    pub async fn stock_ins(&self, product: Option<ProductId>) -> StoreResult<Vec<StockIn>> {
        let mut tx = self.begin().await?;
        tx.stock_ins(product).await
    }

    pub async fn stock_outs(&self, product: Option<ProductId>) -> StoreResult<Vec<StockOut>> {
        let mut tx = self.begin().await?;
        tx.stock_outs(product).await
    }
}
