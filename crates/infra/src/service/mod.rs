//! Transactional back-office operations.
//!
//! [`BackOffice`] is the application layer between the HTTP handlers and the
//! store. Every public operation follows the same shape:
//!
//! ```text
//! input
//!   ↓
//! 1. Validate (pure, no transaction yet)
//!   ↓
//! 2. Begin a store transaction
//!   ↓
//! 3. Resolve references (missing ones are `NotFound`)
//!   ↓
//! 4. Write rows and adjust cached counters
//!   ↓
//! 5. Commit, then log
//! ```
//!
//! Any `?` between steps 2 and 5 drops the transaction uncommitted, which
//! discards every write made so far. Read operations begin a transaction and
//! drop it.
//!
//! The operations are split by area: customers and ledgers, catalog, stock,
//! invoices, banking, and expenses with reports.

mod banking;
mod catalog;
mod customers;
mod invoices;
mod reports;
mod stock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use shopbooks_core::{CustomerId, DomainError, InvoiceId, ProductId};
use shopbooks_inventory::OversellPolicy;
use shopbooks_invoicing::Invoice;
use shopbooks_parties::Customer;
use shopbooks_products::Product;

use crate::backup::backup_data_file;
use crate::error::{StoreError, StoreResult};
use crate::repository::{
    CatalogRepository, CustomerRepository, Database, InvoiceRepository, Transaction,
};

pub use customers::CustomerLedger;
pub use invoices::InvoiceDetail;

/// Entry point for every business operation.
#[derive(Clone)]
pub struct BackOffice {
    db: Arc<dyn Database>,
    oversell: OversellPolicy,
}

impl core::fmt::Debug for BackOffice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BackOffice")
            .field("backend", &self.db.backend_name())
            .field("oversell", &self.oversell)
            .finish()
    }
}

impl BackOffice {
    pub fn new(db: Arc<dyn Database>, oversell: OversellPolicy) -> Self {
        Self { db, oversell }
    }

    pub fn oversell_policy(&self) -> OversellPolicy {
        self.oversell
    }

    pub fn backend_name(&self) -> &'static str {
        self.db.backend_name()
    }

    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        self.db.begin().await
    }

    /// Copy the primary data file into `backup_dir`.
    ///
    /// The copy runs inside a transaction so no commit can rewrite the file
    /// halfway through.
    pub async fn backup(&self, backup_dir: &Path) -> StoreResult<PathBuf> {
        let src = self.db.data_file().ok_or_else(|| {
            DomainError::validation(format!(
                "the {} backend has no data file to back up",
                self.db.backend_name()
            ))
        })?;
        let _tx = self.begin().await?;
        let path = backup_data_file(&src, backup_dir, Utc::now()).await?;
        info!(source = %src.display(), backup = %path.display(), "data file backed up");
        Ok(path)
    }
}

pub(crate) async fn require_customer(
    tx: &mut dyn Transaction,
    id: CustomerId,
) -> StoreResult<Customer> {
    tx.customer(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("customer {id}")))
}

pub(crate) async fn require_product(
    tx: &mut dyn Transaction,
    id: ProductId,
) -> StoreResult<Product> {
    tx.product(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("product {id}")))
}

pub(crate) async fn require_invoice(
    tx: &mut dyn Transaction,
    id: InvoiceId,
) -> StoreResult<Invoice> {
    tx.invoice(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("invoice {id}")))
}
