use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use shopbooks_accounting::{LedgerEntry, LedgerTotals, NewLedgerEntry};
use shopbooks_core::{CustomerId, LedgerEntryId};
use shopbooks_parties::{Customer, CustomerDetails, CustomerUpdate};

use super::{BackOffice, require_customer};
use crate::error::{StoreError, StoreResult};
use crate::repository::CustomerRepository;

/// A customer's ledger rows (newest first) with their aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerLedger {
    pub customer: Customer,
    pub entries: Vec<LedgerEntry>,
    pub totals: LedgerTotals,
}

impl CustomerLedger {
    pub fn balance(&self) -> Decimal {
        self.totals.balance()
    }
}

#[derive(Clone, Copy)]
enum Side {
    Debit,
    Credit,
}

impl BackOffice {
    pub async fn create_customer(&self, details: CustomerDetails) -> StoreResult<Customer> {
        let customer = details.into_customer(CustomerId::new(), Utc::now())?;

        let mut tx = self.begin().await?;
        tx.insert_customer(&customer).await?;
        tx.commit().await?;

        info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> StoreResult<Customer> {
        let mut tx = self.begin().await?;
        let mut customer = require_customer(tx.as_mut(), id).await?;
        customer.apply_update(update)?;
        tx.update_customer(&customer).await?;
        tx.commit().await?;
        Ok(customer)
    }

    pub async fn customer(&self, id: CustomerId) -> StoreResult<Customer> {
        let mut tx = self.begin().await?;
        require_customer(tx.as_mut(), id).await
    }

    pub async fn customers(&self) -> StoreResult<Vec<Customer>> {
        let mut tx = self.begin().await?;
        tx.customers().await
    }

    /// Remove the customer and their ledger; their invoices are kept without
    /// a customer.
    #[instrument(skip(self), err)]
    pub async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        if !tx.delete_customer(id).await? {
            return Err(StoreError::not_found(format!("customer {id}")));
        }
        tx.commit().await?;
        info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    /// Charge the customer. Returns the new row and the updated totals.
    pub async fn add_debit(
        &self,
        customer: CustomerId,
        entry: NewLedgerEntry,
    ) -> StoreResult<(LedgerEntry, LedgerTotals)> {
        self.add_ledger_entry(customer, entry, Side::Debit).await
    }

    /// Record a payment from the customer.
    pub async fn add_credit(
        &self,
        customer: CustomerId,
        entry: NewLedgerEntry,
    ) -> StoreResult<(LedgerEntry, LedgerTotals)> {
        self.add_ledger_entry(customer, entry, Side::Credit).await
    }

    async fn add_ledger_entry(
        &self,
        customer: CustomerId,
        entry: NewLedgerEntry,
        side: Side,
    ) -> StoreResult<(LedgerEntry, LedgerTotals)> {
        let mut tx = self.begin().await?;
        require_customer(tx.as_mut(), customer).await?;

        let now = Utc::now();
        let entry = match side {
            Side::Debit => entry.into_debit(LedgerEntryId::new(), customer, now)?,
            Side::Credit => entry.into_credit(LedgerEntryId::new(), customer, now)?,
        };
        tx.insert_ledger_entry(&entry).await?;
        let totals = LedgerTotals::from_entries(&tx.ledger_entries(customer).await?);
        tx.commit().await?;

        info!(
            customer_id = %customer,
            debit = %entry.debit_amount,
            credit = %entry.credit_amount,
            balance = %totals.balance(),
            "ledger entry recorded"
        );
        Ok((entry, totals))
    }

    pub async fn customer_ledger(&self, customer: CustomerId) -> StoreResult<CustomerLedger> {
        let mut tx = self.begin().await?;
        let found = require_customer(tx.as_mut(), customer).await?;
        let entries = tx.ledger_entries(customer).await?;
        let totals = LedgerTotals::from_entries(&entries);
        Ok(CustomerLedger {
            customer: found,
            entries,
            totals,
        })
    }

    /// `Σ credit − Σ debit`; negative means the customer owes money.
    pub async fn customer_balance(&self, customer: CustomerId) -> StoreResult<Decimal> {
        Ok(self.customer_ledger(customer).await?.balance())
    }
}
