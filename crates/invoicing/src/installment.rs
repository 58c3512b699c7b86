use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopbooks_core::money::check_positive;
use shopbooks_core::{DomainResult, FieldErrors, InstallmentId, InvoiceId, impl_entity};

/// A partial payment against an invoice. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceInstallment {
    pub id: InstallmentId,
    pub invoice_id: InvoiceId,
    pub paid_amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl_entity!(InvoiceInstallment, InstallmentId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInstallment {
    pub paid_amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewInstallment {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        check_positive(&mut errors, "paid_amount", self.paid_amount);
        errors.into_result()
    }

    pub fn into_installment(
        self,
        id: InstallmentId,
        invoice_id: InvoiceId,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceInstallment> {
        self.validate()?;
        Ok(InvoiceInstallment {
            id,
            invoice_id,
            paid_amount: self.paid_amount,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            date: self.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        })
    }
}
