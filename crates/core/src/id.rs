//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_ids {
    ($($(#[$meta:meta])* $t:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $t(Uuid);

            impl $t {
                /// Create a new identifier.
                ///
                /// Uses UUIDv7 (time-ordered), so ids sort by creation time.
                pub fn new() -> Self {
                    Self(Uuid::now_v7())
                }

                pub fn from_uuid(uuid: Uuid) -> Self {
                    Self(uuid)
                }

                pub fn as_uuid(&self) -> &Uuid {
                    &self.0
                }
            }

            impl Default for $t {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl core::fmt::Display for $t {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    core::fmt::Display::fmt(&self.0, f)
                }
            }

            impl From<Uuid> for $t {
                fn from(value: Uuid) -> Self {
                    Self(value)
                }
            }

            impl From<$t> for Uuid {
                fn from(value: $t) -> Self {
                    value.0
                }
            }

            impl FromStr for $t {
                type Err = DomainError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let uuid = Uuid::from_str(s)
                        .map_err(|e| DomainError::invalid_id(format!("{}: {}", stringify!($t), e)))?;
                    Ok(Self(uuid))
                }
            }
        )+
    };
}

uuid_ids!(
    /// Identifier of a customer.
    CustomerId,
    /// Identifier of a customer ledger row.
    LedgerEntryId,
    /// Identifier of a product category.
    CategoryId,
    /// Identifier of a product.
    ProductId,
    StockInId,
    StockOutId,
    /// Identifier of an invoice (the display number is separate).
    InvoiceId,
    InvoiceItemId,
    InstallmentId,
    BankId,
    BankDetailId,
    BankAccountId,
    BankTransactionId,
    ExpenseCategoryId,
    ExpenseId,
);
