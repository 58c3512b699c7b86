//! Invoicing domain module.
//!
//! Invoices, their line items and installment payments, plus the aggregator
//! that derives invoice totals from them. Deterministic domain logic only (no
//! IO, no HTTP, no storage).

pub mod installment;
pub mod invoice;
pub mod totals;

pub use installment::{InvoiceInstallment, NewInstallment};
pub use invoice::{
    Invoice, InvoiceItem, InvoiceItemUpdate, NewInvoice, NewInvoiceLine, PaymentType,
    format_invoice_number,
};
pub use totals::{LineAmount, Totals, recalculate};
