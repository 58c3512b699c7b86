//! Infrastructure layer: storage backends, transactional services, config and
//! backups.

pub mod backup;
pub mod config;
pub mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repository;
pub mod service;

#[cfg(test)]
mod integration_tests;

pub use config::AppConfig;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryDatabase;
pub use repository::{Database, Transaction};
pub use service::{BackOffice, CustomerLedger, InvoiceDetail};
