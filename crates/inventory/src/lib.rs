//! Inventory domain module (stock movements).
//!
//! Stock is tracked as an append-only history of `StockIn` / `StockOut`
//! movements. Available stock is always derived from that history; the
//! product's cached counter is reconciled against it. Pure domain logic, no IO.

pub mod level;
pub mod movement;
pub mod policy;

pub use level::{StockLevel, StockReconciliation};
pub use movement::{NewStockIn, NewStockOut, StockIn, StockOut};
pub use policy::OversellPolicy;
