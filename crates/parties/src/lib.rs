//! Parties domain module (customers).
//!
//! Customer records and their validation rules, implemented as plain domain
//! logic (no IO, no HTTP, no storage). A customer's ledger lives in
//! `shopbooks-accounting`.

pub mod customer;

pub use customer::{Customer, CustomerDetails, CustomerUpdate};
