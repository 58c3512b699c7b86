//! Products domain module (catalog).
//!
//! Categories and products, including the product's cached `stock` counter.
//! Plain domain logic only (no IO, no HTTP, no storage); stock movements that
//! drive the counter live in `shopbooks-inventory`.

pub mod product;

pub use product::{Category, CategoryDetails, Product, ProductDetails, ProductUpdate};
