//! Products domain module.
//!
//! Catalog entries and the rules for creating, editing and retiring them,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{NewProduct, Product, ProductPatch, DEFAULT_REORDER_LEVEL};
