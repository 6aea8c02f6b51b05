//! Parties domain module (suppliers).
//!
//! Suppliers are referenced by catalog products; this crate holds their
//! validation rules as deterministic domain logic (no IO, no HTTP, no storage).

pub mod supplier;

pub use supplier::{ContactInfo, NewSupplier, Supplier, SupplierPatch};
