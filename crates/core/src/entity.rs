//! Entity trait: catalog rows with a stable identity and a display name.

/// Anything the ledger references by id (products, warehouses, suppliers, users).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Human-readable name used in reports and movement listings.
    fn display_name(&self) -> &str;
}
