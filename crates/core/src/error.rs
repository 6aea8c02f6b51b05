//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// The display strings are user-facing: they end up verbatim in the
/// `message` field of failed operation results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing product, warehouse, supplier, user or inventory row.
    #[error("{0}")]
    NotFound(String),

    /// Transfer source has no inventory record for the product.
    #[error("Product not found in source warehouse")]
    ProductNotInSource,

    #[error("Insufficient inventory. Available: {available}, Requested: {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Adjustment would result in negative inventory. Current: {current}, Adjustment: {adjustment}")]
    NegativeResultRejected { current: i64, adjustment: i64 },

    /// Unique key already taken (inventory pair, SKU, username, ...).
    #[error("{0}")]
    DuplicateEntry(String),

    /// A value failed validation (missing/invalid required fields).
    #[error("{0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Backing-store failure, surfaced but not further classified.
    #[error("store error: {0}")]
    Store(String),
}

/// Machine-readable classification of a [`DomainError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    ProductNotInSource,
    InsufficientStock,
    NegativeResultRejected,
    DuplicateEntry,
    ValidationError,
    StoreError,
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateEntry(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::ProductNotInSource => ErrorKind::ProductNotInSource,
            DomainError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DomainError::NegativeResultRejected { .. } => ErrorKind::NegativeResultRejected,
            DomainError::DuplicateEntry(_) => ErrorKind::DuplicateEntry,
            DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::ValidationError,
            DomainError::Store(_) => ErrorKind::StoreError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_reports_available_and_requested() {
        let err = DomainError::InsufficientStock {
            available: 5,
            requested: 8,
        };
        assert_eq!(err.to_string(), "Insufficient inventory. Available: 5, Requested: 8");
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[test]
    fn invalid_id_is_a_validation_failure() {
        assert_eq!(
            DomainError::invalid_id("ProductId: bad").kind(),
            ErrorKind::ValidationError
        );
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let v = serde_json::to_value(ErrorKind::NegativeResultRejected).unwrap();
        assert_eq!(v, serde_json::json!("NEGATIVE_RESULT_REJECTED"));
    }
}
