//! Read-side filters over inventory rows and the movement log.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockroom_core::{ProductId, WarehouseId};
use stockroom_inventory::{InventoryRecord, MovementKind, StockMovement};

/// Default page size of movement listings.
pub const DEFAULT_MOVEMENT_LIMIT: usize = 100;
/// Hard cap on caller-facing movement listings.
pub const MAX_MOVEMENT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InventoryFilter {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
}

impl InventoryFilter {
    pub fn product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            warehouse_id: None,
        }
    }

    pub fn warehouse(warehouse_id: WarehouseId) -> Self {
        Self {
            product_id: None,
            warehouse_id: Some(warehouse_id),
        }
    }

    pub fn matches(&self, record: &InventoryRecord) -> bool {
        self.product_id.is_none_or(|p| p == record.product_id)
            && self.warehouse_id.is_none_or(|w| w == record.warehouse_id)
    }
}

/// Movement log query. Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    /// Empty means every kind.
    pub kinds: Vec<MovementKind>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Return every matching row. Only for internal reads bounded by `since`.
    pub unbounded: bool,
}

impl MovementFilter {
    pub fn pair(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id: Some(product_id),
            warehouse_id: Some(warehouse_id),
            ..Self::default()
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Lift the row cap entirely.
    pub fn unbounded(mut self) -> Self {
        self.limit = None;
        self.unbounded = true;
        self
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = MovementKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Effective row cap, clamped to [`MAX_MOVEMENT_LIMIT`]; `None` when unbounded.
    pub fn effective_limit(&self) -> Option<usize> {
        if self.unbounded {
            return None;
        }
        Some(self.limit.unwrap_or(MAX_MOVEMENT_LIMIT).min(MAX_MOVEMENT_LIMIT))
    }

    pub fn matches(&self, movement: &StockMovement) -> bool {
        self.product_id.is_none_or(|p| p == movement.product_id)
            && self.warehouse_id.is_none_or(|w| w == movement.warehouse_id)
            && (self.kinds.is_empty() || self.kinds.contains(&movement.kind))
            && self.since.is_none_or(|t| movement.created_at >= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(MovementFilter::default().effective_limit(), Some(MAX_MOVEMENT_LIMIT));
        assert_eq!(MovementFilter::default().limit(10).effective_limit(), Some(10));
        assert_eq!(
            MovementFilter::default().limit(50_000).effective_limit(),
            Some(MAX_MOVEMENT_LIMIT)
        );
    }

    #[test]
    fn unbounded_ignores_any_limit() {
        let f = MovementFilter::default().limit(10).unbounded();
        assert_eq!(f.effective_limit(), None);
        assert_eq!(MovementFilter::default().unbounded().limit(5).effective_limit(), None);
    }
}
