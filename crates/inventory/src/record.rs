use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ProductId, WarehouseId};

pub const DEFAULT_REORDER_LEVEL: i64 = 10;
pub const DEFAULT_MAX_STOCK_LEVEL: i64 = 1000;

/// Stock held for one (product, warehouse) pair.
///
/// `quantity >= 0` always holds. `reserved_quantity <= quantity` is expected
/// but not enforced: a transfer may take `quantity` below the reservation, in
/// which case [`InventoryRecord::available`] goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub reorder_level: i64,
    pub max_stock_level: i64,
    pub last_updated: DateTime<Utc>,
}

/// Read-only view returned by the inventory accessor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub reorder_level: i64,
    pub max_stock_level: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    MediumStock,
    GoodStock,
}

impl InventoryRecord {
    pub fn key(&self) -> (ProductId, WarehouseId) {
        (self.product_id, self.warehouse_id)
    }

    pub fn available(&self) -> i64 {
        self.quantity - self.reserved_quantity
    }

    pub fn levels(&self) -> StockLevels {
        StockLevels {
            quantity: self.quantity,
            reserved_quantity: self.reserved_quantity,
            reorder_level: self.reorder_level,
            max_stock_level: self.max_stock_level,
        }
    }

    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.quantity <= 0 {
            StockStatus::OutOfStock
        } else if self.quantity <= self.reorder_level {
            StockStatus::LowStock
        } else if self.quantity <= self.reorder_level * 2 {
            StockStatus::MediumStock
        } else {
            StockStatus::GoodStock
        }
    }

    /// Empty record for a pair that has never held stock.
    pub fn empty(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        reorder_level: i64,
        max_stock_level: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            warehouse_id,
            quantity: 0,
            reserved_quantity: 0,
            reorder_level,
            max_stock_level,
            last_updated: now,
        }
    }
}

/// Command: register stock for a pair that has no record yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryRecord {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    #[serde(default)]
    pub reserved_quantity: Option<i64>,
    #[serde(default)]
    pub reorder_level: Option<i64>,
    #[serde(default)]
    pub max_stock_level: Option<i64>,
}

impl NewInventoryRecord {
    pub fn into_record(self, now: DateTime<Utc>) -> DomainResult<InventoryRecord> {
        let record = InventoryRecord {
            product_id: self.product_id,
            warehouse_id: self.warehouse_id,
            quantity: self.quantity,
            reserved_quantity: self.reserved_quantity.unwrap_or(0),
            reorder_level: self.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL),
            max_stock_level: self.max_stock_level.unwrap_or(DEFAULT_MAX_STOCK_LEVEL),
            last_updated: now,
        };
        ensure_levels(&record)?;
        Ok(record)
    }
}

/// Command: edit an existing record. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPatch {
    pub quantity: Option<i64>,
    pub reserved_quantity: Option<i64>,
    pub reorder_level: Option<i64>,
    pub max_stock_level: Option<i64>,
}

impl InventoryPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.reserved_quantity.is_none()
            && self.reorder_level.is_none()
            && self.max_stock_level.is_none()
    }

    /// Patched copy of `record`; the original is untouched on error.
    pub fn applied_to(&self, record: &InventoryRecord, now: DateTime<Utc>) -> DomainResult<InventoryRecord> {
        let mut next = record.clone();
        if let Some(q) = self.quantity {
            next.quantity = q;
        }
        if let Some(r) = self.reserved_quantity {
            next.reserved_quantity = r;
        }
        if let Some(r) = self.reorder_level {
            next.reorder_level = r;
        }
        if let Some(m) = self.max_stock_level {
            next.max_stock_level = m;
        }
        ensure_levels(&next)?;
        next.last_updated = now;
        Ok(next)
    }
}

fn ensure_levels(record: &InventoryRecord) -> DomainResult<()> {
    if record.quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    if record.reserved_quantity < 0 {
        return Err(DomainError::validation("reserved_quantity cannot be negative"));
    }
    if record.reorder_level < 0 {
        return Err(DomainError::validation("reorder_level cannot be negative"));
    }
    if record.max_stock_level < 0 {
        return Err(DomainError::validation("max_stock_level cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quantity: i64, reorder_level: i64) -> InventoryRecord {
        InventoryRecord {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            quantity,
            reserved_quantity: 0,
            reorder_level,
            max_stock_level: 1000,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn stock_status_bands() {
        assert_eq!(record(0, 10).stock_status(), StockStatus::OutOfStock);
        assert_eq!(record(10, 10).stock_status(), StockStatus::LowStock);
        assert_eq!(record(20, 10).stock_status(), StockStatus::MediumStock);
        assert_eq!(record(21, 10).stock_status(), StockStatus::GoodStock);
    }

    #[test]
    fn available_can_go_negative_when_reservation_exceeds_stock() {
        let mut r = record(5, 10);
        r.reserved_quantity = 8;
        assert_eq!(r.available(), -3);
    }

    #[test]
    fn new_record_applies_defaults() {
        let r = NewInventoryRecord {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            quantity: 40,
            reserved_quantity: None,
            reorder_level: None,
            max_stock_level: None,
        }
        .into_record(Utc::now())
        .unwrap();
        assert_eq!(r.reserved_quantity, 0);
        assert_eq!(r.reorder_level, DEFAULT_REORDER_LEVEL);
        assert_eq!(r.max_stock_level, DEFAULT_MAX_STOCK_LEVEL);
    }

    #[test]
    fn new_record_rejects_negative_quantity() {
        let err = NewInventoryRecord {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            quantity: -1,
            reserved_quantity: None,
            reorder_level: None,
            max_stock_level: None,
        }
        .into_record(Utc::now())
        .unwrap_err();
        assert_eq!(err, DomainError::validation("quantity cannot be negative"));
    }

    #[test]
    fn patch_leaves_original_untouched() {
        let r = record(50, 10);
        let patched = InventoryPatch {
            quantity: Some(45),
            ..InventoryPatch::default()
        }
        .applied_to(&r, Utc::now())
        .unwrap();
        assert_eq!(patched.quantity, 45);
        assert_eq!(r.quantity, 50);
        assert!(InventoryPatch::default().is_empty());
    }
}
