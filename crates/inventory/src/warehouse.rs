use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, UserId, WarehouseId};

/// A stock location.
///
/// `capacity` is an optional upper bound on the total number of items held;
/// it is only used for reporting, never enforced on writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: String,
    pub capacity: Option<i64>,
    pub manager_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Warehouse {
    /// `total_items / capacity * 100`, or 0 when no usable capacity is set.
    pub fn utilization(&self, total_items: i64) -> f64 {
        match self.capacity {
            Some(cap) if cap > 0 => total_items as f64 / cap as f64 * 100.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub manager_id: Option<UserId>,
}

impl NewWarehouse {
    pub fn into_warehouse(self, id: WarehouseId, now: DateTime<Utc>) -> DomainResult<Warehouse> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if self.location.trim().is_empty() {
            return Err(DomainError::validation("location is required"));
        }
        ensure_capacity(self.capacity)?;
        Ok(Warehouse {
            id,
            name: self.name.trim().to_string(),
            location: self.location.trim().to_string(),
            capacity: self.capacity,
            manager_id: self.manager_id,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehousePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub manager_id: Option<UserId>,
}

impl WarehousePatch {
    pub fn apply(self, warehouse: &mut Warehouse) -> DomainResult<()> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if matches!(&self.location, Some(l) if l.trim().is_empty()) {
            return Err(DomainError::validation("location cannot be empty"));
        }
        ensure_capacity(self.capacity)?;

        if let Some(name) = self.name {
            warehouse.name = name.trim().to_string();
        }
        if let Some(location) = self.location {
            warehouse.location = location.trim().to_string();
        }
        if self.capacity.is_some() {
            warehouse.capacity = self.capacity;
        }
        if self.manager_id.is_some() {
            warehouse.manager_id = self.manager_id;
        }
        Ok(())
    }
}

fn ensure_capacity(capacity: Option<i64>) -> DomainResult<()> {
    match capacity {
        Some(c) if c <= 0 => Err(DomainError::validation("capacity must be greater than zero")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_hall(capacity: Option<i64>) -> Warehouse {
        NewWarehouse {
            name: "Main Hall".into(),
            location: "Dock 1".into(),
            capacity,
            manager_id: None,
        }
        .into_warehouse(WarehouseId::new(), Utc::now())
        .unwrap()
    }

    #[test]
    fn utilization_guards_missing_capacity() {
        assert_eq!(main_hall(None).utilization(500), 0.0);
        assert_eq!(main_hall(Some(1000)).utilization(950), 95.0);
    }

    #[test]
    fn create_rejects_non_positive_capacity() {
        let err = NewWarehouse {
            name: "Overflow".into(),
            location: "Yard".into(),
            capacity: Some(0),
            manager_id: None,
        }
        .into_warehouse(WarehouseId::new(), Utc::now())
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn patch_rejects_blank_location_without_touching_state() {
        let mut w = main_hall(Some(10));
        let before = w.clone();
        let res = WarehousePatch {
            name: Some("North".into()),
            location: Some(" ".into()),
            ..WarehousePatch::default()
        }
        .apply(&mut w);
        assert!(res.is_err());
        assert_eq!(w, before);
    }
}
