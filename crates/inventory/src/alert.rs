//! Derived stock alerts.
//!
//! Alerts are notifications, not ledger state: they can be regenerated from
//! the inventory records at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{AlertId, ProductId, WarehouseId};

use crate::record::InventoryRecord;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    LowStock,
    OutOfStock,
    Overstock,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "LOW_STOCK",
            AlertType::OutOfStock => "OUT_OF_STOCK",
            AlertType::Overstock => "OVERSTOCK",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW_STOCK" => Some(AlertType::LowStock),
            "OUT_OF_STOCK" => Some(AlertType::OutOfStock),
            "OVERSTOCK" => Some(AlertType::Overstock),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub alert_type: AlertType,
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub message: String,
    pub severity: Severity,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub message: String,
    pub severity: Severity,
}

impl NewAlert {
    pub fn into_alert(self, id: AlertId, now: DateTime<Utc>) -> Alert {
        Alert {
            id,
            alert_type: self.alert_type,
            product_id: self.product_id,
            warehouse_id: self.warehouse_id,
            message: self.message,
            severity: self.severity,
            is_read: false,
            created_at: now,
        }
    }
}

/// Alert warranted by a record's current stock, if any.
///
/// Out of stock is critical; at or below the reorder level is a low-stock
/// alert, raised to high severity at half the reorder level; above the
/// maximum stock level is an overstock notice.
pub fn evaluate_stock_alert(
    record: &InventoryRecord,
    product_name: &str,
    warehouse_name: &str,
) -> Option<NewAlert> {
    let (alert_type, severity, message) = if record.quantity <= 0 {
        (
            AlertType::OutOfStock,
            Severity::Critical,
            format!("{product_name} is out of stock at {warehouse_name}"),
        )
    } else if record.quantity <= record.reorder_level {
        let severity = if record.quantity * 2 <= record.reorder_level {
            Severity::High
        } else {
            Severity::Medium
        };
        (
            AlertType::LowStock,
            severity,
            format!(
                "{product_name} is low at {warehouse_name}: {} left (reorder level {})",
                record.quantity, record.reorder_level
            ),
        )
    } else if record.max_stock_level > 0 && record.quantity > record.max_stock_level {
        (
            AlertType::Overstock,
            Severity::Low,
            format!(
                "{product_name} exceeds its maximum at {warehouse_name}: {} held (max {})",
                record.quantity, record.max_stock_level
            ),
        )
    } else {
        return None;
    };

    Some(NewAlert {
        alert_type,
        product_id: Some(record.product_id),
        warehouse_id: Some(record.warehouse_id),
        message,
        severity,
    })
}
