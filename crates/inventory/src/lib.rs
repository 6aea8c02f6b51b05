//! Inventory domain module.
//!
//! Stock ledger rules: per-(product, warehouse) records, the immutable movement
//! log, and the pure planning functions behind transfers and adjustments.
//! Nothing here performs IO; `stockroom-infra` applies the plans under a
//! transaction.

pub mod alert;
pub mod ledger;
pub mod movement;
pub mod record;
pub mod report;
pub mod warehouse;

pub use alert::{Alert, AlertType, NewAlert, Severity, evaluate_stock_alert};
pub use ledger::{
    AdjustmentPlan, AdjustmentRequest, AdjustmentType, InventoryChange, ManualMovement,
    RecordWrite, TransferPlan, TransferRequest, plan_adjustment, plan_manual_movement, plan_new_record,
    plan_record_update, plan_removal, plan_transfer,
};
pub use movement::{MovementKind, NewMovement, ReferencePrefix, StockMovement, reference_number};
pub use record::{
    DEFAULT_MAX_STOCK_LEVEL, DEFAULT_REORDER_LEVEL, InventoryPatch, InventoryRecord,
    NewInventoryRecord, StockLevels, StockStatus,
};
pub use report::{
    CapacityReportEntry, CapacityStatus, DistributionSuggestion, Holding, Priority,
    capacity_entry, optimize_distribution,
};
pub use warehouse::{NewWarehouse, Warehouse, WarehousePatch};
