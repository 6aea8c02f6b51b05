//! Infrastructure layer: ledger stores, services and configuration.
//!
//! Services hold an `Arc<dyn LedgerStore>` and compose the pure planners of
//! `stockroom-inventory` with one store transaction per mutating operation.

pub mod alerts;
pub mod catalog;
pub mod config;
pub mod forecasting;
pub mod inventory_service;
pub mod ledger;
pub mod warehouse_controller;

mod ops;

#[cfg(test)]
mod testing;

pub use alerts::{AlertService, ScanReport};
pub use catalog::CatalogService;
pub use config::{AppConfig, ConfigError, ForecastConfig};
pub use forecasting::{DashboardSummary, DemandPrediction, ForecastService, ReorderReport};
pub use inventory_service::{InventoryService, MovementQuery};
pub use ledger::{
    InMemoryLedgerStore, InventoryFilter, LedgerStore, LedgerTx, MovementFilter, PostgresLedgerStore,
    StoreError, with_transaction,
};
pub use warehouse_controller::WarehouseController;
