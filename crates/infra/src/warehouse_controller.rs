//! Warehouse Controller: multi-row ledger operations and warehouse reporting.
//!
//! ## Write path
//!
//! ```text
//! request
//!   ↓
//! 1. open a ledger transaction
//!   ↓
//! 2. read the affected inventory rows through the transaction
//!   ↓
//! 3. plan the change (pure, `stockroom_inventory::plan_*`)
//!   ↓
//! 4. write every planned row and movement
//!   ↓
//! 5. commit (any error before this point rolls back every write)
//! ```
//!
//! Every public operation resolves to an [`Outcome`]; failures never escape
//! as `Err`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::instrument;

use stockroom_core::{DomainError, DomainResult, Outcome, ProductId, UserId, WarehouseId};
use stockroom_inventory::{
    AdjustmentRequest, CapacityReportEntry, DistributionSuggestion, Holding, MovementKind,
    StockMovement, TransferRequest, Warehouse, capacity_entry, optimize_distribution,
    plan_adjustment, plan_transfer,
};

use crate::ledger::{
    InventoryFilter, LedgerStore, LedgerTx, MovementFilter, with_transaction,
};
use crate::ops::{Names, settle};

const TOP_PRODUCTS: usize = 5;
const RECENT_MOVEMENTS: usize = 10;
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub reference_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustmentReceipt {
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub reference_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityReport {
    pub warehouses: Vec<CapacityReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub suggestions: Vec<DistributionSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseSummary {
    #[serde(flatten)]
    pub warehouse: Warehouse,
    pub capacity_utilization: f64,
    pub total_products: usize,
    pub total_items: i64,
    pub manager_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseList {
    pub warehouses: Vec<WarehouseSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseStatistics {
    pub total_products: usize,
    pub total_items: i64,
    pub low_stock_products: usize,
    pub avg_stock_level: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseInfo {
    pub warehouse: Warehouse,
    pub capacity_utilization: f64,
    pub manager_name: Option<String>,
    pub statistics: WarehouseStatistics,
    pub top_products: Vec<TopProduct>,
    pub recent_movements: Vec<StockMovement>,
}

/// One transfer, reassembled from its TRANSFER_OUT/TRANSFER_IN pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub reference_number: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub from_warehouse_id: WarehouseId,
    pub from_warehouse_name: String,
    pub to_warehouse_id: WarehouseId,
    pub to_warehouse_name: String,
    pub quantity: i64,
    pub notes: Option<String>,
    pub transferred_by: Option<UserId>,
    pub transfer_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferHistory {
    pub transfers: Vec<TransferRecord>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct WarehouseController {
    store: Arc<dyn LedgerStore>,
}

impl WarehouseController {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Move stock between two warehouses.
    #[instrument(
        skip(self, req),
        fields(
            product_id = %req.product_id,
            from_warehouse_id = %req.from_warehouse_id,
            to_warehouse_id = %req.to_warehouse_id,
            quantity = req.quantity,
        )
    )]
    pub async fn transfer(&self, req: TransferRequest) -> Outcome<TransferReceipt> {
        let quantity = req.quantity;
        let result = self.run_transfer(req).await;
        if let Ok(receipt) = &result {
            tracing::info!(reference_number = %receipt.reference_number, "transfer committed");
        }
        settle("Transfer", result, |_| {
            format!("Successfully transferred {quantity} units")
        })
    }

    async fn run_transfer(&self, req: TransferRequest) -> DomainResult<TransferReceipt> {
        let destination_known = self.store.get_warehouse(req.to_warehouse_id).await?.is_some();
        let now = Utc::now();
        with_transaction(self.store.as_ref(), move |tx| {
            Box::pin(apply_transfer(tx, req, destination_known, now))
        })
        .await
    }

    /// Adjust a record in place by a signed delta.
    #[instrument(
        skip(self, req),
        fields(
            product_id = %req.product_id,
            warehouse_id = %req.warehouse_id,
            delta = req.delta,
            adjustment_type = %req.adjustment_type,
        )
    )]
    pub async fn adjust(&self, req: AdjustmentRequest) -> Outcome<AdjustmentReceipt> {
        let now = Utc::now();
        let result =
            with_transaction(self.store.as_ref(), move |tx| Box::pin(apply_adjustment(tx, req, now)))
                .await;
        if let Ok(receipt) = &result {
            tracing::info!(
                reference_number = %receipt.reference_number,
                new_quantity = receipt.new_quantity,
                "adjustment committed"
            );
        }
        settle("Adjustment", result, |r| {
            format!("Inventory adjusted successfully. New quantity: {}", r.new_quantity)
        })
    }

    /// Utilization of every warehouse, by name.
    #[instrument(skip(self))]
    pub async fn capacity_report(&self) -> Outcome<CapacityReport> {
        let result = self.load_capacity_report().await;
        settle("Capacity report", result, |r| {
            format!("Capacity report for {} warehouses", r.warehouses.len())
        })
    }

    async fn load_capacity_report(&self) -> DomainResult<CapacityReport> {
        let warehouses = self.store.list_warehouses().await?;
        let records = self.store.list_inventory(&InventoryFilter::default()).await?;
        Ok(CapacityReport {
            warehouses: warehouses.iter().map(|w| capacity_entry(w, &records)).collect(),
        })
    }

    /// Rebalancing suggestions for unevenly distributed products.
    #[instrument(skip(self))]
    pub async fn optimize_distribution(&self) -> Outcome<DistributionReport> {
        let result = self.load_distribution().await;
        settle("Distribution analysis", result, |r| {
            format!("{} redistribution suggestions", r.suggestions.len())
        })
    }

    async fn load_distribution(&self) -> DomainResult<DistributionReport> {
        let names = Names::load(self.store.as_ref()).await?;
        let holdings: Vec<Holding> = self
            .store
            .list_inventory(&InventoryFilter::default())
            .await?
            .into_iter()
            .map(|r| Holding {
                product_id: r.product_id,
                product_name: names.product(r.product_id),
                warehouse_id: r.warehouse_id,
                warehouse_name: names.warehouse(r.warehouse_id),
                quantity: r.quantity,
            })
            .collect();
        Ok(DistributionReport {
            suggestions: optimize_distribution(&holdings),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_warehouses(&self) -> Outcome<WarehouseList> {
        let result = self.load_warehouse_list().await;
        settle("Warehouse listing", result, |r| {
            format!("{} warehouses", r.warehouses.len())
        })
    }

    async fn load_warehouse_list(&self) -> DomainResult<WarehouseList> {
        let warehouses = self.store.list_warehouses().await?;
        let records = self.store.list_inventory(&InventoryFilter::default()).await?;
        let usernames = self.usernames().await?;
        let warehouses = warehouses
            .into_iter()
            .map(|w| {
                let entry = capacity_entry(&w, &records);
                let manager_name = w.manager_id.and_then(|id| usernames.get(&id).cloned());
                WarehouseSummary {
                    capacity_utilization: entry.utilization_percentage,
                    total_products: entry.unique_products,
                    total_items: entry.total_items,
                    manager_name,
                    warehouse: w,
                }
            })
            .collect();
        Ok(WarehouseList { warehouses })
    }

    /// Details, statistics, top holdings and recent movements of one warehouse.
    #[instrument(skip(self), fields(warehouse_id = %warehouse_id))]
    pub async fn warehouse_info(&self, warehouse_id: WarehouseId) -> Outcome<WarehouseInfo> {
        let result = self.load_warehouse_info(warehouse_id).await;
        settle("Warehouse lookup", result, |w| {
            format!("Warehouse {}", w.warehouse.name)
        })
    }

    async fn load_warehouse_info(&self, warehouse_id: WarehouseId) -> DomainResult<WarehouseInfo> {
        let warehouse = self
            .store
            .get_warehouse(warehouse_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Warehouse not found"))?;

        let mut records = self
            .store
            .list_inventory(&InventoryFilter::warehouse(warehouse_id))
            .await?;
        let entry = capacity_entry(&warehouse, &records);
        let avg_stock_level = if records.is_empty() {
            0.0
        } else {
            round2(entry.total_items as f64 / records.len() as f64)
        };

        let products: HashMap<ProductId, (String, String)> = self
            .store
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, (p.name, p.category)))
            .collect();
        records.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.product_id.cmp(&b.product_id)));
        let top_products = records
            .iter()
            .take(TOP_PRODUCTS)
            .map(|r| {
                let (product_name, category) = match products.get(&r.product_id) {
                    Some((name, category)) => (name.clone(), Some(category.clone())),
                    None => (r.product_id.to_string(), None),
                };
                TopProduct {
                    product_id: r.product_id,
                    product_name,
                    category,
                    quantity: r.quantity,
                }
            })
            .collect();

        let recent_movements = self
            .store
            .list_movements(&warehouse_movements(warehouse_id).limit(RECENT_MOVEMENTS))
            .await?;

        let manager_name = match warehouse.manager_id {
            Some(id) => self.store.get_user(id).await?.map(|u| u.username),
            None => None,
        };

        Ok(WarehouseInfo {
            capacity_utilization: entry.utilization_percentage,
            manager_name,
            statistics: WarehouseStatistics {
                total_products: entry.unique_products,
                total_items: entry.total_items,
                low_stock_products: entry.low_stock_items,
                avg_stock_level,
            },
            top_products,
            recent_movements,
            warehouse,
        })
    }

    /// Transfers of the last `days_back` days, newest first, optionally
    /// limited to those touching one warehouse.
    #[instrument(skip(self))]
    pub async fn transfer_history(
        &self,
        warehouse_id: Option<WarehouseId>,
        days_back: Option<i64>,
    ) -> Outcome<TransferHistory> {
        let result = self.load_transfer_history(warehouse_id, days_back).await;
        settle("Transfer history", result, |h| {
            format!("{} transfers", h.transfers.len())
        })
    }

    async fn load_transfer_history(
        &self,
        warehouse_id: Option<WarehouseId>,
        days_back: Option<i64>,
    ) -> DomainResult<TransferHistory> {
        let days_back = days_back.unwrap_or(DEFAULT_HISTORY_DAYS);
        if days_back < 0 {
            return Err(DomainError::validation("days_back cannot be negative"));
        }
        let since = Duration::try_days(days_back)
            .and_then(|d| Utc::now().checked_sub_signed(d))
            .ok_or_else(|| DomainError::validation("days_back is out of range"))?;
        let movements = self
            .store
            .list_movements(
                &MovementFilter::default()
                    .kinds([MovementKind::TransferOut, MovementKind::TransferIn])
                    .since(since)
                    .unbounded(),
            )
            .await?;

        let names = Names::load(self.store.as_ref()).await?;
        let transfers = pair_transfers(&movements)
            .into_iter()
            .filter(|(out, inbound)| {
                warehouse_id.is_none_or(|w| out.warehouse_id == w || inbound.warehouse_id == w)
            })
            .map(|(out, inbound)| TransferRecord {
                reference_number: out.reference_number.clone(),
                product_id: out.product_id,
                product_name: names.product(out.product_id),
                from_warehouse_id: out.warehouse_id,
                from_warehouse_name: names.warehouse(out.warehouse_id),
                to_warehouse_id: inbound.warehouse_id,
                to_warehouse_name: names.warehouse(inbound.warehouse_id),
                quantity: out.quantity,
                notes: out.notes.clone(),
                transferred_by: out.user_id,
                transfer_date: out.created_at,
            })
            .collect();
        Ok(TransferHistory { transfers })
    }

    async fn usernames(&self) -> DomainResult<HashMap<UserId, String>> {
        Ok(self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect())
    }
}

/// Source checks come first; an unknown destination is only reported for a
/// transfer that would otherwise go through.
async fn apply_transfer(
    tx: &mut dyn LedgerTx,
    req: TransferRequest,
    destination_known: bool,
    now: DateTime<Utc>,
) -> DomainResult<TransferReceipt> {
    let source = tx.read_inventory(req.product_id, req.from_warehouse_id).await?;
    let destination = tx.read_inventory(req.product_id, req.to_warehouse_id).await?;
    let plan = plan_transfer(&req, source.as_ref(), destination.as_ref(), now)?;
    if !destination_known {
        return Err(DomainError::not_found("Destination warehouse not found"));
    }

    tx.write_inventory(&plan.source).await?;
    tx.write_inventory(&plan.destination).await?;
    for movement in &plan.movements {
        tx.append_movement(movement).await?;
    }
    Ok(TransferReceipt {
        reference_number: plan.reference_number,
    })
}

async fn apply_adjustment(
    tx: &mut dyn LedgerTx,
    req: AdjustmentRequest,
    now: DateTime<Utc>,
) -> DomainResult<AdjustmentReceipt> {
    let current = tx.read_inventory(req.product_id, req.warehouse_id).await?;
    let plan = plan_adjustment(&req, current.as_ref(), now)?;

    tx.write_inventory(&plan.record).await?;
    tx.append_movement(&plan.movement).await?;
    Ok(AdjustmentReceipt {
        previous_quantity: plan.previous_quantity,
        new_quantity: plan.new_quantity,
        reference_number: plan.reference_number,
    })
}

/// Match each TRANSFER_OUT with the TRANSFER_IN carrying the same reference
/// number, product and quantity. Input and output are newest first.
///
/// Two same-second transfers of one product share a reference number; each
/// inbound row is consumed by at most one outbound row.
fn pair_transfers(movements: &[StockMovement]) -> Vec<(&StockMovement, &StockMovement)> {
    let mut inbound: HashMap<(&str, ProductId), Vec<&StockMovement>> = HashMap::new();
    for m in movements.iter().filter(|m| m.kind == MovementKind::TransferIn) {
        inbound
            .entry((m.reference_number.as_str(), m.product_id))
            .or_default()
            .push(m);
    }

    movements
        .iter()
        .filter(|m| m.kind == MovementKind::TransferOut)
        .filter_map(|out| {
            let candidates = inbound.get_mut(&(out.reference_number.as_str(), out.product_id))?;
            let pos = candidates.iter().position(|i| i.quantity == out.quantity)?;
            Some((out, candidates.remove(pos)))
        })
        .collect()
}

fn warehouse_movements(warehouse_id: WarehouseId) -> MovementFilter {
    MovementFilter {
        warehouse_id: Some(warehouse_id),
        ..MovementFilter::default()
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
