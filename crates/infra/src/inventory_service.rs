//! Inventory Accessor and Movement Recorder surface.
//!
//! Record lifecycle writes (create, patch, remove, manual movements) each run
//! in one ledger transaction: the record write and its explaining movement
//! commit together or not at all.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockroom_core::{DomainError, DomainResult, Outcome, ProductId, UserId, WarehouseId};
use stockroom_inventory::{
    InventoryChange, InventoryPatch, InventoryRecord, ManualMovement, MovementKind,
    NewInventoryRecord, RecordWrite, StockLevels, StockMovement, StockStatus,
    plan_manual_movement, plan_new_record, plan_record_update, plan_removal,
};

use crate::ledger::{
    DEFAULT_MOVEMENT_LIMIT, InventoryFilter, LedgerStore, LedgerTx, MovementFilter,
    with_transaction,
};
use crate::ops::settle;

const ITEM_MOVEMENTS: usize = 10;

/// Inventory row joined with its catalog names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub record: InventoryRecord,
    pub product_name: String,
    pub sku: String,
    pub category: String,
    pub warehouse_name: String,
    pub available_quantity: i64,
    pub stock_status: StockStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryListing {
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryDetail {
    pub item: InventoryItem,
    pub recent_movements: Vec<StockMovement>,
}

/// What a lifecycle write did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReceipt {
    /// State after the write; absent after a removal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<InventoryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_quantity: Option<i64>,
    /// Absent when the write changed no quantity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
}

impl From<InventoryChange> for ChangeReceipt {
    fn from(change: InventoryChange) -> Self {
        let reference_number = change.reference_number().map(str::to_string);
        let record = match change.write {
            RecordWrite::Upsert(record) => Some(record),
            RecordWrite::Delete(..) => None,
        };
        ChangeReceipt {
            record,
            previous_quantity: change.previous_quantity,
            reference_number,
        }
    }
}

/// Movement log query as accepted from callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MovementQuery {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default, rename = "movement_type")]
    pub kind: Option<MovementKind>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MovementQuery {
    fn into_filter(self) -> MovementFilter {
        MovementFilter {
            product_id: self.product_id,
            warehouse_id: self.warehouse_id,
            kinds: self.kind.into_iter().collect(),
            since: self.since,
            limit: Some(self.limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT)),
            unbounded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementListing {
    pub movements: Vec<StockMovement>,
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn LedgerStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Current levels of one pair. No zero default: a missing row is
    /// `NotFound`.
    #[instrument(skip(self), fields(product_id = %product_id, warehouse_id = %warehouse_id))]
    pub async fn get_quantity(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Outcome<StockLevels> {
        let result = match self.store.get_inventory(product_id, warehouse_id).await {
            Ok(Some(record)) => Ok(record.levels()),
            Ok(None) => Err(DomainError::not_found("Inventory record not found")),
            Err(e) => Err(e.into()),
        };
        settle("Inventory lookup", result, |l| {
            format!("{} units on hand", l.quantity)
        })
    }

    #[instrument(skip(self))]
    pub async fn list_inventory(&self, filter: InventoryFilter) -> Outcome<InventoryListing> {
        let result = self.load_items(&filter).await.map(|items| InventoryListing { items });
        settle("Inventory listing", result, |l| {
            format!("Retrieved {} inventory items", l.items.len())
        })
    }

    /// One item plus its latest movements.
    #[instrument(skip(self), fields(product_id = %product_id, warehouse_id = %warehouse_id))]
    pub async fn get_inventory_item(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Outcome<InventoryDetail> {
        let result = self.load_detail(product_id, warehouse_id).await;
        settle("Inventory lookup", result, |_| {
            "Inventory item retrieved successfully".to_string()
        })
    }

    async fn load_detail(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> DomainResult<InventoryDetail> {
        let filter = InventoryFilter {
            product_id: Some(product_id),
            warehouse_id: Some(warehouse_id),
        };
        let item = self
            .load_items(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found("Inventory record not found"))?;
        let recent_movements = self
            .store
            .list_movements(&MovementFilter::pair(product_id, warehouse_id).limit(ITEM_MOVEMENTS))
            .await?;
        Ok(InventoryDetail {
            item,
            recent_movements,
        })
    }

    async fn load_items(&self, filter: &InventoryFilter) -> DomainResult<Vec<InventoryItem>> {
        let records = self.store.list_inventory(filter).await?;
        let products = self.store.list_products().await?;
        let warehouses = self.store.list_warehouses().await?;

        let mut items: Vec<InventoryItem> = records
            .into_iter()
            .filter_map(|record| {
                let product = products.iter().find(|p| p.id == record.product_id)?;
                let warehouse = warehouses.iter().find(|w| w.id == record.warehouse_id)?;
                Some(InventoryItem {
                    product_name: product.name.clone(),
                    sku: product.sku.clone(),
                    category: product.category.clone(),
                    warehouse_name: warehouse.name.clone(),
                    available_quantity: record.available(),
                    stock_status: record.stock_status(),
                    record,
                })
            })
            .collect();
        items.sort_by(|a, b| {
            a.product_name
                .cmp(&b.product_name)
                .then_with(|| a.warehouse_name.cmp(&b.warehouse_name))
        });
        Ok(items)
    }

    /// Register stock for a new pair, with an INITIAL movement when it starts
    /// non-empty.
    #[instrument(skip(self, cmd), fields(product_id = %cmd.product_id, warehouse_id = %cmd.warehouse_id))]
    pub async fn add_inventory(
        &self,
        cmd: NewInventoryRecord,
        user_id: Option<UserId>,
    ) -> Outcome<ChangeReceipt> {
        let result = self.run_add(cmd, user_id).await;
        settle("Inventory creation", result, |_| {
            "Inventory record created successfully".to_string()
        })
    }

    async fn run_add(&self, cmd: NewInventoryRecord, user_id: Option<UserId>) -> DomainResult<ChangeReceipt> {
        if self.store.get_product(cmd.product_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Product {} not found", cmd.product_id)));
        }
        if self.store.get_warehouse(cmd.warehouse_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Warehouse {} not found", cmd.warehouse_id)));
        }
        let now = Utc::now();
        let change = with_transaction(self.store.as_ref(), move |tx| {
            Box::pin(apply_new_record(tx, cmd, user_id, now))
        })
        .await?;
        Ok(change.into())
    }

    /// Patch a record; a quantity change is logged as an ADJUSTMENT_IN/OUT.
    #[instrument(skip(self, patch), fields(product_id = %product_id, warehouse_id = %warehouse_id))]
    pub async fn update_inventory(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        patch: InventoryPatch,
        user_id: Option<UserId>,
    ) -> Outcome<ChangeReceipt> {
        let now = Utc::now();
        let result = with_transaction(self.store.as_ref(), move |tx| {
            Box::pin(apply_record_update(tx, product_id, warehouse_id, patch, user_id, now))
        })
        .await
        .map(ChangeReceipt::from);
        settle("Inventory update", result, |_| {
            "Inventory record updated successfully".to_string()
        })
    }

    /// Remove a record, logging its final quantity as REMOVED.
    #[instrument(skip(self), fields(product_id = %product_id, warehouse_id = %warehouse_id))]
    pub async fn delete_inventory(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        user_id: Option<UserId>,
    ) -> Outcome<ChangeReceipt> {
        let now = Utc::now();
        let result = with_transaction(self.store.as_ref(), move |tx| {
            Box::pin(apply_removal(tx, product_id, warehouse_id, user_id, now))
        })
        .await
        .map(ChangeReceipt::from);
        settle("Inventory removal", result, |_| {
            "Inventory record deleted".to_string()
        })
    }

    /// Manual IN/OUT/RETURN/DAMAGED movement.
    #[instrument(
        skip(self, req),
        fields(product_id = %req.product_id, warehouse_id = %req.warehouse_id, kind = %req.kind)
    )]
    pub async fn record_movement(&self, req: ManualMovement) -> Outcome<ChangeReceipt> {
        let result = self.run_manual_movement(req).await;
        settle("Stock movement", result, |r| match &r.record {
            Some(record) => format!("Stock movement recorded. New quantity: {}", record.quantity),
            None => "Stock movement recorded".to_string(),
        })
    }

    async fn run_manual_movement(&self, req: ManualMovement) -> DomainResult<ChangeReceipt> {
        // First IN/RETURN creates the row, so both ends must exist.
        if self.store.get_product(req.product_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Product {} not found", req.product_id)));
        }
        if self.store.get_warehouse(req.warehouse_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Warehouse {} not found", req.warehouse_id)));
        }
        let now = Utc::now();
        let change = with_transaction(self.store.as_ref(), move |tx| {
            Box::pin(apply_manual_movement(tx, req, now))
        })
        .await?;
        Ok(change.into())
    }

    /// Movement log, newest first; defaults to the latest 100 rows.
    #[instrument(skip(self))]
    pub async fn list_movements(&self, query: MovementQuery) -> Outcome<MovementListing> {
        let result = self
            .store
            .list_movements(&query.into_filter())
            .await
            .map(|movements| MovementListing { movements })
            .map_err(DomainError::from);
        settle("Movement listing", result, |l| {
            format!("Retrieved {} stock movements", l.movements.len())
        })
    }
}

async fn apply_change(tx: &mut dyn LedgerTx, change: InventoryChange) -> DomainResult<InventoryChange> {
    match &change.write {
        RecordWrite::Upsert(record) => tx.write_inventory(record).await?,
        RecordWrite::Delete(product_id, warehouse_id) => {
            tx.delete_inventory(*product_id, *warehouse_id).await?;
        }
    }
    if let Some(movement) = &change.movement {
        tx.append_movement(movement).await?;
    }
    Ok(change)
}

async fn apply_new_record(
    tx: &mut dyn LedgerTx,
    cmd: NewInventoryRecord,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    let existing = tx.read_inventory(cmd.product_id, cmd.warehouse_id).await?;
    let change = plan_new_record(cmd, existing.as_ref(), user_id, now)?;
    apply_change(tx, change).await
}

async fn apply_record_update(
    tx: &mut dyn LedgerTx,
    product_id: ProductId,
    warehouse_id: WarehouseId,
    patch: InventoryPatch,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    let existing = tx.read_inventory(product_id, warehouse_id).await?;
    let change = plan_record_update(existing.as_ref(), &patch, user_id, now)?;
    apply_change(tx, change).await
}

async fn apply_removal(
    tx: &mut dyn LedgerTx,
    product_id: ProductId,
    warehouse_id: WarehouseId,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    let existing = tx.read_inventory(product_id, warehouse_id).await?;
    let change = plan_removal(existing.as_ref(), user_id, now)?;
    apply_change(tx, change).await
}

async fn apply_manual_movement(
    tx: &mut dyn LedgerTx,
    req: ManualMovement,
    now: DateTime<Utc>,
) -> DomainResult<InventoryChange> {
    let existing = tx.read_inventory(req.product_id, req.warehouse_id).await?;
    let change = plan_manual_movement(&req, existing.as_ref(), now)?;
    apply_change(tx, change).await
}
