//! Seed helpers for service tests.

use std::sync::Arc;

use chrono::Utc;

use stockroom_core::{DomainResult, ProductId, WarehouseId};
use stockroom_inventory::{InventoryRecord, NewMovement, NewWarehouse, Warehouse};
use stockroom_products::{NewProduct, Product};

use crate::ledger::{InMemoryLedgerStore, LedgerStore, LedgerTx, with_transaction};

pub(crate) fn store() -> Arc<InMemoryLedgerStore> {
    Arc::new(InMemoryLedgerStore::new())
}

pub(crate) async fn product(store: &dyn LedgerStore, name: &str, sku: &str, unit_price: u64) -> Product {
    let product = NewProduct {
        name: name.into(),
        category: "General".into(),
        sku: sku.into(),
        barcode: None,
        description: None,
        unit_price,
        cost_price: None,
        supplier_id: None,
        reorder_level: None,
    }
    .into_product(ProductId::new(), Utc::now())
    .unwrap();
    store.insert_product(&product).await.unwrap();
    product
}

pub(crate) async fn warehouse(store: &dyn LedgerStore, name: &str, capacity: Option<i64>) -> Warehouse {
    let warehouse = NewWarehouse {
        name: name.into(),
        location: format!("{name} site"),
        capacity,
        manager_id: None,
    }
    .into_warehouse(WarehouseId::new(), Utc::now())
    .unwrap();
    store.insert_warehouse(&warehouse).await.unwrap();
    warehouse
}

/// Writes a record directly, without a movement.
pub(crate) async fn stock(
    store: &dyn LedgerStore,
    product_id: ProductId,
    warehouse_id: WarehouseId,
    quantity: i64,
    reorder_level: i64,
) -> InventoryRecord {
    let mut record = InventoryRecord::empty(product_id, warehouse_id, reorder_level, 1000, Utc::now());
    record.quantity = quantity;
    let written = record.clone();
    with_transaction(store, move |tx| Box::pin(put(tx, written)))
        .await
        .unwrap();
    record
}

async fn put(tx: &mut dyn LedgerTx, record: InventoryRecord) -> DomainResult<()> {
    tx.write_inventory(&record).await?;
    Ok(())
}

/// Appends raw movement rows in order, without touching inventory records.
pub(crate) async fn movements(store: &dyn LedgerStore, rows: Vec<NewMovement>) {
    with_transaction(store, move |tx| Box::pin(append_all(tx, rows)))
        .await
        .unwrap();
}

async fn append_all(tx: &mut dyn LedgerTx, rows: Vec<NewMovement>) -> DomainResult<()> {
    for row in &rows {
        tx.append_movement(row).await?;
    }
    Ok(())
}
