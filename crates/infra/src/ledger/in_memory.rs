use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockroom_auth::User;
use stockroom_core::{AlertId, MovementId, ProductId, SupplierId, UserId, WarehouseId};
use stockroom_inventory::{Alert, InventoryRecord, NewMovement, StockMovement, Warehouse};
use stockroom_parties::Supplier;
use stockroom_products::Product;

use super::query::{InventoryFilter, MovementFilter};
use super::{LedgerStore, LedgerTx, StoreError};

type PairKey = (ProductId, WarehouseId);

#[derive(Debug, Default)]
struct Ledger {
    products: BTreeMap<ProductId, Product>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    users: BTreeMap<UserId, User>,
    alerts: BTreeMap<AlertId, Alert>,
    inventory: BTreeMap<PairKey, InventoryRecord>,
    /// Append order.
    movements: Vec<StockMovement>,
}

/// In-memory ledger.
///
/// Intended for tests/dev. One async mutex guards the whole ledger; an open
/// transaction owns it until commit or rollback, so transactions are fully
/// serialized.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<Ledger>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Working copy of the inventory table plus the movements appended so far.
struct InMemoryTx {
    guard: OwnedMutexGuard<Ledger>,
    inventory: BTreeMap<PairKey, InventoryRecord>,
    pending: Vec<StockMovement>,
}

#[async_trait]
impl LedgerTx for InMemoryTx {
    async fn read_inventory(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        Ok(self.inventory.get(&(product_id, warehouse_id)).cloned())
    }

    async fn write_inventory(&mut self, record: &InventoryRecord) -> Result<(), StoreError> {
        if record.quantity < 0 {
            return Err(StoreError::Constraint(format!(
                "inventory quantity must be >= 0 (product {}, warehouse {})",
                record.product_id, record.warehouse_id
            )));
        }
        if !self.guard.products.contains_key(&record.product_id) {
            return Err(StoreError::Constraint(format!("unknown product {}", record.product_id)));
        }
        if !self.guard.warehouses.contains_key(&record.warehouse_id) {
            return Err(StoreError::Constraint(format!("unknown warehouse {}", record.warehouse_id)));
        }
        self.inventory.insert(record.key(), record.clone());
        Ok(())
    }

    async fn delete_inventory(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<bool, StoreError> {
        Ok(self.inventory.remove(&(product_id, warehouse_id)).is_some())
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> Result<MovementId, StoreError> {
        let id = MovementId::new();
        self.pending.push(movement.clone().persisted(id));
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx {
            mut guard,
            inventory,
            pending,
        } = *self;
        guard.inventory = inventory;
        guard.movements.extend(pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // The working copy is dropped with the guard.
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let inventory = guard.inventory.clone();
        Ok(Box::new(InMemoryTx {
            guard,
            inventory,
            pending: Vec::new(),
        }))
    }

    async fn get_inventory(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.inventory.get(&(product_id, warehouse_id)).cloned())
    }

    async fn list_inventory(&self, filter: &InventoryFilter) -> Result<Vec<InventoryRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .inventory
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<StockMovement>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .movements
            .iter()
            .rev()
            .filter(|m| filter.matches(m))
            .take(filter.effective_limit().unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.products.values().find(|p| p.sku == sku).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        ensure_unique_sku(&state, product)?;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        ensure_unique_sku(&state, product)?;
        match state.products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(())
            }
            None => Err(StoreError::Constraint(format!("unknown product {}", product.id))),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if state.inventory.iter().any(|((p, _), r)| *p == id && r.quantity > 0) {
            return Err(StoreError::Constraint(format!("product {id} is still in stock")));
        }
        state.inventory.retain(|(p, _), _| *p != id);
        Ok(state.products.remove(&id).is_some())
    }

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError> {
        Ok(self.state.lock().await.suppliers.get(&id).cloned())
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError> {
        let state = self.state.lock().await;
        let mut suppliers: Vec<Supplier> = state.suppliers.values().cloned().collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.suppliers.insert(supplier.id, supplier.clone());
        Ok(())
    }

    async fn update_supplier(&self, supplier: &Supplier) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        match state.suppliers.get_mut(&supplier.id) {
            Some(slot) => {
                *slot = supplier.clone();
                Ok(())
            }
            None => Err(StoreError::Constraint(format!("unknown supplier {}", supplier.id))),
        }
    }

    async fn delete_supplier(&self, id: SupplierId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if state.products.values().any(|p| p.supplier_id == Some(id)) {
            return Err(StoreError::Constraint(format!("supplier {id} is referenced by products")));
        }
        Ok(state.suppliers.remove(&id).is_some())
    }

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError> {
        Ok(self.state.lock().await.warehouses.get(&id).cloned())
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
        let state = self.state.lock().await;
        let mut warehouses: Vec<Warehouse> = state.warehouses.values().cloned().collect();
        warehouses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(warehouses)
    }

    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.warehouses.insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn update_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        match state.warehouses.get_mut(&warehouse.id) {
            Some(slot) => {
                *slot = warehouse.clone();
                Ok(())
            }
            None => Err(StoreError::Constraint(format!("unknown warehouse {}", warehouse.id))),
        }
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        ensure_unique_user(&state, user)?;
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        ensure_unique_user(&state, user)?;
        match state.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(StoreError::Constraint(format!("unknown user {}", user.id))),
        }
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.users.remove(&id).is_some())
    }

    async fn list_alerts(&self, unread_only: bool) -> Result<Vec<Alert>, StoreError> {
        let state = self.state.lock().await;
        let mut alerts: Vec<Alert> = state
            .alerts
            .values()
            .filter(|a| !unread_only || !a.is_read)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(alerts)
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        self.state.lock().await.alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn mark_alert_read(&self, id: AlertId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(match state.alerts.get_mut(&id) {
            Some(alert) => {
                alert.is_read = true;
                true
            }
            None => false,
        })
    }
}

fn ensure_unique_sku(state: &Ledger, product: &Product) -> Result<(), StoreError> {
    if state
        .products
        .values()
        .any(|p| p.sku == product.sku && p.id != product.id)
    {
        return Err(StoreError::Duplicate(format!("SKU '{}' already exists", product.sku)));
    }
    Ok(())
}

fn ensure_unique_user(state: &Ledger, user: &User) -> Result<(), StoreError> {
    for other in state.users.values().filter(|u| u.id != user.id) {
        if other.username == user.username {
            return Err(StoreError::Duplicate(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        if other.email == user.email {
            return Err(StoreError::Duplicate(format!("email '{}' already exists", user.email)));
        }
    }
    Ok(())
}
