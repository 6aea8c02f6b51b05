//! Ledger store: the system of record behind every service.
//!
//! The store is split in two:
//!
//! - [`LedgerStore`]: catalog reads/writes (each its own atomic statement) and
//!   read-only listings of inventory rows and movements.
//! - [`LedgerTx`]: a unit of work over inventory rows and the movement log.
//!   Multi-row ledger changes (transfers, adjustments, record lifecycle) go
//!   through [`with_transaction`], which commits on `Ok` and rolls back on
//!   `Err`.
//!
//! ## Concurrency
//!
//! Inventory rows carry no version column. Two concurrent read-modify-write
//! transactions on the same `(product, warehouse)` pair can lose an update on
//! backends that read without row locks (the Postgres store under READ
//! COMMITTED). The in-memory store serializes all transactions behind one
//! lock, so it cannot.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_auth::User;
use stockroom_core::{
    AlertId, DomainError, DomainResult, MovementId, ProductId, SupplierId, UserId, WarehouseId,
};
use stockroom_inventory::{Alert, InventoryRecord, NewMovement, StockMovement, Warehouse};
use stockroom_parties::Supplier;
use stockroom_products::Product;

pub mod in_memory;
pub mod postgres;
pub mod query;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use query::{DEFAULT_MOVEMENT_LIMIT, InventoryFilter, MAX_MOVEMENT_LIMIT, MovementFilter};

/// Boxed future returned by transaction bodies.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Ledger store operation error.
///
/// These are infrastructure errors; domain rule violations never originate
/// here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key is already taken.
    #[error("{0}")]
    Duplicate(String),

    /// A foreign-key or check constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A persisted row could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Connection, pool or driver failure.
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => DomainError::DuplicateEntry(msg),
            other => DomainError::store(other.to_string()),
        }
    }
}

/// Unit of work over inventory rows and the movement log.
///
/// Dropping a transaction without committing discards its writes. Do not call
/// back into the owning [`LedgerStore`] while a transaction is open: the
/// in-memory store holds its lock for the transaction's whole lifetime.
#[async_trait]
pub trait LedgerTx: Send {
    async fn read_inventory(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<InventoryRecord>, StoreError>;

    /// Upsert on `(product_id, warehouse_id)`.
    async fn write_inventory(&mut self, record: &InventoryRecord) -> Result<(), StoreError>;

    /// Returns whether a row was removed.
    async fn delete_inventory(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<bool, StoreError>;

    async fn append_movement(&mut self, movement: &NewMovement) -> Result<MovementId, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// The system of record.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    // ── inventory (read side) ────────────────────────────────────────────────

    async fn get_inventory(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<InventoryRecord>, StoreError>;

    async fn list_inventory(&self, filter: &InventoryFilter) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Newest first.
    async fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<StockMovement>, StoreError>;

    // ── products ─────────────────────────────────────────────────────────────

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// `Duplicate` when the SKU is taken.
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Removes the product and its empty inventory rows in one step.
    /// `Constraint` while any row still holds stock.
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    // ── suppliers ────────────────────────────────────────────────────────────

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError>;

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError>;

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), StoreError>;

    async fn update_supplier(&self, supplier: &Supplier) -> Result<(), StoreError>;

    async fn delete_supplier(&self, id: SupplierId) -> Result<bool, StoreError>;

    // ── warehouses ───────────────────────────────────────────────────────────

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError>;

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, StoreError>;

    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError>;

    async fn update_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError>;

    // ── users ────────────────────────────────────────────────────────────────

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// `Duplicate` when the username or email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;

    // ── alerts ───────────────────────────────────────────────────────────────

    /// Newest first.
    async fn list_alerts(&self, unread_only: bool) -> Result<Vec<Alert>, StoreError>;

    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    async fn mark_alert_read(&self, id: AlertId) -> Result<bool, StoreError>;
}

/// Run `f` inside one ledger transaction.
///
/// Commits when `f` returns `Ok`, rolls back on `Err`; nothing `f` wrote is
/// visible to other readers until the commit.
///
/// ```rust,ignore
/// let plan = with_transaction(store, move |tx| Box::pin(apply_transfer(tx, req, now))).await?;
/// ```
pub async fn with_transaction<S, F, T>(store: &S, f: F) -> DomainResult<T>
where
    S: LedgerStore + ?Sized,
    F: for<'t> FnOnce(&'t mut dyn LedgerTx) -> BoxFuture<'t, DomainResult<T>> + Send,
    T: Send,
{
    let mut tx = store.begin().await?;
    match f(&mut *tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "ledger rollback failed");
            }
            Err(err)
        }
    }
}
