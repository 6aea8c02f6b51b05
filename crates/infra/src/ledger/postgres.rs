//! Postgres-backed ledger store.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `Constraint` |
//! | Database (check violation) | `23514` | `Constraint` |
//! | anything else | | `Backend` |
//!
//! Inventory reads inside a transaction take no row lock (see the module docs
//! of [`crate::ledger`] for the resulting lost-update hazard).

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockroom_auth::{Role, User};
use stockroom_core::{AlertId, MovementId, ProductId, SupplierId, UserId, WarehouseId};
use stockroom_inventory::{
    Alert, AlertType, InventoryRecord, MovementKind, NewMovement, Severity, StockMovement, Warehouse,
};
use stockroom_parties::{ContactInfo, Supplier};
use stockroom_products::Product;

use super::query::{InventoryFilter, MovementFilter};
use super::{LedgerStore, LedgerTx, StoreError};

const SCHEMA: &str = include_str!("schema.sql");

const INVENTORY_COLUMNS: &str =
    "product_id, warehouse_id, quantity, reserved_quantity, reorder_level, max_stock_level, last_updated";
const MOVEMENT_COLUMNS: &str =
    "id, product_id, warehouse_id, movement_type, quantity, reference_number, notes, user_id, created_at";
const PRODUCT_COLUMNS: &str = "id, name, category, sku, barcode, description, unit_price, cost_price, \
     supplier_id, reorder_level, created_at, updated_at";
const SUPPLIER_COLUMNS: &str = "id, name, contact_person, email, phone, address, created_at";
const WAREHOUSE_COLUMNS: &str = "id, name, location, capacity, manager_id, created_at";
const USER_COLUMNS: &str = "id, username, email, full_name, role, is_active, created_at";
const ALERT_COLUMNS: &str =
    "id, alert_type, product_id, warehouse_id, message, severity, is_read, created_at";

/// Postgres-backed ledger.
///
/// `Send + Sync`; all access goes through the SQLx pool.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(url), err)]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema (idempotent).
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("ledger schema applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// A ledger transaction on one pooled connection.
struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PostgresTx {
    async fn read_inventory(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = $1 AND warehouse_id = $2"
        ))
        .bind(product_id.as_uuid())
        .bind(warehouse_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("read_inventory", e))?;
        row.map(|r| decode::<InventoryRow>(&r).map(InventoryRecord::from)).transpose()
    }

    async fn write_inventory(&mut self, record: &InventoryRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory (
                product_id, warehouse_id, quantity, reserved_quantity,
                reorder_level, max_stock_level, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (product_id, warehouse_id) DO UPDATE SET
                quantity = EXCLUDED.quantity,
                reserved_quantity = EXCLUDED.reserved_quantity,
                reorder_level = EXCLUDED.reorder_level,
                max_stock_level = EXCLUDED.max_stock_level,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(record.product_id.as_uuid())
        .bind(record.warehouse_id.as_uuid())
        .bind(record.quantity)
        .bind(record.reserved_quantity)
        .bind(record.reorder_level)
        .bind(record.max_stock_level)
        .bind(record.last_updated)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("write_inventory", e))?;
        Ok(())
    }

    async fn delete_inventory(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM inventory WHERE product_id = $1 AND warehouse_id = $2")
            .bind(product_id.as_uuid())
            .bind(warehouse_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_inventory", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> Result<MovementId, StoreError> {
        let id = MovementId::new();
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, warehouse_id, movement_type, quantity,
                reference_number, notes, user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id.as_uuid())
        .bind(movement.product_id.as_uuid())
        .bind(movement.warehouse_id.as_uuid())
        .bind(movement.kind.to_string())
        .bind(movement.quantity)
        .bind(&movement.reference_number)
        .bind(movement.notes.as_deref())
        .bind(movement.user_id.map(Uuid::from))
        .bind(movement.occurred_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_movement", e))?;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresTx { tx }))
    }

    async fn get_inventory(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = $1 AND warehouse_id = $2"
        ))
        .bind(product_id.as_uuid())
        .bind(warehouse_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_inventory", e))?;
        row.map(|r| decode::<InventoryRow>(&r).map(InventoryRecord::from)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_inventory(&self, filter: &InventoryFilter) -> Result<Vec<InventoryRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {INVENTORY_COLUMNS} FROM inventory
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR warehouse_id = $2)
            ORDER BY product_id, warehouse_id
            "#
        ))
        .bind(filter.product_id.map(Uuid::from))
        .bind(filter.warehouse_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory", e))?;
        rows.iter()
            .map(|r| decode::<InventoryRow>(r).map(InventoryRecord::from))
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<StockMovement>, StoreError> {
        let kinds: Vec<String> = filter.kinds.iter().map(|k| k.as_str().into_owned()).collect();
        // LIMIT NULL is no limit at all.
        let limit = filter
            .effective_limit()
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR warehouse_id = $2)
              AND (cardinality($3::text[]) = 0 OR movement_type = ANY($3))
              AND ($4::timestamptz IS NULL OR created_at >= $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#
        ))
        .bind(filter.product_id.map(Uuid::from))
        .bind(filter.warehouse_id.map(Uuid::from))
        .bind(&kinds)
        .bind(filter.since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;
        rows.iter()
            .map(|r| StockMovement::try_from(decode::<MovementRow>(r)?))
            .collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(decode_product).transpose()
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product_by_sku", e))?;
        row.as_ref().map(decode_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(decode_product).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id, sku = %product.sku), err)]
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, sku, barcode, description, unit_price,
                cost_price, supplier_id, reorder_level, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.sku)
        .bind(product.barcode.as_deref())
        .bind(product.description.as_deref())
        .bind(cents_to_db(product.unit_price)?)
        .bind(product.cost_price.map(cents_to_db).transpose()?)
        .bind(product.supplier_id.map(Uuid::from))
        .bind(product.reorder_level)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_error(e, &product.sku, "insert_product"))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE products SET
                name = $2, category = $3, sku = $4, barcode = $5, description = $6,
                unit_price = $7, cost_price = $8, supplier_id = $9, reorder_level = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.sku)
        .bind(product.barcode.as_deref())
        .bind(product.description.as_deref())
        .bind(cents_to_db(product.unit_price)?)
        .bind(product.cost_price.map(cents_to_db).transpose()?)
        .bind(product.supplier_id.map(Uuid::from))
        .bind(product.reorder_level)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_error(e, &product.sku, "update_product"))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        // Only empty rows are cleared; a stocked row left behind (or committed
        // concurrently) trips the RESTRICT key on the product delete.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        sqlx::query("DELETE FROM inventory WHERE product_id = $1 AND quantity = 0")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_supplier", e))?;
        row.as_ref().map(decode_supplier).transpose()
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_suppliers", e))?;
        rows.iter().map(decode_supplier).collect()
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, contact_person, email, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(supplier.contact.contact_person.as_deref())
        .bind(supplier.contact.email.as_deref())
        .bind(supplier.contact.phone.as_deref())
        .bind(supplier.contact.address.as_deref())
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(())
    }

    async fn update_supplier(&self, supplier: &Supplier) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE suppliers SET
                name = $2, contact_person = $3, email = $4, phone = $5, address = $6
            WHERE id = $1
            "#,
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(supplier.contact.contact_person.as_deref())
        .bind(supplier.contact.email.as_deref())
        .bind(supplier.contact.phone.as_deref())
        .bind(supplier.contact.address.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_supplier", e))?;
        Ok(())
    }

    async fn delete_supplier(&self, id: SupplierId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_supplier", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError> {
        let row = sqlx::query(&format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_warehouse", e))?;
        row.as_ref().map(decode_warehouse).transpose()
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_warehouses", e))?;
        rows.iter().map(decode_warehouse).collect()
    }

    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO warehouses (id, name, location, capacity, manager_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(warehouse.id.as_uuid())
        .bind(&warehouse.name)
        .bind(&warehouse.location)
        .bind(warehouse.capacity)
        .bind(warehouse.manager_id.map(Uuid::from))
        .bind(warehouse.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_warehouse", e))?;
        Ok(())
    }

    async fn update_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE warehouses SET name = $2, location = $3, capacity = $4, manager_id = $5 WHERE id = $1",
        )
        .bind(warehouse.id.as_uuid())
        .bind(&warehouse.name)
        .bind(&warehouse.location)
        .bind(warehouse.capacity)
        .bind(warehouse.manager_id.map(Uuid::from))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_warehouse", e))?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.fetch_user("id = $1", UserKey::Id(id)).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.fetch_user("username = $1", UserKey::Text(username)).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_user("email = $1", UserKey::Text(email)).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(decode_user).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, full_name, role, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.full_name.as_deref())
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| user_error(e, user, "insert_user"))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET email = $2, full_name = $3, role = $4, is_active = $5 WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(user.full_name.as_deref())
        .bind(user.role.as_str())
        .bind(user.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| user_error(e, user, "update_user"))?;
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_alerts(&self, unread_only: bool) -> Result<Vec<Alert>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE (NOT $1 OR is_read = FALSE) ORDER BY created_at DESC, id DESC"
        ))
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_alerts", e))?;
        rows.iter().map(decode_alert).collect()
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO alerts (id, alert_type, product_id, warehouse_id, message, severity, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(alert.id.as_uuid())
        .bind(alert.alert_type.as_str())
        .bind(alert.product_id.map(Uuid::from))
        .bind(alert.warehouse_id.map(Uuid::from))
        .bind(&alert.message)
        .bind(alert.severity.as_str())
        .bind(alert.is_read)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_alert", e))?;
        Ok(())
    }

    async fn mark_alert_read(&self, id: AlertId) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE alerts SET is_read = TRUE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("mark_alert_read", e))?;
        Ok(result.rows_affected() > 0)
    }
}

enum UserKey<'a> {
    Id(UserId),
    Text(&'a str),
}

impl PostgresLedgerStore {
    async fn fetch_user(&self, predicate: &str, key: UserKey<'_>) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
        let query = sqlx::query(&sql);
        let query = match key {
            UserKey::Id(id) => query.bind(Uuid::from(id)),
            UserKey::Text(text) => query.bind(text),
        };
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_user", e))?;
        row.as_ref().map(decode_user).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23503") | Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn unique_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

fn sku_error(err: sqlx::Error, sku: &str, operation: &str) -> StoreError {
    match unique_constraint(&err) {
        Some(_) => StoreError::Duplicate(format!("SKU '{sku}' already exists")),
        None => map_sqlx_error(operation, err),
    }
}

fn user_error(err: sqlx::Error, user: &User, operation: &str) -> StoreError {
    match unique_constraint(&err).as_deref() {
        Some("users_username_key") => {
            StoreError::Duplicate(format!("username '{}' already exists", user.username))
        }
        Some(_) => StoreError::Duplicate(format!("email '{}' already exists", user.email)),
        None => map_sqlx_error(operation, err),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row decoding
// ─────────────────────────────────────────────────────────────────────────────

fn decode<'r, T: FromRow<'r, PgRow>>(row: &'r PgRow) -> Result<T, StoreError> {
    T::from_row(row).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn corrupt(e: impl core::fmt::Display) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

fn cents_to_db(cents: u64) -> Result<i64, StoreError> {
    i64::try_from(cents).map_err(|_| StoreError::Constraint(format!("price {cents} out of range")))
}

fn cents_from_db(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative price {value}")))
}

#[derive(Debug)]
struct InventoryRow {
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i64,
    reserved_quantity: i64,
    reorder_level: i64,
    max_stock_level: i64,
    last_updated: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for InventoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(InventoryRow {
            product_id: row.try_get("product_id")?,
            warehouse_id: row.try_get("warehouse_id")?,
            quantity: row.try_get("quantity")?,
            reserved_quantity: row.try_get("reserved_quantity")?,
            reorder_level: row.try_get("reorder_level")?,
            max_stock_level: row.try_get("max_stock_level")?,
            last_updated: row.try_get("last_updated")?,
        })
    }
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord {
            product_id: ProductId::from_uuid(row.product_id),
            warehouse_id: WarehouseId::from_uuid(row.warehouse_id),
            quantity: row.quantity,
            reserved_quantity: row.reserved_quantity,
            reorder_level: row.reorder_level,
            max_stock_level: row.max_stock_level,
            last_updated: row.last_updated,
        }
    }
}

#[derive(Debug)]
struct MovementRow {
    id: Uuid,
    product_id: Uuid,
    warehouse_id: Uuid,
    movement_type: String,
    quantity: i64,
    reference_number: String,
    notes: Option<String>,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for MovementRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            warehouse_id: row.try_get("warehouse_id")?,
            movement_type: row.try_get("movement_type")?,
            quantity: row.try_get("quantity")?,
            reference_number: row.try_get("reference_number")?,
            notes: row.try_get("notes")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: MovementId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            warehouse_id: WarehouseId::from_uuid(row.warehouse_id),
            kind: MovementKind::from_str(&row.movement_type).map_err(corrupt)?,
            quantity: row.quantity,
            reference_number: row.reference_number,
            notes: row.notes,
            user_id: row.user_id.map(UserId::from_uuid),
            created_at: row.created_at,
        })
    }
}

fn decode_product(row: &PgRow) -> Result<Product, StoreError> {
    let unit_price: i64 = row.try_get("unit_price").map_err(corrupt)?;
    let cost_price: Option<i64> = row.try_get("cost_price").map_err(corrupt)?;
    let supplier_id: Option<Uuid> = row.try_get("supplier_id").map_err(corrupt)?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        category: row.try_get("category").map_err(corrupt)?,
        sku: row.try_get("sku").map_err(corrupt)?,
        barcode: row.try_get("barcode").map_err(corrupt)?,
        description: row.try_get("description").map_err(corrupt)?,
        unit_price: cents_from_db(unit_price)?,
        cost_price: cost_price.map(cents_from_db).transpose()?,
        supplier_id: supplier_id.map(SupplierId::from_uuid),
        reorder_level: row.try_get("reorder_level").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        updated_at: row.try_get("updated_at").map_err(corrupt)?,
    })
}

fn decode_supplier(row: &PgRow) -> Result<Supplier, StoreError> {
    Ok(Supplier {
        id: SupplierId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        contact: ContactInfo {
            contact_person: row.try_get("contact_person").map_err(corrupt)?,
            email: row.try_get("email").map_err(corrupt)?,
            phone: row.try_get("phone").map_err(corrupt)?,
            address: row.try_get("address").map_err(corrupt)?,
        },
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn decode_warehouse(row: &PgRow) -> Result<Warehouse, StoreError> {
    let manager_id: Option<Uuid> = row.try_get("manager_id").map_err(corrupt)?;
    Ok(Warehouse {
        id: WarehouseId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        location: row.try_get("location").map_err(corrupt)?,
        capacity: row.try_get("capacity").map_err(corrupt)?,
        manager_id: manager_id.map(UserId::from_uuid),
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn decode_user(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role").map_err(corrupt)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(corrupt)?),
        username: row.try_get("username").map_err(corrupt)?,
        email: row.try_get("email").map_err(corrupt)?,
        full_name: row.try_get("full_name").map_err(corrupt)?,
        role: Role::from_str(&role).map_err(corrupt)?,
        is_active: row.try_get("is_active").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn decode_alert(row: &PgRow) -> Result<Alert, StoreError> {
    let alert_type: String = row.try_get("alert_type").map_err(corrupt)?;
    let severity: String = row.try_get("severity").map_err(corrupt)?;
    let product_id: Option<Uuid> = row.try_get("product_id").map_err(corrupt)?;
    let warehouse_id: Option<Uuid> = row.try_get("warehouse_id").map_err(corrupt)?;
    Ok(Alert {
        id: AlertId::from_uuid(row.try_get("id").map_err(corrupt)?),
        alert_type: AlertType::parse(&alert_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown alert type '{alert_type}'")))?,
        product_id: product_id.map(ProductId::from_uuid),
        warehouse_id: warehouse_id.map(WarehouseId::from_uuid),
        message: row.try_get("message").map_err(corrupt)?,
        severity: Severity::parse(&severity)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown severity '{severity}'")))?,
        is_read: row.try_get("is_read").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}
