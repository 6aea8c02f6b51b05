//! Product, supplier, warehouse and user maintenance.
//!
//! Catalog operations return `DomainResult` directly; the presentation layer
//! maps the error kind to a status. Uniqueness is pre-checked for a readable
//! message and enforced again by the store.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use stockroom_auth::{NewUser, Role, User, UserPatch};
use stockroom_core::{DomainError, DomainResult, ProductId, SupplierId, UserId, WarehouseId};
use stockroom_inventory::{NewWarehouse, Warehouse, WarehousePatch};
use stockroom_parties::{NewSupplier, Supplier, SupplierPatch};
use stockroom_products::{NewProduct, Product, ProductPatch};

use crate::ledger::{InventoryFilter, LedgerStore, StoreError};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LedgerStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // ── products ────────────────────────────────────────────────────────────

    pub async fn list_products(&self) -> DomainResult<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    pub async fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Product {id} not found")))
    }

    #[instrument(skip(self, cmd), fields(sku = %cmd.sku), err(level = "warn"))]
    pub async fn create_product(&self, cmd: NewProduct) -> DomainResult<Product> {
        cmd.validate()?;
        self.ensure_sku_free(cmd.sku.trim()).await?;
        if let Some(supplier_id) = cmd.supplier_id {
            self.get_supplier(supplier_id).await?;
        }
        let product = cmd.into_product(ProductId::new(), Utc::now())?;
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[instrument(skip(self, patch), err(level = "warn"))]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product> {
        let mut product = self.get_product(id).await?;
        if let Some(sku) = patch.new_sku(&product) {
            self.ensure_sku_free(sku).await?;
        }
        if let Some(supplier_id) = patch.supplier_id {
            self.get_supplier(supplier_id).await?;
        }
        patch.apply(&mut product, Utc::now())?;
        self.store.update_product(&product).await?;
        Ok(product)
    }

    /// Refused while any warehouse still holds the product; its empty
    /// inventory rows go with it.
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        let product = self.get_product(id).await?;
        let total_stock: i64 = self
            .store
            .list_inventory(&InventoryFilter::product(id))
            .await?
            .iter()
            .map(|r| r.quantity)
            .sum();
        product.ensure_deletable(total_stock)?;
        match self.store.delete_product(id).await {
            Ok(true) => {}
            Ok(false) => return Err(DomainError::not_found(format!("Product {id} not found"))),
            // Stock arrived after the check above.
            Err(StoreError::Constraint(_)) => {
                return Err(DomainError::validation(format!(
                    "Cannot delete product '{}' while it is still in stock",
                    product.name
                )));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn ensure_sku_free(&self, sku: &str) -> DomainResult<()> {
        match self.store.find_product_by_sku(sku).await? {
            Some(_) => Err(DomainError::duplicate(format!("SKU '{sku}' already exists"))),
            None => Ok(()),
        }
    }

    // ── suppliers ───────────────────────────────────────────────────────────

    pub async fn list_suppliers(&self) -> DomainResult<Vec<Supplier>> {
        Ok(self.store.list_suppliers().await?)
    }

    pub async fn get_supplier(&self, id: SupplierId) -> DomainResult<Supplier> {
        self.store
            .get_supplier(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Supplier {id} not found")))
    }

    #[instrument(skip(self, cmd), err(level = "warn"))]
    pub async fn create_supplier(&self, cmd: NewSupplier) -> DomainResult<Supplier> {
        let supplier = cmd.into_supplier(SupplierId::new(), Utc::now())?;
        self.store.insert_supplier(&supplier).await?;
        Ok(supplier)
    }

    #[instrument(skip(self, patch), err(level = "warn"))]
    pub async fn update_supplier(&self, id: SupplierId, patch: SupplierPatch) -> DomainResult<Supplier> {
        let mut supplier = self.get_supplier(id).await?;
        patch.apply(&mut supplier)?;
        self.store.update_supplier(&supplier).await?;
        Ok(supplier)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn delete_supplier(&self, id: SupplierId) -> DomainResult<()> {
        let supplier = self.get_supplier(id).await?;
        let referencing = self
            .store
            .list_products()
            .await?
            .iter()
            .filter(|p| p.supplier_id == Some(id))
            .count();
        if referencing > 0 {
            return Err(DomainError::validation(format!(
                "Cannot delete supplier '{}' referenced by {referencing} products",
                supplier.name
            )));
        }
        if !self.store.delete_supplier(id).await? {
            return Err(DomainError::not_found(format!("Supplier {id} not found")));
        }
        Ok(())
    }

    // ── warehouses ──────────────────────────────────────────────────────────

    pub async fn get_warehouse(&self, id: WarehouseId) -> DomainResult<Warehouse> {
        self.store
            .get_warehouse(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Warehouse {id} not found")))
    }

    #[instrument(skip(self, cmd), err(level = "warn"))]
    pub async fn create_warehouse(&self, cmd: NewWarehouse) -> DomainResult<Warehouse> {
        if let Some(manager_id) = cmd.manager_id {
            self.get_user(manager_id).await?;
        }
        let warehouse = cmd.into_warehouse(WarehouseId::new(), Utc::now())?;
        self.store.insert_warehouse(&warehouse).await?;
        tracing::info!(warehouse_id = %warehouse.id, "warehouse created");
        Ok(warehouse)
    }

    #[instrument(skip(self, patch), err(level = "warn"))]
    pub async fn update_warehouse(&self, id: WarehouseId, patch: WarehousePatch) -> DomainResult<Warehouse> {
        let mut warehouse = self.get_warehouse(id).await?;
        if let Some(manager_id) = patch.manager_id {
            self.get_user(manager_id).await?;
        }
        patch.apply(&mut warehouse)?;
        self.store.update_warehouse(&warehouse).await?;
        Ok(warehouse)
    }

    // ── users ───────────────────────────────────────────────────────────────

    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        Ok(self.store.list_users().await?)
    }

    pub async fn get_user(&self, id: UserId) -> DomainResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User {id} not found")))
    }

    /// `actor` is the role of the caller; nobody grants above their own level.
    #[instrument(skip(self, cmd), err(level = "warn"))]
    pub async fn create_user(&self, actor: Role, cmd: NewUser) -> DomainResult<User> {
        let user = cmd.into_user(actor, UserId::new(), Utc::now())?;
        if self.store.find_user_by_username(&user.username).await?.is_some() {
            return Err(DomainError::duplicate(format!(
                "Username '{}' already exists",
                user.username
            )));
        }
        self.ensure_email_free(&user.email).await?;
        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    #[instrument(skip(self, patch), err(level = "warn"))]
    pub async fn update_user(&self, actor: Role, id: UserId, patch: UserPatch) -> DomainResult<User> {
        let mut user = self.get_user(id).await?;
        if let Some(email) = patch.new_email(&user)? {
            self.ensure_email_free(&email).await?;
        }
        patch.apply(actor, &mut user)?;
        self.store.update_user(&user).await?;
        Ok(user)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn delete_user(&self, actor: Role, id: UserId) -> DomainResult<()> {
        let user = self.get_user(id).await?;
        stockroom_auth::ensure_can_assign(actor, user.role)?;
        if !self.store.delete_user(id).await? {
            return Err(DomainError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> DomainResult<()> {
        match self.store.find_user_by_email(email).await? {
            Some(_) => Err(DomainError::duplicate(format!("Email '{email}' already exists"))),
            None => Ok(()),
        }
    }
}
