//! Plumbing shared by the service layer.

use std::collections::HashMap;

use stockroom_core::{DomainError, DomainResult, Outcome, ProductId, WarehouseId};

use crate::ledger::LedgerStore;

/// Log a failed operation, then fold the result into an [`Outcome`].
///
/// Rule violations are logged at `warn`, store failures at `error`.
pub(crate) fn settle<T>(
    operation: &'static str,
    result: DomainResult<T>,
    message: impl FnOnce(&T) -> String,
) -> Outcome<T> {
    match &result {
        Ok(_) => {}
        Err(e @ DomainError::Store(_)) => {
            tracing::error!(operation, error = %e, "operation failed");
        }
        Err(e) => {
            tracing::warn!(operation, error = %e, "operation rejected");
        }
    }
    Outcome::from_result(result, operation, message)
}

/// Product and warehouse display names, loaded once per report.
#[derive(Debug, Default)]
pub(crate) struct Names {
    products: HashMap<ProductId, String>,
    warehouses: HashMap<WarehouseId, String>,
}

impl Names {
    pub(crate) async fn load(store: &dyn LedgerStore) -> DomainResult<Self> {
        let products = store
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let warehouses = store
            .list_warehouses()
            .await?
            .into_iter()
            .map(|w| (w.id, w.name))
            .collect();
        Ok(Self {
            products,
            warehouses,
        })
    }

    /// Falls back to the id for rows whose product is gone.
    pub(crate) fn product(&self, id: ProductId) -> String {
        self.products
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub(crate) fn warehouse(&self, id: WarehouseId) -> String {
        self.warehouses
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}
