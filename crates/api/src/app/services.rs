//! Infrastructure wiring: one ledger store shared by every service.

use std::sync::Arc;

use stockroom_infra::config::DatabaseConfig;
use stockroom_infra::{
    AlertService, CatalogService, ForecastConfig, ForecastService, InMemoryLedgerStore, InventoryService,
    LedgerStore, PostgresLedgerStore, WarehouseController,
};

#[derive(Clone)]
pub struct AppServices {
    pub inventory: InventoryService,
    pub warehouses: WarehouseController,
    pub forecasts: ForecastService,
    pub catalog: CatalogService,
    pub alerts: AlertService,
}

impl AppServices {
    pub fn new(store: Arc<dyn LedgerStore>, forecast: ForecastConfig) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            warehouses: WarehouseController::new(store.clone()),
            forecasts: ForecastService::new(store.clone(), forecast),
            catalog: CatalogService::new(store.clone()),
            alerts: AlertService::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLedgerStore::new()), ForecastConfig::default())
    }
}

/// Postgres when a URL is configured, otherwise an in-memory ledger.
pub async fn connect_store(db: &DatabaseConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    let Some(url) = db.url.as_deref() else {
        tracing::warn!("database.url not set; using the in-memory ledger (data is lost on exit)");
        return Ok(Arc::new(InMemoryLedgerStore::new()));
    };

    let store = PostgresLedgerStore::connect(url, db.max_connections).await?;
    if db.run_migrations {
        store.migrate().await?;
        tracing::info!("ledger schema applied");
    }
    Ok(Arc::new(store))
}
