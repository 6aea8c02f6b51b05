//! Stock alerts: listing, acknowledgement and the stock scan.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use stockroom_core::{AlertId, DomainError, DomainResult, ProductId, WarehouseId};
use stockroom_inventory::{Alert, AlertType, evaluate_stock_alert};

use crate::ledger::{InventoryFilter, LedgerStore};
use crate::ops::Names;

/// Result of one [`AlertService::scan_stock_alerts`] pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub records_checked: usize,
    pub created: Vec<Alert>,
    /// Pairs that already had an unread alert of the same type.
    pub skipped: usize,
}

#[derive(Clone)]
pub struct AlertService {
    store: Arc<dyn LedgerStore>,
}

impl AlertService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, unread_only: bool) -> DomainResult<Vec<Alert>> {
        Ok(self.store.list_alerts(unread_only).await?)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn mark_read(&self, id: AlertId) -> DomainResult<()> {
        if self.store.mark_alert_read(id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(format!("Alert {id} not found")))
        }
    }

    /// Raise `LOW_STOCK` and `OUT_OF_STOCK` alerts for every record that
    /// warrants one, unless the pair already has an unread alert of that type.
    #[instrument(skip(self))]
    pub async fn scan_stock_alerts(&self) -> DomainResult<ScanReport> {
        let records = self.store.list_inventory(&InventoryFilter::default()).await?;
        let mut open: HashSet<(AlertType, ProductId, WarehouseId)> = self
            .store
            .list_alerts(true)
            .await?
            .into_iter()
            .filter_map(|a| Some((a.alert_type, a.product_id?, a.warehouse_id?)))
            .collect();
        let names = Names::load(self.store.as_ref()).await?;

        let mut created = Vec::new();
        let mut skipped = 0;
        for record in &records {
            let product = names.product(record.product_id);
            let warehouse = names.warehouse(record.warehouse_id);
            let Some(alert) = evaluate_stock_alert(record, &product, &warehouse) else {
                continue;
            };
            if !matches!(alert.alert_type, AlertType::LowStock | AlertType::OutOfStock) {
                continue;
            }
            if !open.insert((alert.alert_type, record.product_id, record.warehouse_id)) {
                skipped += 1;
                continue;
            }
            let alert = alert.into_alert(AlertId::new(), Utc::now());
            self.store.insert_alert(&alert).await?;
            created.push(alert);
        }

        tracing::info!(
            checked = records.len(),
            created = created.len(),
            skipped,
            "stock alert scan finished"
        );
        Ok(ScanReport {
            records_checked: records.len(),
            created,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::ErrorKind;
    use stockroom_inventory::Severity;

    use crate::testing;

    #[tokio::test]
    async fn scan_raises_low_and_out_of_stock() {
        let store = testing::store();
        let lamp = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let desk = testing::product(store.as_ref(), "Desk", "DESK-1", 9900).await;
        let chair = testing::product(store.as_ref(), "Chair", "CHAIR-1", 4900).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        testing::stock(store.as_ref(), lamp.id, w.id, 4, 10).await;
        testing::stock(store.as_ref(), desk.id, w.id, 0, 10).await;
        testing::stock(store.as_ref(), chair.id, w.id, 50, 10).await;

        let service = AlertService::new(store);
        let report = service.scan_stock_alerts().await.unwrap();
        assert_eq!(report.records_checked, 3);
        assert_eq!(report.created.len(), 2);

        let low = report
            .created
            .iter()
            .find(|a| a.alert_type == AlertType::LowStock)
            .unwrap();
        assert_eq!(low.product_id, Some(lamp.id));
        assert_eq!(low.severity, Severity::High);
        let out = report
            .created
            .iter()
            .find(|a| a.alert_type == AlertType::OutOfStock)
            .unwrap();
        assert_eq!(out.severity, Severity::Critical);
        assert_eq!(out.message, "Desk is out of stock at Main");
    }

    #[tokio::test]
    async fn rescan_skips_pairs_with_unread_alerts() {
        let store = testing::store();
        let lamp = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        testing::stock(store.as_ref(), lamp.id, w.id, 8, 10).await;

        let service = AlertService::new(store);
        let first = service.scan_stock_alerts().await.unwrap();
        assert_eq!(first.created[0].severity, Severity::Medium);

        let second = service.scan_stock_alerts().await.unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped, 1);

        service.mark_read(first.created[0].id).await.unwrap();
        assert!(service.list(true).await.unwrap().is_empty());
        let third = service.scan_stock_alerts().await.unwrap();
        assert_eq!(third.created.len(), 1);
        assert_eq!(service.list(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn overstock_is_not_raised_by_the_scan() {
        let store = testing::store();
        let lamp = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        testing::stock(store.as_ref(), lamp.id, w.id, 5000, 10).await;

        let report = AlertService::new(store).scan_stock_alerts().await.unwrap();
        assert!(report.created.is_empty());
    }

    #[tokio::test]
    async fn marking_unknown_alert_is_not_found() {
        let service = AlertService::new(testing::store());
        let err = service.mark_read(AlertId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
