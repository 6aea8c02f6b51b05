//! Demand prediction, reorder recommendations and the dashboard summary.
//!
//! This service assembles ledger snapshots for the pure jobs in
//! `stockroom-ai`. Demand prediction never fails outward: a store failure
//! while reading history degrades to the `error_fallback` forecast.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::instrument;

use stockroom_ai::{
    DemandForecast, DemandHistory, MovementSample, ReorderInput, ReorderRecommendation,
    predict_demand, recommend_reorder,
};
use stockroom_core::{DomainError, DomainResult, Outcome, ProductId, WarehouseId};

use crate::config::ForecastConfig;
use crate::ledger::{InventoryFilter, LedgerStore, MovementFilter};
use crate::ops::settle;

/// Reorder recommendations always look 30 days ahead.
const REORDER_HORIZON_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandPrediction {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub horizon_days: u32,
    pub prediction: DemandForecast,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderReport {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub recommendation: ReorderRecommendation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_products: usize,
    pub total_warehouses: usize,
    pub total_inventory_records: usize,
    /// Records at or below their reorder level.
    pub reorder_needed: usize,
    pub out_of_stock: usize,
    /// Σ quantity × unit price, in cents.
    pub total_inventory_value: u64,
    pub unread_alerts: usize,
    pub movements_last_24h: usize,
}

#[derive(Clone)]
pub struct ForecastService {
    store: Arc<dyn LedgerStore>,
    config: ForecastConfig,
}

impl ForecastService {
    pub fn new(store: Arc<dyn LedgerStore>, config: ForecastConfig) -> Self {
        Self { store, config }
    }

    /// Forecast demand for one pair over `days` (default from config).
    #[instrument(skip(self), fields(product_id = %product_id, warehouse_id = %warehouse_id))]
    pub async fn predict_demand(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        days: Option<u32>,
    ) -> Outcome<DemandPrediction> {
        let horizon_days = days.unwrap_or(self.config.default_horizon_days);
        let prediction = self.forecast(product_id, warehouse_id, horizon_days).await;
        Outcome::ok(
            prediction.message.clone(),
            DemandPrediction {
                product_id,
                warehouse_id,
                horizon_days,
                prediction,
            },
        )
    }

    async fn forecast(&self, product_id: ProductId, warehouse_id: WarehouseId, days: u32) -> DemandForecast {
        match self.history(product_id, warehouse_id).await {
            Ok(history) => predict_demand(history, days),
            Err(e) => {
                tracing::error!(error = %e, "reading demand history failed");
                DemandForecast::error(e)
            }
        }
    }

    /// Movement history for the pair over the configured window, newest first.
    async fn history(&self, product_id: ProductId, warehouse_id: WarehouseId) -> DomainResult<DemandHistory> {
        let since = Utc::now() - Duration::days(i64::from(self.config.history_days));
        let movements = self
            .store
            .list_movements(
                &MovementFilter::pair(product_id, warehouse_id)
                    .since(since)
                    .unbounded(),
            )
            .await?;
        let samples = movements
            .into_iter()
            .map(|m| MovementSample {
                outbound: m.kind.is_outbound(),
                quantity: m.quantity,
                occurred_at: m.created_at,
            })
            .collect();
        Ok(DemandHistory::new(samples))
    }

    /// 30-day forecast followed by the reorder-point check.
    #[instrument(skip(self), fields(product_id = %product_id, warehouse_id = %warehouse_id))]
    pub async fn reorder_recommendation(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Outcome<ReorderReport> {
        let result = self.recommend(product_id, warehouse_id).await;
        match result {
            Ok(report) => Outcome::ok(report.recommendation.message.clone(), report),
            Err(e) => settle("Reorder recommendation", Err(e), |_: &ReorderReport| String::new()),
        }
    }

    async fn recommend(&self, product_id: ProductId, warehouse_id: WarehouseId) -> DomainResult<ReorderReport> {
        let record = self
            .store
            .get_inventory(product_id, warehouse_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product not found in inventory"))?;
        let product_name = match self.store.get_product(product_id).await? {
            Some(product) => product.name,
            None => product_id.to_string(),
        };

        let forecast = self.forecast(product_id, warehouse_id, REORDER_HORIZON_DAYS).await;
        let recommendation = recommend_reorder(ReorderInput {
            product_name,
            quantity: record.quantity,
            reserved_quantity: record.reserved_quantity,
            reorder_level: record.reorder_level,
            max_stock_level: record.max_stock_level,
            predicted_demand_30_days: forecast.predicted_demand,
        })
        .map_err(|e| DomainError::validation(e.to_string()))?;

        Ok(ReorderReport {
            product_id,
            warehouse_id,
            recommendation,
        })
    }

    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Outcome<DashboardSummary> {
        let result = self.summarize().await;
        settle("Dashboard summary", result, |_| {
            "Dashboard summary retrieved successfully".to_string()
        })
    }

    async fn summarize(&self) -> DomainResult<DashboardSummary> {
        let products = self.store.list_products().await?;
        let warehouses = self.store.list_warehouses().await?;
        let records = self.store.list_inventory(&InventoryFilter::default()).await?;
        let unread_alerts = self.store.list_alerts(true).await?.len();
        let since = Utc::now() - Duration::hours(24);
        let movements_last_24h = self
            .store
            .list_movements(&MovementFilter::default().since(since).unbounded())
            .await?
            .len();

        let prices: HashMap<ProductId, u64> = products.iter().map(|p| (p.id, p.unit_price)).collect();
        let total_inventory_value = records
            .iter()
            .map(|r| {
                let quantity = u64::try_from(r.quantity).unwrap_or(0);
                let price = prices.get(&r.product_id).copied().unwrap_or(0);
                quantity.saturating_mul(price)
            })
            .fold(0u64, u64::saturating_add);

        Ok(DashboardSummary {
            total_products: products.len(),
            total_warehouses: warehouses.len(),
            total_inventory_records: records.len(),
            reorder_needed: records.iter().filter(|r| r.needs_reorder()).count(),
            out_of_stock: records.iter().filter(|r| r.quantity == 0).count(),
            total_inventory_value,
            unread_alerts,
            movements_last_24h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_ai::{ForecastMethod, Urgency};
    use stockroom_core::ErrorKind;
    use stockroom_inventory::{ManualMovement, MovementKind, NewMovement};

    use crate::inventory_service::InventoryService;
    use crate::testing;

    fn service(store: Arc<dyn LedgerStore>) -> ForecastService {
        ForecastService::new(store, ForecastConfig::default())
    }

    async fn movement(inventory: &InventoryService, p: ProductId, w: WarehouseId, kind: MovementKind, qty: i64) {
        let outcome = inventory
            .record_movement(ManualMovement {
                product_id: p,
                warehouse_id: w,
                kind,
                quantity: qty,
                notes: None,
                user_id: None,
            })
            .await;
        assert!(outcome.success, "{}", outcome.message);
    }

    #[tokio::test]
    async fn short_history_uses_default_fallback() {
        let store = testing::store();
        let p = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        let inventory = InventoryService::new(store.clone());
        movement(&inventory, p.id, w.id, MovementKind::In, 50).await;

        let outcome = service(store).predict_demand(p.id, w.id, None).await;
        assert!(outcome.success);
        let prediction = outcome.payload.unwrap();
        assert_eq!(prediction.horizon_days, 30);
        assert_eq!(prediction.prediction.method, ForecastMethod::DefaultFallback);
        assert_eq!(prediction.prediction.predicted_demand, 10.0);
        assert_eq!(outcome.message, "Insufficient historical data");
    }

    #[tokio::test]
    async fn outbound_history_drives_moving_average() {
        let store = testing::store();
        let p = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        let inventory = InventoryService::new(store.clone());
        movement(&inventory, p.id, w.id, MovementKind::In, 500).await;
        for _ in 0..8 {
            movement(&inventory, p.id, w.id, MovementKind::Out, 4).await;
        }

        let prediction = service(store).predict_demand(p.id, w.id, Some(10)).await.payload.unwrap();
        assert_eq!(prediction.prediction.method, ForecastMethod::MovingAverage);
        assert_eq!(prediction.prediction.predicted_daily_demand, Some(4.0));
        assert_eq!(prediction.prediction.predicted_demand, 40.0);
        assert_eq!(prediction.prediction.historical_points, 8);
    }

    #[tokio::test]
    async fn busy_pair_uses_the_whole_history_window() {
        let store = testing::store();
        let p = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        let older = Utc::now() - Duration::days(20);
        let newer = Utc::now() - Duration::days(1);
        let out = |quantity, at| NewMovement::new(p.id, w.id, MovementKind::Out, quantity, "MOV-1", at).unwrap();
        let mut rows: Vec<NewMovement> = (0..500).map(|_| out(100, older)).collect();
        rows.extend((0..1000).map(|_| out(1, newer)));
        testing::movements(store.as_ref(), rows).await;

        let prediction = service(store).predict_demand(p.id, w.id, Some(1)).await.payload.unwrap();
        assert_eq!(prediction.prediction.historical_points, 1500);
        // recent 1, overall (500 * 100 + 1000) / 1500 = 34
        assert_eq!(prediction.prediction.predicted_daily_demand, Some(10.9));
    }

    #[tokio::test]
    async fn inbound_only_history_has_no_outbound_data() {
        let store = testing::store();
        let p = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        let inventory = InventoryService::new(store.clone());
        for _ in 0..7 {
            movement(&inventory, p.id, w.id, MovementKind::Return, 2).await;
        }
        let prediction = service(store).predict_demand(p.id, w.id, None).await.payload.unwrap();
        assert_eq!(prediction.prediction.method, ForecastMethod::NoOutboundData);
        assert_eq!(prediction.prediction.predicted_demand, 5.0);
    }

    #[tokio::test]
    async fn reorder_for_missing_record_is_not_found() {
        let store = testing::store();
        let outcome = service(store).reorder_recommendation(ProductId::new(), WarehouseId::new()).await;
        assert_eq!(outcome.error, Some(ErrorKind::NotFound));
        assert_eq!(outcome.message, "Product not found in inventory");
    }

    #[tokio::test]
    async fn low_stock_recommends_reorder() {
        let store = testing::store();
        let p = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        testing::stock(store.as_ref(), p.id, w.id, 8, 20).await;

        let outcome = service(store).reorder_recommendation(p.id, w.id).await;
        assert!(outcome.success);
        let r = outcome.payload.unwrap().recommendation;
        assert!(r.should_reorder);
        // default fallback forecast (10) with max stock 1000
        assert_eq!(r.recommended_quantity, Some(792));
        assert_eq!(r.urgency, Some(Urgency::High));
        assert_eq!(r.product_name, "Lamp");
        assert_eq!(outcome.message, r.message);
    }

    #[tokio::test]
    async fn dashboard_counts_and_values_stock() {
        let store = testing::store();
        let lamp = testing::product(store.as_ref(), "Lamp", "LAMP-1", 1999).await;
        let desk = testing::product(store.as_ref(), "Desk", "DESK-1", 15000).await;
        let w = testing::warehouse(store.as_ref(), "Main", None).await;
        testing::stock(store.as_ref(), lamp.id, w.id, 10, 20).await;
        testing::stock(store.as_ref(), desk.id, w.id, 0, 5).await;

        let summary = service(store).dashboard_summary().await.payload.unwrap();
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_warehouses, 1);
        assert_eq!(summary.reorder_needed, 2);
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.total_inventory_value, 19990);
        assert_eq!(summary.unread_alerts, 0);
    }
}
