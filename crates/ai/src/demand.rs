use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::AiJob;
use crate::error::AiError;
use crate::stats::{mean, round2, stddev_population};

/// Minimum number of movements (any kind) before a forecast is attempted.
pub const MIN_HISTORY_POINTS: usize = 7;
/// Size of the "recent" window in the weighted average.
pub const RECENT_WINDOW: usize = 7;

const RECENT_WEIGHT: f64 = 0.7;
const OVERALL_WEIGHT: f64 = 0.3;
const MIN_CONFIDENCE: f64 = 0.5;

/// One historical movement, as seen by the forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementSample {
    /// OUT or TRANSFER_OUT.
    pub outbound: bool,
    /// Magnitude; sign is ignored.
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Movement history for one (product, warehouse) pair, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandHistory {
    pub samples: Vec<MovementSample>,
}

impl DemandHistory {
    pub fn new(samples: Vec<MovementSample>) -> Self {
        Self { samples }
    }

    /// Outbound magnitudes, oldest first.
    fn outbound_quantities(&self) -> Vec<f64> {
        let mut quantities: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.outbound)
            .map(|s| s.quantity.unsigned_abs() as f64)
            .collect();
        quantities.reverse();
        quantities
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    MovingAverage,
    DefaultFallback,
    NoOutboundData,
    ErrorFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub predicted_demand: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_daily_demand: Option<f64>,
    pub confidence: f64,
    pub method: ForecastMethod,
    pub historical_points: usize,
    pub message: String,
}

impl DemandForecast {
    fn fallback(
        predicted: f64,
        confidence: f64,
        method: ForecastMethod,
        historical_points: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            predicted_demand: predicted,
            predicted_daily_demand: None,
            confidence,
            method,
            historical_points,
            message: message.into(),
        }
    }

    pub fn insufficient_history(points: usize) -> Self {
        Self::fallback(10.0, 0.3, ForecastMethod::DefaultFallback, points, "Insufficient historical data")
    }

    pub fn no_outbound_data(points: usize) -> Self {
        Self::fallback(
            5.0,
            0.4,
            ForecastMethod::NoOutboundData,
            points,
            "No outbound movement data available",
        )
    }

    pub fn error(reason: impl core::fmt::Display) -> Self {
        Self::fallback(
            15.0,
            0.3,
            ForecastMethod::ErrorFallback,
            0,
            format!("Prediction error: {reason}"),
        )
    }
}

/// Weighted moving-average demand forecast.
///
/// `daily = 0.7 * mean(last 7 outbound) + 0.3 * mean(all outbound)`,
/// `total = daily * days`, `confidence = max(0.5, 1 - stddev / (daily + 1))`.
#[derive(Debug, Clone)]
pub struct DemandForecastJob {
    input: DemandHistory,
    days: u32,
}

impl DemandForecastJob {
    pub fn new(input: DemandHistory, days: u32) -> Self {
        Self { input, days }
    }
}

impl AiJob for DemandForecastJob {
    type Input = DemandHistory;
    type Output = DemandForecast;

    fn name(&self) -> &'static str {
        "ai.demand_forecast"
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<DemandForecast, AiError> {
        let points = self.input.samples.len();
        if points < MIN_HISTORY_POINTS {
            return Ok(DemandForecast::insufficient_history(points));
        }

        let outbound = self.input.outbound_quantities();
        if outbound.is_empty() {
            return Ok(DemandForecast::no_outbound_data(points));
        }

        let recent = &outbound[outbound.len().saturating_sub(RECENT_WINDOW)..];
        let recent_avg = mean(recent);
        let overall_avg = mean(&outbound);
        let daily = RECENT_WEIGHT * recent_avg + OVERALL_WEIGHT * overall_avg;
        let total = daily * f64::from(self.days);

        let std = stddev_population(&outbound);
        let confidence = (1.0 - std / (daily + 1.0)).max(MIN_CONFIDENCE);

        if !(total.is_finite() && confidence.is_finite()) {
            return Err(AiError::InferenceFailed(format!(
                "non-finite forecast (daily={daily}, std={std})"
            )));
        }

        Ok(DemandForecast {
            predicted_demand: round2(total),
            predicted_daily_demand: Some(round2(daily)),
            confidence: round2(confidence),
            method: ForecastMethod::MovingAverage,
            historical_points: outbound.len(),
            message: format!("Prediction based on {} historical data points", outbound.len()),
        })
    }
}

/// Forecast that never fails: job errors degrade to the error fallback.
pub fn predict_demand(history: DemandHistory, days: u32) -> DemandForecast {
    let job = DemandForecastJob::new(history, days);
    match job.run() {
        Ok(forecast) => forecast,
        Err(e) => {
            tracing::warn!(job = job.name(), error = %e, "demand forecast degraded to fallback");
            DemandForecast::error(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Builds newest-first history from oldest-first `(outbound, qty)` pairs.
    fn history(oldest_first: &[(bool, i64)]) -> DemandHistory {
        let start = Utc::now() - Duration::days(60);
        let mut samples: Vec<MovementSample> = oldest_first
            .iter()
            .enumerate()
            .map(|(i, &(outbound, quantity))| MovementSample {
                outbound,
                quantity,
                occurred_at: start + Duration::days(i as i64),
            })
            .collect();
        samples.reverse();
        DemandHistory::new(samples)
    }

    #[test]
    fn fewer_than_seven_rows_is_default_fallback() {
        let f = predict_demand(history(&[(true, 5); 6]), 30);
        assert_eq!(f.method, ForecastMethod::DefaultFallback);
        assert_eq!(f.predicted_demand, 10.0);
        assert_eq!(f.confidence, 0.3);
        assert_eq!(f.historical_points, 6);
    }

    #[test]
    fn inbound_only_history_is_no_outbound_data() {
        let f = predict_demand(history(&[(false, 20); 9]), 30);
        assert_eq!(f.method, ForecastMethod::NoOutboundData);
        assert_eq!(f.predicted_demand, 5.0);
        assert_eq!(f.confidence, 0.4);
    }

    #[test]
    fn constant_outflow_has_full_confidence() {
        let f = predict_demand(history(&[(true, 4); 10]), 30);
        assert_eq!(f.method, ForecastMethod::MovingAverage);
        assert_eq!(f.predicted_daily_demand, Some(4.0));
        assert_eq!(f.predicted_demand, 120.0);
        assert_eq!(f.confidence, 1.0);
        assert_eq!(f.historical_points, 10);
    }

    #[test]
    fn recent_window_is_the_newest_seven_outbound() {
        // oldest three outbound are 100, newest seven are 10
        let mut rows = vec![(true, 100); 3];
        rows.extend(vec![(true, 10); 7]);
        rows.push((false, 500));
        let f = predict_demand(history(&rows), 1);
        // recent = 10, overall = (300 + 70) / 10 = 37
        let daily = 0.7 * 10.0 + 0.3 * 37.0;
        assert_eq!(f.predicted_daily_demand, Some(round2(daily)));
        assert_eq!(f.predicted_demand, round2(daily));
    }

    #[test]
    fn fewer_than_seven_outbound_uses_all_for_recent() {
        let mut rows = vec![(false, 1); 5];
        rows.extend([(true, 2), (true, 4)]);
        let f = predict_demand(history(&rows), 10);
        assert_eq!(f.predicted_daily_demand, Some(3.0));
        assert_eq!(f.predicted_demand, 30.0);
        // std = 1, confidence = 1 - 1/4
        assert_eq!(f.confidence, 0.75);
    }

    #[test]
    fn volatile_outflow_confidence_floors_at_half() {
        let rows: Vec<(bool, i64)> = (0..8).map(|i| (true, if i % 2 == 0 { 1 } else { 200 })).collect();
        let f = predict_demand(history(&rows), 30);
        assert_eq!(f.confidence, 0.5);
    }

    #[test]
    fn error_fallback_shape() {
        let f = DemandForecast::error("ledger unavailable");
        assert_eq!(f.method, ForecastMethod::ErrorFallback);
        assert_eq!(f.predicted_demand, 15.0);
        assert_eq!(f.confidence, 0.3);
        assert_eq!(f.message, "Prediction error: ledger unavailable");
    }

    #[test]
    fn fallback_omits_daily_rate_on_the_wire() {
        let v = serde_json::to_value(DemandForecast::error("boom")).unwrap();
        assert_eq!(v["method"], "error_fallback");
        assert!(v.get("predicted_daily_demand").is_none());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Confidence stays within [0.5, 1] for any moving-average forecast.
            #[test]
            fn confidence_is_bounded(qty in proptest::collection::vec(0i64..10_000, 7..60), days in 1u32..365) {
                let rows: Vec<(bool, i64)> = qty.into_iter().map(|q| (true, q)).collect();
                let f = predict_demand(history(&rows), days);
                prop_assert_eq!(f.method, ForecastMethod::MovingAverage);
                prop_assert!(f.confidence >= 0.5 && f.confidence <= 1.0);
                prop_assert!(f.predicted_demand >= 0.0);
            }
        }
    }
}
