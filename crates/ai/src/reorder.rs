use serde::{Deserialize, Serialize};

use crate::job::AiJob;
use crate::error::AiError;

const SAFETY_STOCK_FACTOR: f64 = 0.2;
const TARGET_FILL: f64 = 0.8;
const HIGH_URGENCY_FACTOR: f64 = 0.5;
const DAYS_PER_MONTH: f64 = 30.0;

/// Stock snapshot plus the 30-day demand forecast for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderInput {
    pub product_name: String,
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub reorder_level: i64,
    pub max_stock_level: i64,
    pub predicted_demand_30_days: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub should_reorder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_quantity: Option<i64>,
    pub current_stock: i64,
    pub available_stock: i64,
    pub predicted_demand_30_days: i64,
    pub safety_stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_reorder: Option<i64>,
    pub product_name: String,
    pub message: String,
}

/// Reorder point check.
///
/// At or below the reorder level: order up to 80% of the maximum stock
/// level, HIGH urgency at half the reorder level. Above it: estimate days
/// until the reorder point at the forecast daily rate (at least one day).
#[derive(Debug, Clone)]
pub struct ReorderJob {
    input: ReorderInput,
}

impl ReorderJob {
    pub fn new(input: ReorderInput) -> Self {
        Self { input }
    }
}

impl AiJob for ReorderJob {
    type Input = ReorderInput;
    type Output = ReorderRecommendation;

    fn name(&self) -> &'static str {
        "ai.reorder_recommendation"
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<ReorderRecommendation, AiError> {
        let i = &self.input;
        let demand = i.predicted_demand_30_days;
        if !demand.is_finite() || demand < 0.0 {
            return Err(AiError::InvalidInput(format!(
                "predicted demand must be a finite non-negative number, got {demand}"
            )));
        }

        let available = i.quantity - i.reserved_quantity;
        let safety_stock = demand * SAFETY_STOCK_FACTOR;

        if available <= i.reorder_level {
            let target = i.max_stock_level as f64 * TARGET_FILL;
            let recommended = (target - available as f64).round_ties_even() as i64;
            let urgency = if available as f64 <= i.reorder_level as f64 * HIGH_URGENCY_FACTOR {
                Urgency::High
            } else {
                Urgency::Medium
            };
            return Ok(ReorderRecommendation {
                should_reorder: true,
                recommended_quantity: Some(recommended),
                current_stock: i.quantity,
                available_stock: available,
                predicted_demand_30_days: demand.round_ties_even() as i64,
                safety_stock: safety_stock.round_ties_even() as i64,
                urgency: Some(urgency),
                days_until_reorder: None,
                product_name: i.product_name.clone(),
                message: format!(
                    "Reorder recommended: stock level is {available}, below reorder level of {}",
                    i.reorder_level
                ),
            });
        }

        let daily = demand / DAYS_PER_MONTH;
        let days_until_reorder = if daily > 0.0 {
            Some(((available - i.reorder_level) as f64 / daily).max(1.0).round_ties_even() as i64)
        } else {
            None
        };
        let message = match days_until_reorder {
            Some(days) => format!("No reorder needed. Estimated {days} days until reorder point."),
            None => "No reorder needed. No demand forecast to estimate the reorder point.".to_string(),
        };

        Ok(ReorderRecommendation {
            should_reorder: false,
            recommended_quantity: None,
            current_stock: i.quantity,
            available_stock: available,
            predicted_demand_30_days: demand.round_ties_even() as i64,
            safety_stock: safety_stock.round_ties_even() as i64,
            urgency: None,
            days_until_reorder,
            product_name: i.product_name.clone(),
            message,
        })
    }
}

pub fn recommend_reorder(input: ReorderInput) -> Result<ReorderRecommendation, AiError> {
    ReorderJob::new(input).run()
}
