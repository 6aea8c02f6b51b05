//! `stockroom-ai`
//!
//! **Responsibility:** demand forecasting and reorder arithmetic.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It does not depend on ledger types; callers hand it plain snapshots.
//! - It never mutates stock.
//! - Its constants (0.7/0.3 weighting, 0.2 safety factor, 0.8 fill target)
//!   are fixed business rules, not tunables.

pub mod demand;
pub mod job;
pub mod reorder;
pub mod error;
mod stats;

pub use demand::{DemandForecast, DemandForecastJob, DemandHistory, ForecastMethod, MovementSample, predict_demand};
pub use job::AiJob;
pub use reorder::{ReorderInput, ReorderJob, ReorderRecommendation, Urgency, recommend_reorder};
pub use error::AiError;
