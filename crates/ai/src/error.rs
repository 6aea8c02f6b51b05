use thiserror::Error;

/// Why a forecasting or reorder job produced no answer.
///
/// Demand prediction never surfaces these to callers; it degrades to the
/// `error_fallback` forecast instead. Reorder checks do return them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AiError {
    /// The snapshot handed to the job violates its preconditions
    /// (e.g. a negative or non-finite demand figure).
    #[error("invalid forecast input: {0}")]
    InvalidInput(String),

    /// The arithmetic produced something unusable, such as a non-finite rate.
    #[error("forecast computation failed: {0}")]
    InferenceFailed(String),
}
