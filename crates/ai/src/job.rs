use crate::error::AiError;

/// A deterministic inference unit.
///
/// Jobs consume snapshots via their `Input` type. This crate stays
/// storage-agnostic: inputs are assembled by callers (infra services).
pub trait AiJob: Send + Sync {
    type Input: Send + Sync;
    type Output;

    /// Stable job name, used in logs.
    fn name(&self) -> &'static str;

    /// The input snapshot the job will run on.
    fn input(&self) -> &Self::Input;

    /// Execute the job. Must not mutate ledger state.
    fn run(&self) -> Result<Self::Output, AiError>;
}
