//! Optimizer configuration.

use serde::{Deserialize, Serialize};

use crate::decoder::RetryPolicy;
use crate::error::CorridorError;
use crate::priority::PriorityTable;
use crate::qubo::PenaltyConfig;
use crate::solver::{BackendKind, SamplerConfig};

/// Everything a [`CorridorOptimizer`](super::CorridorOptimizer) needs besides its inputs.
///
/// # Examples
///
/// ```
/// use u_corridor::optimizer::OptimizerConfig;
/// use u_corridor::qubo::PenaltyConfig;
/// use u_corridor::solver::{BackendKind, SamplerConfig};
///
/// let config = OptimizerConfig::default()
///     .with_penalties(PenaltyConfig::default().with_lambda(200.0))
///     .with_sampler(SamplerConfig::default().with_seed(42))
///     .with_backend(BackendKind::Exact);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Priority weight per vehicle type.
    pub priorities: PriorityTable,
    /// λ, μ, corridor penalty and congestion factor.
    pub penalties: PenaltyConfig,
    /// Per-solve sampling settings, shared by both phases.
    pub sampler: SamplerConfig,
    /// λ escalation on infeasible results.
    pub retry: RetryPolicy,
    /// Solving backend.
    pub backend: BackendKind,
}

impl OptimizerConfig {
    /// Sets the priority table.
    pub fn with_priorities(mut self, priorities: PriorityTable) -> Self {
        self.priorities = priorities;
        self
    }

    /// Sets the penalty coefficients.
    pub fn with_penalties(mut self, penalties: PenaltyConfig) -> Self {
        self.penalties = penalties;
        self
    }

    /// Sets the sampler settings.
    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = sampler;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Selects the backend.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), CorridorError> {
        self.priorities.validate()?;
        self.penalties.validate()?;
        self.sampler.validate()?;
        self.retry.validate()
    }
}
