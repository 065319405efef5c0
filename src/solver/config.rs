//! Sampler configuration and backend selection.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;

use super::{ExactSolver, SimulatedAnnealer, SolverBackend};

/// Settings shared by every [`SolverBackend`].
///
/// A fixed `seed` makes repeated solves of the same model reproduce the same
/// ranked samples; leave it `None` for fresh entropy. A `time_budget` trades
/// that guarantee for a bounded wall-clock time.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_corridor::solver::SamplerConfig;
///
/// let config = SamplerConfig::default()
///     .with_num_reads(16)
///     .with_num_sweeps(500)
///     .with_seed(42)
///     .with_time_budget(Duration::from_millis(250));
/// assert_eq!(config.seed, Some(42));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Independent reads (annealing runs, or samples kept by exact enumeration).
    pub num_reads: usize,
    /// Sweeps per annealing read.
    pub num_sweeps: usize,
    /// Random seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
    /// Wall-clock budget after which the best-so-far result is returned.
    pub time_budget: Option<Duration>,
    /// Inverse temperature range `(hot, cold)`; `None` derives it from the model.
    pub beta_range: Option<(f64, f64)>,
}

impl SamplerConfig {
    /// Sets the number of reads.
    pub fn with_num_reads(mut self, reads: usize) -> Self {
        self.num_reads = reads;
        self
    }

    /// Sets sweeps per read.
    pub fn with_num_sweeps(mut self, sweeps: usize) -> Self {
        self.num_sweeps = sweeps;
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bounds the wall-clock time of a solve.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Sets the inverse temperature range explicitly.
    pub fn with_beta_range(mut self, hot: f64, cold: f64) -> Self {
        self.beta_range = Some((hot, cold));
        self
    }

    /// Rejects zero reads or sweeps and unusable beta ranges.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.num_reads == 0 {
            return Err(SolverError::InvalidConfig("num_reads must be positive".into()));
        }
        if self.num_sweeps == 0 {
            return Err(SolverError::InvalidConfig("num_sweeps must be positive".into()));
        }
        if let Some((hot, cold)) = self.beta_range {
            if !(hot.is_finite() && cold.is_finite() && hot > 0.0 && hot <= cold) {
                return Err(SolverError::InvalidConfig(format!(
                    "beta range ({hot}, {cold}) must satisfy 0 < hot <= cold"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_reads: 32,
            num_sweeps: 1000,
            seed: None,
            time_budget: None,
            beta_range: None,
        }
    }
}

/// Backend selected by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// [`SimulatedAnnealer`].
    #[default]
    SimulatedAnnealing,
    /// [`ExactSolver`].
    Exact,
}

impl BackendKind {
    /// Instantiates the backend.
    pub fn backend(self) -> Box<dyn SolverBackend> {
        match self {
            BackendKind::SimulatedAnnealing => Box::new(SimulatedAnnealer::new()),
            BackendKind::Exact => Box::new(ExactSolver::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let c = SamplerConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.seed.is_none());
        assert!(c.time_budget.is_none());
    }

    #[test]
    fn test_invalid() {
        assert!(SamplerConfig::default().with_num_reads(0).validate().is_err());
        assert!(SamplerConfig::default().with_num_sweeps(0).validate().is_err());
        assert!(SamplerConfig::default()
            .with_beta_range(2.0, 1.0)
            .validate()
            .is_err());
        assert!(SamplerConfig::default()
            .with_beta_range(0.0, 1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_backend_kind() {
        assert_eq!(BackendKind::default().backend().name(), "simulated_annealing");
        assert_eq!(BackendKind::Exact.backend().name(), "exact");
    }

    #[test]
    fn test_config_from_json() {
        let c: SamplerConfig = serde_json::from_str(
            r#"{"num_reads":4,"num_sweeps":10,"seed":7,"time_budget":null,"beta_range":[0.1,3.0]}"#,
        )
        .unwrap();
        assert_eq!(c.num_reads, 4);
        assert_eq!(c.beta_range, Some((0.1, 3.0)));
    }
}
