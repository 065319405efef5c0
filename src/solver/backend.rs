//! Solving backend contract.

use crate::error::SolverError;
use crate::qubo::BinaryQuadraticModel;

use super::{SampleSet, SamplerConfig};

/// Anything that turns a [`BinaryQuadraticModel`] into ranked samples.
///
/// Implementations must not keep state between calls: the model is borrowed
/// immutably for the duration of one solve and concurrent solves never share
/// it. A remote sampler plugs in behind this same signature.
pub trait SolverBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Samples `bqm` and returns samples ranked by ascending energy.
    ///
    /// An exhausted time budget is not an error: the best-so-far samples come
    /// back with [`SampleSet::early_terminated`] set.
    fn solve(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, SolverError>;
}

impl<B: SolverBackend + ?Sized> SolverBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, SolverError> {
        (**self).solve(bqm, config)
    }
}
