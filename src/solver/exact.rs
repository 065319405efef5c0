//! Exhaustive enumeration backend.
//!
//! # Algorithm
//!
//! Walks all 2ⁿ assignments in reflected Gray code order, so consecutive
//! states differ by one bit and each energy follows from the previous one in
//! O(deg(i)). The `num_reads` lowest-energy states are kept.
//!
//! # Complexity
//!
//! O(2ⁿ · d̄) time for average degree d̄; limited to
//! [`ExactSolver::MAX_VARIABLES`] variables.

use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::error::SolverError;
use crate::qubo::BinaryQuadraticModel;

use super::{SampleSet, SamplerConfig, SolverBackend};

/// Ground-truth backend for small models.
///
/// Ignores `seed`, `num_sweeps` and `beta_range`; honours `num_reads` (how
/// many of the best states to return) and `time_budget`.
///
/// # Examples
///
/// ```
/// use u_corridor::qubo::{BinaryQuadraticModel, Variable};
/// use u_corridor::solver::{ExactSolver, SamplerConfig, SolverBackend};
///
/// let vars = vec![Variable::new(0, 0), Variable::new(0, 1)];
/// let bqm = BinaryQuadraticModel::new(vars, vec![-1.0, -2.0], vec![(0, 1, 4.0)], 1.0).unwrap();
///
/// let set = ExactSolver::new().solve(&bqm, &SamplerConfig::default().with_num_reads(4)).unwrap();
/// assert_eq!(set.len(), 4);
/// assert_eq!(set.best().unwrap().energy, -1.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

impl ExactSolver {
    /// Largest model the enumerator accepts.
    pub const MAX_VARIABLES: usize = 24;

    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

/// Relative slack on the admission threshold for the running energy.
const DRIFT_TOLERANCE: f64 = 1e-9;

fn prune(kept: &mut Vec<(f64, Vec<bool>)>, k: usize) {
    kept.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    kept.truncate(k);
}

impl SolverBackend for ExactSolver {
    fn name(&self) -> &str {
        "exact"
    }

    #[instrument(skip_all, fields(variables = bqm.num_variables(), keep = config.num_reads))]
    fn solve(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, SolverError> {
        config.validate()?;
        let n = bqm.num_variables();
        if n == 0 {
            return Err(SolverError::EmptyModel);
        }
        if n > Self::MAX_VARIABLES {
            return Err(SolverError::ModelTooLarge {
                variables: n,
                limit: Self::MAX_VARIABLES,
            });
        }

        let k = config.num_reads;
        let deadline = config.time_budget.map(|budget| Instant::now() + budget);
        let total: u64 = 1 << n;

        let mut bits = vec![false; n];
        let mut energy = bqm.offset();
        let mut kept = vec![(energy, bits.clone())];
        let mut threshold = f64::INFINITY;
        let mut visited: u64 = 1;
        let mut early_terminated = false;

        for step in 1..total {
            if step % 4096 == 0 && deadline.is_some_and(|d| Instant::now() >= d) {
                early_terminated = true;
                break;
            }
            let i = step.trailing_zeros() as usize;
            energy += bqm.flip_delta(&bits, i);
            bits[i] = !bits[i];
            visited += 1;

            let slack = DRIFT_TOLERANCE * (1.0 + threshold.abs());
            if kept.len() < k || energy <= threshold + slack {
                // the running sum drifts over 2^n flips; rank on the exact value
                energy = bqm.energy(&bits);
                if kept.len() >= k && energy > threshold {
                    continue;
                }
                kept.push((energy, bits.clone()));
                if kept.len() >= 2 * k {
                    prune(&mut kept, k);
                    threshold = kept.last().map_or(f64::INFINITY, |e| e.0);
                }
            }
        }
        prune(&mut kept, k);

        if early_terminated {
            warn!(visited, total, "time budget exhausted during enumeration");
        }
        let reads = kept.into_iter().map(|(_, b)| b).collect();
        let set = SampleSet::from_reads(bqm, reads, visited as usize, early_terminated)?;
        debug!(visited, best = ?set.best().map(|s| s.energy), "enumeration done");
        Ok(set)
    }
}
