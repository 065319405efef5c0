//! Simulated annealing over binary quadratic models.
//!
//! # Algorithm
//!
//! Each read starts from a uniformly random assignment and performs
//! `num_sweeps` sweeps over the variables under a geometric inverse
//! temperature schedule `β_0 = hot … β_{S−1} = cold`. Within a sweep every
//! variable is proposed for a flip once and accepted with the Metropolis rule
//!
//! ```text
//! P(accept) = 1                 if ΔE ≤ 0
//!           = exp(−β · ΔE)      otherwise
//! ```
//!
//! Local fields are maintained incrementally, so a flip costs O(deg(i)).
//! Each read returns the lowest-energy state it visited.
//!
//! When no range is configured, `hot = ln 2 / max_i ΔE_i` (the largest
//! possible move is accepted half the time) and `cold = ln 100 / min |coef|`
//! (the smallest move is accepted 1% of the time).
//!
//! # Parallelism
//!
//! Reads are independent and run on the rayon pool. Read `r` draws from a
//! ChaCha8 stream seeded by `(seed, r)` and results are collected in read
//! order, so a fixed seed reproduces the same sample set regardless of
//! scheduling.
//!
//! # Reference
//!
//! Kirkpatrick, S., Gelatt, C.D. & Vecchi, M.P. (1983). "Optimization by
//! Simulated Annealing", *Science* 220(4598), 671-680.

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument, warn};

use crate::error::SolverError;
use crate::qubo::BinaryQuadraticModel;

use super::{SampleSet, SamplerConfig, SolverBackend};

/// Classical simulated annealing backend.
///
/// # Examples
///
/// ```
/// use u_corridor::qubo::{BinaryQuadraticModel, Variable};
/// use u_corridor::solver::{SamplerConfig, SimulatedAnnealer, SolverBackend};
///
/// let vars = vec![Variable::new(0, 0), Variable::new(0, 1)];
/// let bqm = BinaryQuadraticModel::new(vars, vec![-1.0, -2.0], vec![(0, 1, 4.0)], 1.0).unwrap();
/// let config = SamplerConfig::default().with_num_reads(8).with_num_sweeps(50).with_seed(1);
///
/// let set = SimulatedAnnealer::new().solve(&bqm, &config).unwrap();
/// assert_eq!(set.best().unwrap().bits, vec![false, true]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedAnnealer;

impl SimulatedAnnealer {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

/// Derives `(hot, cold)` inverse temperatures from the model's coefficients.
pub fn default_beta_range(bqm: &BinaryQuadraticModel) -> (f64, f64) {
    let mut max_delta = 0.0_f64;
    let mut min_coef = f64::INFINITY;
    for i in 0..bqm.num_variables() {
        let h = bqm.linear(i).abs();
        let delta = h + bqm.neighbors(i).iter().map(|&(_, j)| j.abs()).sum::<f64>();
        max_delta = max_delta.max(delta);
        if h > 0.0 {
            min_coef = min_coef.min(h);
        }
    }
    for (_, _, j) in bqm.interactions() {
        min_coef = min_coef.min(j.abs());
    }

    if max_delta == 0.0 || !min_coef.is_finite() {
        return (0.1, 1.0);
    }
    let hot = std::f64::consts::LN_2 / max_delta;
    let cold = 100_f64.ln() / min_coef;
    (hot, cold.max(hot))
}

/// Geometric interpolation from `hot` to `cold` over `sweeps` steps.
pub fn geometric_schedule(hot: f64, cold: f64, sweeps: usize) -> Vec<f64> {
    if sweeps <= 1 {
        return vec![cold];
    }
    let ratio = (cold / hot).powf(1.0 / (sweeps - 1) as f64);
    let mut beta = hot;
    let mut schedule = Vec::with_capacity(sweeps);
    for _ in 0..sweeps {
        schedule.push(beta);
        beta *= ratio;
    }
    if let Some(last) = schedule.last_mut() {
        *last = cold;
    }
    schedule
}

fn make_read_rng(seed: u64, read: usize) -> ChaCha8Rng {
    let s = seed ^ ((read as u64).rotate_left(17)) ^ 0x9E37_79B1_85EB_CA87u64;
    ChaCha8Rng::seed_from_u64(s)
}

struct ReadOutcome {
    bits: Option<Vec<bool>>,
    interrupted: bool,
}

fn anneal_read(
    bqm: &BinaryQuadraticModel,
    schedule: &[f64],
    mut rng: ChaCha8Rng,
    deadline: Option<Instant>,
    mandatory: bool,
) -> ReadOutcome {
    let expired = || deadline.is_some_and(|d| Instant::now() >= d);
    if !mandatory && expired() {
        return ReadOutcome {
            bits: None,
            interrupted: true,
        };
    }

    let n = bqm.num_variables();
    let mut bits: Vec<bool> = (0..n).map(|_| rng.random::<bool>()).collect();
    let mut fields: Vec<f64> = (0..n).map(|i| bqm.local_field(&bits, i)).collect();
    let mut energy = bqm.energy(&bits);
    let mut best_energy = energy;
    let mut best = bits.clone();
    let mut interrupted = false;

    for &beta in schedule {
        if expired() {
            interrupted = true;
            break;
        }
        for i in 0..n {
            let delta = if bits[i] { -fields[i] } else { fields[i] };
            if delta > 0.0 && rng.random::<f64>() >= (-beta * delta).exp() {
                continue;
            }
            bits[i] = !bits[i];
            energy += delta;
            let sign = if bits[i] { 1.0 } else { -1.0 };
            for &(j, coupling) in bqm.neighbors(i) {
                fields[j] += sign * coupling;
            }
            if energy < best_energy {
                best_energy = energy;
                best.copy_from_slice(&bits);
            }
        }
    }

    ReadOutcome {
        bits: Some(best),
        interrupted,
    }
}

impl SolverBackend for SimulatedAnnealer {
    fn name(&self) -> &str {
        "simulated_annealing"
    }

    #[instrument(
        skip_all,
        fields(variables = bqm.num_variables(), reads = config.num_reads, sweeps = config.num_sweeps)
    )]
    fn solve(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, SolverError> {
        config.validate()?;
        if bqm.num_variables() == 0 {
            return Err(SolverError::EmptyModel);
        }

        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let (hot, cold) = config
            .beta_range
            .unwrap_or_else(|| default_beta_range(bqm));
        let schedule = geometric_schedule(hot, cold, config.num_sweeps);
        let deadline = config.time_budget.map(|budget| Instant::now() + budget);
        debug!(seed, hot, cold, "annealing");

        let outcomes: Vec<ReadOutcome> = (0..config.num_reads)
            .into_par_iter()
            .map(|r| anneal_read(bqm, &schedule, make_read_rng(seed, r), deadline, r == 0))
            .collect();

        let early_terminated = outcomes.iter().any(|o| o.interrupted);
        let reads: Vec<Vec<bool>> = outcomes.into_iter().filter_map(|o| o.bits).collect();
        if early_terminated {
            warn!(
                completed = reads.len(),
                requested = config.num_reads,
                "time budget exhausted, returning best-so-far samples"
            );
        }

        let num_reads = reads.len();
        let set = SampleSet::from_reads(bqm, reads, num_reads, early_terminated)?;
        if let Some(best) = set.best() {
            debug!(energy = best.energy, feasible = best.feasible, distinct = set.len(), "annealing done");
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::qubo::Variable;

    /// Two vehicles, two routes each; route 0 of both collide.
    fn small() -> BinaryQuadraticModel {
        let vars = vec![
            Variable::new(0, 0),
            Variable::new(0, 1),
            Variable::new(1, 0),
            Variable::new(1, 1),
        ];
        let lambda = 20.0;
        BinaryQuadraticModel::new(
            vars,
            vec![1.0 - lambda, 2.0 - lambda, 1.0 - lambda, 3.0 - lambda],
            vec![(0, 1, 2.0 * lambda), (2, 3, 2.0 * lambda), (0, 2, 5.0)],
            2.0 * lambda,
        )
        .unwrap()
    }

    fn config() -> SamplerConfig {
        SamplerConfig::default()
            .with_num_reads(16)
            .with_num_sweeps(200)
            .with_seed(7)
    }

    #[test]
    fn test_finds_optimum() {
        let set = SimulatedAnnealer::new().solve(&small(), &config()).unwrap();
        let best = set.best().unwrap();
        // (0,1) + (1,0) = 2 + 1 beats (0,0) + (1,1) = 1 + 3 and the colliding pair
        assert_eq!(best.bits, vec![false, true, true, false]);
        assert!((best.energy - 3.0).abs() < 1e-9);
        assert!(best.feasible);
        assert_eq!(set.reads(), 16);
        assert!(!set.early_terminated());
    }

    #[test]
    fn test_seeded_determinism() {
        let a = SimulatedAnnealer::new().solve(&small(), &config()).unwrap();
        let b = SimulatedAnnealer::new().solve(&small(), &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ranked_ascending() {
        let cfg = config().with_num_sweeps(1).with_beta_range(0.001, 0.001);
        let set = SimulatedAnnealer::new().solve(&small(), &cfg).unwrap();
        for w in set.samples().windows(2) {
            assert!(w[0].energy <= w[1].energy);
        }
        let total: usize = set.iter().map(|s| s.num_occurrences).sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn test_zero_budget_returns_best_so_far() {
        let cfg = config().with_time_budget(Duration::ZERO);
        let set = SimulatedAnnealer::new().solve(&small(), &cfg).unwrap();
        assert!(set.early_terminated());
        assert!(!set.is_empty());
        assert!(set.reads() >= 1);
    }

    #[test]
    fn test_empty_model() {
        let bqm = BinaryQuadraticModel::new(vec![], vec![], vec![], 0.0).unwrap();
        assert_eq!(
            SimulatedAnnealer::new().solve(&bqm, &config()),
            Err(SolverError::EmptyModel)
        );
    }

    #[test]
    fn test_schedule() {
        let s = geometric_schedule(0.1, 10.0, 3);
        assert_eq!(s.len(), 3);
        assert!((s[0] - 0.1).abs() < 1e-12);
        assert!((s[1] - 1.0).abs() < 1e-9);
        assert_eq!(s[2], 10.0);
        assert_eq!(geometric_schedule(0.1, 10.0, 1), vec![10.0]);
    }

    #[test]
    fn test_default_beta_range() {
        let (hot, cold) = default_beta_range(&small());
        assert!(hot > 0.0 && hot <= cold);
        let flat = BinaryQuadraticModel::new(vec![Variable::new(0, 0)], vec![0.0], vec![], 0.0).unwrap();
        assert_eq!(default_beta_range(&flat), (0.1, 1.0));
    }
}
