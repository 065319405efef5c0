//! Sample validation, decoding and penalty escalation.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{CorridorError, SolverError};
use crate::models::OneHotViolation;
use crate::qubo::{BinaryQuadraticModel, QuboBuilder, Variable};
use crate::solver::{SampleSet, SamplerConfig, SolverBackend};

/// Bounded λ escalation applied when no feasible sample is found.
///
/// # Examples
///
/// ```
/// use u_corridor::decoder::RetryPolicy;
///
/// let p = RetryPolicy::default().with_max_retries(5).with_lambda_growth(3.0);
/// assert_eq!(p.lambda_after(100.0, 2), 900.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Re-solves after the first attempt.
    pub max_retries: usize,
    /// Factor applied to λ before each re-solve.
    pub lambda_growth: f64,
}

impl RetryPolicy {
    /// Sets the retry bound.
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the geometric growth factor.
    pub fn with_lambda_growth(mut self, growth: f64) -> Self {
        self.lambda_growth = growth;
        self
    }

    /// λ used on attempt `attempt` (0 = initial).
    pub fn lambda_after(&self, initial: f64, attempt: usize) -> f64 {
        initial * self.lambda_growth.powi(attempt as i32)
    }

    /// Requires a growth factor above 1.
    pub fn validate(&self) -> Result<(), CorridorError> {
        if !(self.lambda_growth.is_finite() && self.lambda_growth > 1.0) {
            return Err(CorridorError::InvalidConfiguration(format!(
                "lambda_growth = {} must be finite and > 1",
                self.lambda_growth
            )));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            lambda_growth: 2.0,
        }
    }
}

/// A sample translated back into per-vehicle route choices.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Variables set to 1, ascending.
    pub selection: Vec<Variable>,
    /// Sample energy.
    pub energy: f64,
    /// `true` iff `violations` is empty.
    pub feasible: bool,
    /// Vehicles not having exactly one route selected.
    pub violations: Vec<OneHotViolation>,
}

impl Decoded {
    /// Route index chosen for `vehicle_id`, if exactly one was selected.
    pub fn route_of(&self, vehicle_id: usize) -> Option<usize> {
        let mut chosen = self
            .selection
            .iter()
            .filter(|v| v.vehicle_id == vehicle_id)
            .map(|v| v.route_index);
        match (chosen.next(), chosen.next()) {
            (Some(r), None) => Some(r),
            _ => None,
        }
    }
}

/// Result of a solve-decode loop with λ escalation.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    /// Decoded best sample of the last attempt.
    pub decoded: Decoded,
    /// λ of the last attempt.
    pub lambda: f64,
    /// Attempts made (1 + retries used).
    pub attempts: usize,
    /// `true` if any attempt stopped on its time budget.
    pub early_terminated: bool,
}

/// Turns ranked samples into route choices.
///
/// Always decodes the lowest-energy sample. An infeasible top sample is
/// never repaired or swapped for a feasible runner-up: it is decoded as-is
/// with its one-hot violations, and escalation raises λ instead.
///
/// # Examples
///
/// ```
/// use u_corridor::decoder::SolutionDecoder;
/// use u_corridor::qubo::{BinaryQuadraticModel, Variable};
/// use u_corridor::solver::SampleSet;
///
/// let vars = vec![Variable::new(0, 0), Variable::new(0, 1)];
/// let bqm = BinaryQuadraticModel::new(vars, vec![-1.0, -2.0], vec![(0, 1, 4.0)], 1.0).unwrap();
/// let set = SampleSet::from_reads(&bqm, vec![vec![false, true]], 1, false).unwrap();
///
/// let decoded = SolutionDecoder::new().decode(&bqm, &set).unwrap();
/// assert!(decoded.feasible);
/// assert_eq!(decoded.route_of(0), Some(1));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SolutionDecoder;

impl SolutionDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decodes the top sample with its violations. `None` for an empty set.
    pub fn decode(&self, bqm: &BinaryQuadraticModel, samples: &SampleSet) -> Option<Decoded> {
        let sample = samples.best()?;
        let violations = bqm.violations(&sample.bits);
        Some(Decoded {
            selection: bqm.selected(&sample.bits),
            energy: sample.energy,
            feasible: violations.is_empty(),
            violations,
        })
    }

    /// Builds, solves and decodes, raising λ geometrically while infeasible.
    ///
    /// Stops at the first feasible decode or after `policy.max_retries`
    /// re-solves, returning the last attempt either way.
    #[instrument(skip_all, fields(backend = backend.name(), vehicles = builder.requests().len()))]
    pub fn solve_with_escalation<B>(
        &self,
        builder: &QuboBuilder<'_>,
        backend: &B,
        sampler: &SamplerConfig,
        policy: &RetryPolicy,
    ) -> Result<PhaseOutcome, CorridorError>
    where
        B: SolverBackend + ?Sized,
    {
        policy.validate()?;
        let initial = builder.penalties().lambda;
        let mut early_terminated = false;
        let mut attempt = 0;

        loop {
            let lambda = policy.lambda_after(initial, attempt);
            let bqm = builder.clone().with_lambda(lambda).build()?;
            let samples = backend.solve(&bqm, sampler)?;
            early_terminated |= samples.early_terminated();

            let decoded = self.decode(&bqm, &samples).ok_or_else(|| {
                CorridorError::Solver(SolverError::InvalidConfig(
                    "backend returned no samples".to_string(),
                ))
            })?;
            debug!(attempt, lambda, energy = decoded.energy, feasible = decoded.feasible, "decoded");

            if decoded.feasible || attempt >= policy.max_retries {
                if !decoded.feasible {
                    warn!(
                        attempts = attempt + 1,
                        violations = decoded.violations.len(),
                        "no feasible sample after penalty escalation"
                    );
                }
                return Ok(PhaseOutcome {
                    decoded,
                    lambda,
                    attempts: attempt + 1,
                    early_terminated,
                });
            }

            warn!(
                attempt,
                lambda,
                next = policy.lambda_after(initial, attempt + 1),
                "infeasible sample, raising lambda"
            );
            attempt += 1;
        }
    }
}
