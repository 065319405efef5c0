//! Samples and ranked sample sets.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::SolverError;
use crate::qubo::BinaryQuadraticModel;

/// One full 0/1 assignment with its energy.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Assignment in variable index order.
    pub bits: Vec<bool>,
    /// Objective value, lower is better.
    pub energy: f64,
    /// `true` iff every one-hot group has exactly one bit set.
    pub feasible: bool,
    /// How many reads ended in this assignment.
    pub num_occurrences: usize,
}

impl Sample {
    fn rank(&self, other: &Self) -> Ordering {
        self.energy
            .total_cmp(&other.energy)
            .then_with(|| self.bits.cmp(&other.bits))
    }
}

/// Samples ranked by ascending energy, ties broken by bit order.
///
/// Variables are indexed by ascending vehicle ID, so the tie-break is a
/// fixed lexicographic order over vehicles and does not depend on the order
/// in which parallel reads finished.
///
/// # Examples
///
/// ```
/// use u_corridor::qubo::{BinaryQuadraticModel, Variable};
/// use u_corridor::solver::SampleSet;
///
/// let vars = vec![Variable::new(0, 0), Variable::new(0, 1)];
/// let bqm = BinaryQuadraticModel::new(vars, vec![-1.0, -2.0], vec![(0, 1, 4.0)], 1.0).unwrap();
/// let set = SampleSet::from_reads(
///     &bqm,
///     vec![vec![true, false], vec![false, true], vec![false, true]],
///     3,
///     false,
/// )
/// .unwrap();
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.best().unwrap().bits, vec![false, true]);
/// assert_eq!(set.best().unwrap().num_occurrences, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    samples: Vec<Sample>,
    reads: usize,
    early_terminated: bool,
}

impl SampleSet {
    /// Aggregates raw assignments, evaluates them against `bqm` and ranks them.
    ///
    /// Fails with [`SolverError::SampleLength`] if any assignment does not
    /// have exactly one bit per model variable.
    pub fn from_reads(
        bqm: &BinaryQuadraticModel,
        reads: Vec<Vec<bool>>,
        num_reads: usize,
        early_terminated: bool,
    ) -> Result<Self, SolverError> {
        let expected = bqm.num_variables();
        if let Some(bad) = reads.iter().find(|bits| bits.len() != expected) {
            return Err(SolverError::SampleLength {
                expected,
                found: bad.len(),
            });
        }
        let mut counts: BTreeMap<Vec<bool>, usize> = BTreeMap::new();
        for bits in reads {
            *counts.entry(bits).or_insert(0) += 1;
        }
        let mut samples: Vec<Sample> = counts
            .into_iter()
            .map(|(bits, num_occurrences)| Sample {
                energy: bqm.energy(&bits),
                feasible: bqm.is_feasible(&bits),
                bits,
                num_occurrences,
            })
            .collect();
        samples.sort_by(Sample::rank);
        Ok(Self {
            samples,
            reads: num_reads,
            early_terminated,
        })
    }

    /// Lowest-energy sample.
    pub fn best(&self) -> Option<&Sample> {
        self.samples.first()
    }

    /// Lowest-energy sample satisfying every one-hot group.
    pub fn best_feasible(&self) -> Option<&Sample> {
        self.samples.iter().find(|s| s.feasible)
    }

    /// Ranked samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates ranked samples.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Number of distinct samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no sample was produced.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Reads (or enumerated states) behind this set.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// `true` if the time budget cut the solve short.
    pub fn early_terminated(&self) -> bool {
        self.early_terminated
    }

    /// Keeps only the `n` best samples.
    pub fn truncate(&mut self, n: usize) {
        self.samples.truncate(n);
    }
}
