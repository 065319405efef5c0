//! Request lifecycle and outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{ExcludedVehicle, Solution};

/// Lifecycle of one optimization request.
///
/// ```text
/// Unsolved ──► EmergencySolved ──► RegularSolved ──► Finalized
///     │               │                  │
///     └───────────────┴──────────────────┴──────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationState {
    /// Inputs accepted, nothing solved yet.
    Unsolved,
    /// Emergency phase solved and corridor locked.
    EmergencySolved,
    /// Regular phase solved around the corridor.
    RegularSolved,
    /// Feasible solution delivered.
    Finalized,
    /// Nothing to optimize, or no feasible sample after escalation.
    Failed,
}

impl OptimizationState {
    /// Returns `true` if `next` is a legal successor.
    pub fn can_transition_to(self, next: OptimizationState) -> bool {
        use OptimizationState::*;
        matches!(
            (self, next),
            (Unsolved, EmergencySolved)
                | (EmergencySolved, RegularSolved)
                | (RegularSolved, Finalized)
                | (Unsolved | EmergencySolved | RegularSolved, Failed)
        )
    }

    /// Returns `true` for `Finalized` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, OptimizationState::Finalized | OptimizationState::Failed)
    }
}

impl fmt::Display for OptimizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptimizationState::Unsolved => "unsolved",
            OptimizationState::EmergencySolved => "emergency_solved",
            OptimizationState::RegularSolved => "regular_solved",
            OptimizationState::Finalized => "finalized",
            OptimizationState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The two sequential solves of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Emergency vehicles only.
    Emergency,
    /// Regular vehicles around the locked corridor.
    Regular,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Emergency => f.write_str("emergency"),
            Phase::Regular => f.write_str("regular"),
        }
    }
}

/// Per-phase solve statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    /// Which phase.
    pub phase: Phase,
    /// Vehicles in the phase.
    pub vehicles: usize,
    /// Variables in the last model built.
    pub variables: usize,
    /// λ of the last attempt.
    pub lambda: f64,
    /// Solve attempts, including escalations.
    pub attempts: usize,
    /// Energy of the decoded sample.
    pub energy: f64,
    /// Whether the decoded sample satisfied one-hot.
    pub feasible: bool,
    /// Whether a solve hit its time budget.
    pub early_terminated: bool,
}

/// Full outcome of [`CorridorOptimizer::optimize`](super::CorridorOptimizer::optimize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Route assignment, best effort when `state` is `Failed`.
    pub solution: Solution,
    /// Terminal state reached.
    pub state: OptimizationState,
    /// Vehicles left out for lack of candidate routes.
    pub excluded: Vec<ExcludedVehicle>,
    /// Phases that ran, in order.
    pub phases: Vec<PhaseSummary>,
}

impl OptimizationReport {
    pub(crate) fn new(excluded: Vec<ExcludedVehicle>) -> Self {
        Self {
            solution: Solution::new(),
            state: OptimizationState::Unsolved,
            excluded,
            phases: Vec::new(),
        }
    }

    pub(crate) fn advance(&mut self, next: OptimizationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    /// Returns `true` if the request reached `Finalized`.
    pub fn is_finalized(&self) -> bool {
        self.state == OptimizationState::Finalized
    }

    /// Total solve attempts across phases.
    pub fn total_attempts(&self) -> usize {
        self.phases.iter().map(|p| p.attempts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::OptimizationState::*;

    #[test]
    fn test_transitions() {
        assert!(Unsolved.can_transition_to(EmergencySolved));
        assert!(EmergencySolved.can_transition_to(RegularSolved));
        assert!(RegularSolved.can_transition_to(Finalized));
        for s in [Unsolved, EmergencySolved, RegularSolved] {
            assert!(s.can_transition_to(Failed));
            assert!(!s.is_terminal());
        }
        assert!(!Unsolved.can_transition_to(RegularSolved));
        assert!(!Finalized.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Unsolved));
        assert!(Finalized.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn test_report_advance() {
        let mut r = OptimizationReport::new(Vec::new());
        assert_eq!(r.state, Unsolved);
        r.advance(EmergencySolved);
        r.advance(RegularSolved);
        r.advance(Finalized);
        assert!(r.is_finalized());
        assert_eq!(r.total_attempts(), 0);
        assert_eq!(Finalized.to_string(), "finalized");
        assert_eq!(Phase::Regular.to_string(), "regular");
    }
}
