//! Two-phase corridor optimization.
//!
//! # Pipeline
//!
//! 1. Reject empty or duplicate vehicle sets and invalid configuration.
//! 2. Exclude vehicles without candidates (reported on the
//!    [`OptimizationReport`]).
//! 3. **Emergency phase**: build and solve a QUBO over emergency vehicles
//!    only; the edges of their selected routes become the [`Corridor`].
//! 4. **Regular phase**: build and solve a QUBO over regular vehicles with
//!    the corridor term active.
//! 5. Assemble the [`Solution`]: objective is the sum of phase energies,
//!    feasibility and early termination are combined across phases.
//!
//! Each phase escalates λ on infeasible results through
//! [`SolutionDecoder::solve_with_escalation`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, info_span, instrument, warn};

use crate::decoder::{PhaseOutcome, SolutionDecoder};
use crate::error::CorridorError;
use crate::models::{
    CandidateRoute, CandidateRouteProvider, ExcludedVehicle, RouteAssignment, Solution, Vehicle,
    VehicleRequest,
};
use crate::priority::PriorityScorer;
use crate::qubo::{Corridor, QuboBuilder};
use crate::solver::SolverBackend;

use super::{OptimizationReport, OptimizationState, OptimizerConfig, Phase, PhaseSummary};

/// Priority-aware route assignment with emergency green corridors.
///
/// # Examples
///
/// ```
/// use u_corridor::models::{CandidateRoute, Vehicle, VehicleRequest};
/// use u_corridor::optimizer::{CorridorOptimizer, OptimizerConfig, OptimizationState};
/// use u_corridor::solver::SamplerConfig;
///
/// let requests = vec![
///     VehicleRequest::new(
///         Vehicle::emergency(0),
///         vec![CandidateRoute::from_nodes(0, 0, &[1, 2, 3], 4.0)],
///     ),
///     VehicleRequest::new(
///         Vehicle::regular(1),
///         vec![
///             CandidateRoute::from_nodes(1, 0, &[1, 2, 3], 4.0),
///             CandidateRoute::from_nodes(1, 1, &[1, 5, 3], 6.0),
///         ],
///     ),
/// ];
/// let config = OptimizerConfig::default()
///     .with_sampler(SamplerConfig::default().with_seed(42).with_num_sweeps(200));
///
/// let report = CorridorOptimizer::new(config).unwrap().optimize(&requests).unwrap();
/// assert_eq!(report.state, OptimizationState::Finalized);
/// assert_eq!(report.solution.assignment(1).unwrap().route_index, 1);
/// ```
pub struct CorridorOptimizer {
    config: OptimizerConfig,
    scorer: PriorityScorer,
    backend: Box<dyn SolverBackend>,
    decoder: SolutionDecoder,
}

impl std::fmt::Debug for CorridorOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorridorOptimizer")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl CorridorOptimizer {
    /// Validates `config` and instantiates its backend.
    pub fn new(config: OptimizerConfig) -> Result<Self, CorridorError> {
        config.validate()?;
        let scorer = PriorityScorer::new(config.priorities)?;
        let backend = config.backend.backend();
        Ok(Self {
            config,
            scorer,
            backend,
            decoder: SolutionDecoder::new(),
        })
    }

    /// Replaces the configured backend, e.g. with a remote sampler.
    pub fn with_backend(mut self, backend: Box<dyn SolverBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Fetches `k` candidates per vehicle from `provider`, then optimizes.
    ///
    /// Vehicles the provider cannot route ([`CorridorError::NoRouteFound`])
    /// are excluded and reported; any other provider error aborts.
    pub fn plan<P>(
        &self,
        provider: &P,
        vehicles: &[Vehicle],
        k: usize,
    ) -> Result<OptimizationReport, CorridorError>
    where
        P: CandidateRouteProvider + ?Sized,
    {
        if k == 0 {
            return Err(CorridorError::InvalidConfiguration(
                "k must be positive".to_string(),
            ));
        }
        let mut requests = Vec::with_capacity(vehicles.len());
        let mut reasons = HashMap::new();
        for vehicle in vehicles {
            match VehicleRequest::from_provider(vehicle.clone(), provider, k) {
                Ok(request) => requests.push(request),
                Err(err @ CorridorError::NoRouteFound { .. }) => {
                    warn!(vehicle = vehicle.id(), error = %err, "provider returned no route");
                    requests.push(VehicleRequest::new(vehicle.clone(), Vec::new()));
                    reasons.insert(vehicle.id(), err);
                }
                Err(err) => return Err(err),
            }
        }
        self.optimize_with_reasons(&requests, reasons)
    }

    /// Runs both phases over `requests`.
    ///
    /// Returns `Err` only for invalid input or configuration and backend
    /// refusals. Infeasibility and time-budget expiry are reported on the
    /// returned [`Solution`].
    pub fn optimize(&self, requests: &[VehicleRequest]) -> Result<OptimizationReport, CorridorError> {
        self.optimize_with_reasons(requests, HashMap::new())
    }

    /// [`optimize`](Self::optimize), with provider errors keyed by vehicle ID
    /// for vehicles that arrive without candidates.
    #[instrument(skip_all, fields(vehicles = requests.len(), backend = self.backend.name()))]
    fn optimize_with_reasons(
        &self,
        requests: &[VehicleRequest],
        mut reasons: HashMap<usize, CorridorError>,
    ) -> Result<OptimizationReport, CorridorError> {
        if requests.is_empty() {
            return Err(CorridorError::InvalidConfiguration(
                "empty vehicle set".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = requests.iter().find(|r| !seen.insert(r.vehicle.id())) {
            return Err(CorridorError::InvalidConfiguration(format!(
                "duplicate vehicle id {}",
                dup.vehicle.id()
            )));
        }

        let (active, empty): (Vec<&VehicleRequest>, Vec<&VehicleRequest>) =
            requests.iter().partition(|r| !r.candidates.is_empty());
        let excluded: Vec<ExcludedVehicle> = empty
            .iter()
            .map(|r| {
                warn!(vehicle = r.vehicle.id(), "no candidate routes, excluding vehicle");
                match reasons.remove(&r.vehicle.id()) {
                    Some(reason) => ExcludedVehicle::new(&r.vehicle, reason),
                    None => ExcludedVehicle::without_candidates(&r.vehicle),
                }
            })
            .collect();

        let mut report = OptimizationReport::new(excluded);
        if active.is_empty() {
            warn!("every vehicle was excluded");
            report.solution.feasible = false;
            report.advance(OptimizationState::Failed);
            return Ok(report);
        }
        QuboBuilder::new(active.iter().copied(), self.scorer, self.config.penalties).validate()?;

        let (emergency, regular): (Vec<&VehicleRequest>, Vec<&VehicleRequest>) =
            active.into_iter().partition(|r| r.vehicle.is_emergency());
        let mut assignments = Vec::with_capacity(emergency.len() + regular.len());
        let mut violations = Vec::new();

        let corridor = match self.run_phase(Phase::Emergency, &emergency, None, &mut report)? {
            Some(outcome) => {
                let routes = selected_routes(&emergency, &outcome);
                let corridor = Corridor::from_routes(routes.iter().map(|(_, r)| *r));
                for (req, route) in routes {
                    if outcome.decoded.route_of(req.vehicle.id()).is_some() {
                        assignments.push(assignment(req, route));
                    }
                }
                violations.extend(outcome.decoded.violations);
                corridor
            }
            None => Corridor::new(),
        };
        debug!(edges = corridor.len(), "corridor locked");
        report.advance(OptimizationState::EmergencySolved);

        if let Some(outcome) = self.run_phase(Phase::Regular, &regular, Some(&corridor), &mut report)? {
            for (req, route) in selected_routes(&regular, &outcome) {
                if outcome.decoded.route_of(req.vehicle.id()).is_some() {
                    assignments
                        .push(assignment(req, route).with_corridor_overlap(corridor.overlap(route)));
                }
            }
            violations.extend(outcome.decoded.violations);
        }
        report.advance(OptimizationState::RegularSolved);

        assignments.sort_by_key(|a| a.vehicle_id);
        violations.sort_by_key(|v| v.vehicle_id);
        let solution = Solution {
            assignments,
            objective: report.phases.iter().map(|p| p.energy).sum(),
            corridor: corridor.edges().iter().copied().collect(),
            feasible: violations.is_empty(),
            violations,
            early_terminated: report.phases.iter().any(|p| p.early_terminated),
        };

        let terminal = if solution.feasible {
            OptimizationState::Finalized
        } else {
            warn!(violations = solution.violations.len(), "returning infeasible best-effort solution");
            OptimizationState::Failed
        };
        report.solution = solution;
        report.advance(terminal);
        Ok(report)
    }

    /// Solves one phase; `None` when the phase has no vehicles.
    fn run_phase(
        &self,
        phase: Phase,
        requests: &[&VehicleRequest],
        corridor: Option<&Corridor>,
        report: &mut OptimizationReport,
    ) -> Result<Option<PhaseOutcome>, CorridorError> {
        if requests.is_empty() {
            debug!(%phase, "no vehicles, skipping phase");
            return Ok(None);
        }
        let span = info_span!("phase", %phase, vehicles = requests.len());
        let _guard = span.enter();

        let mut builder = QuboBuilder::new(requests.iter().copied(), self.scorer, self.config.penalties);
        if let Some(corridor) = corridor {
            builder = builder.with_corridor(corridor);
        }
        if !builder.lambda_dominates() {
            warn!(
                lambda = self.config.penalties.lambda,
                required = builder.dominant_lambda(),
                "lambda does not dominate route costs, one-hot violations may be favourable"
            );
        }

        let outcome = self.decoder.solve_with_escalation(
            &builder,
            self.backend.as_ref(),
            &self.config.sampler,
            &self.config.retry,
        )?;
        let variables = requests.iter().map(|r| r.candidates.len()).sum();
        report.phases.push(PhaseSummary {
            phase,
            vehicles: requests.len(),
            variables,
            lambda: outcome.lambda,
            attempts: outcome.attempts,
            energy: outcome.decoded.energy,
            feasible: outcome.decoded.feasible,
            early_terminated: outcome.early_terminated,
        });
        debug!(
            energy = outcome.decoded.energy,
            feasible = outcome.decoded.feasible,
            attempts = outcome.attempts,
            "phase solved"
        );
        Ok(Some(outcome))
    }
}

/// Cheapest candidate of `request`, lowest index on ties.
fn shortest_candidate(request: &VehicleRequest) -> Option<&CandidateRoute> {
    request.candidates.iter().min_by(|a, b| {
        a.base_cost()
            .total_cmp(&b.base_cost())
            .then_with(|| a.index().cmp(&b.index()))
    })
}

fn assignment(request: &VehicleRequest, route: &CandidateRoute) -> RouteAssignment {
    let chosen = RouteAssignment::new(request.vehicle.vehicle_type(), route);
    match shortest_candidate(request) {
        Some(shortest) => chosen.with_baseline(shortest),
        None => chosen,
    }
}

/// Pairs every selected variable of `outcome` with its request and route.
fn selected_routes<'r>(
    requests: &[&'r VehicleRequest],
    outcome: &PhaseOutcome,
) -> Vec<(&'r VehicleRequest, &'r CandidateRoute)> {
    let by_id: HashMap<usize, &'r VehicleRequest> =
        requests.iter().map(|&r| (r.vehicle.id(), r)).collect();
    outcome
        .decoded
        .selection
        .iter()
        .filter_map(|v| {
            let req = *by_id.get(&v.vehicle_id)?;
            let route = req.candidates.iter().find(|c| c.index() == v.route_index)?;
            Some((req, route))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::RetryPolicy;
    use crate::models::{Edge, StaticCandidates};
    use crate::qubo::PenaltyConfig;
    use crate::solver::{BackendKind, SamplerConfig};

    fn exact() -> CorridorOptimizer {
        CorridorOptimizer::new(OptimizerConfig::default().with_backend(BackendKind::Exact)).unwrap()
    }

    fn route(v: usize, i: usize, nodes: &[u64], cost: f64) -> CandidateRoute {
        CandidateRoute::from_nodes(v, i, nodes, cost)
    }

    #[test]
    fn test_corridor_diverts_regular_vehicle() {
        let reqs = vec![
            VehicleRequest::new(
                Vehicle::emergency(0),
                vec![route(0, 0, &[1, 2, 3], 5.0), route(0, 1, &[1, 4, 3], 9.0)],
            ),
            VehicleRequest::new(
                Vehicle::regular(1),
                vec![route(1, 0, &[2, 3, 6], 4.0), route(1, 1, &[2, 7, 6], 7.0)],
            ),
        ];
        let report = exact().optimize(&reqs).unwrap();
        assert_eq!(report.state, OptimizationState::Finalized);
        let sol = &report.solution;
        assert!(sol.feasible);
        assert_eq!(sol.assignment(0).unwrap().route_index, 0);
        assert!(sol.assignment(0).unwrap().in_corridor);
        assert_eq!(sol.assignment(1).unwrap().route_index, 1);
        assert_eq!(sol.assignment(1).unwrap().corridor_overlap, 0);
        assert_eq!(sol.corridor, vec![Edge::new(1, 2), Edge::new(2, 3)]);
        // 5·5 for the emergency route, 7·1 for the detour
        assert!((sol.objective - 32.0).abs() < 1e-9);
        assert!(!sol.assignment(0).unwrap().is_detour());
        assert_eq!(sol.assignment(1).unwrap().shortest_index, 0);
        assert!((sol.assignment(1).unwrap().detour_cost - 3.0).abs() < 1e-9);
        assert!((sol.total_detour_cost() - 3.0).abs() < 1e-9);
        assert_eq!(report.phases.len(), 2);
        assert_eq!(report.phases[0].phase, Phase::Emergency);
    }

    #[test]
    fn test_baseline_uses_cheapest_candidate() {
        // candidates listed out of cost order
        let reqs = vec![VehicleRequest::new(
            Vehicle::regular(2),
            vec![route(2, 0, &[1, 5, 3], 9.0), route(2, 1, &[1, 2, 3], 6.0)],
        )];
        let report = exact().optimize(&reqs).unwrap();
        let a = report.solution.assignment(2).unwrap();
        assert_eq!(a.route_index, 1);
        assert_eq!(a.shortest_index, 1);
        assert_eq!(a.detour_cost, 0.0);
    }

    #[test]
    fn test_regular_only_skips_emergency_phase() {
        let reqs = vec![VehicleRequest::new(
            Vehicle::regular(3),
            vec![route(3, 0, &[1, 2], 2.0)],
        )];
        let report = exact().optimize(&reqs).unwrap();
        assert!(report.is_finalized());
        assert_eq!(report.phases.len(), 1);
        assert_eq!(report.phases[0].phase, Phase::Regular);
        assert!(report.solution.corridor.is_empty());
    }

    #[test]
    fn test_input_errors() {
        let opt = exact();
        assert!(matches!(
            opt.optimize(&[]),
            Err(CorridorError::InvalidConfiguration(_))
        ));
        let dup = vec![
            VehicleRequest::new(Vehicle::regular(0), vec![route(0, 0, &[1, 2], 1.0)]),
            VehicleRequest::new(Vehicle::emergency(0), vec![route(0, 0, &[1, 2], 1.0)]),
        ];
        assert!(matches!(
            opt.optimize(&dup),
            Err(CorridorError::InvalidConfiguration(_))
        ));
        let bad = OptimizerConfig::default().with_penalties(PenaltyConfig::default().with_lambda(0.0));
        assert!(CorridorOptimizer::new(bad).is_err());
    }

    #[test]
    fn test_all_excluded_fails() {
        let reqs = vec![VehicleRequest::new(Vehicle::regular(0), vec![])];
        let report = exact().optimize(&reqs).unwrap();
        assert_eq!(report.state, OptimizationState::Failed);
        assert_eq!(report.excluded.len(), 1);
        assert!(matches!(
            report.excluded[0].reason,
            CorridorError::InvalidConfiguration(_)
        ));
        assert!(!report.solution.feasible);
        assert!(report.phases.is_empty());
    }

    #[test]
    fn test_infeasible_after_retries() {
        let reqs = vec![VehicleRequest::new(
            Vehicle::regular(0),
            vec![route(0, 0, &[1, 2], 100.0)],
        )];
        let config = OptimizerConfig::default()
            .with_backend(BackendKind::Exact)
            .with_penalties(PenaltyConfig::default().with_lambda(1.0))
            .with_retry(RetryPolicy::default().with_max_retries(1));
        let report = CorridorOptimizer::new(config).unwrap().optimize(&reqs).unwrap();
        assert_eq!(report.state, OptimizationState::Failed);
        assert!(!report.solution.feasible);
        assert_eq!(report.solution.violations.len(), 1);
        assert!(report.solution.assignments.is_empty());
        assert_eq!(report.total_attempts(), 2);
    }

    #[test]
    fn test_plan_excludes_unroutable() {
        let mut provider = StaticCandidates::new();
        provider.insert(1, 3, vec![1, 2, 3], 3.0);
        provider.insert(1, 3, vec![1, 4, 3], 4.0);
        let vehicles = vec![
            Vehicle::emergency(0).with_endpoints(1, 3),
            Vehicle::regular(1).with_endpoints(9, 8),
        ];
        let report = exact().plan(&provider, &vehicles, 3).unwrap();
        assert!(report.is_finalized());
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].vehicle_id, 1);
        assert_eq!(report.excluded[0].origin, Some(9));
        assert_eq!(
            report.excluded[0].reason,
            CorridorError::NoRouteFound {
                vehicle_id: 1,
                origin: 9,
                destination: 8
            }
        );
        assert_eq!(report.solution.num_assigned(), 1);
        assert!(exact().plan(&provider, &vehicles, 0).is_err());
    }

    #[test]
    fn test_custom_backend() {
        let opt = CorridorOptimizer::new(OptimizerConfig::default())
            .unwrap()
            .with_backend(BackendKind::Exact.backend());
        assert_eq!(opt.backend_name(), "exact");
        let annealing = CorridorOptimizer::new(
            OptimizerConfig::default().with_sampler(SamplerConfig::default().with_seed(1)),
        )
        .unwrap();
        assert_eq!(annealing.backend_name(), "simulated_annealing");
    }
}
