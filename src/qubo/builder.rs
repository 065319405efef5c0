//! QUBO construction for priority-aware route selection.
//!
//! # Formulation
//!
//! One binary variable `x_{v,r}` per (vehicle, candidate) pair. With
//! priority weight `w_v` and one-hot strength `p_v = λ·w_v`:
//!
//! ```text
//! E(x) = Σ_{v,r} w_v·cost_r·κ·κ_r · x_{v,r}                (route cost)
//!      + Σ_v p_v·(Σ_r x_{v,r} − 1)²                          (one-hot)
//!      + μ · Σ_{(a,b) conflicting} c(a,b) · x_a·x_b          (overlap)
//!      + Σ_{v,r} λ·w_v·(1 − (1−ρ)^|r ∩ corridor|) · x_{v,r}  (corridor)
//! ```
//!
//! Expanding the one-hot square gives `−p_v` on every variable of `v`,
//! `+2·p_v` on every pair within `v`, and a constant `+p_v`. Here `κ` is the
//! global congestion factor, `κ_r` the route's own congestion and `ρ` the
//! corridor penalty.
//!
//! The corridor term follows the one-hot scale: the first shared corridor
//! edge costs `ρ·λ·w_v` and every further edge takes the same fraction of
//! what is left, so a corridor route always costs less than `λ·w_v` extra.
//! Corridor edges are therefore strongly discouraged but never outright
//! forbidden.
//!
//! λ must dominate the other per-variable terms, otherwise leaving a vehicle
//! unassigned becomes cheaper than any route. [`QuboBuilder::dominant_lambda`]
//! reports the bound for the current inputs.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::conflict::{ConflictMap, ConflictModel};
use crate::error::CorridorError;
use crate::models::{CandidateRoute, VehicleRequest};
use crate::priority::PriorityScorer;

use super::{BinaryQuadraticModel, Corridor, Variable};

/// Penalty coefficients of the objective.
///
/// # Examples
///
/// ```
/// use u_corridor::qubo::PenaltyConfig;
///
/// let p = PenaltyConfig::default().with_lambda(500.0).with_mu(2.0);
/// assert!(p.validate().is_ok());
/// assert!(PenaltyConfig::default().with_lambda(0.0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// One-hot strength λ (per unit of priority weight).
    pub lambda: f64,
    /// Conflict scale μ.
    pub mu: f64,
    /// Fraction ρ ∈ [0, 1) of the one-hot strength charged per shared corridor edge.
    pub corridor_penalty: f64,
    /// Global congestion factor κ applied to every route cost.
    pub congestion_factor: f64,
}

impl PenaltyConfig {
    /// Sets λ.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Sets μ.
    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Sets ρ.
    pub fn with_corridor_penalty(mut self, penalty: f64) -> Self {
        self.corridor_penalty = penalty;
        self
    }

    /// Sets κ.
    pub fn with_congestion_factor(mut self, factor: f64) -> Self {
        self.congestion_factor = factor;
        self
    }

    /// Rejects λ ≤ 0, μ < 0, ρ outside [0, 1), κ ≤ 0 and non-finite values.
    pub fn validate(&self) -> Result<(), CorridorError> {
        let check = |ok: bool, what: &str, value: f64| {
            if ok && value.is_finite() {
                Ok(())
            } else {
                Err(CorridorError::InvalidConfiguration(format!(
                    "{what} = {value} out of range"
                )))
            }
        };
        check(self.lambda > 0.0, "lambda", self.lambda)?;
        check(self.mu >= 0.0, "mu", self.mu)?;
        check(
            (0.0..1.0).contains(&self.corridor_penalty),
            "corridor_penalty",
            self.corridor_penalty,
        )?;
        check(self.congestion_factor > 0.0, "congestion_factor", self.congestion_factor)
    }
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            lambda: 1000.0,
            mu: 1.0,
            corridor_penalty: 0.5,
            congestion_factor: 1.0,
        }
    }
}

/// Assembles a [`BinaryQuadraticModel`] for a set of vehicles.
///
/// The builder borrows its inputs and can be rebuilt with a different λ for
/// penalty escalation; every [`build`](Self::build) produces a fresh model.
///
/// # Examples
///
/// ```
/// use u_corridor::models::{CandidateRoute, Vehicle, VehicleRequest};
/// use u_corridor::priority::PriorityScorer;
/// use u_corridor::qubo::{PenaltyConfig, QuboBuilder};
///
/// let requests = vec![VehicleRequest::new(
///     Vehicle::regular(0),
///     vec![
///         CandidateRoute::from_nodes(0, 0, &[1, 2], 10.0),
///         CandidateRoute::from_nodes(0, 1, &[1, 3, 2], 14.0),
///     ],
/// )];
/// let builder = QuboBuilder::new(&requests, PriorityScorer::default(), PenaltyConfig::default());
/// let bqm = builder.build().unwrap();
/// assert_eq!(bqm.num_variables(), 2);
/// assert_eq!(bqm.energy(&[true, false]), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct QuboBuilder<'a> {
    requests: Vec<&'a VehicleRequest>,
    scorer: PriorityScorer,
    penalties: PenaltyConfig,
    corridor: Option<&'a Corridor>,
}

impl<'a> QuboBuilder<'a> {
    /// Creates a builder over `requests`, ordered by vehicle ID.
    pub fn new<I>(requests: I, scorer: PriorityScorer, penalties: PenaltyConfig) -> Self
    where
        I: IntoIterator<Item = &'a VehicleRequest>,
    {
        let mut requests: Vec<&'a VehicleRequest> = requests.into_iter().collect();
        requests.sort_by_key(|r| r.vehicle.id());
        Self {
            requests,
            scorer,
            penalties,
            corridor: None,
        }
    }

    /// Penalises routes that use locked corridor edges.
    pub fn with_corridor(mut self, corridor: &'a Corridor) -> Self {
        self.corridor = Some(corridor);
        self
    }

    /// Replaces λ, keeping everything else.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.penalties.lambda = lambda;
        self
    }

    /// Active penalty coefficients.
    pub fn penalties(&self) -> &PenaltyConfig {
        &self.penalties
    }

    /// Vehicles covered, in variable order.
    pub fn requests(&self) -> &[&'a VehicleRequest] {
        &self.requests
    }

    /// Checks the inputs without building; [`build`](Self::build) runs the same checks.
    pub fn validate(&self) -> Result<(), CorridorError> {
        self.penalties.validate()?;
        if self.requests.is_empty() {
            return Err(CorridorError::InvalidConfiguration(
                "empty vehicle set".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for req in &self.requests {
            let id = req.vehicle.id();
            if !seen.insert(id) {
                return Err(CorridorError::InvalidConfiguration(format!(
                    "duplicate vehicle id {id}"
                )));
            }
            if req.candidates.is_empty() {
                return Err(CorridorError::InvalidConfiguration(format!(
                    "vehicle {id} has no candidate routes"
                )));
            }
            let mut indices = HashSet::new();
            for route in &req.candidates {
                if route.vehicle_id() != id {
                    return Err(CorridorError::InvalidConfiguration(format!(
                        "route {} of vehicle {id} is labelled for vehicle {}",
                        route.index(),
                        route.vehicle_id()
                    )));
                }
                if !indices.insert(route.index()) {
                    return Err(CorridorError::InvalidConfiguration(format!(
                        "duplicate route {} for vehicle {id}",
                        route.index()
                    )));
                }
                let cost = route.base_cost();
                let congestion = route.congestion();
                if !cost.is_finite() || cost < 0.0 || !congestion.is_finite() || congestion <= 0.0 {
                    return Err(CorridorError::InvalidConfiguration(format!(
                        "route {} of vehicle {id} has invalid cost {cost} or congestion {congestion}",
                        route.index()
                    )));
                }
            }
        }
        Ok(())
    }

    fn route_cost(&self, weight: f64, route: &CandidateRoute) -> f64 {
        weight * route.base_cost() * self.penalties.congestion_factor * route.congestion()
    }

    /// Share of the one-hot strength left after the corridor term.
    fn corridor_slack(&self, route: &CandidateRoute) -> f64 {
        match self.corridor {
            Some(corridor) => {
                let shared = corridor.overlap(route) as i32;
                (1.0 - self.penalties.corridor_penalty).powi(shared)
            }
            None => 1.0,
        }
    }

    fn corridor_cost(&self, weight: f64, route: &CandidateRoute) -> f64 {
        self.penalties.lambda * weight * (1.0 - self.corridor_slack(route))
    }

    fn conflicts(&self) -> ConflictMap {
        ConflictModel::new(self.scorer).build(self.requests.iter().copied())
    }

    /// Builds the model.
    ///
    /// Fails with [`CorridorError::InvalidConfiguration`] on an empty vehicle
    /// set, duplicate vehicle IDs or route indices, a vehicle without
    /// candidates, invalid route costs, or out-of-range penalties.
    #[instrument(skip_all, fields(vehicles = self.requests.len(), lambda = self.penalties.lambda))]
    pub fn build(&self) -> Result<BinaryQuadraticModel, CorridorError> {
        self.validate()?;

        let mut variables = Vec::new();
        let mut linear = Vec::new();
        let mut quadratic = Vec::new();
        let mut offset = 0.0;

        for req in &self.requests {
            let weight = self.scorer.weight_of(&req.vehicle);
            let strength = self.penalties.lambda * weight;
            let first = variables.len();
            for route in &req.candidates {
                variables.push(Variable::new(req.vehicle.id(), route.index()));
                linear.push(
                    self.route_cost(weight, route) + self.corridor_cost(weight, route) - strength,
                );
            }
            let last = variables.len();
            for i in first..last {
                for j in i + 1..last {
                    quadratic.push((i, j, 2.0 * strength));
                }
            }
            offset += strength;
        }

        let position: HashMap<Variable, usize> =
            variables.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let conflicts = self.conflicts();
        for (a, b, coefficient) in conflicts.iter() {
            let i = position.get(&Variable::new(a.0, a.1));
            let j = position.get(&Variable::new(b.0, b.1));
            if let (Some(&i), Some(&j)) = (i, j) {
                quadratic.push((i, j, self.penalties.mu * coefficient));
            }
        }

        let bqm = BinaryQuadraticModel::new(variables, linear, quadratic, offset)?;
        debug!(
            variables = bqm.num_variables(),
            interactions = bqm.num_interactions(),
            conflicts = conflicts.len(),
            offset,
            "built QUBO"
        );
        Ok(bqm)
    }

    /// Smallest λ above which dropping any vehicle's route never lowers energy.
    ///
    /// For each route this bounds the energy it can contribute (cost and
    /// every conflict it takes part in), divides by the owning vehicle's
    /// weight and by the share of λ the corridor term leaves; the result is
    /// the maximum over all routes.
    pub fn dominant_lambda(&self) -> f64 {
        let conflicts = self.conflicts();
        let mut conflict_load: HashMap<(usize, usize), f64> = HashMap::new();
        for (a, b, c) in conflicts.iter() {
            *conflict_load.entry(a).or_insert(0.0) += self.penalties.mu * c;
            *conflict_load.entry(b).or_insert(0.0) += self.penalties.mu * c;
        }

        let mut bound = 0.0_f64;
        for req in &self.requests {
            let weight = self.scorer.weight_of(&req.vehicle);
            for route in &req.candidates {
                let load = self.route_cost(weight, route)
                    + conflict_load
                        .get(&(req.vehicle.id(), route.index()))
                        .copied()
                        .unwrap_or(0.0);
                bound = bound.max(load / (weight * self.corridor_slack(route)));
            }
        }
        bound
    }

    /// Returns `true` if the configured λ exceeds [`dominant_lambda`](Self::dominant_lambda).
    pub fn lambda_dominates(&self) -> bool {
        self.penalties.lambda > self.dominant_lambda()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vehicle;

    fn route(v: usize, i: usize, nodes: &[u64], cost: f64) -> CandidateRoute {
        CandidateRoute::from_nodes(v, i, nodes, cost)
    }

    fn penalties() -> PenaltyConfig {
        PenaltyConfig::default().with_lambda(100.0)
    }

    #[test]
    fn test_one_hot_expansion() {
        let reqs = vec![VehicleRequest::new(
            Vehicle::regular(0),
            vec![route(0, 0, &[1, 2], 3.0), route(0, 1, &[1, 3], 4.0), route(0, 2, &[1, 4], 5.0)],
        )];
        let bqm = QuboBuilder::new(&reqs, PriorityScorer::default(), penalties())
            .build()
            .unwrap();
        assert_eq!(bqm.linear(0), 3.0 - 100.0);
        assert_eq!(bqm.linear(2), 5.0 - 100.0);
        assert_eq!(bqm.quadratic(0, 1), 200.0);
        assert_eq!(bqm.quadratic(1, 2), 200.0);
        assert_eq!(bqm.offset(), 100.0);
        // feasible energies equal route costs
        assert_eq!(bqm.energy(&[false, true, false]), 4.0);
        // nothing selected pays λ, two selected pay λ on top
        assert_eq!(bqm.energy(&[false, false, false]), 100.0);
        assert_eq!(bqm.energy(&[true, true, false]), 107.0);
    }

    #[test]
    fn test_priority_weights_costs_and_penalty() {
        let reqs = vec![VehicleRequest::new(
            Vehicle::emergency(0),
            vec![route(0, 0, &[1, 2], 3.0)],
        )];
        let bqm = QuboBuilder::new(&reqs, PriorityScorer::default(), penalties())
            .build()
            .unwrap();
        assert_eq!(bqm.linear(0), 5.0 * 3.0 - 500.0);
        assert_eq!(bqm.offset(), 500.0);
        assert_eq!(bqm.energy(&[true]), 15.0);
    }

    #[test]
    fn test_conflict_terms() {
        let reqs = vec![
            VehicleRequest::new(Vehicle::regular(1), vec![route(1, 0, &[1, 2, 3], 1.0)]),
            VehicleRequest::new(Vehicle::emergency(0), vec![route(0, 0, &[1, 2, 3], 1.0)]),
        ];
        let p = penalties().with_mu(3.0);
        let bqm = QuboBuilder::new(&reqs, PriorityScorer::default(), p)
            .build()
            .unwrap();
        // 2 shared edges · 5 · 1 · μ
        assert_eq!(bqm.quadratic(0, 1), 30.0);
        assert_eq!(bqm.variables()[0].vehicle_id, 0);
    }

    #[test]
    fn test_mu_zero_drops_conflicts() {
        let reqs = vec![
            VehicleRequest::new(Vehicle::regular(0), vec![route(0, 0, &[1, 2], 1.0)]),
            VehicleRequest::new(Vehicle::regular(1), vec![route(1, 0, &[1, 2], 1.0)]),
        ];
        let bqm = QuboBuilder::new(&reqs, PriorityScorer::default(), penalties().with_mu(0.0))
            .build()
            .unwrap();
        assert_eq!(bqm.num_interactions(), 0);
    }

    #[test]
    fn test_corridor_term() {
        let reqs = vec![VehicleRequest::new(
            Vehicle::regular(3),
            vec![route(3, 0, &[1, 2, 3], 2.0), route(3, 1, &[1, 5, 3], 3.0)],
        )];
        let locked = route(9, 0, &[0, 1, 2], 0.0);
        let corridor = Corridor::from_routes([&locked]);
        let bqm = QuboBuilder::new(&reqs, PriorityScorer::default(), penalties())
            .with_corridor(&corridor)
            .build()
            .unwrap();
        // one shared edge: ρ·λ·w = 0.5·100·1
        assert_eq!(bqm.linear(0), 2.0 + 50.0 - 100.0);
        assert_eq!(bqm.linear(1), 3.0 - 100.0);
    }

    #[test]
    fn test_corridor_term_scales_with_lambda() {
        let reqs = vec![VehicleRequest::new(
            Vehicle::regular(1),
            vec![route(1, 0, &[1, 2, 3, 4], 300.0), route(1, 1, &[1, 7, 4], 380.0)],
        )];
        let locked = route(0, 0, &[0, 1, 2, 3], 0.0);
        let corridor = Corridor::from_routes([&locked]);
        let builder = QuboBuilder::new(&reqs, PriorityScorer::default(), PenaltyConfig::default())
            .with_corridor(&corridor);
        let bqm = builder.build().unwrap();
        // two shared edges: λ·(1 − 0.5²) = 750 on top of the cost
        assert_eq!(bqm.energy(&[true, false]), 300.0 + 750.0);
        assert_eq!(bqm.energy(&[false, true]), 380.0);
        // λ = 1000 leaves 250 of slack, less than the route's cost of 300
        assert!(bqm.energy(&[true, false]) > bqm.energy(&[false, false]));
        assert!(!builder.lambda_dominates());

        // 300 / 0.25 for the corridor route
        assert_eq!(builder.dominant_lambda(), 1200.0);
        let doubled = builder.clone().with_lambda(2000.0).build().unwrap();
        assert_eq!(doubled.energy(&[true, false]), 300.0 + 1500.0);
        assert!(doubled.energy(&[true, false]) < doubled.energy(&[false, false]));
    }

    #[test]
    fn test_corridor_penalty_range() {
        assert!(penalties().with_corridor_penalty(0.0).validate().is_ok());
        assert!(penalties().with_corridor_penalty(0.99).validate().is_ok());
        assert!(penalties().with_corridor_penalty(1.0).validate().is_err());
        assert!(penalties().with_corridor_penalty(-0.1).validate().is_err());
    }

    #[test]
    fn test_validation() {
        let scorer = PriorityScorer::default();
        let empty: Vec<VehicleRequest> = Vec::new();
        assert!(QuboBuilder::new(&empty, scorer, penalties()).build().is_err());

        let dup = vec![
            VehicleRequest::new(Vehicle::regular(0), vec![route(0, 0, &[1, 2], 1.0)]),
            VehicleRequest::new(Vehicle::regular(0), vec![route(0, 0, &[1, 2], 1.0)]),
        ];
        assert!(QuboBuilder::new(&dup, scorer, penalties()).build().is_err());

        let dup_route = vec![VehicleRequest::new(
            Vehicle::regular(0),
            vec![route(0, 0, &[1, 2], 1.0), route(0, 0, &[1, 3], 1.0)],
        )];
        assert!(QuboBuilder::new(&dup_route, scorer, penalties()).build().is_err());

        let no_routes = vec![VehicleRequest::new(Vehicle::regular(0), vec![])];
        assert!(QuboBuilder::new(&no_routes, scorer, penalties()).build().is_err());

        let ok = vec![VehicleRequest::new(Vehicle::regular(0), vec![route(0, 0, &[1, 2], 1.0)])];
        assert!(QuboBuilder::new(&ok, scorer, penalties().with_lambda(0.0)).build().is_err());
        assert!(QuboBuilder::new(&ok, scorer, penalties().with_lambda(-1.0)).build().is_err());
        assert!(QuboBuilder::new(&ok, scorer, penalties().with_mu(-0.5)).build().is_err());
        assert!(QuboBuilder::new(&ok, scorer, penalties()).build().is_ok());
    }

    #[test]
    fn test_dominant_lambda() {
        let reqs = vec![
            VehicleRequest::new(
                Vehicle::regular(0),
                vec![route(0, 0, &[1, 2, 3], 10.0), route(0, 1, &[1, 4, 3], 12.0)],
            ),
            VehicleRequest::new(Vehicle::regular(1), vec![route(1, 0, &[1, 2, 3], 11.0)]),
        ];
        let builder = QuboBuilder::new(&reqs, PriorityScorer::default(), penalties());
        // route (1,0): cost 11 + conflict 2 shared edges · 1 · 1
        assert_eq!(builder.dominant_lambda(), 13.0);
        assert!(builder.lambda_dominates());
        assert!(!builder.clone().with_lambda(13.0).lambda_dominates());
    }
}
