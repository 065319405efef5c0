//! Route assignment output types.

use serde::{Deserialize, Serialize};

use super::{CandidateRoute, Edge, NodeId, Vehicle, VehicleType};
use crate::error::CorridorError;

/// A vehicle whose one-hot group is not satisfied by the reported sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotViolation {
    /// Offending vehicle.
    pub vehicle_id: usize,
    /// Route indices set to 1 (empty when no route was selected).
    pub selected: Vec<usize>,
}

/// A vehicle left out of the optimization because it has no candidate route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedVehicle {
    /// Excluded vehicle.
    pub vehicle_id: usize,
    /// Vehicle class.
    pub vehicle_type: VehicleType,
    /// Origin node, if known.
    pub origin: Option<NodeId>,
    /// Destination node, if known.
    pub destination: Option<NodeId>,
    /// Why the vehicle has no candidates, usually [`CorridorError::NoRouteFound`].
    pub reason: CorridorError,
}

impl ExcludedVehicle {
    /// Records `vehicle` as excluded for `reason`.
    pub fn new(vehicle: &Vehicle, reason: CorridorError) -> Self {
        Self {
            vehicle_id: vehicle.id(),
            vehicle_type: vehicle.vehicle_type(),
            origin: vehicle.origin(),
            destination: vehicle.destination(),
            reason,
        }
    }

    /// Excludes a vehicle that arrived with an empty candidate set.
    ///
    /// The reason is [`CorridorError::NoRouteFound`] when both endpoints are
    /// known.
    pub fn without_candidates(vehicle: &Vehicle) -> Self {
        let reason = match (vehicle.origin(), vehicle.destination()) {
            (Some(origin), Some(destination)) => CorridorError::NoRouteFound {
                vehicle_id: vehicle.id(),
                origin,
                destination,
            },
            _ => CorridorError::InvalidConfiguration(format!(
                "vehicle {} has no candidate routes",
                vehicle.id()
            )),
        };
        Self::new(vehicle, reason)
    }
}

/// The route chosen for one vehicle, in the shape a map renderer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAssignment {
    /// Vehicle ID.
    pub vehicle_id: usize,
    /// Vehicle class.
    pub vehicle_type: VehicleType,
    /// Index of the chosen candidate.
    pub route_index: usize,
    /// Ordered edges of the chosen route.
    pub edges: Vec<Edge>,
    /// Base cost of the chosen route.
    pub base_cost: f64,
    /// `true` when this route is part of the emergency corridor.
    pub in_corridor: bool,
    /// Number of corridor edges this route still uses (always 0 for corridor routes).
    pub corridor_overlap: usize,
    /// Index of the vehicle's cheapest candidate, the route it would take
    /// without coordination.
    pub shortest_index: usize,
    /// `base_cost` minus the cheapest candidate's cost; 0 when not detoured.
    pub detour_cost: f64,
}

impl RouteAssignment {
    /// Builds an assignment from a chosen candidate.
    pub fn new(vehicle_type: VehicleType, route: &CandidateRoute) -> Self {
        Self {
            vehicle_id: route.vehicle_id(),
            vehicle_type,
            route_index: route.index(),
            edges: route.edges().to_vec(),
            base_cost: route.base_cost(),
            in_corridor: vehicle_type.is_emergency(),
            corridor_overlap: 0,
            shortest_index: route.index(),
            detour_cost: 0.0,
        }
    }

    /// Records the vehicle's uncoordinated shortest candidate.
    pub fn with_baseline(mut self, shortest: &CandidateRoute) -> Self {
        self.shortest_index = shortest.index();
        self.detour_cost = self.base_cost - shortest.base_cost();
        self
    }

    /// `true` if the chosen route is not the vehicle's shortest candidate.
    pub fn is_detour(&self) -> bool {
        self.route_index != self.shortest_index
    }

    /// Sets how many corridor edges the route shares.
    pub fn with_corridor_overlap(mut self, overlap: usize) -> Self {
        self.corridor_overlap = overlap;
        self
    }
}

/// Request-level outcome: one route per optimized vehicle plus quality flags.
///
/// # Examples
///
/// ```
/// use u_corridor::models::Solution;
///
/// let sol = Solution::new();
/// assert!(sol.feasible);
/// assert_eq!(sol.num_assigned(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Chosen routes, ordered by vehicle ID.
    pub assignments: Vec<RouteAssignment>,
    /// Sum of the decoded samples' energies across phases.
    pub objective: f64,
    /// Edges locked by the emergency phase, sorted.
    pub corridor: Vec<Edge>,
    /// `true` iff every optimized vehicle has exactly one selected route.
    pub feasible: bool,
    /// Vehicles violating one-hot, empty when feasible.
    pub violations: Vec<OneHotViolation>,
    /// `true` if any solve stopped on its time budget.
    pub early_terminated: bool,
}

impl Solution {
    /// Creates an empty feasible solution.
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
            objective: 0.0,
            corridor: Vec::new(),
            feasible: true,
            violations: Vec::new(),
            early_terminated: false,
        }
    }

    /// Number of vehicles with a chosen route.
    pub fn num_assigned(&self) -> usize {
        self.assignments.len()
    }

    /// Returns the assignment for `vehicle_id`, if any.
    pub fn assignment(&self, vehicle_id: usize) -> Option<&RouteAssignment> {
        self.assignments.iter().find(|a| a.vehicle_id == vehicle_id)
    }

    /// Sum of base costs over chosen routes.
    pub fn total_base_cost(&self) -> f64 {
        self.assignments.iter().map(|a| a.base_cost).sum()
    }

    /// Extra cost over every vehicle taking its shortest candidate.
    pub fn total_detour_cost(&self) -> f64 {
        self.assignments.iter().map(|a| a.detour_cost).sum()
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}
