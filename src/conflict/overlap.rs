//! Pairwise route overlap penalties.
//!
//! # Coefficient
//!
//! For routes `a` (vehicle `u`) and `b` (vehicle `v`, `u ≠ v`):
//!
//! ```text
//! c(a, b) = |E(a) ∩ E(b)| · w(u) · w(v)
//! ```
//!
//! where `E` is the distinct directed edge set and `w` the priority weight.
//! Disjoint routes have no entry at all, so the map stays as sparse as the
//! actual overlap.
//!
//! # Complexity
//!
//! Built from an edge → routes inverted index: O(Σ_e r(e)²) where `r(e)` is
//! the number of candidate routes using edge `e`, instead of O(R²) over all
//! route pairs.

use std::collections::{BTreeMap, HashMap};

use crate::models::{CandidateRoute, Edge, VehicleRequest, VehicleType};
use crate::priority::PriorityScorer;

/// Identifies a candidate route as `(vehicle_id, route_index)`.
pub type RouteKey = (usize, usize);

/// Number of distinct edges two routes share.
///
/// # Examples
///
/// ```
/// use u_corridor::models::CandidateRoute;
/// use u_corridor::conflict::shared_edges;
///
/// let a = CandidateRoute::from_nodes(0, 0, &[1, 2, 3], 1.0);
/// let b = CandidateRoute::from_nodes(1, 0, &[2, 3, 4], 1.0);
/// assert_eq!(shared_edges(&a, &b), 1);
/// ```
pub fn shared_edges(a: &CandidateRoute, b: &CandidateRoute) -> usize {
    a.overlap_with(b.edge_set())
}

/// Sparse symmetric map from route pairs to conflict coefficients.
///
/// Keys are stored with the smaller [`RouteKey`] first; lookups accept
/// either order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictMap {
    entries: BTreeMap<(RouteKey, RouteKey), f64>,
}

impl ConflictMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: RouteKey, b: RouteKey) -> (RouteKey, RouteKey) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Stores a coefficient. Zero coefficients and same-vehicle pairs are ignored.
    pub fn insert(&mut self, a: RouteKey, b: RouteKey, coefficient: f64) {
        if a.0 == b.0 || coefficient == 0.0 {
            return;
        }
        self.entries.insert(Self::key(a, b), coefficient);
    }

    /// Coefficient between two routes, zero if absent.
    pub fn get(&self, a: RouteKey, b: RouteKey) -> f64 {
        self.entries.get(&Self::key(a, b)).copied().unwrap_or(0.0)
    }

    /// Number of stored (nonzero) pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no pair conflicts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (RouteKey, RouteKey, f64)> + '_ {
        self.entries.iter().map(|(&(a, b), &c)| (a, b, c))
    }
}

/// Computes priority-scaled conflict coefficients between candidate routes.
///
/// # Examples
///
/// ```
/// use u_corridor::models::{CandidateRoute, Vehicle, VehicleRequest, VehicleType};
/// use u_corridor::conflict::ConflictModel;
/// use u_corridor::priority::PriorityScorer;
///
/// let model = ConflictModel::new(PriorityScorer::default());
/// let requests = vec![
///     VehicleRequest::new(Vehicle::emergency(0), vec![CandidateRoute::from_nodes(0, 0, &[1, 2, 3], 4.0)]),
///     VehicleRequest::new(Vehicle::regular(1), vec![CandidateRoute::from_nodes(1, 0, &[9, 2, 3], 4.0)]),
/// ];
/// let map = model.build(&requests);
/// assert_eq!(map.get((0, 0), (1, 0)), 5.0); // 1 shared edge · 5 · 1
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictModel {
    scorer: PriorityScorer,
}

impl ConflictModel {
    /// Creates a conflict model with the given priority weights.
    pub fn new(scorer: PriorityScorer) -> Self {
        Self { scorer }
    }

    /// Coefficient for one pair of routes from different vehicles.
    ///
    /// Returns 0 for routes of the same vehicle.
    pub fn coefficient(
        &self,
        a: &CandidateRoute,
        a_type: VehicleType,
        b: &CandidateRoute,
        b_type: VehicleType,
    ) -> f64 {
        if a.vehicle_id() == b.vehicle_id() {
            return 0.0;
        }
        self.scale(shared_edges(a, b), a_type, b_type)
    }

    fn scale(&self, shared: usize, a_type: VehicleType, b_type: VehicleType) -> f64 {
        shared as f64 * self.scorer.weight(a_type) * self.scorer.weight(b_type)
    }

    /// Builds the sparse conflict map over all candidate routes in `requests`.
    pub fn build<'r, I>(&self, requests: I) -> ConflictMap
    where
        I: IntoIterator<Item = &'r VehicleRequest>,
    {
        let mut users: HashMap<Edge, Vec<(RouteKey, VehicleType)>> = HashMap::new();
        for req in requests {
            let vt = req.vehicle.vehicle_type();
            for route in &req.candidates {
                let key = (req.vehicle.id(), route.index());
                for &edge in route.edge_set() {
                    users.entry(edge).or_default().push((key, vt));
                }
            }
        }

        let mut shared: BTreeMap<(RouteKey, RouteKey), (usize, VehicleType, VehicleType)> =
            BTreeMap::new();
        for routes in users.values() {
            for (i, &(a, at)) in routes.iter().enumerate() {
                for &(b, bt) in &routes[i + 1..] {
                    if a.0 == b.0 {
                        continue;
                    }
                    let (key, types) = if a <= b {
                        ((a, b), (at, bt))
                    } else {
                        ((b, a), (bt, at))
                    };
                    shared.entry(key).or_insert((0, types.0, types.1)).0 += 1;
                }
            }
        }

        let mut map = ConflictMap::new();
        for ((a, b), (count, at, bt)) in shared {
            map.insert(a, b, self.scale(count, at, bt));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vehicle;

    fn route(v: usize, i: usize, nodes: &[u64]) -> CandidateRoute {
        CandidateRoute::from_nodes(v, i, nodes, 1.0)
    }

    #[test]
    fn test_disjoint_is_zero_and_absent() {
        let m = ConflictModel::default();
        let reqs = vec![
            VehicleRequest::new(Vehicle::regular(0), vec![route(0, 0, &[1, 2, 3])]),
            VehicleRequest::new(Vehicle::regular(1), vec![route(1, 0, &[4, 5, 6])]),
        ];
        let map = m.build(&reqs);
        assert!(map.is_empty());
        assert_eq!(map.get((0, 0), (1, 0)), 0.0);
    }

    #[test]
    fn test_increasing_in_overlap() {
        let m = ConflictModel::default();
        let a = route(0, 0, &[1, 2, 3, 4, 5]);
        let one = route(1, 0, &[9, 2, 3]);
        let two = route(1, 1, &[9, 2, 3, 4]);
        let three = route(1, 2, &[1, 2, 3, 4]);
        let rt = VehicleType::Regular;
        let c1 = m.coefficient(&a, rt, &one, rt);
        let c2 = m.coefficient(&a, rt, &two, rt);
        let c3 = m.coefficient(&a, rt, &three, rt);
        assert!(0.0 < c1 && c1 < c2 && c2 < c3);
    }

    #[test]
    fn test_emergency_scales_up() {
        let m = ConflictModel::default();
        let a = route(0, 0, &[1, 2, 3]);
        let b = route(1, 0, &[1, 2, 3]);
        let rr = m.coefficient(&a, VehicleType::Regular, &b, VehicleType::Regular);
        let er = m.coefficient(&a, VehicleType::Emergency, &b, VehicleType::Regular);
        assert_eq!(rr, 2.0);
        assert_eq!(er, 10.0);
    }

    #[test]
    fn test_same_vehicle_ignored() {
        let m = ConflictModel::default();
        let a = route(0, 0, &[1, 2, 3]);
        let b = route(0, 1, &[1, 2, 4]);
        assert_eq!(
            m.coefficient(&a, VehicleType::Regular, &b, VehicleType::Regular),
            0.0
        );
        let reqs = vec![VehicleRequest::new(Vehicle::regular(0), vec![a, b])];
        assert!(m.build(&reqs).is_empty());
    }

    #[test]
    fn test_build_matches_pairwise_and_is_symmetric() {
        let m = ConflictModel::default();
        let reqs = vec![
            VehicleRequest::new(
                Vehicle::emergency(2),
                vec![route(2, 0, &[1, 2, 3, 4]), route(2, 1, &[1, 5, 4])],
            ),
            VehicleRequest::new(
                Vehicle::regular(0),
                vec![route(0, 0, &[2, 3, 4]), route(0, 1, &[7, 5, 4])],
            ),
            VehicleRequest::new(Vehicle::regular(1), vec![route(1, 0, &[1, 5, 6])]),
        ];
        let map = m.build(&reqs);
        for x in &reqs {
            for y in &reqs {
                for a in &x.candidates {
                    for b in &y.candidates {
                        let expect = m.coefficient(
                            a,
                            x.vehicle.vehicle_type(),
                            b,
                            y.vehicle.vehicle_type(),
                        );
                        let ka = (a.vehicle_id(), a.index());
                        let kb = (b.vehicle_id(), b.index());
                        assert_eq!(map.get(ka, kb), expect);
                        assert_eq!(map.get(kb, ka), expect);
                    }
                }
            }
        }
        assert!(map.iter().all(|(_, _, c)| c > 0.0));
    }

    #[test]
    fn test_insert_ignores_zero() {
        let mut map = ConflictMap::new();
        map.insert((0, 0), (1, 0), 0.0);
        map.insert((0, 0), (0, 1), 3.0);
        assert!(map.is_empty());
        map.insert((1, 0), (0, 0), 3.0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get((0, 0), (1, 0)), 3.0);
    }
}
