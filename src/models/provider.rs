//! Candidate route acquisition boundary.

use std::collections::HashMap;

use crate::error::CorridorError;

use super::{CandidateRoute, NodeId, Vehicle};

/// Source of k alternative routes between two network nodes.
///
/// Implementations own the road graph and any cache around it; the
/// optimizer only ever sees the produced [`CandidateRoute`]s. Returned routes
/// must carry the requesting vehicle's ID and consecutive indices starting
/// at zero. Fewer than `k` routes is fine when the network affords no more
/// distinct simple paths.
pub trait CandidateRouteProvider {
    /// Returns up to `k` candidate routes for `vehicle_id` from `origin` to
    /// `destination`, or [`CorridorError::NoRouteFound`] if they are disconnected.
    fn candidates(
        &self,
        vehicle_id: usize,
        origin: NodeId,
        destination: NodeId,
        k: usize,
    ) -> Result<Vec<CandidateRoute>, CorridorError>;
}

/// In-memory provider backed by precomputed node paths per origin/destination pair.
///
/// # Examples
///
/// ```
/// use u_corridor::models::{CandidateRouteProvider, StaticCandidates};
///
/// let mut provider = StaticCandidates::new();
/// provider.insert(1, 3, vec![1, 2, 3], 10.0);
/// provider.insert(1, 3, vec![1, 4, 3], 12.0);
///
/// let routes = provider.candidates(0, 1, 3, 5).unwrap();
/// assert_eq!(routes.len(), 2);
/// assert_eq!(routes[1].index(), 1);
/// assert!(provider.candidates(0, 3, 1, 5).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCandidates {
    paths: HashMap<(NodeId, NodeId), Vec<(Vec<NodeId>, f64)>>,
}

impl StaticCandidates {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a path for the pair `(origin, destination)`.
    ///
    /// Paths are offered in insertion order, so insert the shortest first.
    pub fn insert(&mut self, origin: NodeId, destination: NodeId, nodes: Vec<NodeId>, cost: f64) {
        self.paths
            .entry((origin, destination))
            .or_default()
            .push((nodes, cost));
    }
}

impl CandidateRouteProvider for StaticCandidates {
    fn candidates(
        &self,
        vehicle_id: usize,
        origin: NodeId,
        destination: NodeId,
        k: usize,
    ) -> Result<Vec<CandidateRoute>, CorridorError> {
        let paths = self
            .paths
            .get(&(origin, destination))
            .filter(|p| !p.is_empty())
            .ok_or(CorridorError::NoRouteFound {
                vehicle_id,
                origin,
                destination,
            })?;

        Ok(paths
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, (nodes, cost))| CandidateRoute::from_nodes(vehicle_id, i, nodes, *cost))
            .collect())
    }
}

/// A vehicle together with its fixed candidate-route set.
///
/// An empty candidate set is allowed here; the optimizer excludes such
/// vehicles and reports them rather than dropping them silently.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VehicleRequest {
    /// The vehicle.
    pub vehicle: Vehicle,
    /// Candidate routes in provider order.
    pub candidates: Vec<CandidateRoute>,
}

impl VehicleRequest {
    /// Creates a request.
    pub fn new(vehicle: Vehicle, candidates: Vec<CandidateRoute>) -> Self {
        Self {
            vehicle,
            candidates,
        }
    }

    /// Builds a request by asking `provider` for `k` candidates.
    ///
    /// Fails with [`CorridorError::InvalidConfiguration`] when the vehicle
    /// has no endpoints, and passes provider errors through.
    pub fn from_provider<P>(vehicle: Vehicle, provider: &P, k: usize) -> Result<Self, CorridorError>
    where
        P: CandidateRouteProvider + ?Sized,
    {
        let (Some(origin), Some(destination)) = (vehicle.origin(), vehicle.destination()) else {
            return Err(CorridorError::InvalidConfiguration(format!(
                "vehicle {} has no origin/destination",
                vehicle.id()
            )));
        };
        let candidates = provider.candidates(vehicle.id(), origin, destination, k)?;
        Ok(Self::new(vehicle, candidates))
    }
}
