//! Network edges and candidate routes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifier of a node in the road network.
pub type NodeId = u64;

/// A directed road segment between two network nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Tail node.
    pub from: NodeId,
    /// Head node.
    pub to: NodeId,
}

impl Edge {
    /// Creates a directed edge `from → to`.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

/// One pre-generated alternative path offered to a vehicle.
///
/// The route index is stable within the owning vehicle's candidate set and
/// the route is immutable once created.
///
/// # Examples
///
/// ```
/// use u_corridor::models::{CandidateRoute, Edge};
///
/// let route = CandidateRoute::from_nodes(0, 0, &[1, 2, 3], 12.5);
/// assert_eq!(route.edges(), &[Edge::new(1, 2), Edge::new(2, 3)]);
/// assert_eq!(route.nodes(), vec![1, 2, 3]);
/// assert_eq!(route.base_cost(), 12.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RouteRepr")]
pub struct CandidateRoute {
    vehicle_id: usize,
    index: usize,
    edges: Vec<Edge>,
    base_cost: f64,
    congestion: f64,
    #[serde(skip)]
    edge_set: BTreeSet<Edge>,
}

impl CandidateRoute {
    /// Creates a route from an ordered edge sequence.
    pub fn new(vehicle_id: usize, index: usize, edges: Vec<Edge>, base_cost: f64) -> Self {
        let edge_set = edges.iter().copied().collect();
        Self {
            vehicle_id,
            index,
            edges,
            base_cost,
            congestion: 1.0,
            edge_set,
        }
    }

    /// Creates a route from an ordered node path, one edge per consecutive pair.
    pub fn from_nodes(vehicle_id: usize, index: usize, nodes: &[NodeId], base_cost: f64) -> Self {
        let edges = nodes.windows(2).map(|w| Edge::new(w[0], w[1])).collect();
        Self::new(vehicle_id, index, edges, base_cost)
    }

    /// Sets a per-route congestion multiplier applied on top of the global factor.
    pub fn with_congestion(mut self, congestion: f64) -> Self {
        self.congestion = congestion;
        self
    }

    /// Owning vehicle ID.
    pub fn vehicle_id(&self) -> usize {
        self.vehicle_id
    }

    /// Index within the owning vehicle's candidate set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Ordered edges of this route.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Distinct edges of this route.
    pub fn edge_set(&self) -> &BTreeSet<Edge> {
        &self.edge_set
    }

    /// Ordered node sequence (empty for an edgeless route).
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes = Vec::with_capacity(self.edges.len() + 1);
        if let Some(first) = self.edges.first() {
            nodes.push(first.from);
        }
        nodes.extend(self.edges.iter().map(|e| e.to));
        nodes
    }

    /// Base cost (travel time or length).
    pub fn base_cost(&self) -> f64 {
        self.base_cost
    }

    /// Per-route congestion multiplier (1.0 unless set).
    pub fn congestion(&self) -> f64 {
        self.congestion
    }

    /// Number of distinct edges shared with `edges`.
    pub fn overlap_with(&self, edges: &BTreeSet<Edge>) -> usize {
        if self.edge_set.len() <= edges.len() {
            self.edge_set.iter().filter(|e| edges.contains(e)).count()
        } else {
            edges.iter().filter(|e| self.edge_set.contains(e)).count()
        }
    }
}

/// Wire form of [`CandidateRoute`]; the distinct edge cache is rebuilt on load.
#[derive(Deserialize)]
struct RouteRepr {
    vehicle_id: usize,
    index: usize,
    edges: Vec<Edge>,
    base_cost: f64,
    #[serde(default = "unit_congestion")]
    congestion: f64,
}

fn unit_congestion() -> f64 {
    1.0
}

impl From<RouteRepr> for CandidateRoute {
    fn from(repr: RouteRepr) -> Self {
        Self::new(repr.vehicle_id, repr.index, repr.edges, repr.base_cost)
            .with_congestion(repr.congestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nodes() {
        let r = CandidateRoute::from_nodes(4, 1, &[5, 6, 7, 8], 3.0);
        assert_eq!(r.vehicle_id(), 4);
        assert_eq!(r.index(), 1);
        assert_eq!(r.edges().len(), 3);
        assert_eq!(r.nodes(), vec![5, 6, 7, 8]);
        assert_eq!(r.congestion(), 1.0);
    }

    #[test]
    fn test_single_node_route_has_no_edges() {
        let r = CandidateRoute::from_nodes(0, 0, &[5], 0.0);
        assert!(r.edges().is_empty());
        assert!(r.nodes().is_empty());
    }

    #[test]
    fn test_edge_set_dedup() {
        let r = CandidateRoute::new(0, 0, vec![Edge::new(1, 2), Edge::new(2, 1), Edge::new(1, 2)], 1.0);
        assert_eq!(r.edges().len(), 3);
        assert_eq!(r.edge_set().len(), 2);
    }

    #[test]
    fn test_overlap_directed() {
        let a = CandidateRoute::from_nodes(0, 0, &[1, 2, 3, 4], 1.0);
        let b = CandidateRoute::from_nodes(1, 0, &[9, 2, 3, 4], 1.0);
        let c = CandidateRoute::from_nodes(2, 0, &[4, 3, 2], 1.0);
        assert_eq!(a.overlap_with(b.edge_set()), 2);
        assert_eq!(a.overlap_with(c.edge_set()), 0);
    }

    #[test]
    fn test_deserialize_rebuilds_edge_set() {
        let r = CandidateRoute::from_nodes(0, 0, &[1, 2, 3], 1.0).with_congestion(1.5);
        let json = serde_json::to_string(&r).unwrap();
        let back: CandidateRoute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        assert_eq!(back.edge_set().len(), 2);
    }
}
