//! Locked emergency corridor.

use std::collections::BTreeSet;

use crate::models::{CandidateRoute, Edge};

/// Edges claimed by the routed emergency vehicles.
///
/// Built once after the emergency phase and read-only afterwards.
///
/// # Examples
///
/// ```
/// use u_corridor::models::{CandidateRoute, Edge};
/// use u_corridor::qubo::Corridor;
///
/// let r = CandidateRoute::from_nodes(0, 0, &[1, 2, 3], 1.0);
/// let corridor = Corridor::from_routes([&r]);
/// assert!(corridor.contains(&Edge::new(2, 3)));
/// assert_eq!(corridor.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corridor {
    edges: BTreeSet<Edge>,
}

impl Corridor {
    /// Creates an empty corridor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of the edges of `routes`.
    pub fn from_routes<'r, I>(routes: I) -> Self
    where
        I: IntoIterator<Item = &'r CandidateRoute>,
    {
        let edges = routes
            .into_iter()
            .flat_map(|r| r.edge_set().iter().copied())
            .collect();
        Self { edges }
    }

    /// Returns `true` if `edge` is locked.
    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Locked edges.
    pub fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    /// Number of locked edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if nothing is locked.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Corridor edges used by `route`.
    pub fn overlap(&self, route: &CandidateRoute) -> usize {
        route.overlap_with(&self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union() {
        let a = CandidateRoute::from_nodes(0, 0, &[1, 2, 3], 1.0);
        let b = CandidateRoute::from_nodes(1, 0, &[2, 3, 4], 1.0);
        let c = Corridor::from_routes([&a, &b]);
        assert_eq!(c.len(), 3);
        let other = CandidateRoute::from_nodes(5, 0, &[9, 2, 3, 4, 8], 1.0);
        assert_eq!(c.overlap(&other), 2);
    }

    #[test]
    fn test_empty() {
        let c = Corridor::new();
        assert!(c.is_empty());
        let other = CandidateRoute::from_nodes(5, 0, &[1, 2], 1.0);
        assert_eq!(c.overlap(&other), 0);
    }
}
