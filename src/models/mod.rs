//! Domain model types for corridor-aware route assignment.
//!
//! Provides the core abstractions: vehicles with a closed type tag, candidate
//! routes as ordered edge sequences over the road network, the provider
//! boundary that produces them, and the per-vehicle assignment handed to a
//! renderer.

mod provider;
mod route;
mod solution;
mod vehicle;

pub use provider::{CandidateRouteProvider, StaticCandidates, VehicleRequest};
pub use route::{CandidateRoute, Edge, NodeId};
pub use solution::{ExcludedVehicle, OneHotViolation, RouteAssignment, Solution};
pub use vehicle::{Vehicle, VehicleType};
