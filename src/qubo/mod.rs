//! QUBO formulation of the route assignment problem.
//!
//! - [`BinaryQuadraticModel`] — immutable linear/quadratic/offset model with one-hot groups
//! - [`QuboBuilder`] — encodes costs, one-hot penalties, conflicts and the corridor
//! - [`PenaltyConfig`] — λ, μ, corridor and congestion coefficients
//! - [`Corridor`] — edges locked by the emergency phase

mod bqm;
mod builder;
mod corridor;

pub use bqm::{BinaryQuadraticModel, OneHotGroup, Variable};
pub use builder::{PenaltyConfig, QuboBuilder};
pub use corridor::Corridor;
