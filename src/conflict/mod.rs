//! Route conflict modelling.
//!
//! - [`ConflictModel`] — priority-scaled shared-edge coefficients
//! - [`ConflictMap`] — sparse symmetric storage of nonzero coefficients
//! - [`shared_edges`] — raw overlap count between two routes

mod overlap;

pub use overlap::{shared_edges, ConflictMap, ConflictModel, RouteKey};
