//! Priority weighting of vehicle classes.
//!
//! - [`PriorityTable`] — explicit weight per [`VehicleType`](crate::models::VehicleType)
//! - [`PriorityScorer`] — validated lookup used by the QUBO builder

mod scorer;

pub use scorer::{PriorityScorer, PriorityTable};
