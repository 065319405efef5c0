//! Error taxonomy.
//!
//! Configuration and input problems fail fast as [`CorridorError`]. Solution
//! quality problems (infeasibility after penalty escalation, an exhausted time
//! budget) are not errors: they are reported as flags on
//! [`Solution`](crate::models::Solution).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::NodeId;

/// Errors raised by the optimizer and its components.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CorridorError {
    /// A vehicle's origin and destination are not connected.
    #[error("no route found for vehicle {vehicle_id} from {origin} to {destination}")]
    NoRouteFound {
        /// Vehicle that could not be routed.
        vehicle_id: usize,
        /// Requested origin.
        origin: NodeId,
        /// Requested destination.
        destination: NodeId,
    },
    /// Rejected before any model is built.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A vehicle type label outside the closed set.
    #[error("unknown vehicle type `{0}`")]
    UnknownVehicleType(String),
    /// The solving backend refused the model.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Errors raised by a [`SolverBackend`](crate::solver::SolverBackend).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SolverError {
    /// The model has no variables.
    #[error("model has no variables")]
    EmptyModel,
    /// The model is too large for exhaustive enumeration.
    #[error("model has {variables} variables, exact enumeration supports at most {limit}")]
    ModelTooLarge {
        /// Variables in the model.
        variables: usize,
        /// Backend limit.
        limit: usize,
    },
    /// Sampler settings are unusable.
    #[error("invalid sampler configuration: {0}")]
    InvalidConfig(String),
    /// A raw assignment does not cover every model variable.
    #[error("sample has {found} bits, model has {expected} variables")]
    SampleLength {
        /// Variables in the model.
        expected: usize,
        /// Bits in the offending assignment.
        found: usize,
    },
}
