//! Pluggable QUBO solving backends.
//!
//! - [`SolverBackend`] — BQM in, ranked [`SampleSet`] out
//! - [`SimulatedAnnealer`] — parallel seeded simulated annealing (default)
//! - [`ExactSolver`] — Gray-code enumeration for small models
//! - [`SamplerConfig`] / [`BackendKind`] — shared settings and selection by configuration

mod annealer;
mod backend;
mod config;
mod exact;
mod sample;

pub use annealer::{default_beta_range, geometric_schedule, SimulatedAnnealer};
pub use backend::SolverBackend;
pub use config::{BackendKind, SamplerConfig};
pub use exact::ExactSolver;
pub use sample::{Sample, SampleSet};
