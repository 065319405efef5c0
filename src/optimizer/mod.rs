//! End-to-end optimization of a request.
//!
//! - [`CorridorOptimizer`] — emergency phase, corridor lock, regular phase
//! - [`OptimizerConfig`] — priorities, penalties, sampler, retry and backend
//! - [`OptimizationReport`] / [`OptimizationState`] — outcome and lifecycle

mod config;
mod engine;
mod report;

pub use config::OptimizerConfig;
pub use engine::CorridorOptimizer;
pub use report::{OptimizationReport, OptimizationState, Phase, PhaseSummary};
