//! # u-corridor
//!
//! Priority-aware route assignment with emergency green corridors,
//! formulated as a QUBO and solved by simulated annealing.
//!
//! ## Modules
//!
//! - [`models`] — Domain model types (Vehicle, CandidateRoute, Solution, provider trait)
//! - [`priority`] — Priority weights per vehicle type
//! - [`conflict`] — Pairwise route-overlap coefficients
//! - [`qubo`] — Binary quadratic model and its builder
//! - [`solver`] — Pluggable backends (simulated annealing, exact enumeration)
//! - [`decoder`] — One-hot validation, decoding and penalty escalation
//! - [`optimizer`] — Two-phase emergency/regular optimization
//! - [`error`] — Error taxonomy
//!
//! ## Example
//!
//! ```
//! use u_corridor::models::{StaticCandidates, Vehicle};
//! use u_corridor::optimizer::{CorridorOptimizer, OptimizerConfig};
//! use u_corridor::solver::SamplerConfig;
//!
//! let mut network = StaticCandidates::new();
//! network.insert(1, 3, vec![1, 2, 3], 10.0);
//! network.insert(1, 3, vec![1, 4, 3], 13.0);
//!
//! let vehicles = vec![
//!     Vehicle::emergency(0).with_endpoints(1, 3),
//!     Vehicle::regular(1).with_endpoints(1, 3),
//! ];
//! let config = OptimizerConfig::default()
//!     .with_sampler(SamplerConfig::default().with_seed(7).with_num_sweeps(200));
//!
//! let report = CorridorOptimizer::new(config)?.plan(&network, &vehicles, 2)?;
//! let solution = &report.solution;
//! assert!(solution.feasible);
//! assert_eq!(solution.assignment(0).unwrap().route_index, 0);
//! assert_eq!(solution.assignment(1).unwrap().route_index, 1);
//! # Ok::<(), u_corridor::error::CorridorError>(())
//! ```

pub mod conflict;
pub mod decoder;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod priority;
pub mod qubo;
pub mod solver;
