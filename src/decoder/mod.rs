//! Decoding samples into route assignments.
//!
//! - [`SolutionDecoder`] — one-hot validation, decoding and λ escalation
//! - [`RetryPolicy`] — bounded geometric λ growth
//! - [`Decoded`] / [`PhaseOutcome`] — decoded sample and escalation result

mod decode;

pub use decode::{Decoded, PhaseOutcome, RetryPolicy, SolutionDecoder};
