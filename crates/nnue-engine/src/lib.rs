//! An NNUE (Efficiently Updatable Neural Network) inference engine for
//! evaluating chess positions: HalfKP feature indexing, an incrementally
//! maintained accumulator, a small quantized dense stack, and the parameter
//! file format that ties them together.
//!
//! The public surface mirrors §6 of the design document: load parameters
//! once via [`nnue::evaluator::load`], then call [`nnue::evaluator::evaluate`]
//! per position. Everything under [`nnue`] other than `evaluator` is the
//! implementation the facade composes; most callers only need the facade.

pub mod config;
pub mod error;
pub mod nnue;
pub mod position;
pub mod types;

#[cfg(feature = "nnue-train")]
pub mod training;

pub use config::EvalConfig;
pub use error::{NnueError, Result};
