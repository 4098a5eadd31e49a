//! Error types for the decision engine.
//!
//! The engine has no I/O, so the error surface is deliberately narrow:
//! malformed inputs are rejected before any computation starts, and every
//! degenerate-but-valid input (empty profile lists, single groups,
//! zero-variance populations) degrades to a documented result instead of
//! raising.

use thiserror::Error;

/// Errors produced by the engine's validation boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Objective weights must be non-negative and sum to exactly 100.
    ///
    /// The engine never silently renormalizes caller-supplied weights; only
    /// the inference path performs its own deterministic renormalization.
    #[error("invalid objective weights: accuracy={accuracy} + fairness={fairness} + robustness={robustness} = {sum}, expected exactly 100")]
    InvalidWeights {
        accuracy: u32,
        fairness: u32,
        robustness: u32,
        sum: u32,
    },

    /// A group profile carried a non-finite or out-of-range field.
    #[error("invalid group profile '{group}': {reason}")]
    InvalidProfile { group: String, reason: String },
}
