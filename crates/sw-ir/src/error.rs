//! Score validation errors.

use thiserror::Error;

/// Error raised while building or loading a score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// Symbol or register outside the recognized set.
    #[error("unknown note {symbol:?} in register {register:?}")]
    UnknownNote { symbol: String, register: String },
    /// Duration is zero, negative or not a number.
    #[error("invalid duration {0}s (must be a positive number of seconds)")]
    InvalidDuration(f64),
    /// A rest carried a register.
    #[error("rest cannot carry a register (got {0:?})")]
    RegisterOnRest(String),
}
