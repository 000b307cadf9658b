//! Engine error type.

use sw_formats::FormatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Duration is zero, negative or not a number.
    #[error("invalid duration {0}s")]
    InvalidDuration(f64),
    /// The source recording cannot carry the requested envelope.
    #[error("cannot shape {asset}: {reason}")]
    Shaping { asset: String, reason: String },
    /// Nothing to compose, or segments in different formats.
    #[error("composition failed: {0}")]
    Composition(String),
    /// Final encode step failed.
    #[error("encode failed")]
    Encode(#[from] FormatError),
}
