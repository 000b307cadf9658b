//! Format handling for scorewave.
//!
//! Decodes and encodes WAV, loads scores from RON, and maps notes to the
//! single-note recordings in a sample store.

mod resolver;
mod score_file;
mod store;
mod wav_format;

pub use resolver::{AssetHandle, ResolveError, SampleBank, SampleKey, SampleResolver};
pub use score_file::{load_score, parse_score, save_score, score_to_ron};
pub use store::{AssetId, DirStore, MemoryStore, SampleStore};
pub use wav_format::{encode_wav, load_wav, write_wav, EncodeParams};

use thiserror::Error;

/// Error type for format parsing and encoding.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    #[error("invalid header")]
    InvalidHeader,
    /// Unexpected end of file
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Unsupported encoding (bit depth, channel count, codec)
    #[error("unsupported format: {0}")]
    Unsupported(String),
    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Score file could not be parsed or failed validation
    #[error("score: {0}")]
    Score(#[from] ron::error::SpannedError),
    /// Score could not be serialized
    #[error("score encode: {0}")]
    ScoreEncode(#[from] ron::Error),
}
