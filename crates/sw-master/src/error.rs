use std::path::PathBuf;

use sw_engine::EngineError;
use sw_formats::ResolveError;
use thiserror::Error;

/// A render failure, tagged with the stage that raised it.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("resolving event {index}: {source}")]
    Resolving {
        index: usize,
        #[source]
        source: ResolveError,
    },
    #[error("shaping event {index}: {source}")]
    Shaping {
        index: usize,
        #[source]
        source: EngineError,
    },
    #[error("composing: {0}")]
    Composing(#[source] EngineError),
    #[error("writing: {0}")]
    Encoding(#[source] EngineError),
    #[error("writing {path}: {source}")]
    Writing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cancelled")]
    Cancelled,
}
