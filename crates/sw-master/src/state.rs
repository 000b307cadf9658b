//! Pipeline progress and cooperative cancellation, shared across threads.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Why a render ended without output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailReason {
    Cancelled,
    Error(String),
}

/// Where the driver is. Event indices are zero-based.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,
    Resolving(usize),
    Shaping(usize),
    Composing,
    Writing,
    Done,
    Failed(FailReason),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Resolving(i) => write!(f, "resolving event {}", i),
            PipelineState::Shaping(i) => write!(f, "shaping event {}", i),
            PipelineState::Composing => write!(f, "composing"),
            PipelineState::Writing => write!(f, "writing"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed(FailReason::Cancelled) => write!(f, "cancelled"),
            PipelineState::Failed(FailReason::Error(e)) => write!(f, "failed: {}", e),
        }
    }
}

/// Readable view of a renderer's state. Clones share the same cell.
#[derive(Clone, Debug, Default)]
pub struct StateHandle {
    state: Arc<Mutex<PipelineState>>,
}

impl StateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> PipelineState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn set(&self, state: PipelineState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Cooperative stop flag, checked between events and before composing.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the flag so the renderer can be used again.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
