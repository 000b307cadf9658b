//! Core types for scorewave.
//!
//! This crate defines the score model and the audio buffer types shared
//! by the rest of the workspace. Loaders emit a `Score`, the engine turns
//! each event into an `AudioSegment`, and the master crate drives it all.

mod audio_segment;
mod audio_traits;
mod curve;
mod error;
mod sample;
pub mod score;
mod time;

pub use audio_segment::{AudioSegment, STANDARD_CHANNELS, STANDARD_SAMPLE_RATE};
pub use audio_traits::AudioSource;
pub use curve::FadeCurve;
pub use error::ScoreError;
pub use sample::{Sample, SampleData};
pub use score::{EventKind, PitchClass, RawEvent, Register, Score, ScoreBuilder, ScoreEvent, ScoreFile};
pub use time::{frames_to_seconds, is_valid_duration, seconds_to_frames, MAX_EVENT_SECONDS};
