//! Rendering engine for scorewave.
//!
//! Turns score events into audio segments and joins them into one track.
//! Every stage talks to audio through the [`AudioEngine`] capability, with
//! [`NativeEngine`] as the built-in implementation.

mod compositor;
mod engine;
mod error;
mod filter;
mod resample;
mod shaper;
mod silence;

pub use compositor::{Compositor, CrossfadeSettings, RenderedTrack};
pub use engine::{joined_length, AudioEngine, NativeEngine, PadMode};
pub use error::EngineError;
pub use filter::{Biquad, FilterKind};
pub use resample::conform;
pub use shaper::{EnvelopePlan, SegmentShaper, ShaperSettings};
pub use silence::{synthesize_silence, SilenceSynthesizer};
