//! Silent segments for rests.

use sw_ir::{is_valid_duration, seconds_to_frames, AudioSegment, STANDARD_CHANNELS, STANDARD_SAMPLE_RATE};

use crate::error::EngineError;

/// Produces zero-amplitude segments in the pipeline's format.
#[derive(Clone, Copy, Debug)]
pub struct SilenceSynthesizer {
    sample_rate: u32,
    channels: u16,
}

impl Default for SilenceSynthesizer {
    fn default() -> Self {
        Self::new(STANDARD_SAMPLE_RATE, STANDARD_CHANNELS)
    }
}

impl SilenceSynthesizer {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self { sample_rate, channels }
    }

    /// `duration` seconds of silence. Fails unless `duration` is positive and
    /// within [`sw_ir::MAX_EVENT_SECONDS`].
    pub fn synthesize(&self, duration: f64) -> Result<AudioSegment, EngineError> {
        if !is_valid_duration(duration) {
            return Err(EngineError::InvalidDuration(duration));
        }
        let frames = seconds_to_frames(duration, self.sample_rate);
        Ok(AudioSegment::new(self.channels, frames, self.sample_rate))
    }
}

/// `duration` seconds of silence at 44.1 kHz stereo.
pub fn synthesize_silence(duration: f64) -> Result<AudioSegment, EngineError> {
    SilenceSynthesizer::default().synthesize(duration)
}
