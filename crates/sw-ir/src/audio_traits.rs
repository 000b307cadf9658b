//! Read-only access to audio data of any storage format.

use crate::audio_segment::AudioSegment;

/// Read-only access to sample data at a given position.
pub trait AudioSource {
    /// Number of channels in the source.
    fn channels(&self) -> u16;

    /// Number of frames in the source.
    fn frames(&self) -> usize;

    /// Read a sample as i16 at the given channel and frame.
    fn read_i16(&self, ch: u16, frame: usize) -> i16;

    /// Read a sample as f32 at the given channel and frame.
    fn read_f32(&self, ch: u16, frame: usize) -> f32 {
        self.read_i16(ch, frame) as f32 / 32768.0
    }
}

impl AudioSource for AudioSegment {
    fn channels(&self) -> u16 {
        AudioSegment::channels(self)
    }

    fn frames(&self) -> usize {
        AudioSegment::frames(self)
    }

    fn read_i16(&self, ch: u16, frame: usize) -> i16 {
        (self.read_f32(ch, frame).clamp(-1.0, 1.0) * 32767.0) as i16
    }

    fn read_f32(&self, ch: u16, frame: usize) -> f32 {
        self.channel(ch).get(frame).copied().unwrap_or(0.0)
    }
}
