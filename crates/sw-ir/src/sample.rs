//! Decoded single-note recordings.

use arrayvec::ArrayString;

use crate::audio_traits::AudioSource;
use crate::time::frames_to_seconds;

/// A decoded recording, at its native rate and channel layout.
#[derive(Clone, Debug)]
pub struct Sample {
    /// Sample name (usually the asset it came from)
    pub name: ArrayString<32>,
    /// Audio data
    pub data: SampleData,
    /// Native sample rate in Hz
    pub sample_rate: u32,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: ArrayString::new(),
            data: SampleData::Mono16(Vec::new()),
            sample_rate: 44100,
        }
    }
}

impl Sample {
    /// Create a new empty sample.
    pub fn new(name: &str) -> Self {
        let mut sample = Self::default();
        for c in name.chars() {
            if sample.name.try_push(c).is_err() {
                break;
            }
        }
        sample
    }

    /// Get the length of the sample in frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sample has no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length in seconds at the native rate.
    pub fn duration_seconds(&self) -> f64 {
        frames_to_seconds(self.len(), self.sample_rate)
    }
}

/// Sample audio data.
#[derive(Clone, Debug)]
pub enum SampleData {
    /// 8-bit mono samples
    Mono8(Vec<i8>),
    /// 16-bit mono samples
    Mono16(Vec<i16>),
    /// 8-bit stereo samples (left, right)
    Stereo8(Vec<i8>, Vec<i8>),
    /// 16-bit stereo samples (left, right)
    Stereo16(Vec<i16>, Vec<i16>),
    /// Float mono samples (24-bit and float sources)
    MonoF32(Vec<f32>),
    /// Float stereo samples (left, right)
    StereoF32(Vec<f32>, Vec<f32>),
}

impl SampleData {
    /// Get the number of sample frames.
    pub fn len(&self) -> usize {
        match self {
            SampleData::Mono8(v) => v.len(),
            SampleData::Mono16(v) => v.len(),
            SampleData::Stereo8(l, _) => l.len(),
            SampleData::Stereo16(l, _) => l.len(),
            SampleData::MonoF32(v) => v.len(),
            SampleData::StereoF32(l, _) => l.len(),
        }
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of channels in the sample data.
    pub fn num_channels(&self) -> u16 {
        match self {
            SampleData::Mono8(_) | SampleData::Mono16(_) | SampleData::MonoF32(_) => 1,
            _ => 2,
        }
    }
}

fn f32_to_i16(v: f32) -> i16 {
    (v.clamp(-1.0, 1.0) * 32767.0) as i16
}

impl AudioSource for SampleData {
    fn channels(&self) -> u16 {
        self.num_channels()
    }

    fn frames(&self) -> usize {
        self.len()
    }

    /// Stereo data answers channel 0 with left and anything else with right.
    /// Mono data answers every channel with its single plane.
    fn read_i16(&self, ch: u16, frame: usize) -> i16 {
        match self {
            SampleData::Mono8(v) => v.get(frame).copied().unwrap_or(0) as i16 * 256,
            SampleData::Mono16(v) => v.get(frame).copied().unwrap_or(0),
            SampleData::Stereo8(l, r) => {
                let plane = if ch == 0 { l } else { r };
                plane.get(frame).copied().unwrap_or(0) as i16 * 256
            }
            SampleData::Stereo16(l, r) => {
                let plane = if ch == 0 { l } else { r };
                plane.get(frame).copied().unwrap_or(0)
            }
            SampleData::MonoF32(_) | SampleData::StereoF32(..) => f32_to_i16(self.read_f32(ch, frame)),
        }
    }

    fn read_f32(&self, ch: u16, frame: usize) -> f32 {
        match self {
            SampleData::MonoF32(v) => v.get(frame).copied().unwrap_or(0.0),
            SampleData::StereoF32(l, r) => {
                let plane = if ch == 0 { l } else { r };
                plane.get(frame).copied().unwrap_or(0.0)
            }
            _ => self.read_i16(ch, frame) as f32 / 32768.0,
        }
    }
}

impl AudioSource for Sample {
    fn channels(&self) -> u16 {
        self.data.num_channels()
    }

    fn frames(&self) -> usize {
        self.data.len()
    }

    fn read_i16(&self, ch: u16, frame: usize) -> i16 {
        self.data.read_i16(ch, frame)
    }

    fn read_f32(&self, ch: u16, frame: usize) -> f32 {
        self.data.read_f32(ch, frame)
    }
}
