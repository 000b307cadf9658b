//! Multichannel f32 audio segment with planar layout.

use crate::time::frames_to_seconds;

/// Sample rate every segment is conformed to before composing.
pub const STANDARD_SAMPLE_RATE: u32 = 44100;

/// Channel count every segment is conformed to before composing.
pub const STANDARD_CHANNELS: u16 = 2;

/// An owned block of audio in planar layout.
///
/// Data is stored as `channels` contiguous planes of `frames` samples each.
/// `data[ch * frames + frame]` gives the sample for channel `ch` at `frame`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    data: Vec<f32>,
    channels: u16,
    frames: usize,
    sample_rate: u32,
}

impl AudioSegment {
    /// Create a new silent segment with the given dimensions.
    pub fn new(channels: u16, frames: usize, sample_rate: u32) -> Self {
        Self {
            data: vec![0.0; channels as usize * frames],
            channels,
            frames,
            sample_rate,
        }
    }

    /// Build a segment from one plane per channel.
    ///
    /// Planes shorter than the longest one are zero-padded.
    pub fn from_planes(planes: &[&[f32]], sample_rate: u32) -> Self {
        let frames = planes.iter().map(|p| p.len()).max().unwrap_or(0);
        let mut segment = Self::new(planes.len() as u16, frames, sample_rate);
        for (ch, plane) in planes.iter().enumerate() {
            segment.channel_mut(ch as u16)[..plane.len()].copy_from_slice(plane);
        }
        segment
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        frames_to_seconds(self.frames, self.sample_rate)
    }

    /// True when both segments share sample rate and channel count.
    pub fn same_format(&self, other: &AudioSegment) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }

    /// Read-only access to one channel's sample data.
    pub fn channel(&self, ch: u16) -> &[f32] {
        let start = ch as usize * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Mutable access to one channel's sample data.
    pub fn channel_mut(&mut self, ch: u16) -> &mut [f32] {
        let start = ch as usize * self.frames;
        let len = self.frames;
        &mut self.data[start..start + len]
    }

    /// Iterate over mutable channel planes.
    pub fn planes_mut(&mut self) -> impl Iterator<Item = &mut [f32]> + '_ {
        // chunks_exact_mut(0) panics; an empty segment has no data anyway.
        self.data.chunks_exact_mut(self.frames.max(1))
    }

    /// Copy of `len` frames starting at `start`, zero-padded past the end.
    pub fn slice(&self, start: usize, len: usize) -> AudioSegment {
        let mut out = AudioSegment::new(self.channels, len, self.sample_rate);
        if start < self.frames {
            let n = len.min(self.frames - start);
            for ch in 0..self.channels {
                out.channel_mut(ch)[..n].copy_from_slice(&self.channel(ch)[start..start + n]);
            }
        }
        out
    }

    /// Copy truncated or zero-padded to exactly `frames`.
    pub fn resized(&self, frames: usize) -> AudioSegment {
        self.slice(0, frames)
    }

    /// Scale all samples by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for s in &mut self.data {
            *s *= gain;
        }
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// True when every sample is exactly zero.
    pub fn is_silent(&self) -> bool {
        self.data.iter().all(|&s| s == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_silent() {
        let seg = AudioSegment::new(2, 4, 44100);
        assert_eq!(seg.channels(), 2);
        assert_eq!(seg.frames(), 4);
        assert!(seg.is_silent());
    }

    #[test]
    fn channel_mut_writes_correctly() {
        let mut seg = AudioSegment::new(2, 2, 44100);
        seg.channel_mut(0)[0] = 1.0;
        seg.channel_mut(1)[1] = -0.5;
        assert_eq!(seg.channel(0), &[1.0, 0.0]);
        assert_eq!(seg.channel(1), &[0.0, -0.5]);
    }

    #[test]
    fn from_planes_pads_short_plane() {
        let seg = AudioSegment::from_planes(&[&[1.0, 2.0, 3.0], &[4.0]], 8000);
        assert_eq!(seg.frames(), 3);
        assert_eq!(seg.channel(1), &[4.0, 0.0, 0.0]);
    }

    #[test]
    fn duration_follows_rate() {
        let seg = AudioSegment::new(2, 22050, 44100);
        assert!((seg.duration_seconds() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn slice_pads_past_end() {
        let seg = AudioSegment::from_planes(&[&[1.0, 2.0, 3.0]], 8000);
        let s = seg.slice(2, 3);
        assert_eq!(s.channel(0), &[3.0, 0.0, 0.0]);
        let r = seg.resized(2);
        assert_eq!(r.channel(0), &[1.0, 2.0]);
        let beyond = seg.slice(10, 2);
        assert!(beyond.is_silent());
    }

    #[test]
    fn planes_mut_visits_each_channel() {
        let mut seg = AudioSegment::new(2, 3, 8000);
        for (i, plane) in seg.planes_mut().enumerate() {
            plane.fill(i as f32 + 1.0);
        }
        assert_eq!(seg.channel(0), &[1.0; 3]);
        assert_eq!(seg.channel(1), &[2.0; 3]);

        let mut empty = AudioSegment::new(2, 0, 8000);
        assert_eq!(empty.planes_mut().count(), 0);
    }

    #[test]
    fn apply_gain_and_peak() {
        let mut seg = AudioSegment::from_planes(&[&[1.0], &[-0.5]], 8000);
        seg.apply_gain(2.0);
        assert!((seg.peak() - 2.0).abs() < 1e-6);
        assert!((seg.channel(1)[0] - -1.0).abs() < 1e-6);
    }

    #[test]
    fn same_format_compares_rate_and_channels() {
        let a = AudioSegment::new(2, 10, 44100);
        assert!(a.same_format(&AudioSegment::new(2, 5, 44100)));
        assert!(!a.same_format(&AudioSegment::new(1, 10, 44100)));
        assert!(!a.same_format(&AudioSegment::new(2, 10, 48000)));
    }
}
