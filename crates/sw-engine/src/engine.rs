//! The audio-processing capability every pipeline stage is written against.

use serde::{Deserialize, Serialize};
use sw_formats::{encode_wav, EncodeParams};
use sw_ir::{AudioSegment, FadeCurve, Sample};
use tracing::debug;

use crate::error::EngineError;
use crate::filter::{Biquad, FilterKind};
use crate::resample::conform;

/// How a recording shorter than its target duration is extended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadMode {
    /// Append silence.
    #[default]
    Silence,
    /// Repeat the recording from its start.
    Loop,
}

/// Declarative audio operations. Stages never touch samples directly.
pub trait AudioEngine {
    /// Convert a decoded recording to `channels` at `sample_rate`.
    fn conform(&self, sample: &Sample, sample_rate: u32, channels: u16) -> AudioSegment;

    /// Cut or extend `segment` to exactly `frames`.
    fn trim(&self, segment: AudioSegment, frames: usize, pad: PadMode) -> AudioSegment;

    /// Scale every sample.
    fn gain(&self, segment: &mut AudioSegment, gain: f32);

    /// Ramp the first `frames` frames up from silence.
    fn fade_in(&self, segment: &mut AudioSegment, frames: usize, curve: FadeCurve);

    /// Ramp the last `frames` frames down to silence.
    fn fade_out(&self, segment: &mut AudioSegment, frames: usize, curve: FadeCurve);

    fn high_pass(&self, segment: &mut AudioSegment, cutoff_hz: f32);

    fn low_pass(&self, segment: &mut AudioSegment, cutoff_hz: f32);

    /// Join `segments` in order, blending each pair over up to `overlap` frames.
    fn crossfade(
        &self,
        segments: Vec<AudioSegment>,
        overlap: usize,
        curve: FadeCurve,
    ) -> Result<AudioSegment, EngineError>;

    /// Encode to the output container, converting format first if needed.
    fn encode(&self, segment: &AudioSegment, params: &EncodeParams) -> Result<Vec<u8>, EngineError>;
}

/// Length of `lengths` joined with up to `overlap` frames per join.
///
/// Each join overlaps by `overlap`, or by the shorter of the running total
/// and the incoming segment when either is shorter than that.
pub fn joined_length(lengths: &[usize], overlap: usize) -> usize {
    let mut iter = lengths.iter();
    let Some(&first) = iter.next() else {
        return 0;
    };
    iter.fold(first, |total, &len| total + len - join_overlap(total, len, overlap))
}

fn join_overlap(total: usize, incoming: usize, overlap: usize) -> usize {
    overlap.min(total).min(incoming)
}

/// In-process implementation of [`AudioEngine`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }

    fn filter(&self, segment: &mut AudioSegment, kind: FilterKind, cutoff_hz: f32) {
        let rate = segment.sample_rate();
        for plane in segment.planes_mut() {
            Biquad::new(kind, cutoff_hz, rate).run(plane);
        }
    }
}

impl AudioEngine for NativeEngine {
    fn conform(&self, sample: &Sample, sample_rate: u32, channels: u16) -> AudioSegment {
        conform(sample, sample.sample_rate, sample_rate, channels)
    }

    fn trim(&self, segment: AudioSegment, frames: usize, pad: PadMode) -> AudioSegment {
        let len = segment.frames();
        if len == frames {
            return segment;
        }
        if len > frames || len == 0 || pad == PadMode::Silence {
            return segment.resized(frames);
        }

        let mut out = AudioSegment::new(segment.channels(), frames, segment.sample_rate());
        for ch in 0..segment.channels() {
            let src = segment.channel(ch);
            for (dst, s) in out.channel_mut(ch).chunks_mut(len).zip(std::iter::repeat(src)) {
                dst.copy_from_slice(&s[..dst.len()]);
            }
        }
        out
    }

    fn gain(&self, segment: &mut AudioSegment, gain: f32) {
        segment.apply_gain(gain);
    }

    fn fade_in(&self, segment: &mut AudioSegment, frames: usize, curve: FadeCurve) {
        let n = frames.min(segment.frames());
        if n == 0 {
            return;
        }
        for plane in segment.planes_mut() {
            for (i, s) in plane[..n].iter_mut().enumerate() {
                *s *= curve.gain(i as f32 / n as f32);
            }
        }
    }

    fn fade_out(&self, segment: &mut AudioSegment, frames: usize, curve: FadeCurve) {
        let n = frames.min(segment.frames());
        if n == 0 {
            return;
        }
        let start = segment.frames() - n;
        for plane in segment.planes_mut() {
            for (j, s) in plane[start..].iter_mut().enumerate() {
                *s *= curve.gain(1.0 - (j + 1) as f32 / n as f32);
            }
        }
    }

    fn high_pass(&self, segment: &mut AudioSegment, cutoff_hz: f32) {
        self.filter(segment, FilterKind::HighPass, cutoff_hz);
    }

    fn low_pass(&self, segment: &mut AudioSegment, cutoff_hz: f32) {
        self.filter(segment, FilterKind::LowPass, cutoff_hz);
    }

    fn crossfade(
        &self,
        mut segments: Vec<AudioSegment>,
        overlap: usize,
        curve: FadeCurve,
    ) -> Result<AudioSegment, EngineError> {
        let Some(first) = segments.first() else {
            return Err(EngineError::Composition("no segments to compose".into()));
        };
        if let Some(i) = segments.iter().position(|s| !s.same_format(first)) {
            return Err(EngineError::Composition(format!(
                "segment {} is {} Hz x{}, expected {} Hz x{}",
                i,
                segments[i].sample_rate(),
                segments[i].channels(),
                first.sample_rate(),
                first.channels()
            )));
        }
        let (channels, rate) = (first.channels(), first.sample_rate());
        if segments.len() == 1 {
            return Ok(segments.swap_remove(0));
        }

        let lengths: Vec<usize> = segments.iter().map(AudioSegment::frames).collect();
        let mut out = AudioSegment::new(channels, joined_length(&lengths, overlap), rate);

        let mut end = 0;
        for (i, seg) in segments.iter().enumerate() {
            let ov = if i == 0 { 0 } else { join_overlap(end, seg.frames(), overlap) };
            let start = end - ov;
            if i > 0 {
                debug!(join = i, overlap_frames = ov, "crossfade");
            }
            for ch in 0..seg.channels() {
                let src = seg.channel(ch);
                let dst = &mut out.channel_mut(ch)[start..start + seg.frames()];
                for k in 0..ov {
                    let (g_out, g_in) = curve.crossfade_gains(k as f32 / ov as f32);
                    dst[k] = dst[k] * g_out + src[k] * g_in;
                }
                dst[ov..].copy_from_slice(&src[ov..]);
            }
            end = start + seg.frames();
        }
        Ok(out)
    }

    fn encode(&self, segment: &AudioSegment, params: &EncodeParams) -> Result<Vec<u8>, EngineError> {
        if segment.sample_rate() == params.sample_rate && segment.channels() == params.channels {
            return Ok(encode_wav(segment, params)?);
        }
        let converted = conform(segment, segment.sample_rate(), params.sample_rate, params.channels);
        Ok(encode_wav(&converted, params)?)
    }
}
