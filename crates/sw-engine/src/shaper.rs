//! Retiming and envelope shaping of single-note recordings.
//!
//! A note is conformed to the pipeline format, cut or padded to its notated
//! length, band-limited when long enough, and faded in and out so segment
//! edges meet the crossfades without clicks.

use serde::{Deserialize, Serialize};
use sw_ir::{is_valid_duration, seconds_to_frames, AudioSegment, FadeCurve, Sample};
use tracing::debug;

use crate::engine::{AudioEngine, PadMode};
use crate::error::EngineError;

/// Tuning for [`SegmentShaper`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaperSettings {
    /// Notes longer than this (seconds) get the long-note envelope and filters.
    pub envelope_threshold: f64,
    /// Upper bound on the long-note fade, in seconds.
    pub fixed_fade: f64,
    /// Long-note fade is at most `duration / long_fade_divisor`.
    pub long_fade_divisor: f64,
    /// Short-note fade is `duration / short_fade_divisor`.
    pub short_fade_divisor: f64,
    /// High-pass corner for long notes; `None` disables it.
    pub high_pass_hz: Option<f32>,
    /// Low-pass corner for long notes; `None` disables it.
    pub low_pass_hz: Option<f32>,
    pub pad_mode: PadMode,
    pub fade_curve: FadeCurve,
    /// Linear gain applied to every note.
    pub gain: f32,
}

impl Default for ShaperSettings {
    fn default() -> Self {
        Self {
            envelope_threshold: 0.2,
            fixed_fade: 0.1,
            long_fade_divisor: 4.0,
            short_fade_divisor: 6.0,
            high_pass_hz: Some(20.0),
            low_pass_hz: Some(15000.0),
            pad_mode: PadMode::Silence,
            fade_curve: FadeCurve::Linear,
            gain: 1.0,
        }
    }
}

/// Fade lengths (seconds) and filter choice for one note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopePlan {
    pub fade_in: f64,
    pub fade_out: f64,
    pub band_limit: bool,
}

impl EnvelopePlan {
    /// No fades, no filters.
    pub fn none() -> Self {
        Self { fade_in: 0.0, fade_out: 0.0, band_limit: false }
    }

    /// Envelope for a note of `duration` seconds.
    pub fn for_duration(duration: f64, settings: &ShaperSettings) -> Self {
        if duration > settings.envelope_threshold {
            let fade = settings.fixed_fade.min(duration / settings.long_fade_divisor);
            Self { fade_in: fade, fade_out: fade, band_limit: true }
        } else {
            let fade = duration / settings.short_fade_divisor;
            Self { fade_in: fade, fade_out: fade, band_limit: false }
        }
    }
}

/// Turns a recording into a segment of an exact length.
pub struct SegmentShaper<'e, E: AudioEngine + ?Sized> {
    engine: &'e E,
    settings: ShaperSettings,
    sample_rate: u32,
    channels: u16,
}

impl<'e, E: AudioEngine + ?Sized> SegmentShaper<'e, E> {
    pub fn new(engine: &'e E, settings: ShaperSettings, sample_rate: u32, channels: u16) -> Self {
        Self { engine, settings, sample_rate, channels }
    }

    pub fn settings(&self) -> &ShaperSettings {
        &self.settings
    }

    /// Envelope that [`SegmentShaper::shape`] applies for these arguments.
    pub fn plan(&self, duration: f64, apply_envelope: bool) -> EnvelopePlan {
        if apply_envelope {
            EnvelopePlan::for_duration(duration, &self.settings)
        } else {
            EnvelopePlan::none()
        }
    }

    /// Retime `sample` to `duration` seconds and shape it.
    pub fn shape(
        &self,
        sample: &Sample,
        duration: f64,
        apply_envelope: bool,
    ) -> Result<AudioSegment, EngineError> {
        if !is_valid_duration(duration) {
            return Err(EngineError::InvalidDuration(duration));
        }
        if sample.is_empty() {
            return Err(EngineError::Shaping {
                asset: sample.name.to_string(),
                reason: "recording is empty".into(),
            });
        }

        let plan = self.plan(duration, apply_envelope);
        let target = seconds_to_frames(duration, self.sample_rate);
        let fade_in = seconds_to_frames(plan.fade_in, self.sample_rate);
        let fade_out = seconds_to_frames(plan.fade_out, self.sample_rate);

        let source = self.engine.conform(sample, self.sample_rate, self.channels);
        let needed = fade_in + fade_out;
        if apply_envelope && self.settings.pad_mode == PadMode::Silence && source.frames() < needed {
            return Err(EngineError::Shaping {
                asset: sample.name.to_string(),
                reason: format!(
                    "recording has {} frames, envelope needs {}",
                    source.frames(),
                    needed
                ),
            });
        }

        debug!(
            asset = %sample.name,
            duration,
            fade_in = plan.fade_in,
            fade_out = plan.fade_out,
            band_limit = plan.band_limit,
            "shaping"
        );

        let mut segment = self.engine.trim(source, target, self.settings.pad_mode);
        if self.settings.gain != 1.0 {
            self.engine.gain(&mut segment, self.settings.gain);
        }
        // Filters run before the fades so the edges stay exactly silent.
        if plan.band_limit {
            if let Some(hz) = self.settings.high_pass_hz {
                self.engine.high_pass(&mut segment, hz);
            }
            if let Some(hz) = self.settings.low_pass_hz {
                self.engine.low_pass(&mut segment, hz);
            }
        }
        self.engine.fade_in(&mut segment, fade_in, self.settings.fade_curve);
        self.engine.fade_out(&mut segment, fade_out, self.settings.fade_curve);
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NativeEngine;
    use sw_ir::SampleData;

    fn tone(frames: usize) -> Sample {
        let mut s = Sample::new("mid/1");
        s.data = SampleData::MonoF32(vec![0.5; frames]);
        s.sample_rate = 44100;
        s
    }

    fn unfiltered() -> ShaperSettings {
        ShaperSettings { high_pass_hz: None, low_pass_hz: None, ..ShaperSettings::default() }
    }

    #[test]
    fn long_note_plan() {
        let s = ShaperSettings::default();
        for d in [0.25, 0.3, 0.4, 0.5, 1.0, 2.0] {
            let plan = EnvelopePlan::for_duration(d, &s);
            let expected = (0.1f64).min(d / 4.0);
            assert!((plan.fade_in - expected).abs() < 1e-12, "d={}", d);
            assert!((plan.fade_out - expected).abs() < 1e-12, "d={}", d);
            assert!(plan.band_limit);
        }
    }

    #[test]
    fn short_note_plan() {
        let s = ShaperSettings::default();
        for d in [0.01, 0.1, 0.125, 0.2] {
            let plan = EnvelopePlan::for_duration(d, &s);
            assert!((plan.fade_in - d / 6.0).abs() < 1e-12, "d={}", d);
            assert!((plan.fade_out - d / 6.0).abs() < 1e-12, "d={}", d);
            assert!(!plan.band_limit);
        }
    }

    #[test]
    fn no_envelope_plan() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 2);
        assert_eq!(shaper.plan(1.0, false), EnvelopePlan::none());
    }

    #[test]
    fn trims_to_exact_length() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 2);
        let seg = shaper.shape(&tone(88200), 0.5, true).unwrap();
        assert_eq!(seg.frames(), 22050);
        assert_eq!(seg.channels(), 2);
    }

    #[test]
    fn long_note_fades_over_min_of_fixed_and_quarter() {
        let shaper = SegmentShaper::new(&NativeEngine, unfiltered(), 44100, 1);
        // 0.3 s: fade = min(0.1, 0.075) = 0.075 s = 3308 frames (3307.5 rounded).
        let seg = shaper.shape(&tone(44100), 0.3, true).unwrap();
        let fade = seconds_to_frames(0.075, 44100);
        let ch = seg.channel(0);
        assert_eq!(ch[0], 0.0);
        assert!(ch[fade - 1] < 0.5);
        assert_eq!(ch[fade], 0.5);
        assert_eq!(ch[seg.frames() - fade - 1], 0.5);
        assert!(ch[seg.frames() - fade] < 0.5);
        assert_eq!(ch[seg.frames() - 1], 0.0);
    }

    #[test]
    fn short_note_fades_over_sixth() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 1);
        let seg = shaper.shape(&tone(44100), 0.12, true).unwrap();
        let fade = seconds_to_frames(0.02, 44100);
        let ch = seg.channel(0);
        assert_eq!(ch[0], 0.0);
        // Short notes are not filtered, so the plateau is the raw level.
        assert_eq!(ch[fade], 0.5);
        assert!(ch[fade - 1] < 0.5);
        assert_eq!(ch[seg.frames() - 1], 0.0);
    }

    #[test]
    fn without_envelope_only_trims() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 1);
        let seg = shaper.shape(&tone(44100), 0.5, false).unwrap();
        assert!(seg.channel(0).iter().all(|&s| s == 0.5));
    }

    #[test]
    fn long_note_is_band_limited() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 1);
        let seg = shaper.shape(&tone(44100), 1.0, true).unwrap();
        // A constant (DC) recording is removed by the 20 Hz high-pass.
        let mid = seg.channel(0)[seg.frames() / 2];
        assert!(mid.abs() < 0.01, "dc residual {}", mid);
    }

    #[test]
    fn short_source_pads_with_silence() {
        let shaper = SegmentShaper::new(&NativeEngine, unfiltered(), 44100, 1);
        let seg = shaper.shape(&tone(22050), 1.0, true).unwrap();
        assert_eq!(seg.frames(), 44100);
        assert_eq!(seg.channel(0)[30000], 0.0);
    }

    #[test]
    fn loop_mode_repeats_source() {
        let settings = ShaperSettings { pad_mode: PadMode::Loop, ..unfiltered() };
        let shaper = SegmentShaper::new(&NativeEngine, settings, 44100, 1);
        let seg = shaper.shape(&tone(1000), 1.0, true).unwrap();
        assert_eq!(seg.channel(0)[30000], 0.5);
    }

    #[test]
    fn source_too_short_for_envelope() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 1);
        // 1.0 s note needs 2 x 0.1 s of fades = 8820 frames of material.
        let err = shaper.shape(&tone(100), 1.0, true).unwrap_err();
        assert!(matches!(err, EngineError::Shaping { .. }));
        // Without an envelope the same source is simply padded.
        assert!(shaper.shape(&tone(100), 1.0, false).is_ok());
    }

    #[test]
    fn empty_source_fails() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 1);
        assert!(matches!(
            shaper.shape(&Sample::new("empty"), 0.5, false),
            Err(EngineError::Shaping { .. })
        ));
    }

    #[test]
    fn invalid_duration_fails() {
        let shaper = SegmentShaper::new(&NativeEngine, ShaperSettings::default(), 44100, 1);
        for d in [0.0, 1e300] {
            assert!(matches!(
                shaper.shape(&tone(100), d, true),
                Err(EngineError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn gain_scales_note() {
        let settings = ShaperSettings { gain: 0.5, ..unfiltered() };
        let shaper = SegmentShaper::new(&NativeEngine, settings, 44100, 1);
        let seg = shaper.shape(&tone(44100), 0.5, false).unwrap();
        assert_eq!(seg.channel(0)[100], 0.25);
    }
}
