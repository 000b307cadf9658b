//! Concatenation of shaped segments into the final track.

use serde::{Deserialize, Serialize};
use sw_formats::EncodeParams;
use sw_ir::{seconds_to_frames, AudioSegment, FadeCurve};
use tracing::debug;

use crate::engine::AudioEngine;
use crate::error::EngineError;

/// How adjacent segments are blended.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeSettings {
    /// Seconds of overlap per join.
    pub overlap: f64,
    pub curve: FadeCurve,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self { overlap: 0.05, curve: FadeCurve::Linear }
    }
}

/// A composed track and the format it will be written in.
#[derive(Clone, Debug)]
pub struct RenderedTrack {
    pub audio: AudioSegment,
    pub params: EncodeParams,
}

impl RenderedTrack {
    pub fn frames(&self) -> usize {
        self.audio.frames()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.audio.duration_seconds()
    }
}

pub struct Compositor<'e, E: AudioEngine + ?Sized> {
    engine: &'e E,
    settings: CrossfadeSettings,
    params: EncodeParams,
}

impl<'e, E: AudioEngine + ?Sized> Compositor<'e, E> {
    pub fn new(engine: &'e E, settings: CrossfadeSettings, params: EncodeParams) -> Self {
        Self { engine, settings, params }
    }

    pub fn settings(&self) -> &CrossfadeSettings {
        &self.settings
    }

    /// Overlap per join, in frames at the output rate.
    pub fn overlap_frames(&self) -> usize {
        seconds_to_frames(self.settings.overlap, self.params.sample_rate)
    }

    /// Join `segments` in order with a crossfade at every boundary.
    ///
    /// The result lasts the sum of the segments minus one overlap per join.
    pub fn compose(&self, segments: Vec<AudioSegment>) -> Result<RenderedTrack, EngineError> {
        if segments.is_empty() {
            return Err(EngineError::Composition("no segments to compose".into()));
        }
        let count = segments.len();
        let overlap = self.overlap_frames();
        let audio = self.engine.crossfade(segments, overlap, self.settings.curve)?;
        debug!(segments = count, overlap_frames = overlap, frames = audio.frames(), "composed");
        Ok(RenderedTrack { audio, params: self.params })
    }

    /// Encode a composed track to container bytes.
    pub fn encode(&self, track: &RenderedTrack) -> Result<Vec<u8>, EngineError> {
        self.engine.encode(&track.audio, &track.params)
    }
}
