//! Headless render driver for scorewave.
//!
//! [`Renderer`] walks a score event by event, turns each one into a
//! segment, joins the segments and writes the track. Progress is published
//! through a [`StateHandle`] and a render can be stopped between events with
//! a [`CancelToken`].

mod config;
mod error;
mod state;
mod writer;

use std::path::{Path, PathBuf};

use sw_engine::{AudioEngine, Compositor, EngineError, NativeEngine, RenderedTrack, SegmentShaper, SilenceSynthesizer};
use sw_formats::{DirStore, ResolveError, SampleBank, SampleResolver, SampleStore};
use sw_ir::{AudioSegment, EventKind, RawEvent, ScoreError, ScoreEvent};
use tracing::{debug, info, warn};

// Re-export common types so callers don't need the lower crates directly.
pub use config::{ConfigError, RenderConfig};
pub use error::RenderError;
pub use state::{CancelToken, FailReason, PipelineState, StateHandle};
pub use sw_formats::FormatError;
pub use sw_ir::Score;
pub use writer::{is_partial, PartialFile, PARTIAL_SUFFIX};

/// An event left out of the track, and why.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedEvent {
    pub index: usize,
    /// The event as written, or its tuple form when it failed to parse.
    pub event: String,
    pub reason: String,
}

/// Summary of a finished render.
#[derive(Clone, Debug)]
pub struct RenderReport {
    pub output: PathBuf,
    /// Segments that made it into the track.
    pub segments: usize,
    pub skipped: Vec<SkippedEvent>,
    pub duration_seconds: f64,
}

/// What the per-event loop hands to the compositor.
#[derive(Debug, Default)]
pub struct SegmentList {
    pub segments: Vec<AudioSegment>,
    pub skipped: Vec<SkippedEvent>,
}

/// Drives a render from score to file.
pub struct Renderer<S, E = NativeEngine> {
    resolver: SampleResolver<S>,
    engine: E,
    config: RenderConfig,
    state: StateHandle,
    cancel: CancelToken,
}

impl Renderer<DirStore, NativeEngine> {
    /// Renderer reading samples from `config.sample_root`.
    pub fn from_config(config: RenderConfig) -> Self {
        let store = DirStore::new(&config.sample_root);
        Self::new(store, config)
    }
}

impl<S: SampleStore> Renderer<S, NativeEngine> {
    pub fn new(store: S, config: RenderConfig) -> Self {
        Self::with_engine(store, NativeEngine, config)
    }
}

impl<S: SampleStore, E: AudioEngine> Renderer<S, E> {
    pub fn with_engine(store: S, engine: E, config: RenderConfig) -> Self {
        Self {
            resolver: SampleResolver::new(store),
            engine,
            config,
            state: StateHandle::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Use `token` instead of a fresh one, so it can be shared before the
    /// renderer exists.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn resolver(&self) -> &SampleResolver<S> {
        &self.resolver
    }

    /// Shared view of the pipeline state, readable from other threads.
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Render `score` to the configured output path.
    pub fn render(&self, score: &Score) -> Result<RenderReport, RenderError> {
        self.render_to(score, &self.config.output_path())
    }

    /// Render `score` to `path`.
    pub fn render_to(&self, score: &Score, path: &Path) -> Result<RenderReport, RenderError> {
        info!(title = score.title(), events = score.len(), "rendering score");
        let events = score.iter().map(|e| Ok(*e));
        self.run(events, score.len(), path)
    }

    /// Render raw `(symbol, register, duration, legato)` tuples to `path`.
    ///
    /// Tuples are parsed one at a time as the driver reaches them, so an
    /// unknown note aborts at its position and a bad duration skips only
    /// its own event.
    pub fn render_tuples(&self, tuples: &[RawEvent], path: &Path) -> Result<RenderReport, RenderError> {
        info!(events = tuples.len(), "rendering raw events");
        let events = tuples
            .iter()
            .map(|(symbol, register, duration, legato)| ScoreEvent::from_tuple(symbol, register, *duration, *legato));
        self.run(events, tuples.len(), path)
    }

    /// Per-event stage only: resolve, shape or synthesize each event.
    pub fn segments(&self, score: &Score) -> Result<SegmentList, RenderError> {
        let result = self.collect_segments(score.iter().map(|e| Ok(*e)), score.len());
        result.map_err(|e| self.fail(e))
    }

    /// Per-event stage and composition, without writing.
    pub fn render_track(&self, score: &Score) -> Result<(RenderedTrack, Vec<SkippedEvent>), RenderError> {
        let result = self
            .collect_segments(score.iter().map(|e| Ok(*e)), score.len())
            .and_then(|list| Ok((self.compose(list.segments)?, list.skipped)));
        result.map_err(|e| self.fail(e))
    }

    fn run(
        &self,
        events: impl Iterator<Item = Result<ScoreEvent, ScoreError>>,
        total: usize,
        path: &Path,
    ) -> Result<RenderReport, RenderError> {
        let result = self.collect_segments(events, total).and_then(|list| {
            let segments = list.segments.len();
            let track = self.compose(list.segments)?;
            let output = self.write(&track, path)?;
            Ok(RenderReport {
                output,
                segments,
                duration_seconds: track.duration_seconds(),
                skipped: list.skipped,
            })
        });
        match result {
            Ok(report) => {
                self.state.set(PipelineState::Done);
                info!(
                    output = %report.output.display(),
                    segments = report.segments,
                    skipped = report.skipped.len(),
                    seconds = report.duration_seconds,
                    "render complete"
                );
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn collect_segments(
        &self,
        events: impl Iterator<Item = Result<ScoreEvent, ScoreError>>,
        total: usize,
    ) -> Result<SegmentList, RenderError> {
        let shaper = SegmentShaper::new(
            &self.engine,
            self.config.shaper.clone(),
            self.config.sample_rate,
            self.config.channels,
        );
        let silence = SilenceSynthesizer::new(self.config.sample_rate, self.config.channels);
        let mut bank = SampleBank::new();
        let mut list = SegmentList::default();

        for (index, event) in events.enumerate() {
            if self.cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
            let event = match event {
                Ok(event) => event,
                Err(ScoreError::InvalidDuration(d)) => {
                    let reason = EngineError::InvalidDuration(d).to_string();
                    self.skip(&mut list, index, format!("event {}", index + 1), reason);
                    continue;
                }
                Err(ScoreError::UnknownNote { symbol, register }) => {
                    self.state.set(PipelineState::Resolving(index));
                    return Err(RenderError::Resolving {
                        index,
                        source: ResolveError::UnknownNote { symbol, register },
                    });
                }
                Err(ScoreError::RegisterOnRest(register)) => {
                    self.state.set(PipelineState::Resolving(index));
                    return Err(RenderError::Resolving {
                        index,
                        source: ResolveError::UnknownNote { symbol: "rest".into(), register },
                    });
                }
            };
            info!("event {}/{}: {}", index + 1, total, event);

            let segment = match event.kind() {
                // Rests never resolve or shape; the state stays where it was.
                EventKind::Rest => silence.synthesize(event.duration()),
                EventKind::Note { pitch, register } => {
                    self.state.set(PipelineState::Resolving(index));
                    let handle = match self.resolver.resolve(pitch, register) {
                        Ok(handle) => handle,
                        Err(e @ ResolveError::AssetNotFound { .. }) => {
                            self.skip(&mut list, index, event.to_string(), e.to_string());
                            continue;
                        }
                        Err(source) => return Err(RenderError::Resolving { index, source }),
                    };
                    let sample = bank
                        .get_or_load(&self.resolver, &handle)
                        .map_err(|source| RenderError::Resolving { index, source })?;
                    self.state.set(PipelineState::Shaping(index));
                    shaper.shape(sample, event.duration(), true)
                }
            };

            match segment {
                Ok(segment) => list.segments.push(segment),
                Err(e @ (EngineError::Shaping { .. } | EngineError::InvalidDuration(_))) => {
                    self.skip(&mut list, index, event.to_string(), e.to_string());
                }
                Err(source) => return Err(RenderError::Shaping { index, source }),
            }
        }
        debug!(segments = list.segments.len(), decoded = bank.len(), "events processed");
        Ok(list)
    }

    fn compose(&self, segments: Vec<AudioSegment>) -> Result<RenderedTrack, RenderError> {
        if self.cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        self.state.set(PipelineState::Composing);
        let compositor = Compositor::new(&self.engine, self.config.crossfade, self.config.encode_params());
        compositor.compose(segments).map_err(RenderError::Composing)
    }

    fn write(&self, track: &RenderedTrack, path: &Path) -> Result<PathBuf, RenderError> {
        self.state.set(PipelineState::Writing);
        let bytes = self
            .engine
            .encode(&track.audio, &track.params)
            .map_err(RenderError::Encoding)?;
        let io_err = |source| RenderError::Writing { path: path.to_path_buf(), source };
        let mut file = PartialFile::create(path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.commit().map_err(io_err)
    }

    fn skip(&self, list: &mut SegmentList, index: usize, event: String, reason: String) {
        warn!(index, event = %event, reason = %reason, "skipping event");
        list.skipped.push(SkippedEvent { index, event, reason });
    }

    fn fail(&self, err: RenderError) -> RenderError {
        let reason = match err {
            RenderError::Cancelled => FailReason::Cancelled,
            ref e => FailReason::Error(e.to_string()),
        };
        if reason == FailReason::Cancelled {
            info!("render cancelled");
        }
        self.state.set(PipelineState::Failed(reason));
        err
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use sw_formats::{encode_wav, AssetId, EncodeParams, MemoryStore};
    use sw_ir::{FadeCurve, PitchClass, Register, Sample};
    use sw_engine::PadMode;

    fn tone_wav(frames: usize) -> Vec<u8> {
        let plane: Vec<f32> = (0..frames).map(|i| if i % 100 < 50 { 0.25 } else { -0.25 }).collect();
        let seg = AudioSegment::from_planes(&[&plane], 44100);
        encode_wav(&seg, &EncodeParams { channels: 1, ..EncodeParams::default() }).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with(AssetId::new(PitchClass::Do, Register::Mid), tone_wav(44100))
            .with(AssetId::new(PitchClass::Ti, Register::Low), tone_wav(44100))
            .with(AssetId::new(PitchClass::Re, Register::High), tone_wav(10))
    }

    fn renderer() -> Renderer<MemoryStore> {
        Renderer::new(store(), RenderConfig::default())
    }

    #[test]
    fn three_events_make_three_segments() {
        let score = Score::from_tuples("t", [("rest", "", 0.5, false), ("1", "mid", 0.5, false), ("7", "low", 0.5, false)])
            .unwrap();
        let r = renderer();
        let list = r.segments(&score).unwrap();
        assert_eq!(list.segments.len(), 3);
        assert!(list.skipped.is_empty());
        assert!(list.segments[0].is_silent());
        assert!(list.segments.iter().all(|s| s.frames() == 22050));
    }

    #[test]
    fn missing_asset_is_skipped() {
        let score = Score::from_tuples("t", [("1", "mid", 0.5, false), ("5", "mid", 0.5, false), ("rest", "", 0.25, false)])
            .unwrap();
        let (track, skipped) = renderer().render_track(&score).unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].index, 1);
        assert_eq!(track.frames(), 22050 + 11025 - 2205);
    }

    #[test]
    fn too_short_recording_is_skipped() {
        // high/2 holds 10 frames, far less than a 0.5 s envelope needs.
        let score = Score::from_tuples("t", [("2", "high", 0.5, false), ("1", "mid", 0.5, false)]).unwrap();
        let list = renderer().segments(&score).unwrap();
        assert_eq!(list.segments.len(), 1);
        assert_eq!(list.skipped[0].index, 0);
    }

    #[test]
    fn every_event_skipped_fails_composition() {
        let score = Score::from_tuples("t", [("3", "low", 0.5, false)]).unwrap();
        let r = renderer();
        let err = r.render_track(&score).unwrap_err();
        assert!(matches!(err, RenderError::Composing(EngineError::Composition(_))));
        assert!(matches!(r.state(), PipelineState::Failed(FailReason::Error(_))));
    }

    #[test]
    fn undecodable_asset_aborts() {
        let store = MemoryStore::new().with(AssetId::new(PitchClass::Do, Register::Mid), b"not a wav".to_vec());
        let r = Renderer::new(store, RenderConfig::default());
        let score = Score::from_tuples("t", [("rest", "", 0.5, false), ("1", "mid", 0.5, false)]).unwrap();
        let err = r.segments(&score).unwrap_err();
        assert!(matches!(err, RenderError::Resolving { index: 1, source: ResolveError::Format { .. } }));
    }

    #[test]
    fn cancelled_before_start() {
        let r = renderer();
        r.cancel_token().cancel();
        let score = Score::from_tuples("t", [("1", "mid", 0.5, false)]).unwrap();
        assert!(matches!(r.render_track(&score), Err(RenderError::Cancelled)));
        assert_eq!(r.state(), PipelineState::Failed(FailReason::Cancelled));
    }

    #[test]
    fn state_handle_tracks_last_stage() {
        let r = renderer();
        let handle = r.state_handle();
        assert_eq!(handle.get(), PipelineState::Idle);
        let score = Score::from_tuples("t", [("1", "mid", 0.5, false)]).unwrap();
        r.render_track(&score).unwrap();
        assert_eq!(handle.get(), PipelineState::Composing);
    }

    #[test]
    fn repeated_pitch_is_decoded_once() {
        let score = Score::builder("t")
            .note(PitchClass::Do, Register::Mid, 0.25)
            .note(PitchClass::Do, Register::Mid, 0.25)
            .note(PitchClass::Do, Register::Mid, 0.25)
            .build()
            .unwrap();
        let list = renderer().segments(&score).unwrap();
        assert_eq!(list.segments.len(), 3);
    }

    #[test]
    fn rests_leave_state_untouched() {
        let score = Score::builder("t").rest(0.5).rest(0.25).build().unwrap();
        let r = renderer();
        let list = r.segments(&score).unwrap();
        assert_eq!(list.segments.len(), 2);
        assert_eq!(r.state(), PipelineState::Idle);
    }

    /// Native engine that cancels the render once it has conformed
    /// `cancel_after` recordings.
    struct CancellingEngine {
        token: CancelToken,
        cancel_after: usize,
        conformed: Cell<usize>,
    }

    impl AudioEngine for CancellingEngine {
        fn conform(&self, sample: &Sample, sample_rate: u32, channels: u16) -> AudioSegment {
            let n = self.conformed.get() + 1;
            self.conformed.set(n);
            if n == self.cancel_after {
                self.token.cancel();
            }
            NativeEngine.conform(sample, sample_rate, channels)
        }
        fn trim(&self, segment: AudioSegment, frames: usize, pad: PadMode) -> AudioSegment {
            NativeEngine.trim(segment, frames, pad)
        }
        fn gain(&self, segment: &mut AudioSegment, gain: f32) {
            NativeEngine.gain(segment, gain)
        }
        fn fade_in(&self, segment: &mut AudioSegment, frames: usize, curve: FadeCurve) {
            NativeEngine.fade_in(segment, frames, curve)
        }
        fn fade_out(&self, segment: &mut AudioSegment, frames: usize, curve: FadeCurve) {
            NativeEngine.fade_out(segment, frames, curve)
        }
        fn high_pass(&self, segment: &mut AudioSegment, cutoff_hz: f32) {
            NativeEngine.high_pass(segment, cutoff_hz)
        }
        fn low_pass(&self, segment: &mut AudioSegment, cutoff_hz: f32) {
            NativeEngine.low_pass(segment, cutoff_hz)
        }
        fn crossfade(
            &self,
            segments: Vec<AudioSegment>,
            overlap: usize,
            curve: FadeCurve,
        ) -> Result<AudioSegment, EngineError> {
            NativeEngine.crossfade(segments, overlap, curve)
        }
        fn encode(&self, segment: &AudioSegment, params: &EncodeParams) -> Result<Vec<u8>, EngineError> {
            NativeEngine.encode(segment, params)
        }
    }

    #[test]
    fn cancel_during_render_stops_before_next_event() {
        let token = CancelToken::new();
        let engine = CancellingEngine { token: token.clone(), cancel_after: 2, conformed: Cell::new(0) };
        let r = Renderer::with_engine(store(), engine, RenderConfig::default()).with_cancel_token(token);
        let score = Score::from_tuples("t", [("1", "mid", 0.5, false), ("7", "low", 0.5, false), ("1", "mid", 0.5, false)])
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cancelled.wav");

        assert!(matches!(r.render_to(&score, &target), Err(RenderError::Cancelled)));
        assert_eq!(r.engine.conformed.get(), 2);
        assert_eq!(r.state(), PipelineState::Failed(FailReason::Cancelled));
        assert!(!target.exists());
        assert_eq!(fs_entries(dir.path()), 0);
    }

    fn fs_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }
}
