//! Score structure: an ordered, flat list of notes and rests.

use arrayvec::ArrayString;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::time::is_valid_duration;

/// Symbol used for rests in the tuple form.
pub const REST_SYMBOL: &str = "rest";

/// A score event in its loader-facing tuple form:
/// `(symbol, register, duration_seconds, legato)`.
pub type RawEvent = (String, String, f64, bool);

/// One of the seven scale degrees of numbered notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    Do,
    Re,
    Mi,
    Fa,
    Sol,
    La,
    Ti,
}

impl PitchClass {
    pub const ALL: [PitchClass; 7] = [
        PitchClass::Do,
        PitchClass::Re,
        PitchClass::Mi,
        PitchClass::Fa,
        PitchClass::Sol,
        PitchClass::La,
        PitchClass::Ti,
    ];

    /// Scale degree, 1-7.
    pub fn degree(self) -> u8 {
        self as u8 + 1
    }

    /// Look up a pitch class by scale degree (1-7).
    pub fn from_degree(degree: u8) -> Option<Self> {
        let idx = degree.checked_sub(1)? as usize;
        Self::ALL.get(idx).copied()
    }

    /// Parse the textual symbol `"1"`..`"7"`.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.as_bytes() {
            [d @ b'1'..=b'7'] => Self::from_degree(d - b'0'),
            _ => None,
        }
    }

    /// Textual symbol, `"1"`..`"7"`.
    pub fn symbol(self) -> &'static str {
        ["1", "2", "3", "4", "5", "6", "7"][self as usize]
    }
}

/// Octave band of a note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    Low,
    Mid,
    High,
}

impl Register {
    pub const ALL: [Register; 3] = [Register::Low, Register::Mid, Register::High];

    /// Parse `"low"`, `"mid"` or `"high"`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Register::Low),
            "mid" => Some(Register::Mid),
            "high" => Some(Register::High),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Register::Low => "low",
            Register::Mid => "mid",
            Register::High => "high",
        }
    }
}

/// Parse a textual `(symbol, register)` pair into a note.
pub fn parse_note(symbol: &str, register: &str) -> Result<(PitchClass, Register), ScoreError> {
    match (PitchClass::parse(symbol), Register::parse(register)) {
        (Some(pitch), Some(reg)) => Ok((pitch, reg)),
        _ => Err(ScoreError::UnknownNote {
            symbol: symbol.into(),
            register: register.into(),
        }),
    }
}

/// Whether an event sounds a note or is silent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Note { pitch: PitchClass, register: Register },
    Rest,
}

/// A single note or rest. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreEvent {
    kind: EventKind,
    duration: f64,
    legato: bool,
}

fn check_duration(duration: f64) -> Result<f64, ScoreError> {
    if is_valid_duration(duration) {
        Ok(duration)
    } else {
        Err(ScoreError::InvalidDuration(duration))
    }
}

impl ScoreEvent {
    /// A note of `duration` seconds.
    pub fn note(pitch: PitchClass, register: Register, duration: f64) -> Result<Self, ScoreError> {
        Ok(Self {
            kind: EventKind::Note { pitch, register },
            duration: check_duration(duration)?,
            legato: false,
        })
    }

    /// A rest of `duration` seconds.
    pub fn rest(duration: f64) -> Result<Self, ScoreError> {
        Ok(Self {
            kind: EventKind::Rest,
            duration: check_duration(duration)?,
            legato: false,
        })
    }

    /// Build an event from its tuple form.
    pub fn from_tuple(
        symbol: &str,
        register: &str,
        duration: f64,
        legato: bool,
    ) -> Result<Self, ScoreError> {
        let event = if symbol == REST_SYMBOL {
            if !register.is_empty() {
                return Err(ScoreError::RegisterOnRest(register.into()));
            }
            Self::rest(duration)?
        } else {
            let (pitch, reg) = parse_note(symbol, register)?;
            Self::note(pitch, reg, duration)?
        };
        Ok(event.with_legato(legato))
    }

    /// Back to the tuple form.
    pub fn to_tuple(&self) -> RawEvent {
        let (symbol, register) = match self.kind {
            EventKind::Note { pitch, register } => (pitch.symbol(), register.name()),
            EventKind::Rest => (REST_SYMBOL, ""),
        };
        (symbol.into(), register.into(), self.duration, self.legato)
    }

    /// Same event with the legato flag set.
    pub fn with_legato(self, legato: bool) -> Self {
        Self { legato, ..self }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Duration in seconds, always > 0.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn legato(&self) -> bool {
        self.legato
    }

    pub fn is_rest(&self) -> bool {
        self.kind == EventKind::Rest
    }
}

impl fmt::Display for ScoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Note { pitch, register } => {
                write!(f, "{}({}) {:.2}s", pitch.symbol(), register.name(), self.duration)?
            }
            EventKind::Rest => write!(f, "rest {:.2}s", self.duration)?,
        }
        write!(f, " legato={}", self.legato)
    }
}

/// On-disk / serialized form of a score.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreFile {
    pub title: String,
    /// Informational tempo in BPM. Durations are already in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<u16>,
    pub events: Vec<RawEvent>,
}

/// A complete piece: title plus ordered events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScoreFile", into = "ScoreFile")]
pub struct Score {
    title: ArrayString<64>,
    tempo: Option<u16>,
    events: Vec<ScoreEvent>,
}

fn truncated_title(title: &str) -> ArrayString<64> {
    let mut out = ArrayString::new();
    for c in title.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}

impl Score {
    /// Create a score from already-validated events.
    pub fn new(title: &str, events: Vec<ScoreEvent>) -> Self {
        Self {
            title: truncated_title(title),
            tempo: None,
            events,
        }
    }

    /// Start building a score event by event.
    pub fn builder(title: &str) -> ScoreBuilder {
        ScoreBuilder::new(title)
    }

    /// Build a score from `(symbol, register, duration, legato)` tuples.
    ///
    /// Fails on the first invalid tuple.
    pub fn from_tuples<I, S>(title: &str, tuples: I) -> Result<Self, ScoreError>
    where
        I: IntoIterator<Item = (S, S, f64, bool)>,
        S: AsRef<str>,
    {
        let events = tuples
            .into_iter()
            .map(|(symbol, register, duration, legato)| {
                ScoreEvent::from_tuple(symbol.as_ref(), register.as_ref(), duration, legato)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(title, events))
    }

    pub fn with_tempo(mut self, bpm: u16) -> Self {
        self.tempo = Some(bpm);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tempo(&self) -> Option<u16> {
        self.tempo
    }

    pub fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ScoreEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of all event durations, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(ScoreEvent::duration).sum()
    }

    pub fn note_count(&self) -> usize {
        self.events.iter().filter(|e| !e.is_rest()).count()
    }

    pub fn rest_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_rest()).count()
    }
}

impl<'a> IntoIterator for &'a Score {
    type Item = &'a ScoreEvent;
    type IntoIter = core::slice::Iter<'a, ScoreEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl TryFrom<ScoreFile> for Score {
    type Error = ScoreError;

    fn try_from(file: ScoreFile) -> Result<Self, Self::Error> {
        let score = Score::from_tuples(&file.title, file.events)?;
        Ok(match file.tempo {
            Some(bpm) => score.with_tempo(bpm),
            None => score,
        })
    }
}

impl From<Score> for ScoreFile {
    fn from(score: Score) -> Self {
        Self {
            title: score.title.to_string(),
            tempo: score.tempo,
            events: score.events.iter().map(ScoreEvent::to_tuple).collect(),
        }
    }
}

/// Incremental score construction. The first invalid event is reported
/// by [`ScoreBuilder::build`].
#[derive(Debug)]
pub struct ScoreBuilder {
    title: ArrayString<64>,
    tempo: Option<u16>,
    events: Vec<ScoreEvent>,
    error: Option<ScoreError>,
}

impl ScoreBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: truncated_title(title),
            tempo: None,
            events: Vec::new(),
            error: None,
        }
    }

    pub fn tempo(mut self, bpm: u16) -> Self {
        self.tempo = Some(bpm);
        self
    }

    pub fn note(self, pitch: PitchClass, register: Register, duration: f64) -> Self {
        self.push(ScoreEvent::note(pitch, register, duration))
    }

    pub fn legato_note(self, pitch: PitchClass, register: Register, duration: f64) -> Self {
        self.push(ScoreEvent::note(pitch, register, duration).map(|e| e.with_legato(true)))
    }

    pub fn rest(self, duration: f64) -> Self {
        self.push(ScoreEvent::rest(duration))
    }

    fn push(mut self, event: Result<ScoreEvent, ScoreError>) -> Self {
        match event {
            Ok(event) => self.events.push(event),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn build(self) -> Result<Score, ScoreError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(Score {
            title: self.title,
            tempo: self.tempo,
            events: self.events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_symbols_round_trip() {
        for p in PitchClass::ALL {
            assert_eq!(PitchClass::parse(p.symbol()), Some(p));
        }
        assert_eq!(PitchClass::parse("0"), None);
        assert_eq!(PitchClass::parse("8"), None);
        assert_eq!(PitchClass::parse("12"), None);
        assert_eq!(PitchClass::parse(""), None);
    }

    #[test]
    fn degree_matches_symbol() {
        assert_eq!(PitchClass::Do.degree(), 1);
        assert_eq!(PitchClass::Ti.degree(), 7);
        assert_eq!(PitchClass::from_degree(5), Some(PitchClass::Sol));
        assert_eq!(PitchClass::from_degree(0), None);
    }

    #[test]
    fn rest_tuple_has_no_register() {
        let rest = ScoreEvent::from_tuple("rest", "", 0.5, false).unwrap();
        assert!(rest.is_rest());
        assert_eq!(rest.kind(), EventKind::Rest);

        let err = ScoreEvent::from_tuple("rest", "mid", 0.5, false).unwrap_err();
        assert_eq!(err, ScoreError::RegisterOnRest("mid".into()));
    }

    #[test]
    fn unknown_symbol_or_register_rejected() {
        let err = ScoreEvent::from_tuple("8", "mid", 0.5, false).unwrap_err();
        assert!(matches!(err, ScoreError::UnknownNote { .. }));

        let err = ScoreEvent::from_tuple("1", "ultra", 0.5, false).unwrap_err();
        assert!(matches!(err, ScoreError::UnknownNote { .. }));

        // A note must carry a register.
        let err = ScoreEvent::from_tuple("1", "", 0.5, false).unwrap_err();
        assert!(matches!(err, ScoreError::UnknownNote { .. }));
    }

    #[test]
    fn non_positive_duration_rejected() {
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e300] {
            let err = ScoreEvent::rest(d).unwrap_err();
            assert!(matches!(err, ScoreError::InvalidDuration(_)));
        }
    }

    #[test]
    fn from_tuples_keeps_order_and_flags() {
        let score = Score::from_tuples(
            "test",
            [
                ("rest", "", 0.5, false),
                ("1", "mid", 0.5, false),
                ("2", "mid", 0.25, true),
                ("7", "low", 1.0, false),
            ],
        )
        .unwrap();
        assert_eq!(score.len(), 4);
        assert_eq!(score.rest_count(), 1);
        assert_eq!(score.note_count(), 3);
        assert!((score.total_duration() - 2.25).abs() < 1e-12);
        assert!(score.events()[2].legato());
        assert_eq!(
            score.events()[3].kind(),
            EventKind::Note { pitch: PitchClass::Ti, register: Register::Low }
        );
    }

    #[test]
    fn builder_reports_first_error() {
        let err = Score::builder("bad")
            .note(PitchClass::Do, Register::Mid, 0.5)
            .rest(0.0)
            .rest(-1.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ScoreError::InvalidDuration(0.0));
    }

    #[test]
    fn builder_builds_in_order() {
        let score = Score::builder("ok")
            .tempo(60)
            .rest(0.5)
            .legato_note(PitchClass::Re, Register::High, 0.25)
            .build()
            .unwrap();
        assert_eq!(score.tempo(), Some(60));
        assert!(score.events()[0].is_rest());
        assert!(score.events()[1].legato());
    }

    #[test]
    fn long_title_is_truncated() {
        let long = "x".repeat(100);
        let score = Score::new(&long, Vec::new());
        assert_eq!(score.title().len(), 64);
    }

    #[test]
    fn display_formats_event() {
        let e = ScoreEvent::from_tuple("6", "low", 1.0, true).unwrap();
        assert_eq!(e.to_string(), "6(low) 1.00s legato=true");
        let r = ScoreEvent::rest(0.5).unwrap();
        assert_eq!(r.to_string(), "rest 0.50s legato=false");
    }

    #[test]
    fn ron_score_loads() {
        let src = r#"(
            title: "Huang",
            tempo: 60,
            events: [
                ("rest", "", 0.5, false),
                ("1", "mid", 0.5, false),
                ("7", "low", 0.5, false),
            ],
        )"#;
        let score: Score = ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .from_str(src)
            .unwrap();
        assert_eq!(score.title(), "Huang");
        assert_eq!(score.tempo(), Some(60));
        assert_eq!(score.len(), 3);
    }

    #[test]
    fn ron_score_with_bad_event_fails() {
        let src = r#"(title: "x", events: [("9", "mid", 0.5, false)])"#;
        assert!(ron::from_str::<Score>(src).is_err());
    }
}
