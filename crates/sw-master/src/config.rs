//! Render configuration, loadable from RON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sw_engine::{CrossfadeSettings, ShaperSettings};
use sw_formats::EncodeParams;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a render needs besides the score. Missing fields take defaults.
///
/// ```ron
/// (
///     bits_per_sample: 24,
///     crossfade: (overlap: 0.03, curve: EqualPower),
///     sample_root: "assets/piano",
/// )
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub shaper: ShaperSettings,
    pub crossfade: CrossfadeSettings,
    /// Root of the `<register>/<degree>.wav` sample tree.
    pub sample_root: PathBuf,
    pub output_dir: PathBuf,
    pub output_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let params = EncodeParams::default();
        Self {
            sample_rate: params.sample_rate,
            channels: params.channels,
            bits_per_sample: params.bits_per_sample,
            shaper: ShaperSettings::default(),
            crossfade: CrossfadeSettings::default(),
            sample_root: PathBuf::from("samples"),
            output_dir: PathBuf::from("output"),
            output_name: "score.wav".into(),
        }
    }
}

impl RenderConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive".into());
        }
        if !(1..=2).contains(&self.channels) {
            return invalid(format!("channels must be 1 or 2, got {}", self.channels));
        }
        if self.bits_per_sample != 16 && self.bits_per_sample != 24 {
            return invalid(format!("bits_per_sample must be 16 or 24, got {}", self.bits_per_sample));
        }
        if self.output_name.is_empty() {
            return invalid("output_name is empty".into());
        }

        let s = &self.shaper;
        let timings = [
            ("shaper.envelope_threshold", s.envelope_threshold),
            ("shaper.fixed_fade", s.fixed_fade),
            ("shaper.long_fade_divisor", s.long_fade_divisor),
            ("shaper.short_fade_divisor", s.short_fade_divisor),
            ("crossfade.overlap", self.crossfade.overlap),
        ];
        for (name, value) in timings {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("{} must be positive, got {}", name, value));
            }
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        for (name, hz) in [("shaper.high_pass_hz", s.high_pass_hz), ("shaper.low_pass_hz", s.low_pass_hz)] {
            if let Some(hz) = hz {
                if !(hz > 0.0 && hz < nyquist) {
                    return invalid(format!("{} must be within (0, {}), got {}", name, nyquist, hz));
                }
            }
        }
        if !s.gain.is_finite() || s.gain < 0.0 {
            return invalid(format!("shaper.gain must be non-negative, got {}", s.gain));
        }
        Ok(())
    }
}
