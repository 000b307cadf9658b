//! Second-order Butterworth low/high-pass filters.
//!
//! RBJ cookbook biquads with Q = 1/sqrt(2), run in direct form I.
//! Coefficients and state are f64 so a 20 Hz corner at 44.1 kHz stays stable.

use core::f64::consts::{FRAC_1_SQRT_2, TAU};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
}

/// One biquad section with its own history. Use one per channel.
#[derive(Clone, Debug)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Design a filter. The cutoff is clamped below Nyquist.
    pub fn new(kind: FilterKind, cutoff_hz: f32, sample_rate: u32) -> Self {
        let sr = sample_rate.max(1) as f64;
        let fc = (cutoff_hz as f64).clamp(1.0, sr * 0.49);
        let w0 = TAU * fc / sr;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * FRAC_1_SQRT_2);

        let (b0, b1, b2) = match kind {
            FilterKind::LowPass => ((1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0),
            FilterKind::HighPass => ((1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0),
        };
        let a0 = 1.0 + alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Filter one sample.
    pub fn process(&mut self, x: f32) -> f32 {
        let x = x as f64;
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y as f32
    }

    /// Filter a buffer in place.
    pub fn run(&mut self, buffer: &mut [f32]) {
        for s in buffer {
            *s = self.process(*s);
        }
    }
}
