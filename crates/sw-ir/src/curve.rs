//! Gain curves for fades and crossfades.

use core::f32::consts::FRAC_PI_2;
use serde::{Deserialize, Serialize};

/// Shape of a 0 → 1 gain ramp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FadeCurve {
    /// Straight line (triangular crossfade).
    #[default]
    #[serde(alias = "Triangular")]
    Linear,
    /// Sine quarter-wave. Paired with its mirror it gives an equal-power crossfade.
    #[serde(alias = "EqualPower")]
    SineQuarter,
    /// Exponential curve. 0.0 = linear, >0 = starts slow, <0 = starts fast.
    Exponential(f32),
}

impl FadeCurve {
    /// Rising gain at position `t` (clamped to 0.0..=1.0).
    pub fn gain(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::SineQuarter => libm::sinf(t * FRAC_PI_2),
            FadeCurve::Exponential(k) => {
                if k.abs() < 1e-6 {
                    t
                } else {
                    (libm::expf(k * t) - 1.0) / (libm::expf(k) - 1.0)
                }
            }
        }
    }

    /// Gains `(outgoing, incoming)` at position `t` through a crossfade.
    pub fn crossfade_gains(self, t: f32) -> (f32, f32) {
        (self.gain(1.0 - t), self.gain(t))
    }
}
