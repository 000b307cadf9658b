//! Conversions between seconds and frame counts.

/// Number of frames covering `seconds` at `sample_rate`, rounded to nearest.
///
/// Non-positive or non-finite input gives 0.
pub fn seconds_to_frames(seconds: f64, sample_rate: u32) -> usize {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    libm::round(seconds * sample_rate as f64) as usize
}

/// Longest single event accepted, in seconds. Keeps frame counts and buffer
/// sizes far from overflow.
pub const MAX_EVENT_SECONDS: f64 = 3600.0;

/// Whether `seconds` is a usable event duration: finite, positive and at
/// most [`MAX_EVENT_SECONDS`].
pub fn is_valid_duration(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0 && seconds <= MAX_EVENT_SECONDS
}

/// Length in seconds of `frames` frames at `sample_rate`.
pub fn frames_to_seconds(frames: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64
}
