//! Sample-rate and channel-layout conversion.
//!
//! Steps through the source with a 16.16 fixed-point increment and blends the
//! two nearest frames.

use sw_ir::{AudioSegment, AudioSource};

/// Convert `source` (recorded at `source_rate`) to `channels` at `sample_rate`.
///
/// Mono sources are copied to every output channel; stereo folded to mono is
/// the average of left and right.
pub fn conform(source: &impl AudioSource, source_rate: u32, sample_rate: u32, channels: u16) -> AudioSegment {
    let src_frames = source.frames();
    if src_frames == 0 || source.channels() == 0 || source_rate == 0 || sample_rate == 0 {
        return AudioSegment::new(channels, 0, sample_rate);
    }

    let out_frames = if source_rate == sample_rate {
        src_frames
    } else {
        ((src_frames as u64 * sample_rate as u64 + source_rate as u64 / 2) / source_rate as u64) as usize
    };
    let increment = ((source_rate as u64) << 16) / sample_rate as u64;

    let mut out = AudioSegment::new(channels, out_frames, sample_rate);
    for ch in 0..channels {
        let plane = out.channel_mut(ch);
        if source_rate == sample_rate {
            for (i, s) in plane.iter_mut().enumerate() {
                *s = read_mapped(source, ch, channels, i);
            }
            continue;
        }
        for (i, s) in plane.iter_mut().enumerate() {
            let pos = i as u64 * increment;
            let idx = (pos >> 16) as usize;
            let frac = (pos & 0xFFFF) as f32 / 65536.0;
            let a = read_mapped(source, ch, channels, idx.min(src_frames - 1));
            let b = read_mapped(source, ch, channels, (idx + 1).min(src_frames - 1));
            *s = a + (b - a) * frac;
        }
    }
    out
}

fn read_mapped(source: &impl AudioSource, ch: u16, out_channels: u16, frame: usize) -> f32 {
    let src_channels = source.channels();
    if src_channels == 2 && out_channels == 1 {
        return (source.read_f32(0, frame) + source.read_f32(1, frame)) * 0.5;
    }
    source.read_f32(ch.min(src_channels - 1), frame)
}
