//! WAV encoding and decoding for PCM audio.

use crate::FormatError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use sw_ir::{AudioSource, Sample, SampleData, STANDARD_CHANNELS, STANDARD_SAMPLE_RATE};

const FORMAT_PCM: u16 = 1;
const FORMAT_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Output container parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeParams {
    pub sample_rate: u32,
    pub channels: u16,
    /// 16 or 24
    pub bits_per_sample: u16,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            sample_rate: STANDARD_SAMPLE_RATE,
            channels: STANDARD_CHANNELS,
            bits_per_sample: 16,
        }
    }
}

impl EncodeParams {
    /// Bytes per second of encoded audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }
}

// --- Writing ---

/// Write `source` as a PCM WAV stream.
///
/// Channels beyond the source's count repeat its last channel, so mono
/// sources are written as dual-mono.
pub fn write_wav(
    w: &mut impl Write,
    source: &impl AudioSource,
    params: &EncodeParams,
) -> Result<(), FormatError> {
    if params.bits_per_sample != 16 && params.bits_per_sample != 24 {
        return Err(FormatError::Unsupported(format!(
            "{}-bit output",
            params.bits_per_sample
        )));
    }
    if !(1..=2).contains(&params.channels) {
        return Err(FormatError::Unsupported(format!("{} output channels", params.channels)));
    }
    let data_size = source.frames() as u32 * params.block_align() as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, params)?;
    write_data_chunk(w, source, params, data_size)?;
    Ok(())
}

/// Encode `source` into an in-memory WAV file.
pub fn encode_wav(source: &impl AudioSource, params: &EncodeParams) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::with_capacity(44 + source.frames() * params.block_align() as usize);
    write_wav(&mut buf, source, params)?;
    Ok(buf)
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(w: &mut impl Write, params: &EncodeParams) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&FORMAT_PCM.to_le_bytes())?;
    w.write_all(&params.channels.to_le_bytes())?;
    w.write_all(&params.sample_rate.to_le_bytes())?;
    w.write_all(&params.byte_rate().to_le_bytes())?;
    w.write_all(&params.block_align().to_le_bytes())?;
    w.write_all(&params.bits_per_sample.to_le_bytes())
}

fn write_data_chunk(
    w: &mut impl Write,
    source: &impl AudioSource,
    params: &EncodeParams,
    data_size: u32,
) -> std::io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    let last_ch = source.channels().saturating_sub(1);
    for frame in 0..source.frames() {
        for ch in 0..params.channels {
            let v = source.read_f32(ch.min(last_ch), frame).clamp(-1.0, 1.0);
            if params.bits_per_sample == 24 {
                let s = (v * 8_388_607.0) as i32;
                w.write_all(&s.to_le_bytes()[..3])?;
            } else {
                w.write_all(&((v * 32767.0) as i16).to_le_bytes())?;
            }
        }
    }
    Ok(())
}

// --- Reading ---

/// Load a WAV file from raw bytes into a Sample.
pub fn load_wav(data: &[u8], name: &str) -> Result<Sample, FormatError> {
    let header = parse_header(data)?;
    let sample_data = read_pcm_data(data, &header)?;

    let mut sample = Sample::new(name);
    sample.data = sample_data;
    sample.sample_rate = header.sample_rate;
    Ok(sample)
}

struct WavHeader {
    format: u16,
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_offset: usize,
    data_size: usize,
}

fn parse_header(data: &[u8]) -> Result<WavHeader, FormatError> {
    if data.len() < 44 {
        return Err(FormatError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(FormatError::InvalidHeader);
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut data_chunk: Option<(usize, usize)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32_le(data, pos + 4) as usize;

        if chunk_id == b"fmt " && chunk_size >= 16 && pos + 24 <= data.len() {
            let mut format = read_u16_le(data, pos + 8);
            if format == FORMAT_EXTENSIBLE && chunk_size >= 40 && pos + 34 <= data.len() {
                // First two bytes of the sub-format GUID carry the real tag.
                format = read_u16_le(data, pos + 32);
            }
            let channels = read_u16_le(data, pos + 10);
            let rate = read_u32_le(data, pos + 12);
            let bits = read_u16_le(data, pos + 22);
            fmt = Some((format, channels, rate, bits));
        } else if chunk_id == b"data" {
            data_chunk = Some((pos + 8, chunk_size));
        }

        pos = pos.saturating_add(8 + chunk_size);
        if pos % 2 != 0 {
            pos += 1;
        }
    }

    let (format, num_channels, sample_rate, bits_per_sample) = fmt.ok_or(FormatError::InvalidHeader)?;
    let (data_offset, data_size) = data_chunk.ok_or(FormatError::InvalidHeader)?;

    let supported = matches!(
        (format, bits_per_sample),
        (FORMAT_PCM, 8) | (FORMAT_PCM, 16) | (FORMAT_PCM, 24) | (FORMAT_FLOAT, 32)
    );
    if !supported {
        return Err(FormatError::Unsupported(format!(
            "format tag {} at {} bits",
            format, bits_per_sample
        )));
    }
    if !(1..=2).contains(&num_channels) {
        return Err(FormatError::Unsupported(format!("{} channels", num_channels)));
    }
    if sample_rate == 0 {
        return Err(FormatError::InvalidHeader);
    }

    Ok(WavHeader { format, num_channels, sample_rate, bits_per_sample, data_offset, data_size })
}

fn read_pcm_data(data: &[u8], header: &WavHeader) -> Result<SampleData, FormatError> {
    let end = header.data_offset.saturating_add(header.data_size).min(data.len());
    let raw = data.get(header.data_offset..end).ok_or(FormatError::UnexpectedEof)?;
    let stereo = header.num_channels == 2;

    match (header.format, header.bits_per_sample, stereo) {
        (FORMAT_PCM, 8, false) => Ok(SampleData::Mono8(read_8bit_mono(raw))),
        (FORMAT_PCM, 8, true) => {
            let (l, r) = read_8bit_stereo(raw);
            Ok(SampleData::Stereo8(l, r))
        }
        (FORMAT_PCM, 16, false) => Ok(SampleData::Mono16(read_16bit_mono(raw))),
        (FORMAT_PCM, 16, true) => {
            let (l, r) = read_16bit_stereo(raw);
            Ok(SampleData::Stereo16(l, r))
        }
        (FORMAT_PCM, 24, _) => Ok(split_float(read_wide(raw, 3, decode_24bit), stereo)),
        (FORMAT_FLOAT, 32, _) => Ok(split_float(read_wide(raw, 4, decode_f32), stereo)),
        _ => Err(FormatError::Unsupported(format!("{}-bit data", header.bits_per_sample))),
    }
}

/// Read 8-bit unsigned PCM -> signed i8 (WAV 8-bit is unsigned 0-255, center=128).
fn read_8bit_mono(raw: &[u8]) -> Vec<i8> {
    raw.iter().map(|&b| (b as i16 - 128) as i8).collect()
}

fn read_8bit_stereo(raw: &[u8]) -> (Vec<i8>, Vec<i8>) {
    let mut left = Vec::with_capacity(raw.len() / 2);
    let mut right = Vec::with_capacity(raw.len() / 2);
    for chunk in raw.chunks_exact(2) {
        left.push((chunk[0] as i16 - 128) as i8);
        right.push((chunk[1] as i16 - 128) as i8);
    }
    (left, right)
}

fn read_16bit_mono(raw: &[u8]) -> Vec<i16> {
    raw.chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

fn read_16bit_stereo(raw: &[u8]) -> (Vec<i16>, Vec<i16>) {
    let mut left = Vec::with_capacity(raw.len() / 4);
    let mut right = Vec::with_capacity(raw.len() / 4);
    for chunk in raw.chunks_exact(4) {
        left.push(i16::from_le_bytes([chunk[0], chunk[1]]));
        right.push(i16::from_le_bytes([chunk[2], chunk[3]]));
    }
    (left, right)
}

fn decode_24bit(b: &[u8]) -> f32 {
    // Place the three bytes in the top of an i32 to sign-extend.
    let v = i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8;
    v as f32 / 8_388_608.0
}

fn decode_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn read_wide(raw: &[u8], width: usize, decode: fn(&[u8]) -> f32) -> Vec<f32> {
    raw.chunks_exact(width).map(decode).collect()
}

/// Deinterleave float samples.
fn split_float(interleaved: Vec<f32>, stereo: bool) -> SampleData {
    if !stereo {
        return SampleData::MonoF32(interleaved);
    }
    let mut left = Vec::with_capacity(interleaved.len() / 2);
    let mut right = Vec::with_capacity(interleaved.len() / 2);
    for pair in interleaved.chunks_exact(2) {
        left.push(pair[0]);
        right.push(pair[1]);
    }
    SampleData::StereoF32(left, right)
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}
