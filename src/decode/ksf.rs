// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
//! Single-sample files: standard WAV, the native KSF1 header, or raw PCM behind an
//! unknown header.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::decode::{first_success, Strategy};
use crate::model::{LoopMode, PcmFormat, SampleAsset};
use crate::scan;

/// Buffers shorter than this hold no sample.
pub const MIN_SAMPLE_LEN: usize = 44;

const KSF_AUDIO_OFFSET: usize = 64;
const KSF_SHORT_AUDIO_OFFSET: usize = 32;
const GENERIC_HEADER_SIZES: [usize; 6] = [0, 32, 44, 64, 128, 256];
const GENERIC_SAMPLE_RATE: u32 = 44100;
const PROBE_SAMPLES: usize = 1000;

struct Context<'a> {
    name: &'a str,
}

/// Decodes one sample. `None` if nothing in the buffer looks like audio.
pub fn decode(data: &[u8], name: &str) -> Option<SampleAsset> {
    if data.len() < MIN_SAMPLE_LEN {
        return None;
    }

    let context = Context { name };
    match data.get(..4) {
        Some(b"RIFF") => first_success(
            name,
            data,
            &context,
            &[Strategy {
                name: "riff-wave",
                run: decode_wav,
            }],
        ),
        Some(b"KSF1") | Some(b"kSF1") => first_success(
            name,
            data,
            &context,
            &[
                Strategy {
                    name: "ksf1-header",
                    run: decode_ksf1,
                },
                Strategy {
                    name: "generic-probe",
                    run: decode_generic,
                },
            ],
        ),
        _ => first_success(
            name,
            data,
            &context,
            &[Strategy {
                name: "generic-probe",
                run: decode_generic,
            }],
        ),
    }
}

fn decode_wav(data: &[u8], context: &Context) -> Option<SampleAsset> {
    let reader = match WavReader::new(Cursor::new(data)) {
        Ok(reader) => reader,
        Err(e) => {
            debug!(sample = context.name, err = %e, "Not a readable WAV file");
            return None;
        }
    };
    let spec = reader.spec();
    let samples: Vec<i16> = match spec.sample_format {
        SampleFormat::Int => {
            let bits = i32::from(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| to_i16(v, bits)))
                .collect::<Result<_, _>>()
                .ok()?
        }
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
            .collect::<Result<_, _>>()
            .ok()?,
    };

    let pcm = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    let format = PcmFormat::new(spec.sample_rate, 16, spec.channels);
    let asset = SampleAsset::new(context.name, context.name, 0, format, pcm);
    let frames = asset.frame_count();
    Some(asset.with_loop(LoopMode::None, 0, frames))
}

fn to_i16(value: i32, bits: i32) -> i16 {
    let scaled = if bits > 16 {
        value >> (bits - 16)
    } else {
        value << (16 - bits)
    };
    scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Native header, all fields little-endian:
///
/// ```text
/// 0x08 u32 rate   0x0C u16 bits   0x0E u16 channels   0x10 u32 frames
/// 0x14 u32 loop start   0x18 u32 loop end   0x1C loop mode   0x1D root key
/// 0x1E i16 fine tune (cents)
/// ```
fn decode_ksf1(data: &[u8], context: &Context) -> Option<SampleAsset> {
    let sample_rate = scan::le_u32(data, 0x08)?;
    let bit_depth = scan::le_u16(data, 0x0C)?;
    let channels = scan::le_u16(data, 0x0E)?;
    let frames = scan::le_u32(data, 0x10)?;
    let loop_start = scan::le_u32(data, 0x14)?;
    let loop_end = scan::le_u32(data, 0x18)?;
    let loop_mode = scan::byte(data, 0x1C).unwrap_or(0);
    let root_key = scan::byte(data, 0x1D).unwrap_or(60);
    let fine_tune = scan::le_i16(data, 0x1E).unwrap_or(0);

    if !valid_params(sample_rate, bit_depth, channels) {
        debug!(
            sample = context.name,
            sample_rate, bit_depth, channels, "KSF1 header out of range"
        );
        return None;
    }

    let audio_offset = if KSF_AUDIO_OFFSET < data.len() {
        KSF_AUDIO_OFFSET
    } else {
        KSF_SHORT_AUDIO_OFFSET
    };
    let format = PcmFormat::new(sample_rate, bit_depth, channels);
    let mut asset = SampleAsset::new(
        context.name,
        context.name,
        0,
        format,
        data[audio_offset..].to_vec(),
    )
    .with_data_offset(audio_offset);
    if frames > 0 {
        asset = asset.with_frame_count(frames);
    }
    let loop_end = if loop_end > 0 {
        loop_end
    } else {
        asset.frame_count()
    };
    Some(
        asset
            .with_loop(LoopMode::from_raw(loop_mode), loop_start, loop_end)
            .with_tuning(root_key, fine_tune),
    )
}

fn valid_params(sample_rate: u32, bit_depth: u16, channels: u16) -> bool {
    (8000..=192_000).contains(&sample_rate)
        && matches!(bit_depth, 8 | 16 | 24 | 32)
        && (1..=8).contains(&channels)
}

/// Unknown header: try common header sizes and take the first remainder that
/// looks like 16-bit audio. Assumes 44.1 kHz stereo.
fn decode_generic(data: &[u8], context: &Context) -> Option<SampleAsset> {
    let header = GENERIC_HEADER_SIZES
        .iter()
        .copied()
        .filter(|&size| size < data.len())
        .find(|&size| looks_like_audio(&data[size..]))?;

    let format = PcmFormat::new(GENERIC_SAMPLE_RATE, 16, 2);
    let asset = SampleAsset::new(context.name, context.name, 0, format, data[header..].to_vec())
        .with_data_offset(header);
    let frames = asset.frame_count();
    Some(asset.with_loop(LoopMode::None, 0, frames))
}

/// Statistical check that a buffer holds 16-bit audio: not silent, not saturated
/// noise, and with a plausible zero-crossing rate. Small buffers are accepted.
pub fn looks_like_audio(data: &[u8]) -> bool {
    if data.len() < PROBE_SAMPLES * 2 {
        return data.len() > 100;
    }
    let Some(samples) = scan::le_i16_run(data, 0, PROBE_SAMPLES) else {
        return false;
    };

    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|&s| (f64::from(s) - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();
    if !(10.0..=30000.0).contains(&std_dev) {
        return false;
    }

    let crossings = samples
        .windows(2)
        .filter(|pair| pair[0].signum() != pair[1].signum())
        .count();
    let rate = crossings as f64 / n;
    rate > 0.001 && rate < 0.8
}
