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
use std::fmt;
use std::time::Duration;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::util::duration_minutes_seconds;

/// Identifies a sample by its position in the owning package's sample list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SampleId(pub usize);

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a sample loops during sustain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    #[default]
    None,
    Forward,
    Bidirectional,
    Reverse,
}

impl LoopMode {
    /// Maps a raw loop mode byte, clamping unknown values to reverse.
    pub fn from_raw(raw: u8) -> LoopMode {
        match raw {
            0 => LoopMode::None,
            1 => LoopMode::Forward,
            2 => LoopMode::Bidirectional,
            _ => LoopMode::Reverse,
        }
    }
}

/// The semantic role the classifier assigns to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unknown,
    Percussion,
    Pitched,
    OneShot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unknown => "unknown",
            Role::Percussion => "percussion",
            Role::Pitched => "pitched",
            Role::OneShot => "one-shot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The layout of a linear PCM payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channel_count: u16,
}

impl PcmFormat {
    pub fn new(sample_rate: u32, bit_depth: u16, channel_count: u16) -> PcmFormat {
        PcmFormat {
            sample_rate,
            bit_depth,
            channel_count,
        }
    }

    /// 16-bit mono, the layout of every sample container block.
    pub fn pcm16_mono(sample_rate: u32) -> PcmFormat {
        PcmFormat::new(sample_rate, 16, 1)
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self.bit_depth {
            8 | 16 | 24 | 32 => usize::from(self.bit_depth / 8),
            _ => 0,
        }
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * usize::from(self.channel_count)
    }
}

/// One recovered audio sample. The PCM payload is little-endian and owned by the
/// asset; frame and loop bounds always fit inside it.
#[derive(Clone, PartialEq)]
pub struct SampleAsset {
    name: String,
    container: String,
    index: usize,
    format: PcmFormat,
    frame_count: u32,
    loop_start: u32,
    loop_end: u32,
    loop_mode: LoopMode,
    root_key: u8,
    fine_tune_cents: i16,
    data_offset: usize,
    pcm: Vec<u8>,
}

impl SampleAsset {
    /// Creates an asset whose frame count is derived from the payload length.
    pub fn new(
        name: impl Into<String>,
        container: impl Into<String>,
        index: usize,
        format: PcmFormat,
        pcm: Vec<u8>,
    ) -> SampleAsset {
        let mut asset = SampleAsset {
            name: name.into(),
            container: container.into(),
            index,
            format,
            frame_count: 0,
            loop_start: 0,
            loop_end: 0,
            loop_mode: LoopMode::None,
            root_key: 60,
            fine_tune_cents: 0,
            data_offset: 0,
            pcm,
        };
        asset.frame_count = asset.max_frames();
        asset
    }

    fn max_frames(&self) -> u32 {
        match self.format.bytes_per_frame() {
            0 => 0,
            bpf => u32::try_from(self.pcm.len() / bpf).unwrap_or(u32::MAX),
        }
    }

    /// Uses a declared frame count, clamped to what the payload can hold.
    pub fn with_frame_count(mut self, frames: u32) -> SampleAsset {
        self.frame_count = frames.min(self.max_frames());
        self.loop_end = self.loop_end.min(self.frame_count);
        self.loop_start = self.loop_start.min(self.loop_end);
        self
    }

    /// Sets loop points. Looping bounds are clamped to the frame count.
    pub fn with_loop(mut self, mode: LoopMode, start: u32, end: u32) -> SampleAsset {
        self.loop_mode = mode;
        self.loop_end = end.min(self.frame_count);
        self.loop_start = start.min(self.loop_end);
        self
    }

    pub fn with_tuning(mut self, root_key: u8, fine_tune_cents: i16) -> SampleAsset {
        self.root_key = root_key.min(127);
        self.fine_tune_cents = fine_tune_cents;
        self
    }

    pub fn with_data_offset(mut self, offset: usize) -> SampleAsset {
        self.data_offset = offset;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The container (file) this sample was recovered from.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Position of this sample within its container.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn bit_depth(&self) -> u16 {
        self.format.bit_depth
    }

    pub fn channel_count(&self) -> u16 {
        self.format.channel_count
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn loop_start(&self) -> u32 {
        self.loop_start
    }

    pub fn loop_end(&self) -> u32 {
        self.loop_end
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn root_key(&self) -> u8 {
        self.root_key
    }

    pub fn fine_tune_cents(&self) -> i16 {
        self.fine_tune_cents
    }

    /// Byte offset of the payload in the originating container.
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// The little-endian PCM payload.
    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    /// The part of the payload covered by `frame_count`.
    pub fn frames_bytes(&self) -> &[u8] {
        let len = self.frame_count as usize * self.format.bytes_per_frame();
        &self.pcm[..len.min(self.pcm.len())]
    }

    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(f64::from(self.frame_count) / f64::from(self.format.sample_rate))
    }

    /// Decodes the interleaved samples to signed integers at their native width.
    /// 8-bit payloads are unsigned and get re-centered around zero.
    pub fn samples_i32(&self) -> Vec<i32> {
        let bytes = self.frames_bytes();
        match self.format.bit_depth {
            8 => bytes.iter().map(|&b| i32::from(b) - 128).collect(),
            16 => bytes
                .chunks_exact(2)
                .map(|c| i32::from(LittleEndian::read_i16(c)))
                .collect(),
            24 => bytes.chunks_exact(3).map(LittleEndian::read_i24).collect(),
            32 => bytes.chunks_exact(4).map(LittleEndian::read_i32).collect(),
            _ => Vec::new(),
        }
    }

    /// Converts the first channel to 16-bit little-endian PCM.
    pub fn to_pcm16_mono(&self) -> Vec<u8> {
        if self.format.bit_depth == 16 && self.format.channel_count == 1 {
            return self.frames_bytes().to_vec();
        }

        let channels = usize::from(self.format.channel_count.max(1));
        let shift_down = i32::from(self.format.bit_depth.saturating_sub(16));
        let shift_up = i32::from(16u16.saturating_sub(self.format.bit_depth));
        let mut out = Vec::with_capacity(self.frame_count as usize * 2);
        for value in self.samples_i32().into_iter().step_by(channels) {
            let value = (value >> shift_down) << shift_up;
            let value = value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

impl fmt::Debug for SampleAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleAsset")
            .field("name", &self.name)
            .field("container", &self.container)
            .field("index", &self.index)
            .field("format", &self.format)
            .field("frame_count", &self.frame_count)
            .field("loop_mode", &self.loop_mode)
            .field("pcm_len", &self.pcm.len())
            .finish()
    }
}

impl fmt::Display for SampleAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} Hz, {}-bit, {} ch, {})",
            self.name,
            self.format.sample_rate,
            self.format.bit_depth,
            self.format.channel_count,
            duration_minutes_seconds(self.duration())
        )
    }
}
