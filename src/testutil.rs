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
//! Builders for the synthetic containers used throughout the tests.

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use hound::{SampleFormat, WavSpec, WavWriter};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::decode::pcm::{FOOTER_BEGIN, FOOTER_END, NAME_ROW_SIZE, SAMPLE_HEADER_SIZE, SIGNATURE};

const PCM_TABLE_START: usize = 0x24;
const PCM_RATE_FIELD: usize = 20;
const PCM_NAME_INDEX: usize = 20;
const PCM_NAME_LEN: usize = 16;

/// Builds a sample container with a name table, sample blocks and a footer.
pub struct PcmFixture {
    offsets: Option<Vec<usize>>,
    block_len: usize,
    rate: u16,
    sample_count: Option<usize>,
    names: Vec<String>,
    with_count: bool,
    fill: Vec<i16>,
    name_table: bool,
    header_text: Vec<u8>,
    footer_end: bool,
}

impl PcmFixture {
    pub fn new() -> PcmFixture {
        PcmFixture {
            offsets: None,
            block_len: 0x100,
            rate: 0xBB80,
            sample_count: None,
            names: Vec::new(),
            with_count: false,
            fill: vec![1000, -1000, 500],
            name_table: true,
            header_text: Vec::new(),
            footer_end: true,
        }
    }

    /// Explicit footer offsets, in table order. Duplicates and out-of-order
    /// values are written as given.
    pub fn offsets(mut self, offsets: Vec<usize>) -> Self {
        self.offsets = Some(offsets);
        self
    }

    pub fn block_len(mut self, len: usize) -> Self {
        self.block_len = len;
        self
    }

    pub fn rate(mut self, rate: u16) -> Self {
        self.rate = rate;
        self
    }

    pub fn sample_count(mut self, count: usize) -> Self {
        self.sample_count = Some(count);
        self
    }

    pub fn names(mut self, names: &[&str]) -> Self {
        self.names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Writes the offset count before the offsets.
    pub fn with_count(mut self, with_count: bool) -> Self {
        self.with_count = with_count;
        self
    }

    /// Values repeated through every block's audio, stored big-endian.
    pub fn fill(mut self, values: &[i16]) -> Self {
        self.fill = values.to_vec();
        self
    }

    pub fn without_name_table(mut self) -> Self {
        self.name_table = false;
        self
    }

    /// Free text written where the name table would go.
    pub fn header_text(mut self, text: &[u8]) -> Self {
        self.header_text = text.to_vec();
        self
    }

    pub fn without_footer_end(mut self) -> Self {
        self.footer_end = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let table_rows = if self.name_table && !self.names.is_empty() {
            self.names.len() + 1
        } else {
            0
        };
        let header_len = PCM_TABLE_START + table_rows * NAME_ROW_SIZE + self.header_text.len();

        let offsets = match self.offsets.clone() {
            Some(offsets) => offsets,
            None => {
                let count = self
                    .sample_count
                    .unwrap_or_else(|| self.names.len().max(1));
                let first = (header_len.div_ceil(16) * 16).max(0x100);
                (0..count).map(|i| first + i * self.block_len).collect()
            }
        };

        let end = offsets
            .iter()
            .map(|o| o + self.block_len)
            .max()
            .unwrap_or(0x100);
        let mut data = vec![0u8; end];
        data[..4].copy_from_slice(SIGNATURE);

        if table_rows > 0 {
            for (i, name) in self.names.iter().enumerate() {
                let row = PCM_TABLE_START + i * NAME_ROW_SIZE;
                let bytes = &name.as_bytes()[..name.len().min(PCM_NAME_LEN)];
                data[row..row + bytes.len()].copy_from_slice(bytes);
                data[row + PCM_NAME_INDEX] = i as u8;
            }
        } else if !self.header_text.is_empty() {
            let text = &self.header_text;
            data[PCM_TABLE_START..PCM_TABLE_START + text.len()].copy_from_slice(text);
        }

        let mut distinct = offsets.clone();
        distinct.sort_unstable();
        distinct.dedup();
        for start in distinct {
            data[start + PCM_RATE_FIELD..start + PCM_RATE_FIELD + 2]
                .copy_from_slice(&self.rate.to_be_bytes());
            let audio = (start + SAMPLE_HEADER_SIZE..start + self.block_len).step_by(2);
            for (pos, value) in audio.zip(self.fill.iter().cycle()) {
                if pos + 2 <= data.len() {
                    data[pos..pos + 2].copy_from_slice(&value.to_be_bytes());
                }
            }
        }

        data.extend_from_slice(FOOTER_BEGIN);
        if self.with_count {
            data.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
        }
        for offset in &offsets {
            data.extend_from_slice(&(*offset as u32).to_be_bytes());
        }
        if self.footer_end {
            data.extend_from_slice(FOOTER_END);
        }
        data
    }
}

/// Builds a signed keymap with 16 byte zone records.
pub struct KmpFixture {
    name: String,
    zones: Vec<(u8, u8, u8, u16)>,
    count_offset: usize,
}

impl KmpFixture {
    pub fn new(name: &str) -> KmpFixture {
        KmpFixture {
            name: name.to_string(),
            zones: Vec::new(),
            count_offset: 32,
        }
    }

    pub fn zone(mut self, low: u8, high: u8, root: u8, sample_index: u16) -> Self {
        self.zones.push((low, high, root, sample_index));
        self
    }

    pub fn count_offset(mut self, offset: usize) -> Self {
        self.count_offset = offset;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = b"KMP1".to_vec();
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(self.name.as_bytes());
        data.push(0);
        data.resize(self.count_offset.max(data.len()), 0);
        data.extend_from_slice(&(self.zones.len() as u16).to_le_bytes());
        for (low, high, root, index) in self.zones {
            let mut record = [0u8; 16];
            record[0] = low;
            record[1] = high;
            record[2] = root;
            record[5] = 127;
            record[6..8].copy_from_slice(&index.to_le_bytes());
            record[8] = 127;
            record[9] = 64;
            data.extend_from_slice(&record);
        }
        data.extend_from_slice(&[0u8; 16]);
        data
    }
}

/// One entry of a chunked program bank.
pub struct ProgramEntry {
    name: String,
    category: u8,
    bank: u8,
}

impl ProgramEntry {
    pub fn new(name: &str, category: u8, bank: u8) -> ProgramEntry {
        ProgramEntry {
            name: name.to_string(),
            category,
            bank,
        }
    }
}

/// A `KORG` program bank holding a single `PRG1` chunk of 128 byte entries.
pub fn pcg_chunk_bytes(entries: &[ProgramEntry]) -> Vec<u8> {
    let mut chunk = (entries.len() as u16).to_le_bytes().to_vec();
    chunk.extend_from_slice(&[0u8; 2]);
    for entry in entries {
        let mut record = [0u8; 128];
        let name = &entry.name.as_bytes()[..entry.name.len().min(24)];
        record[..name.len()].copy_from_slice(name);
        record[24] = entry.category;
        record[25] = entry.bank;
        chunk.extend_from_slice(&record);
    }

    let mut data = b"KORG".to_vec();
    data.extend_from_slice(&[0u8; 4]);
    data.extend_from_slice(b"PRG1");
    data.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    data.extend_from_slice(&chunk);
    data
}

/// An in-memory WAV file with interleaved integer samples.
pub fn wav_bytes(sample_rate: u32, bits: u16, channels: u16, samples: &[i32]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(
        &mut cursor,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        },
    )
    .unwrap();
    for sample in samples {
        writer.write_sample(*sample).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}

/// A `KSF1` sample: the 64 byte header followed by 100 frames of 16-bit mono.
pub fn ksf1_bytes(
    sample_rate: u32,
    bits: u16,
    channels: u16,
    frames: u32,
    (loop_start, loop_end, loop_mode): (u32, u32, u8),
    root_key: u8,
    fine_tune: i16,
) -> Vec<u8> {
    let mut data = vec![0u8; 64];
    data[..4].copy_from_slice(b"KSF1");
    data[8..12].copy_from_slice(&sample_rate.to_le_bytes());
    data[12..14].copy_from_slice(&bits.to_le_bytes());
    data[14..16].copy_from_slice(&channels.to_le_bytes());
    data[16..20].copy_from_slice(&frames.to_le_bytes());
    data[20..24].copy_from_slice(&loop_start.to_le_bytes());
    data[24..28].copy_from_slice(&loop_end.to_le_bytes());
    data[28] = loop_mode;
    data[29] = root_key;
    data[30..32].copy_from_slice(&fine_tune.to_le_bytes());
    // A triangle wave. High bytes stay outside the ASCII letters.
    for i in 0..100i16 {
        let value = (i % 20) * 200 - 2000;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

/// A `KORG` tagged container: model, file count and 32 byte file entries.
pub fn korg_bytes(model: &[u8], entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut data = b"KORG".to_vec();
    data.extend_from_slice(model);
    data.resize(12, 0);
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    let mut offset = 16 + entries.len() * 32;
    for (name, payload) in entries {
        let mut entry = [0u8; 32];
        entry[..name.len()].copy_from_slice(name.as_bytes());
        entry[24..28].copy_from_slice(&(offset as u32).to_le_bytes());
        entry[28..32].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&entry);
        offset += payload.len();
    }
    for (_, payload) in entries {
        data.extend_from_slice(payload);
    }
    data
}

/// One file of an indexed container.
pub struct SetEntry {
    name: String,
    stored: Vec<u8>,
    compressed: bool,
}

impl SetEntry {
    pub fn plain(name: &str, data: &[u8]) -> SetEntry {
        SetEntry {
            name: name.to_string(),
            stored: data.to_vec(),
            compressed: false,
        }
    }

    pub fn compressed(name: &str, data: &[u8]) -> SetEntry {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        SetEntry {
            name: name.to_string(),
            stored: encoder.finish().unwrap(),
            compressed: true,
        }
    }
}

/// A `SETi` indexed container with 64 byte directory entries.
pub fn set_bytes(version: u32, entries: &[SetEntry]) -> Vec<u8> {
    let mut data = b"SETi".to_vec();
    data.extend_from_slice(&version.to_le_bytes());
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    let mut offset = 12 + entries.len() * 64;
    for entry in entries {
        let mut record = [0u8; 64];
        record[..entry.name.len()].copy_from_slice(entry.name.as_bytes());
        record[32..36].copy_from_slice(&(offset as u32).to_le_bytes());
        record[36..40].copy_from_slice(&(entry.stored.len() as u32).to_le_bytes());
        record[40..44].copy_from_slice(&u32::from(entry.compressed).to_le_bytes());
        data.extend_from_slice(&record);
        offset += entry.stored.len();
    }
    for entry in entries {
        data.extend_from_slice(&entry.stored);
    }
    data
}

/// A deflated ZIP archive.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, payload) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(payload).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
