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
//! Sample containers: many 16-bit big-endian mono samples in one blob, located by
//! an offset table in a footer between `KBEG` and `KEND`.
//!
//! Layout, as far as it is known:
//!
//! ```text
//! KORF header
//! name table      rows of NAME_ROW_SIZE: 16 byte name, index byte at row[20]
//! sample blocks   SAMPLE_HEADER_SIZE header (BE u16 rate at +20), BE PCM
//! KBEG            [optional count] BE u32 block offsets ...
//! KEND
//! ```

use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use regex::bytes::Regex;
use tracing::{debug, info};

use crate::config::DecodeOptions;
use crate::decode::{first_success, Strategy};
use crate::model::{PcmFormat, SampleAsset};
use crate::scan;

pub const SIGNATURE: &[u8] = b"KORF";
pub const FOOTER_BEGIN: &[u8] = b"KBEG";
pub const FOOTER_END: &[u8] = b"KEND";

/// Header preceding every sample block.
pub const SAMPLE_HEADER_SIZE: usize = 0x4C;
/// One row of the fixed name table.
pub const NAME_ROW_SIZE: usize = 24;
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Offsets at or below this are header fields, not block starts.
pub const MIN_BLOCK_OFFSET: usize = 0x40;
/// Buffers shorter than this can't hold a container.
pub const MIN_CONTAINER_LEN: usize = 256;

const RATE_FIELD_OFFSET: usize = 20;
const NAME_FIELD_LEN: usize = 16;
const NAME_INDEX_OFFSET: usize = 20;
const NAME_TABLE_START: usize = 0x24;
const NAME_TABLE_LIMIT: usize = 0x1000;
const FREE_TEXT_WINDOW: usize = 0x200;

const LEGACY_PROBE_OFFSETS: [usize; 5] = [0x100, 0x200, 0x400, 0x800, 0x1000];
const LEGACY_DEFAULT_START: usize = 0x1000;
const LEGACY_PROBE_SAMPLES: usize = 50;
/// Peak amplitude above which a legacy probe region counts as audio.
pub const LEGACY_AMPLITUDE_THRESHOLD: i32 = 1000;
const LEGACY_MIN_PAYLOAD: usize = 1000;

/// Tokens in the free-text header region that are format markers, not names.
const FORMAT_TOKENS: [&str; 5] = ["KORF", "KBEG", "KEND", "KORG", "RAM"];

lazy_static! {
    static ref FREE_TEXT_NAME: Regex = Regex::new(r"[A-Za-z][A-Za-z0-9 \-_\.]{2,14}").unwrap();
    static ref VERSION_TOKEN: Regex = Regex::new(r"^[Vv]\d+(\.\d+)*$").unwrap();
}

struct Context<'a> {
    container: &'a str,
    options: &'a DecodeOptions,
}

/// Recovers every sample in a container. Returns an empty list when nothing
/// could be recovered.
pub fn decode(data: &[u8], container: &str, options: &DecodeOptions) -> Vec<SampleAsset> {
    if data.len() < MIN_CONTAINER_LEN {
        debug!(container, len = data.len(), "Buffer too short for a sample container");
        return Vec::new();
    }

    let context = Context { container, options };
    let chain = [
        Strategy {
            name: "footer-offset-table",
            run: decode_footer_table,
        },
        Strategy {
            name: "legacy-probe",
            run: decode_legacy,
        },
    ];
    let samples = first_success(container, data, &context, &chain).unwrap_or_default();
    info!(container, samples = samples.len(), "Sample container decoded");
    samples
}

fn decode_footer_table(data: &[u8], context: &Context) -> Option<Vec<SampleAsset>> {
    let footer_begin = scan::rfind(data, FOOTER_BEGIN)?;
    let footer_end = scan::rfind(data, FOOTER_END)
        .filter(|&end| end > footer_begin)
        .unwrap_or(data.len());

    let offsets = read_offset_table(data, footer_begin, footer_end);
    if offsets.is_empty() {
        debug!(container = context.container, "Footer holds no plausible offsets");
        return Some(Vec::new());
    }

    let header_size = context.options.sample_header_size();
    let names = resolve_names(data, context, offsets.len(), offsets[0]);

    let mut boundaries = offsets.clone();
    boundaries.push(footer_begin);

    let mut taken: Vec<(usize, usize)> = Vec::new();
    let mut samples = Vec::new();
    for (index, pair) in boundaries.windows(2).enumerate() {
        let (start, end) = (pair[0], pair[1]);
        if end <= start || end - start <= header_size {
            continue;
        }
        // Out-of-order tables can describe overlapping blocks; keep the first.
        if taken.iter().any(|&(s, e)| start < e && s < end) {
            debug!(
                container = context.container,
                index, start, end, "Skipping overlapping sample block"
            );
            continue;
        }
        taken.push((start, end));

        let sample_rate = match scan::be_u16(data, start + RATE_FIELD_OFFSET) {
            Some(0) | None => context.options.default_sample_rate(),
            Some(rate) => u32::from(rate),
        };
        let audio_start = start + header_size;
        let pcm = scan::swap_bytes_16(&data[audio_start..end]);
        let name = names
            .get(&index)
            .cloned()
            .unwrap_or_else(|| synthesized_name(context.container, index));

        samples.push(
            SampleAsset::new(
                name,
                context.container,
                index,
                PcmFormat::pcm16_mono(sample_rate),
                pcm,
            )
            .with_data_offset(audio_start),
        );
    }
    Some(samples)
}

/// Reads the big-endian offsets between the footer markers, keeping table order.
/// A leading count field is skipped when it is implausible but the value after it
/// looks like an offset.
pub fn read_offset_table(data: &[u8], footer_begin: usize, footer_end: usize) -> Vec<usize> {
    let plausible = |value: u32| {
        let value = value as usize;
        value > MIN_BLOCK_OFFSET && value < footer_begin
    };

    let mut pos = footer_begin + FOOTER_BEGIN.len();
    if let (Some(first), Some(second)) = (scan::be_u32(data, pos), scan::be_u32(data, pos + 4)) {
        if plausible(second) && !plausible(first) {
            pos += 4;
        }
    }

    let mut offsets = Vec::new();
    while pos + 4 <= footer_end {
        match scan::be_u32(data, pos) {
            Some(value) if plausible(value) => offsets.push(value as usize),
            Some(_) => {}
            None => break,
        }
        pos += 4;
    }
    offsets
}

/// The name given to a sample when no table provides one.
pub fn synthesized_name(container: &str, index: usize) -> String {
    format!("{}_Sample_{}", container, index)
}

fn resolve_names(
    data: &[u8],
    context: &Context,
    count: usize,
    first_offset: usize,
) -> HashMap<usize, String> {
    let table = read_name_table(data, context.options.name_row_size());
    if !table.is_empty() {
        return table;
    }

    let free_text = scan_free_text_names(data, first_offset);
    if !free_text.is_empty() {
        debug!(
            container = context.container,
            names = free_text.len(),
            "Using free-text sample names"
        );
    }
    free_text.into_iter().take(count).enumerate().collect()
}

/// Reads the fixed name table that follows the signature. Each row stores a name
/// and the index of the sample it names.
pub fn read_name_table(data: &[u8], row_size: usize) -> HashMap<usize, String> {
    let mut names = HashMap::new();
    let Some(signature) = scan::find(data, SIGNATURE) else {
        return names;
    };
    if row_size <= NAME_INDEX_OFFSET {
        return names;
    }

    let mut pos = if signature < NAME_TABLE_START {
        NAME_TABLE_START
    } else {
        (signature + 13).div_ceil(row_size) * row_size
    };

    let limit = data.len().min(NAME_TABLE_LIMIT);
    while pos < limit {
        let Some(row) = data.get(pos..pos + row_size) else {
            break;
        };
        let name = scan::printable_prefix(&row[..NAME_FIELD_LEN], NAME_FIELD_LEN);
        if name.len() < 2 {
            break;
        }
        let name = name.trim();
        if !name.is_empty() {
            names.insert(usize::from(row[NAME_INDEX_OFFSET]), name.to_string());
        }
        pos += row_size;
    }
    names
}

/// Scans the header region for name-like ASCII, for containers that store names
/// as variable-length text rather than fixed rows.
pub fn scan_free_text_names(data: &[u8], first_offset: usize) -> Vec<String> {
    let start = scan::find(data, SIGNATURE).unwrap_or(0);
    let end = (start + FREE_TEXT_WINDOW).min(first_offset).min(data.len());
    if end <= start {
        return Vec::new();
    }

    FREE_TEXT_NAME
        .find_iter(&data[start..end])
        .map(|m| m.as_bytes().iter().map(|&b| b as char).collect::<String>())
        .map(|s| s.trim().to_string())
        .filter(|s| s.len() >= 3)
        .filter(|s| !FORMAT_TOKENS.iter().any(|token| s.starts_with(token)))
        .filter(|s| !VERSION_TOKEN.is_match(s.as_bytes()))
        .collect()
}

/// Containers without a footer: find where the audio starts and treat the rest of
/// the buffer as one sample.
fn decode_legacy(data: &[u8], context: &Context) -> Option<Vec<SampleAsset>> {
    let start = LEGACY_PROBE_OFFSETS
        .iter()
        .copied()
        .filter(|&offset| offset + 100 < data.len())
        .find(|&offset| {
            scan::le_i16_run(data, offset, LEGACY_PROBE_SAMPLES).is_some_and(|values| {
                values
                    .iter()
                    .any(|&v| i32::from(v).abs() > LEGACY_AMPLITUDE_THRESHOLD)
            })
        })
        .unwrap_or(LEGACY_DEFAULT_START);

    let payload = data.get(start..)?;
    if payload.len() <= LEGACY_MIN_PAYLOAD {
        return None;
    }

    let name = context
        .container
        .strip_suffix(".PCM")
        .unwrap_or(context.container);
    Some(vec![SampleAsset::new(
        name,
        context.container,
        0,
        PcmFormat::pcm16_mono(context.options.default_sample_rate()),
        payload.to_vec(),
    )
    .with_data_offset(start)])
}

/// Per-container statistics used by the `analyze` command.
pub fn describe(data: &[u8]) -> BTreeMap<&'static str, String> {
    let mut facts = BTreeMap::new();
    if let Some(signature) = scan::find(data, SIGNATURE) {
        facts.insert("signature", format!("0x{:X}", signature));
    }
    if let Some(begin) = scan::rfind(data, FOOTER_BEGIN) {
        facts.insert("footer_begin", format!("0x{:X}", begin));
        let end = scan::rfind(data, FOOTER_END)
            .filter(|&end| end > begin)
            .unwrap_or(data.len());
        facts.insert("footer_end", format!("0x{:X}", end));
        let offsets = read_offset_table(data, begin, end);
        facts.insert(
            "offsets",
            offsets
                .iter()
                .map(|o| format!("0x{:X}", o))
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    facts
}
