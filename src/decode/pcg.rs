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
//! Program banks (.PCG): named programs with a category and bank/number slot.
//!
//! Three layouts are known. Chunked banks hold `PRG1` chunks of fixed-size
//! entries. `KORF` banks hold a flat table of 24 byte rows (16 byte name, 8 byte
//! metadata). `PCG1` banks only give a program count. Anything else falls back to
//! scanning for ASCII runs that look like names.

use tracing::{debug, info};

use crate::config::DecodeOptions;
use crate::decode::{first_success, Strategy};
use crate::model::{Category, Program};
use crate::names::is_plausible_name;
use crate::scan;

/// Banks shorter than this hold no programs.
pub const MIN_BANK_LEN: usize = 64;

const PROGRAM_CHUNKS: [&[u8]; 3] = [b"PRG1", b"PROG", b"prg1"];
const SKIPPED_CHUNKS: [&[u8]; 6] = [b"CMB1", b"COMB", b"cmb1", b"GLB1", b"GLOB", b"glb1"];
const CHUNK_HEADER_LEN: usize = 8;

const MAX_CHUNK_PROGRAMS: u16 = 500;
const MAX_ENTRIES_PER_CHUNK: usize = 128;
const ENTRY_SIZES: [usize; 4] = [128, 256, 512, 1024];
const MIN_ENTRY_LEN: usize = 32;
const ENTRY_NAME_LEN: usize = 24;
const ENTRY_CATEGORY_OFFSET: usize = 24;
const ENTRY_BANK_OFFSET: usize = 25;

const TABLE_START: usize = 0x24;
const TABLE_ROW_SIZE: usize = 24;
const TABLE_NAME_LEN: usize = 16;
const TABLE_END_MARKERS: [&[u8]; 2] = [b"OC31", b"\x10\x02\x00\x38"];

const PCG1_HEADER_LEN: usize = 12;
const MAX_HEADER_COUNT: u16 = 1000;
const SCAN_MIN_RUN: usize = 4;
const SCAN_MAX_RUN: usize = 32;

struct Context<'a> {
    source: &'a str,
    percussion: bool,
    options: &'a DecodeOptions,
}

/// Recovers the programs in a bank. `percussion` marks every program read from a
/// `KORF` table as a drum kit; see [`is_percussion_source`].
pub fn decode(data: &[u8], source: &str, percussion: bool, options: &DecodeOptions) -> Vec<Program> {
    if data.len() < MIN_BANK_LEN {
        debug!(bank = source, len = data.len(), "Buffer too short for a program bank");
        return Vec::new();
    }

    let context = Context {
        source,
        percussion,
        options,
    };
    let chain = [
        Strategy {
            name: "program-chunks",
            run: decode_chunks,
        },
        Strategy {
            name: "korf-table",
            run: decode_korf_table,
        },
        Strategy {
            name: "pcg1-header",
            run: decode_pcg1_header,
        },
        Strategy {
            name: "ascii-scan",
            run: decode_ascii_scan,
        },
    ];
    let programs = first_success(source, data, &context, &chain).unwrap_or_default();
    info!(bank = source, programs = programs.len(), "Program bank decoded");
    programs
}

/// Bank files named like `USERDK.PCG` or `DRUM01.PCG` hold drum kits.
pub fn is_percussion_source(name: &str) -> bool {
    let upper = name.to_uppercase();
    upper.contains("DK") || upper.contains("DRUM")
}

fn decode_chunks(data: &[u8], context: &Context) -> Option<Vec<Program>> {
    let mut pos = if data.starts_with(b"KORG") { 4 } else { 0 };
    let mut programs = Vec::new();
    while pos + CHUNK_HEADER_LEN < data.len() {
        let tag = &data[pos..pos + 4];
        let size = scan::le_u32(data, pos + 4).map(|s| s as usize);
        if PROGRAM_CHUNKS.iter().any(|t| *t == tag) {
            if let Some(size) = size.filter(|&s| s > 0) {
                let body = pos + CHUNK_HEADER_LEN;
                if let Some(chunk) = body.checked_add(size).and_then(|end| data.get(body..end)) {
                    debug!(bank = context.source, offset = pos, size, "Program chunk");
                    programs.extend(read_program_chunk(chunk, context));
                    pos = body + size;
                    continue;
                }
            }
        } else if SKIPPED_CHUNKS.iter().any(|t| *t == tag) {
            if let Some(size) = size {
                pos = pos.saturating_add(CHUNK_HEADER_LEN).saturating_add(size);
                continue;
            }
        }
        pos += 1;
    }
    (!programs.is_empty()).then_some(programs)
}

fn read_program_chunk(chunk: &[u8], context: &Context) -> Vec<Program> {
    let count = match (scan::le_u16(chunk, 0), scan::le_u16(chunk, 2)) {
        (Some(first), _) if first <= MAX_CHUNK_PROGRAMS => first,
        (Some(_), Some(second)) if second <= MAX_CHUNK_PROGRAMS => second,
        (Some(_), Some(_)) => {
            return scan_names(chunk, context.options.program_scan_limit(), context.source);
        }
        _ => return Vec::new(),
    };
    let count = usize::from(count);

    for size in ENTRY_SIZES {
        if 4 + count * size > chunk.len() {
            continue;
        }
        let programs: Vec<Program> = (0..count.min(MAX_ENTRIES_PER_CHUNK))
            .filter_map(|i| {
                let offset = 4 + i * size;
                read_program_entry(&chunk[offset..offset + size], i, context.source)
            })
            .collect();
        if !programs.is_empty() {
            return programs;
        }
    }
    Vec::new()
}

fn read_program_entry(entry: &[u8], index: usize, source: &str) -> Option<Program> {
    if entry.len() < MIN_ENTRY_LEN {
        return None;
    }
    let name = scan::printable_prefix(entry, ENTRY_NAME_LEN);
    let name = name.trim();
    if !is_plausible_name(name) {
        return None;
    }
    let category = Category::from_index(scan::byte(entry, ENTRY_CATEGORY_OFFSET)?);
    let bank = scan::byte(entry, ENTRY_BANK_OFFSET)?;
    Some(Program::new(name, u16::from(bank), index as u16, category, source))
}

fn decode_korf_table(data: &[u8], context: &Context) -> Option<Vec<Program>> {
    scan::find(data, b"KORF")?;

    let category = if context.percussion {
        Category::Drums
    } else {
        Category::Unknown
    };
    let mut programs = Vec::new();
    let mut pos = TABLE_START;
    while let Some(row) = data.get(pos..pos + TABLE_ROW_SIZE) {
        if !scan::is_printable(row[0]) {
            if TABLE_END_MARKERS.iter().any(|marker| row.starts_with(marker)) {
                break;
            }
            pos += TABLE_ROW_SIZE;
            continue;
        }

        let name = scan::printable_prefix(row, TABLE_NAME_LEN);
        if name.len() < 3 {
            break;
        }
        let name = name.trim();
        if is_plausible_name(name) {
            let meta = &row[TABLE_NAME_LEN..];
            programs.push(
                Program::new(
                    name,
                    u16::from(meta[4]),
                    u16::from(meta[5]),
                    category,
                    context.source,
                )
                .with_percussion(context.percussion)
                .with_parameter("offset", format!("{pos:#x}")),
            );
        }
        pos += TABLE_ROW_SIZE;
    }
    (!programs.is_empty()).then_some(programs)
}

fn decode_pcg1_header(data: &[u8], context: &Context) -> Option<Vec<Program>> {
    if !(data.starts_with(b"PCG1") || data.starts_with(b"pcg1")) {
        return None;
    }
    let limit = scan::le_u16(data, 8)
        .filter(|&count| count > 0 && count < MAX_HEADER_COUNT)
        .map(usize::from)
        .unwrap_or_else(|| context.options.program_scan_limit());
    debug!(bank = context.source, limit, "PCG1 header");
    Some(scan_names(&data[PCG1_HEADER_LEN..], limit, context.source))
}

fn decode_ascii_scan(data: &[u8], context: &Context) -> Option<Vec<Program>> {
    Some(scan_names(
        data,
        context.options.program_scan_limit(),
        context.source,
    ))
}

/// Treats printable runs as program names in the order they appear.
fn scan_names(data: &[u8], limit: usize, source: &str) -> Vec<Program> {
    scan::ascii_runs(data, SCAN_MIN_RUN, SCAN_MAX_RUN)
        .into_iter()
        .map(|run| run.text.trim().to_string())
        .filter(|name| name.len() >= 3 && name.chars().any(|c| c.is_ascii_alphabetic()))
        .take(limit)
        .enumerate()
        .map(|(i, name)| {
            Program::new(
                name,
                (i / 128) as u16,
                (i % 128) as u16,
                Category::Unknown,
                source,
            )
        })
        .collect()
}
