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
//! Bounds-checked helpers for picking apart undocumented binary layouts.
//!
//! Every read returns an `Option` so that a computed offset running off the end
//! of a buffer skips the record instead of panicking.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Finds the first occurrence of `needle` in `data`.
pub fn find(data: &[u8], needle: &[u8]) -> Option<usize> {
    find_from(data, needle, 0)
}

/// Finds the first occurrence of `needle` at or after `start`.
pub fn find_from(data: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || start >= data.len() {
        return None;
    }
    data[start..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + start)
}

/// Finds the last occurrence of `needle` in `data`.
pub fn rfind(data: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    data.windows(needle.len())
        .rposition(|window| window == needle)
}

/// Finds every occurrence of `needle`, including overlapping ones.
pub fn find_all(data: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(idx) = find_from(data, needle, pos) {
        found.push(idx);
        pos = idx + 1;
    }
    found
}

fn window(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    data.get(offset..offset.checked_add(len)?)
}

pub fn byte(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

pub fn be_u16(data: &[u8], offset: usize) -> Option<u16> {
    window(data, offset, 2).map(BigEndian::read_u16)
}

pub fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    window(data, offset, 4).map(BigEndian::read_u32)
}

pub fn le_u16(data: &[u8], offset: usize) -> Option<u16> {
    window(data, offset, 2).map(LittleEndian::read_u16)
}

pub fn le_i16(data: &[u8], offset: usize) -> Option<i16> {
    window(data, offset, 2).map(LittleEndian::read_i16)
}

pub fn le_u32(data: &[u8], offset: usize) -> Option<u32> {
    window(data, offset, 4).map(LittleEndian::read_u32)
}

/// Reads `count` little-endian 16-bit samples starting at `offset`.
pub fn le_i16_run(data: &[u8], offset: usize, count: usize) -> Option<Vec<i16>> {
    let bytes = window(data, offset, count.checked_mul(2)?)?;
    Some(bytes.chunks_exact(2).map(LittleEndian::read_i16).collect())
}

/// Returns true for printable ASCII (space through tilde).
pub fn is_printable(b: u8) -> bool {
    (32..=126).contains(&b)
}

/// Returns the leading run of printable ASCII, at most `max` bytes long.
pub fn printable_prefix(data: &[u8], max: usize) -> String {
    data.iter()
        .take(max)
        .take_while(|&&b| is_printable(b))
        .map(|&b| b as char)
        .collect()
}

/// Reads an ASCII string up to the first NUL, dropping anything that isn't ASCII.
pub fn nul_terminated(data: &[u8]) -> String {
    data.iter()
        .take_while(|&&b| b != 0)
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

/// A run of printable ASCII found in a binary buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiRun {
    pub offset: usize,
    pub text: String,
}

/// Splits `data` into printable ASCII runs. Runs longer than `max_len` are cut
/// into consecutive pieces; pieces shorter than `min_len` are dropped.
pub fn ascii_runs(data: &[u8], min_len: usize, max_len: usize) -> Vec<AsciiRun> {
    let mut runs = Vec::new();
    let max_len = max_len.max(1);
    let mut pos = 0;
    while pos < data.len() {
        if !is_printable(data[pos]) {
            pos += 1;
            continue;
        }
        let mut end = pos;
        while end < data.len() && end - pos < max_len && is_printable(data[end]) {
            end += 1;
        }
        if end - pos >= min_len {
            runs.push(AsciiRun {
                offset: pos,
                text: data[pos..end].iter().map(|&b| b as char).collect(),
            });
        }
        pos = end;
    }
    runs
}

/// Swaps each pair of bytes, converting 16-bit samples between byte orders.
/// A trailing odd byte is dropped.
pub fn swap_bytes_16(data: &[u8]) -> Vec<u8> {
    let mut swapped = Vec::with_capacity(data.len() & !1);
    for pair in data.chunks_exact(2) {
        swapped.push(pair[1]);
        swapped.push(pair[0]);
    }
    swapped
}
