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
//! The generic `KORG` tagged container:
//!
//! ```text
//! 0x00 "KORG"   0x04 model tag (4 bytes)
//! file count (LE u32) at 0x0C, 0x10 or 0x14, followed by the file table
//! table entry: name (24 bytes, NUL padded), offset (LE u32), size (LE u32), ...
//! ```
//!
//! Neither the count position nor the entry size is fixed, so both are probed.

use tracing::debug;

use super::{absorb, decode_entry, unknown, PackageDecoder};
use crate::model::{ContainerKind, EmbeddedFile, FileKind, Package};
use crate::scan;

const COUNT_OFFSETS: [usize; 3] = [12, 16, 20];
const ENTRY_SIZES: [usize; 4] = [32, 48, 64, 128];
const MAX_FILES: u32 = 1000;
const ENTRY_NAME_LEN: usize = 24;

pub(super) fn decode(decoder: &PackageDecoder, data: &[u8], name: &str) -> Package {
    let mut package = Package::new(name, ContainerKind::Tagged);
    if let Some(model) = data.get(4..8) {
        package.set_model(scan::nul_terminated(model).trim());
    }

    let table = COUNT_OFFSETS.iter().find_map(|&offset| {
        let count = scan::le_u32(data, offset).filter(|&c| c > 0 && c < MAX_FILES)?;
        Some((offset + 4, count as usize))
    });
    let entries = match table {
        Some((start, count)) => {
            debug!(package = name, start, count, "Tagged file table");
            read_table(data, start, count)
        }
        None => Vec::new(),
    };

    if entries.is_empty() {
        debug!(package = name, "No usable file table, scanning for signatures");
        unknown::scan_signatures(decoder, data, &mut package);
        return package;
    }

    for (file_name, offset, size) in entries {
        let payload = &data[offset..offset + size];
        let kind = FileKind::identify(&file_name, payload);
        let decoded = decode_entry(&file_name, kind, payload, decoder.options());
        let file = EmbeddedFile::new(file_name, kind, offset, size).with_data(payload.to_vec());
        absorb(&mut package, file, decoded);
    }
    package
}

/// Returns `(name, offset, size)` for each in-bounds entry, using the first entry
/// size that yields any.
fn read_table(data: &[u8], start: usize, count: usize) -> Vec<(String, usize, usize)> {
    for entry_size in ENTRY_SIZES {
        if start + count * entry_size > data.len() {
            continue;
        }
        let entries: Vec<(String, usize, usize)> = (0..count)
            .filter_map(|i| {
                let entry = &data[start + i * entry_size..start + (i + 1) * entry_size];
                let offset = scan::le_u32(entry, ENTRY_NAME_LEN)? as usize;
                let size = scan::le_u32(entry, ENTRY_NAME_LEN + 4)? as usize;
                if offset == 0 || size == 0 || offset.checked_add(size)? > data.len() {
                    return None;
                }
                let file_name = scan::nul_terminated(&entry[..ENTRY_NAME_LEN]);
                let file_name = if file_name.is_empty() {
                    format!("file_{i:03}")
                } else {
                    file_name
                };
                Some((file_name, offset, size))
            })
            .collect();
        if !entries.is_empty() {
            return entries;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeOptions;
    use crate::testutil::{korg_bytes, ksf1_bytes, KmpFixture};

    #[test]
    fn test_file_table() {
        let sample = ksf1_bytes(32000, 16, 1, 100, (0, 0, 0), 60, 0);
        let keymap = KmpFixture::new("Lead").zone(0, 127, 60, 0).build();
        let data = korg_bytes(b"Pa3X", &[("LEAD.KSF", sample.as_slice()), ("", keymap.as_slice())]);

        let package = PackageDecoder::new(DecodeOptions::default()).decode_bytes(&data, "tagged");
        assert_eq!(package.kind(), ContainerKind::Tagged);
        assert_eq!(package.model(), "Pa3X");
        assert_eq!(package.embedded_files().len(), 2);
        assert_eq!(package.embedded_files()[1].name, "file_001");
        assert_eq!(package.embedded_files()[1].kind, FileKind::Keymap);
        assert_eq!(package.samples().len(), 1);
        assert_eq!(package.samples()[0].sample_rate(), 32000);
        assert!(package.multisamples()[0].samples()[0].is_some());
    }

    #[test]
    fn test_no_table_scans_signatures() {
        let mut data = b"KORGPa1X".to_vec();
        data.resize(32, 0);
        data.extend_from_slice(&ksf1_bytes(22050, 16, 1, 100, (0, 0, 0), 60, 0));
        let package = PackageDecoder::new(DecodeOptions::default()).decode_bytes(&data, "t");
        assert_eq!(package.model(), "Pa1X");
        assert_eq!(package.samples().len(), 1);
        assert_eq!(package.embedded_files()[0].name, "embedded_000.korg");
    }
}
