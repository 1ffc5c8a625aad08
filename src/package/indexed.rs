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
//! The `SETi`/`SET1` indexed container:
//!
//! ```text
//! 0x00 "SETi" | "SET1"   0x04 version (LE u32)   0x08 file count (LE u32)
//! 0x0C directory, 64 bytes per entry:
//!      name (32 bytes, NUL padded), offset, size, flags (LE u32 each), reserved
//! ```
//!
//! Flag bit 0 marks a zlib-compressed payload.

use std::io::Read;

use flate2::read::ZlibDecoder;
use tracing::{debug, warn};

use super::{absorb, decode_entry, unknown, PackageDecoder};
use crate::model::{ContainerKind, EmbeddedFile, FileKind, Package};
use crate::scan;

const DIRECTORY_START: usize = 12;
const ENTRY_SIZE: usize = 64;
const ENTRY_NAME_LEN: usize = 32;
const MAX_FILES: u32 = 1000;
const FLAG_COMPRESSED: u32 = 1;

pub(super) fn decode(decoder: &PackageDecoder, data: &[u8], name: &str) -> Package {
    let mut package = Package::new(name, ContainerKind::Indexed);
    let (Some(version), Some(count)) = (scan::le_u32(data, 4), scan::le_u32(data, 8)) else {
        return package;
    };
    package.set_version(version.to_string());

    if count > MAX_FILES {
        debug!(package = name, count, "Implausible directory size, scanning for signatures");
        unknown::scan_signatures(decoder, data, &mut package);
        return package;
    }

    for i in 0..count as usize {
        let pos = DIRECTORY_START + i * ENTRY_SIZE;
        let Some(entry) = data.get(pos..pos + ENTRY_SIZE) else {
            break;
        };
        let (Some(offset), Some(size), Some(flags)) = (
            scan::le_u32(entry, ENTRY_NAME_LEN),
            scan::le_u32(entry, ENTRY_NAME_LEN + 4),
            scan::le_u32(entry, ENTRY_NAME_LEN + 8),
        ) else {
            continue;
        };
        let (offset, size) = (offset as usize, size as usize);
        if offset == 0 || size == 0 || offset + size > data.len() {
            debug!(package = name, index = i, offset, size, "Directory entry out of bounds");
            continue;
        }

        let file_name = match scan::nul_terminated(&entry[..ENTRY_NAME_LEN]) {
            n if n.is_empty() => format!("file_{i:03}"),
            n => n,
        };
        let raw = &data[offset..offset + size];
        let compressed = flags & FLAG_COMPRESSED != 0;
        let payload = if compressed {
            inflate(raw).unwrap_or_else(|e| {
                warn!(package = name, file = file_name.as_str(), err = %e, "Decompression failed, keeping raw payload");
                raw.to_vec()
            })
        } else {
            raw.to_vec()
        };

        let kind = FileKind::identify(&file_name, &payload);
        let decoded = decode_entry(&file_name, kind, &payload, decoder.options());
        let mut file = EmbeddedFile::new(file_name, kind, offset, payload.len());
        file.compressed = compressed;
        absorb(&mut package, file.with_data(payload), decoded);
    }
    package
}

fn inflate(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(raw).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeOptions;
    use crate::testutil::{ksf1_bytes, set_bytes, SetEntry};

    fn decode_set(data: &[u8]) -> Package {
        PackageDecoder::new(DecodeOptions::default()).decode_bytes(data, "indexed")
    }

    #[test]
    fn test_directory_with_compressed_entry() {
        let sample = ksf1_bytes(44100, 16, 1, 100, (0, 0, 0), 60, 0);
        let data = set_bytes(
            3,
            &[
                SetEntry::plain("A.KSF", &sample),
                SetEntry::compressed("B.KSF", &sample),
            ],
        );
        let package = decode_set(&data);

        assert_eq!(package.kind(), ContainerKind::Indexed);
        assert_eq!(package.version(), "3");
        assert_eq!(package.samples().len(), 2);
        let b = &package.embedded_files()[1];
        assert!(b.compressed);
        assert_eq!(b.size, sample.len());
        assert_eq!(b.data.as_deref(), Some(sample.as_slice()));
    }

    #[test]
    fn test_bad_compressed_payload_kept_raw() {
        let mut data = set_bytes(1, &[SetEntry::plain("C.BIN", b"not zlib at all")]);
        // Flip the compressed flag on the only entry.
        data[DIRECTORY_START + ENTRY_NAME_LEN + 8] = 1;
        let package = decode_set(&data);
        let c = &package.embedded_files()[0];
        assert!(c.compressed);
        assert_eq!(c.data.as_deref(), Some(&b"not zlib at all"[..]));
    }

    #[test]
    fn test_out_of_bounds_entries_skipped() {
        let mut data = set_bytes(1, &[SetEntry::plain("D.KSF", b"0123456789")]);
        let size_at = DIRECTORY_START + ENTRY_NAME_LEN + 4;
        data[size_at..size_at + 4].copy_from_slice(&0xFFFFu32.to_le_bytes());
        let package = decode_set(&data);
        assert!(package.embedded_files().is_empty());
        assert_eq!(package.version(), "1");
    }

    #[test]
    fn test_huge_count_scans() {
        let mut data = b"SETi\x01\0\0\0\xff\xff\xff\xff".to_vec();
        data.extend_from_slice(&ksf1_bytes(44100, 16, 1, 100, (0, 0, 0), 60, 0));
        let package = decode_set(&data);
        assert_eq!(package.samples().len(), 1);
    }
}
