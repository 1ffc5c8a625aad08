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
use std::io::{Cursor, Read};

use tracing::{debug, warn};
use zip::{CompressionMethod, ZipArchive};

use super::{absorb, decode_entry, unknown, PackageDecoder};
use crate::model::{ContainerKind, EmbeddedFile, FileKind, Package};

/// Decodes a ZIP package entry by entry. A buffer that only looks like a ZIP is
/// handed to the unknown-format path.
pub(super) fn decode(decoder: &PackageDecoder, data: &[u8], name: &str) -> Package {
    let mut archive = match ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(package = name, err = %e, "Invalid ZIP archive, scanning instead");
            return unknown::decode(decoder, data, name);
        }
    };

    let mut package = Package::new(name, ContainerKind::Archive);
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(package = name, index = i, err = %e, "Unreadable ZIP entry");
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        let compressed = entry.compression() != CompressionMethod::Stored;
        let mut payload = Vec::with_capacity(entry.size() as usize);
        if let Err(e) = entry.read_to_end(&mut payload) {
            warn!(package = name, entry = entry_name.as_str(), err = %e, "Failed to extract ZIP entry");
            continue;
        }

        let kind = FileKind::identify(&entry_name, &payload);
        debug!(package = name, entry = entry_name.as_str(), %kind, size = payload.len(), "ZIP entry");
        let decoded = decode_entry(&entry_name, kind, &payload, decoder.options());
        let mut file = EmbeddedFile::new(&entry_name, kind, 0, payload.len());
        file.compressed = compressed;
        absorb(&mut package, file.with_data(payload), decoded);
    }
    package
}
