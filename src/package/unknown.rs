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
//! Buffers with no recognized package header.

use tracing::debug;

use super::{absorb, decode_entry, Decoded, PackageDecoder};
use crate::decode::ksf;
use crate::model::{ContainerKind, EmbeddedFile, FileKind, Package};
use crate::scan;

/// Signatures that start an embedded file, with the extension used to name it.
const EMBEDDED_SIGNATURES: [(&[u8], &str); 6] = [
    (b"KSF1", "ksf"),
    (b"KMP1", "kmp"),
    (b"PCG1", "pcg"),
    (b"KORG", "korg"),
    (b"RIFF", "riff"),
    (b"STY1", "sty"),
];

/// Tries, in order: the whole buffer as one known file, embedded files found by
/// signature, and finally the whole buffer as one raw sample.
pub(super) fn decode(decoder: &PackageDecoder, data: &[u8], name: &str) -> Package {
    let mut package = Package::new(name, ContainerKind::Unknown);

    let kind = FileKind::from_signature(data);
    if matches!(
        kind,
        FileKind::Sample | FileKind::Wav | FileKind::ProgramBank | FileKind::Keymap | FileKind::Korf
    ) {
        debug!(package = name, %kind, "Whole buffer is a single file");
        let decoded = decode_entry(name, kind, data, decoder.options());
        push_decoded(&mut package, decoded);
        return package;
    }

    scan_signatures(decoder, data, &mut package);
    if package.embedded_files().is_empty() && package.samples().is_empty() {
        debug!(package = name, "No embedded signatures, treating buffer as raw audio");
        if let Some(sample) = ksf::decode(data, name) {
            package.push_sample(sample);
        }
    }
    package
}

fn push_decoded(package: &mut Package, decoded: Decoded) {
    for sample in decoded.samples {
        package.push_sample(sample);
    }
    for program in decoded.programs {
        package.push_program(program);
    }
    if let Some(multisample) = decoded.multisample {
        package.push_multisample(multisample);
    }
}

/// Splits `data` at every known signature and decodes each slice as an embedded
/// file named `embedded_NNN.<ext>`.
pub(super) fn scan_signatures(decoder: &PackageDecoder, data: &[u8], package: &mut Package) {
    let mut found: Vec<(usize, &str)> = EMBEDDED_SIGNATURES
        .iter()
        .flat_map(|&(signature, ext)| {
            scan::find_all(data, signature)
                .into_iter()
                .map(move |pos| (pos, ext))
        })
        .collect();
    found.sort_by_key(|&(pos, _)| pos);

    for (i, &(start, ext)) in found.iter().enumerate() {
        let end = found.get(i + 1).map_or(data.len(), |&(next, _)| next);
        let payload = &data[start..end];
        let file_name = format!("embedded_{i:03}.{ext}");
        let kind = FileKind::identify(&file_name, payload);
        let decoded = decode_entry(&file_name, kind, payload, decoder.options());
        let file = EmbeddedFile::new(file_name, kind, start, payload.len()).with_data(payload.to_vec());
        absorb(package, file, decoded);
    }
    debug!(package = package.name(), files = found.len(), "Signature scan finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeOptions;
    use crate::testutil::{ksf1_bytes, wav_bytes, KmpFixture};

    fn decode_unknown(data: &[u8]) -> Package {
        PackageDecoder::new(DecodeOptions::default()).decode_bytes(data, "blob")
    }

    #[test]
    fn test_whole_buffer_wav() {
        let data = wav_bytes(22050, 16, 1, &[0, 1000, -1000, 500, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let package = decode_unknown(&data);
        assert_eq!(package.kind(), ContainerKind::Unknown);
        assert!(package.embedded_files().is_empty());
        assert_eq!(package.samples().len(), 1);
        assert_eq!(package.samples()[0].sample_rate(), 22050);
    }

    #[test]
    fn test_embedded_slices() {
        let mut data = vec![0xEEu8; 20];
        data.extend_from_slice(&ksf1_bytes(44100, 16, 1, 100, (0, 0, 0), 60, 0));
        let kmp_at = data.len();
        data.extend_from_slice(&KmpFixture::new("Pad").zone(0, 127, 60, 0).build());

        let package = decode_unknown(&data);
        let files = package.embedded_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "embedded_000.ksf");
        assert_eq!(files[0].offset, 20);
        assert_eq!(files[0].size, kmp_at - 20);
        assert_eq!(files[1].name, "embedded_001.kmp");
        assert_eq!(files[1].kind, FileKind::Keymap);
        assert_eq!(package.samples().len(), 1);
        assert_eq!(package.multisamples().len(), 1);
    }

    #[test]
    fn test_raw_audio_fallback() {
        let data: Vec<u8> = (0..600u32)
            .flat_map(|i| (((i % 50) as i16 - 25) * 200).to_le_bytes())
            .collect();
        let package = decode_unknown(&data);
        assert!(package.embedded_files().is_empty());
        assert_eq!(package.samples().len(), 1);
        assert_eq!(package.samples()[0].name(), "blob");
    }
}
