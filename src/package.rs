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
//! Turns a package, either a single file or a directory tree, into a [`Package`].
//!
//! Byte packages are dispatched on their first four bytes: ZIP archives, the
//! `KORG` tagged container, the `SETi`/`SET1` indexed container, and anything
//! else. Every embedded file is then routed to a format decoder by extension or
//! signature. Decoding never fails past the I/O boundary; a package that can't
//! be made sense of comes back empty.

mod archive;
mod error;
mod folder;
mod indexed;
mod tagged;
mod unknown;

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

pub use error::PackageError;

use crate::config::DecodeOptions;
use crate::decode::{kmp, ksf, pcg, pcm};
use crate::model::{
    ContainerKind, EmbeddedFile, FileKind, Multisample, Package, Program, SampleAsset, Style,
};
use crate::scan;

/// Byte packages shorter than this decode to an empty package.
pub const MIN_PACKAGE_LEN: usize = 16;

/// Decodes packages with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct PackageDecoder {
    options: DecodeOptions,
}

impl PackageDecoder {
    pub fn new(options: DecodeOptions) -> PackageDecoder {
        PackageDecoder { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes a package file or directory. The package is named after the file
    /// stem (or directory name).
    pub fn decode_path(&self, path: &Path) -> Result<Package, PackageError> {
        if !path.exists() {
            return Err(PackageError::NotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            return self.decode_dir(path);
        }

        let data = fs::read(path).map_err(|source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.decode_bytes(&data, &name))
    }

    /// Decodes a package held in memory.
    pub fn decode_bytes(&self, data: &[u8], name: &str) -> Package {
        if data.len() < MIN_PACKAGE_LEN {
            warn!(package = name, len = data.len(), "Package too short to decode");
            return Package::new(name, ContainerKind::Unknown);
        }

        let package = match data.get(..4) {
            Some(b"PK\x03\x04") => archive::decode(self, data, name),
            Some(b"KORG") => tagged::decode(self, data, name),
            Some(b"SETi") | Some(b"SET1") => indexed::decode(self, data, name),
            _ => unknown::decode(self, data, name),
        };
        finish(package)
    }

    /// Decodes a directory-tree package.
    pub fn decode_dir(&self, path: &Path) -> Result<Package, PackageError> {
        folder::decode(self, path).map(finish)
    }
}

fn finish(mut package: Package) -> Package {
    let unresolved = package.link_zones();
    if unresolved > 0 {
        debug!(
            package = package.name(),
            unresolved, "Keymap zones reference samples that aren't in the package"
        );
    }
    info!(
        package = package.name(),
        container = %package.kind(),
        files = package.embedded_files().len(),
        samples = package.samples().len(),
        programs = package.programs().len(),
        multisamples = package.multisamples().len(),
        "Package decoded"
    );
    package
}

/// What one embedded file decoded to.
#[derive(Debug, Default)]
pub(crate) struct Decoded {
    samples: Vec<SampleAsset>,
    programs: Vec<Program>,
    multisample: Option<Multisample>,
    style: Option<Style>,
}

impl Decoded {
    fn count(&self) -> usize {
        self.samples.len()
            + self.programs.len()
            + usize::from(self.multisample.is_some())
            + usize::from(self.style.is_some())
    }
}

/// Runs the decoder matching `kind` over one file. Kinds without a decoder
/// decode to nothing.
pub(crate) fn decode_entry(name: &str, kind: FileKind, data: &[u8], options: &DecodeOptions) -> Decoded {
    let base = base_name(name);
    let mut decoded = Decoded::default();
    match kind {
        FileKind::SampleContainer => {
            decoded.samples = pcm::decode(data, base, options);
        }
        FileKind::Korf if scan::find(data, pcm::FOOTER_BEGIN).is_some() => {
            decoded.samples = pcm::decode(data, base, options);
        }
        FileKind::Korf | FileKind::ProgramBank => {
            decoded.programs = pcg::decode(data, base, pcg::is_percussion_source(base), options);
        }
        FileKind::Sample | FileKind::Wav => {
            decoded.samples = ksf::decode(data, base).into_iter().collect();
        }
        FileKind::Keymap => {
            decoded.multisample = Some(kmp::decode(data, base));
        }
        FileKind::Style => {
            decoded.style = Some(Style::new(stem(base)));
        }
        _ => {}
    }
    decoded
}

/// Records an embedded file and everything decoded from it.
pub(crate) fn absorb(package: &mut Package, mut file: EmbeddedFile, decoded: Decoded) {
    file.yielded = decoded.count();
    if file.yielded == 0 && file.kind.is_decodable() && file.size > 0 {
        warn!(
            package = package.name(),
            file = file.name.as_str(),
            kind = %file.kind,
            "Nothing could be decoded from embedded file"
        );
    }
    package.push_embedded(file);

    for sample in decoded.samples {
        package.push_sample(sample);
    }
    for program in decoded.programs {
        package.push_program(program);
    }
    if let Some(multisample) = decoded.multisample {
        package.push_multisample(multisample);
    }
    if let Some(style) = decoded.style {
        package.push_style(style);
    }
}

/// The last path component of an entry name.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}
