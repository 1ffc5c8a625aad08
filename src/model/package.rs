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
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{FileKind, Multisample, Program, SampleAsset, SampleId};

/// The outer layout a package was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Archive,
    Indexed,
    Tagged,
    Directory,
    Unknown,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerKind::Archive => "archive",
            ContainerKind::Indexed => "indexed",
            ContainerKind::Tagged => "tagged",
            ContainerKind::Directory => "directory",
            ContainerKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Provenance record for a file found in a package.
#[derive(Clone, PartialEq)]
pub struct EmbeddedFile {
    pub name: String,
    pub kind: FileKind,
    pub offset: usize,
    pub size: usize,
    pub compressed: bool,
    /// The (decompressed) payload, when it was kept.
    pub data: Option<Vec<u8>>,
    /// How many samples, programs, keymaps or styles were decoded from it.
    pub yielded: usize,
}

impl EmbeddedFile {
    pub fn new(name: impl Into<String>, kind: FileKind, offset: usize, size: usize) -> EmbeddedFile {
        EmbeddedFile {
            name: name.into(),
            kind,
            offset,
            size,
            compressed: false,
            data: None,
            yielded: 0,
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> EmbeddedFile {
        self.data = Some(data);
        self
    }
}

impl fmt::Debug for EmbeddedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFile")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("compressed", &self.compressed)
            .field("has_data", &self.data.is_some())
            .field("yielded", &self.yielded)
            .finish()
    }
}

/// A cataloged style. Only the name is known; patterns aren't decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub name: String,
    pub tempo: f32,
}

impl Style {
    pub fn new(name: impl Into<String>) -> Style {
        Style {
            name: name.into(),
            tempo: 120.0,
        }
    }
}

/// Everything decoded from one source. Built once by the package decoder and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    model: String,
    version: String,
    kind: ContainerKind,
    embedded_files: Vec<EmbeddedFile>,
    samples: Vec<Arc<SampleAsset>>,
    programs: Vec<Program>,
    multisamples: Vec<Multisample>,
    styles: Vec<Style>,
}

/// Counts and tags describing a package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageSummary {
    pub name: String,
    pub model: String,
    pub version: String,
    pub container: ContainerKind,
    pub embedded_files: usize,
    pub samples: usize,
    pub programs: usize,
    pub multisamples: usize,
    pub styles: usize,
    pub file_kinds: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, kind: ContainerKind) -> Package {
        Package {
            name: name.into(),
            model: String::new(),
            version: String::new(),
            kind,
            embedded_files: Vec::new(),
            samples: Vec::new(),
            programs: Vec::new(),
            multisamples: Vec::new(),
            styles: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn embedded_files(&self) -> &[EmbeddedFile] {
        &self.embedded_files
    }

    pub fn samples(&self) -> &[Arc<SampleAsset>] {
        &self.samples
    }

    pub fn sample(&self, id: SampleId) -> Option<&Arc<SampleAsset>> {
        self.samples.get(id.0)
    }

    /// Samples paired with their ids.
    pub fn sample_ids(&self) -> impl Iterator<Item = (SampleId, &Arc<SampleAsset>)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, sample)| (SampleId(i), sample))
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn multisamples(&self) -> &[Multisample] {
        &self.multisamples
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn is_empty(&self) -> bool {
        self.embedded_files.is_empty()
            && self.samples.is_empty()
            && self.programs.is_empty()
            && self.multisamples.is_empty()
            && self.styles.is_empty()
    }

    pub fn summary(&self) -> PackageSummary {
        let file_kinds: BTreeSet<FileKind> = self.embedded_files.iter().map(|f| f.kind).collect();
        PackageSummary {
            name: self.name.clone(),
            model: self.model.clone(),
            version: self.version.clone(),
            container: self.kind,
            embedded_files: self.embedded_files.len(),
            samples: self.samples.len(),
            programs: self.programs.len(),
            multisamples: self.multisamples.len(),
            styles: self.styles.len(),
            file_kinds: file_kinds.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub(crate) fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub(crate) fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub(crate) fn push_embedded(&mut self, file: EmbeddedFile) {
        self.embedded_files.push(file);
    }

    pub(crate) fn push_sample(&mut self, sample: SampleAsset) {
        self.samples.push(Arc::new(sample));
    }

    pub(crate) fn push_program(&mut self, program: Program) {
        self.programs.push(program);
    }

    pub(crate) fn push_multisample(&mut self, multisample: Multisample) {
        self.multisamples.push(multisample);
    }

    pub(crate) fn push_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    /// Resolves every keymap zone against the package's sample list. Returns the
    /// number of zones left unresolved.
    pub(crate) fn link_zones(&mut self) -> usize {
        let samples = &self.samples;
        self.multisamples
            .iter_mut()
            .map(|ms| ms.resolve(samples))
            .sum()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} container, {} samples, {} programs, {} multisamples)",
            self.name,
            self.kind,
            self.samples.len(),
            self.programs.len(),
            self.multisamples.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, KeyZone, PcmFormat};

    #[test]
    fn test_summary_counts() {
        let mut package = Package::new("Stefan", ContainerKind::Directory);
        package.set_model("Pa-series");
        package.push_embedded(EmbeddedFile::new("PCM/A.PCM", FileKind::SampleContainer, 0, 10));
        package.push_embedded(EmbeddedFile::new("SOUND/B.PCG", FileKind::ProgramBank, 0, 10));
        package.push_embedded(EmbeddedFile::new("PCM/C.PCM", FileKind::SampleContainer, 0, 10));
        package.push_program(Program::new("Piano", 0, 0, Category::Piano, "B.PCG"));

        let summary = package.summary();
        assert_eq!(summary.embedded_files, 3);
        assert_eq!(summary.programs, 1);
        assert_eq!(summary.model, "Pa-series");
        assert_eq!(
            summary.file_kinds,
            vec!["sample container".to_string(), "program bank".to_string()]
        );
    }

    #[test]
    fn test_link_zones_against_package_samples() {
        let mut package = Package::new("p", ContainerKind::Unknown);
        package.push_sample(SampleAsset::new(
            "s0",
            "A.PCM",
            0,
            PcmFormat::pcm16_mono(48000),
            vec![0; 8],
        ));
        package.push_multisample(Multisample::new(
            "ms",
            vec![KeyZone::full_range(0), KeyZone::full_range(3)],
        ));

        assert_eq!(package.link_zones(), 1);
        let ms = &package.multisamples()[0];
        assert!(ms.samples()[0].is_some());
        assert!(ms.samples()[1].is_none());
    }

    #[test]
    fn test_new_package_is_empty() {
        let package = Package::new("empty", ContainerKind::Unknown);
        assert!(package.is_empty());
        assert!(package.sample(SampleId(0)).is_none());
    }
}
