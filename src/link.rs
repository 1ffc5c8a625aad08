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
//! Associates programs with the samples they most likely play.
//!
//! Banks don't record which samples a program uses in any layout we can read, so
//! links are guessed from names in three passes of falling confidence. A program
//! keeps the link from the first pass that finds anything.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::model::{Package, Program, SampleAsset, SampleId};
use crate::names::is_linkable_name;

const STOP_WORDS: [&str; 11] = ["the", "a", "an", "and", "or", "of", "for", "to", "in", "on", "at"];
const PREFIX_LEN: usize = 4;

/// Program keyword to sample keywords. Drum kits first, then melodic families.
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    (
        "toba",
        &[
            "kick", "snare", "tom", "crash", "cymbal", "hihat", "clap", "fill", "cinel", "daula",
            "bd", "sd",
        ],
    ),
    ("kit", &["kick", "snare", "tom", "crash", "cymbal", "hihat", "clap"]),
    ("drum", &["kick", "snare", "tom", "crash", "ride", "hihat"]),
    ("manele", &["pai", "clap", "daula", "fill"]),
    ("etno", &["fill", "dany", "etno"]),
    ("banat", &["banat", "do", "re", "mi", "fa", "sol", "la", "si"]),
    ("acordeon", &["acordeon", "acc", "do", "re", "mi"]),
    ("vioara", &["vioara", "violin", "vio"]),
    ("flute", &["fl", "fluier", "fleita", "flc", "fla", "flg"]),
    ("sax", &["sax", "saxo"]),
    ("clarinet", &["clr", "clarinet"]),
    ("nai", &["nai", "zamfir"]),
];

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").unwrap();
}

/// How a link was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    NameMatch,
    PatternMatch,
    PrefixMatch,
}

impl LinkMethod {
    pub fn confidence(&self) -> f32 {
        match self {
            LinkMethod::NameMatch => 0.7,
            LinkMethod::PatternMatch => 0.5,
            LinkMethod::PrefixMatch => 0.3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMethod::NameMatch => "name_match",
            LinkMethod::PatternMatch => "pattern_match",
            LinkMethod::PrefixMatch => "prefix_match",
        }
    }
}

impl fmt::Display for LinkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramSampleLink {
    pub program: String,
    pub source: String,
    pub samples: Vec<SampleId>,
    pub method: LinkMethod,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkSummary {
    pub total_programs: usize,
    pub linked_programs: usize,
    pub total_samples: usize,
    pub linked_samples: usize,
    pub unlinked_samples: usize,
    pub methods: BTreeMap<LinkMethod, usize>,
}

/// Links keyed by program name.
#[derive(Debug, Clone, Default)]
pub struct ProgramLinks {
    links: BTreeMap<String, ProgramSampleLink>,
    program_count: usize,
    sample_count: usize,
}

impl ProgramLinks {
    pub fn get(&self, program: &str) -> Option<&ProgramSampleLink> {
        self.links.get(program)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgramSampleLink> {
        self.links.values()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Samples linked to a program; empty if it isn't linked.
    pub fn samples_for(&self, program: &str) -> &[SampleId] {
        self.links
            .get(program)
            .map(|link| link.samples.as_slice())
            .unwrap_or_default()
    }

    /// The first program (by name) that links to `sample`.
    pub fn program_for(&self, sample: SampleId) -> Option<&str> {
        self.links
            .values()
            .find(|link| link.samples.contains(&sample))
            .map(|link| link.program.as_str())
    }

    fn linked(&self) -> BTreeSet<SampleId> {
        self.links
            .values()
            .flat_map(|link| link.samples.iter().copied())
            .collect()
    }

    /// Samples that no program links to.
    pub fn unlinked(&self) -> Vec<SampleId> {
        let linked = self.linked();
        (0..self.sample_count)
            .map(SampleId)
            .filter(|id| !linked.contains(id))
            .collect()
    }

    pub fn summary(&self) -> LinkSummary {
        let linked_samples = self.linked().len();
        let mut methods = BTreeMap::new();
        for link in self.links.values() {
            *methods.entry(link.method).or_insert(0) += 1;
        }
        LinkSummary {
            total_programs: self.program_count,
            linked_programs: self.links.len(),
            total_samples: self.sample_count,
            linked_samples,
            unlinked_samples: self.sample_count - linked_samples,
            methods,
        }
    }

    fn insert(&mut self, program: &Program, samples: Vec<SampleId>, method: LinkMethod) {
        self.links.insert(
            program.name().to_string(),
            ProgramSampleLink {
                program: program.name().to_string(),
                source: program.source().to_string(),
                samples,
                method,
                confidence: method.confidence(),
            },
        );
    }
}

/// Links a package's programs to its samples.
pub fn link_package(package: &Package) -> ProgramLinks {
    link(package.programs(), package.samples())
}

/// Links programs to samples. Programs whose names look like decode noise are
/// dropped first and never linked.
pub fn link(programs: &[Program], samples: &[Arc<SampleAsset>]) -> ProgramLinks {
    let programs: Vec<&Program> = programs
        .iter()
        .filter(|p| is_linkable_name(p.name()))
        .collect();
    let names: Vec<String> = samples
        .iter()
        .map(|s| s.name().trim().to_lowercase())
        .collect();

    let mut links = ProgramLinks {
        links: BTreeMap::new(),
        program_count: programs.len(),
        sample_count: samples.len(),
    };

    let passes: [(LinkMethod, fn(&str, &[String]) -> Vec<SampleId>); 3] = [
        (LinkMethod::NameMatch, match_by_name),
        (LinkMethod::PatternMatch, match_by_keywords),
        (LinkMethod::PrefixMatch, match_by_prefix),
    ];
    for (method, pass) in passes {
        for program in &programs {
            if links.links.contains_key(program.name()) {
                continue;
            }
            let matched = pass(program.name(), &names);
            if !matched.is_empty() {
                links.insert(program, matched, method);
            }
        }
    }

    debug!(
        programs = links.program_count,
        linked = links.len(),
        "Programs linked to samples"
    );
    links
}

fn significant_words(name: &str) -> HashSet<&str> {
    WORD.find_iter(name)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .collect()
}

fn match_by_name(program: &str, samples: &[String]) -> Vec<SampleId> {
    let program = program.trim().to_lowercase();
    if program.is_empty() {
        return Vec::new();
    }
    let program_words = significant_words(&program);
    samples
        .iter()
        .enumerate()
        .filter(|(_, sample)| !sample.is_empty())
        .filter(|(_, sample)| {
            program.contains(sample.as_str())
                || sample.contains(&program)
                || !significant_words(sample).is_disjoint(&program_words)
        })
        .map(|(i, _)| SampleId(i))
        .collect()
}

fn match_by_keywords(program: &str, samples: &[String]) -> Vec<SampleId> {
    let program = program.to_lowercase();
    let patterns: Vec<&str> = KEYWORD_TABLE
        .iter()
        .filter(|(keyword, _)| program.contains(keyword))
        .flat_map(|(_, patterns)| patterns.iter().copied())
        .collect();
    if patterns.is_empty() {
        return Vec::new();
    }
    samples
        .iter()
        .enumerate()
        .filter(|(_, sample)| patterns.iter().any(|p| sample.contains(p)))
        .map(|(i, _)| SampleId(i))
        .collect()
}

fn prefix(name: &str) -> String {
    name.chars().take(PREFIX_LEN).collect::<String>().to_lowercase()
}

fn match_by_prefix(program: &str, samples: &[String]) -> Vec<SampleId> {
    let wanted = prefix(program);
    samples
        .iter()
        .enumerate()
        .filter(|(_, sample)| prefix(sample) == wanted)
        .map(|(i, _)| SampleId(i))
        .collect()
}
