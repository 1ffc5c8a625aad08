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
//! Assigns each sample a role (percussion, pitched or unknown) from its name, and a
//! note and octave when the name carries one.
//!
//! Rules are tried in order and the first hit wins: percussion keywords, note
//! patterns, melodic instrument keywords, then a majority vote over the other
//! samples from the same container. Results live in a [`Classifications`] index
//! keyed by [`SampleId`]; the samples themselves are never touched.

use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::{Regex, RegexSet};
use serde::Serialize;
use tracing::debug;

use crate::model::{Package, Role, SampleId};

/// Percussion keywords, matched case-insensitively as whole tokens. Underscores,
/// digits and punctuation count as token separators.
const PERCUSSION_TERMS: &[&str] = &[
    r"kick\d*",
    r"snare\d*",
    r"hi[\s\-]?hat",
    r"hh(?:cl|op|pd)?",
    r"tom[\s_\-]?\d*",
    r"crash",
    r"ride",
    r"cymbal|cym",
    r"claps?",
    r"rim",
    r"fill[\s_\-]?\d*",
    r"perc|percussion",
    r"bd[\s_]?\w*",
    r"bass[\s_\-]?drum",
    r"bassdrum",
    r"conga",
    r"bongo",
    r"timbal",
    r"tamb|tambourine",
    r"tabla",
    r"darbuka",
    r"[hd]?daula",
    r"doira",
    r"djembe",
    r"clopotei",
    r"bells?",
    r"triangle",
    r"cowbell",
    r"chimes",
    r"gong",
    r"sd\d*",
    r"shaker",
    r"castanet",
    r"guiro",
    r"maracas",
    r"cabasa",
    r"woodblock",
    r"claves",
    r"agogo",
    r"cuica",
    r"vibraslap",
    r"whistle",
    r"hit\d*",
    r"fx\d*",
    r"sfx",
    r"arab",
    r"gaby\d*",
    r"sashko",
    r"premier",
];

/// Melodic instrument keywords, including regional names.
const INSTRUMENT_TERMS: &[&str] = &[
    r"piano",
    r"strings?",
    r"violin|vioara",
    r"viola",
    r"cello",
    r"bass",
    r"guitar",
    r"organ",
    r"synth",
    r"pad",
    r"lead",
    r"brass",
    r"trumpet|trompeta",
    r"sax|saxo",
    r"flute|fleita|fluier",
    r"clarinet",
    r"oboe",
    r"accordion|acordeon",
    r"harmonica",
    r"harp",
    r"marimba",
    r"vibraphone",
    r"xylophone",
    r"voice|choir",
    r"ocarina",
    r"nai",
    r"bandon",
    r"zeta",
    r"banat",
    r"blerim",
    r"braci",
    r"returnela",
];

/// Where a note pattern gets its note letter from.
#[derive(Clone, Copy)]
enum NoteSource {
    Fixed(&'static str),
    Captured,
    SolfegeSharp,
}

/// Note patterns, case-sensitive, in priority order. Group 2 is the octave.
const NOTE_PATTERNS: &[(&str, NoteSource)] = &[
    (r"\b(Do|DO|do)[\s_\-]?(\d+)?(?:\s|$|[_\-])", NoteSource::Fixed("C")),
    (r"\b(Re|RE|re)[\s_\-]?(\d+)?(?:\s|$|[_\-])", NoteSource::Fixed("D")),
    (r"\b(Mi|MI|mi)[\s_\-]?(\d+)?(?:\s|$|[_\-])", NoteSource::Fixed("E")),
    (r"\b(Fa|FA|fa)[\s_\-]?(\d+)?(?:\s|$|[_\-])", NoteSource::Fixed("F")),
    (r"\b(Sol|SOL|sol)[\s_\-]?(\d+)?(?:\s|$|[_\-])", NoteSource::Fixed("G")),
    (r"\b(La|LA|la)[\s_\-]?(\d+)?(?:\s|$|[_\-])", NoteSource::Fixed("A")),
    (r"\b(Si|SI|si)[\s_\-]?(\d+)?(?:\s|$|[_\-])", NoteSource::Fixed("B")),
    (r"\b([A-G]#?)(\d)\b", NoteSource::Captured),
    (r"\bFL([A-G])(\d)\b", NoteSource::Captured),
    (r"\b(Do|Re|Mi|Fa|Sol|La|Si)[Dd]iez[\s_\-]?(\d+)?", NoteSource::SolfegeSharp),
    (r"\b(Mib|mib|MIB)[\s_\-]?(\d+)?", NoteSource::Fixed("Eb")),
    (r"\b(Lab|lab|LAB)[\s_\-]?(\d+)?", NoteSource::Fixed("Ab")),
    (r"\b(Sib|sib|SIB)[\s_\-]?(\d+)?", NoteSource::Fixed("Bb")),
    (r"[_\-]([A-G]#?)(\d)\b", NoteSource::Captured),
    (r"^([A-G])(\d+)\b", NoteSource::Captured),
];

const FLUTE_PREFIXES: [&str; 8] = ["FL", "FLA", "FLB", "FLC", "FLD", "FLE", "FLF", "FLG"];

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

fn token(term: &str) -> String {
    format!(r"(?i)(?:^|[^a-z0-9])({term})(?:$|[^a-z0-9])")
}

lazy_static! {
    static ref PERCUSSION: RegexSet =
        RegexSet::new(PERCUSSION_TERMS.iter().map(|term| token(term))).unwrap();
    static ref INSTRUMENTS: Vec<Regex> = INSTRUMENT_TERMS
        .iter()
        .map(|term| Regex::new(&token(term)).unwrap())
        .collect();
    static ref NOTES: Vec<(Regex, NoteSource)> = NOTE_PATTERNS
        .iter()
        .map(|&(pattern, source)| (Regex::new(pattern).unwrap(), source))
        .collect();
    static ref NOTE_THEN_NAME: Regex =
        Regex::new(r"(?i)^(?:Do|Re|Mi|Fa|Sol|La|Si|[A-G]#?)[\s_\-]?\d*\s+(.+)").unwrap();
    static ref NAME_THEN_NOTE: Regex = Regex::new(r"^([A-Za-z]+)[\s_\-]?[A-G]#?\d").unwrap();
}

/// The classifier's verdict for one sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub role: Role,
    pub note: Option<String>,
    pub octave: Option<u32>,
}

impl Classification {
    fn of(role: Role) -> Classification {
        Classification {
            role,
            ..Default::default()
        }
    }

    /// The detected pitch as a MIDI note, for pitched samples with a note.
    pub fn midi_note(&self) -> Option<u8> {
        match (self.role, &self.note) {
            (Role::Pitched, Some(note)) => Some(note_to_midi(note, self.octave)),
            _ => None,
        }
    }
}

/// Classifies one sample name. `siblings` are the names of the other samples in
/// the same container; the sample's own name is ignored if present.
pub fn classify(name: &str, siblings: &[&str]) -> Classification {
    if is_percussion(name) {
        return Classification::of(Role::Percussion);
    }
    if let Some((note, octave)) = detect_note(name) {
        return Classification {
            role: Role::Pitched,
            note: Some(note),
            octave,
        };
    }
    if has_instrument(name) {
        return Classification::of(Role::Pitched);
    }

    let (mut percussion, mut pitched) = (0usize, 0usize);
    for sibling in siblings.iter().filter(|&&s| s != name) {
        if is_percussion(sibling) {
            percussion += 1;
        } else if detect_note(sibling).is_some() || has_instrument(sibling) {
            pitched += 1;
        }
    }
    match pitched.cmp(&percussion) {
        std::cmp::Ordering::Greater => Classification::of(Role::Pitched),
        std::cmp::Ordering::Less => Classification::of(Role::Percussion),
        std::cmp::Ordering::Equal => Classification::of(Role::Unknown),
    }
}

fn is_percussion(name: &str) -> bool {
    PERCUSSION.is_match(name)
}

fn has_instrument(name: &str) -> bool {
    if !INSTRUMENTS.iter().any(|re| re.is_match(name)) {
        return false;
    }
    let lower = name.to_lowercase();
    !(lower.contains("bass") && lower.contains("drum"))
}

fn detect_note(name: &str) -> Option<(String, Option<u32>)> {
    NOTES.iter().find_map(|(re, source)| {
        let caps = re.captures(name)?;
        let octave = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let note = match source {
            NoteSource::Fixed(note) => note.to_string(),
            NoteSource::Captured => caps.get(1)?.as_str().to_string(),
            NoteSource::SolfegeSharp => sharp_of(caps.get(1)?.as_str())?.to_string(),
        };
        Some((note, octave))
    })
}

fn sharp_of(syllable: &str) -> Option<&'static str> {
    Some(match syllable {
        "Do" => "C#",
        "Re" => "D#",
        "Mi" => "F",
        "Fa" => "F#",
        "Sol" => "G#",
        "La" => "A#",
        "Si" => "C",
        _ => return None,
    })
}

/// Converts a note name and octave to a MIDI note number (C4 = 60). A missing
/// octave means octave 4 and an unrecognized note gives 60.
pub fn note_to_midi(note: &str, octave: Option<u32>) -> u8 {
    let semitone = match note {
        "C" => 0,
        "C#" | "Db" => 1,
        "D" => 2,
        "D#" | "Eb" => 3,
        "E" | "Fb" => 4,
        "F" | "E#" => 5,
        "F#" | "Gb" => 6,
        "G" => 7,
        "G#" | "Ab" => 8,
        "A" => 9,
        "A#" | "Bb" => 10,
        "B" | "Cb" => 11,
        _ => return 60,
    };
    let octave = octave.unwrap_or(4);
    let midi = octave.saturating_add(1).saturating_mul(12).saturating_add(semitone);
    midi.min(127) as u8
}

/// Converts a MIDI note number to a note name and octave (60 = C4).
pub fn midi_to_note(midi: u8) -> (&'static str, i32) {
    (NOTE_NAMES[usize::from(midi % 12)], i32::from(midi / 12) - 1)
}

/// Guesses the instrument a pitched sample belongs to, for grouping.
pub fn instrument_name(name: &str) -> String {
    if let Some(caps) = NOTE_THEN_NAME.captures(name) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = NAME_THEN_NOTE.captures(name) {
        let prefix = &caps[1];
        if FLUTE_PREFIXES.contains(&prefix.to_uppercase().as_str()) {
            return "Flute".to_string();
        }
        return prefix.to_string();
    }
    INSTRUMENTS
        .iter()
        .find_map(|re| re.captures(name))
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Counts per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub total: usize,
    pub percussion: usize,
    pub pitched: usize,
    pub one_shot: usize,
    pub unknown: usize,
}

/// Side index of classifier results for a package.
#[derive(Debug, Clone, Default)]
pub struct Classifications {
    by_sample: HashMap<SampleId, Classification>,
}

impl Classifications {
    pub fn get(&self, id: SampleId) -> Option<&Classification> {
        self.by_sample.get(&id)
    }

    /// The role of a sample; unclassified samples are unknown.
    pub fn role_of(&self, id: SampleId) -> Role {
        self.get(id).map(|c| c.role).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sample.is_empty()
    }

    pub fn summary(&self) -> RoleSummary {
        let mut summary = RoleSummary {
            total: self.by_sample.len(),
            ..Default::default()
        };
        for classification in self.by_sample.values() {
            match classification.role {
                Role::Percussion => summary.percussion += 1,
                Role::Pitched => summary.pitched += 1,
                Role::OneShot => summary.one_shot += 1,
                Role::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// Groups pitched samples by [`instrument_name`].
    pub fn group_by_instrument(&self, package: &Package) -> BTreeMap<String, Vec<SampleId>> {
        let mut groups: BTreeMap<String, Vec<SampleId>> = BTreeMap::new();
        for (id, sample) in package.sample_ids() {
            if self.role_of(id) == Role::Pitched {
                groups.entry(instrument_name(sample.name())).or_default().push(id);
            }
        }
        groups
    }
}

/// Classifies every sample in a package, using the other samples of the same
/// container as siblings. Containers are classified in parallel.
pub fn classify_package(package: &Package) -> Classifications {
    let mut containers: BTreeMap<&str, Vec<(SampleId, &str)>> = BTreeMap::new();
    for (id, sample) in package.sample_ids() {
        containers
            .entry(sample.container())
            .or_default()
            .push((id, sample.name()));
    }

    let groups: Vec<Vec<(SampleId, &str)>> = containers.into_values().collect();
    let by_sample: HashMap<SampleId, Classification> = groups
        .par_iter()
        .flat_map_iter(|group| {
            let names: Vec<&str> = group.iter().map(|&(_, name)| name).collect();
            group
                .iter()
                .map(|&(id, name)| (id, classify(name, &names)))
                .collect::<Vec<_>>()
        })
        .collect();

    debug!(
        package = package.name(),
        samples = by_sample.len(),
        "Samples classified"
    );
    Classifications { by_sample }
}
