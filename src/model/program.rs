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
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// The fixed program category table. Banks store the category as a byte that is
/// read modulo 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Piano,
    ElectricPiano,
    Organ,
    Guitar,
    Bass,
    Strings,
    Brass,
    Woodwind,
    SynthLead,
    SynthPad,
    SynthFx,
    Ethnic,
    Percussion,
    Drums,
    Sfx,
    User,
    Unknown,
}

const CATEGORY_TABLE: [Category; 16] = [
    Category::Piano,
    Category::ElectricPiano,
    Category::Organ,
    Category::Guitar,
    Category::Bass,
    Category::Strings,
    Category::Brass,
    Category::Woodwind,
    Category::SynthLead,
    Category::SynthPad,
    Category::SynthFx,
    Category::Ethnic,
    Category::Percussion,
    Category::Drums,
    Category::Sfx,
    Category::User,
];

impl Category {
    /// Looks up a raw category byte.
    pub fn from_index(raw: u8) -> Category {
        CATEGORY_TABLE[usize::from(raw % 16)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Piano => "Piano",
            Category::ElectricPiano => "E.Piano",
            Category::Organ => "Organ",
            Category::Guitar => "Guitar",
            Category::Bass => "Bass",
            Category::Strings => "Strings",
            Category::Brass => "Brass",
            Category::Woodwind => "Woodwind",
            Category::SynthLead => "Synth Lead",
            Category::SynthPad => "Synth Pad",
            Category::SynthFx => "Synth FX",
            Category::Ethnic => "Ethnic",
            Category::Percussion => "Percussion",
            Category::Drums => "Drums",
            Category::Sfx => "SFX",
            Category::User => "User",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named program (patch) recovered from a bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    name: String,
    bank: u16,
    number: u16,
    category: Category,
    source: String,
    percussion: bool,
    parameters: BTreeMap<String, String>,
}

impl Program {
    pub fn new(
        name: impl Into<String>,
        bank: u16,
        number: u16,
        category: Category,
        source: impl Into<String>,
    ) -> Program {
        Program {
            name: name.into(),
            bank,
            number,
            category,
            source: source.into(),
            percussion: false,
            parameters: BTreeMap::new(),
        }
    }

    /// Marks the program as coming from a percussion (drum kit) bank.
    pub fn with_percussion(mut self, percussion: bool) -> Program {
        self.percussion = percussion;
        self
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<String>) -> Program {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bank(&self) -> u16 {
        self.bank
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The bank file the program was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_percussion(&self) -> bool {
        self.percussion
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:03}:{:03} {} [{}]",
            self.bank, self.number, self.name, self.category
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wraps_modulo_16() {
        assert_eq!(Category::from_index(0), Category::Piano);
        assert_eq!(Category::from_index(13), Category::Drums);
        assert_eq!(Category::from_index(17), Category::ElectricPiano);
        assert_eq!(Category::from_index(255), Category::User);
        assert_eq!(Category::SynthFx.to_string(), "Synth FX");
    }

    #[test]
    fn test_program_display() {
        let program = Program::new("Grand Piano", 1, 5, Category::Piano, "USER01.PCG")
            .with_parameter("offset", "36");
        assert_eq!(program.to_string(), "001:005 Grand Piano [Piano]");
        assert_eq!(program.parameters().get("offset").map(String::as_str), Some("36"));
        assert!(!program.is_percussion());
    }
}
