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
use std::fmt;
use std::path::Path;

use serde::Serialize;

/// The type tag of a file found inside (or next to) a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FileKind {
    /// A multi-sample audio container with a footer offset table (.PCM).
    SampleContainer,
    /// A file carrying the KORF header. Both sample containers and program
    /// banks use it, so the payload decides.
    Korf,
    /// A single sample file (.KSF).
    Sample,
    /// A standard WAV file.
    Wav,
    /// A RIFF file that isn't WAVE.
    Riff,
    /// A keymap / multisample definition (.KMP).
    Keymap,
    /// A program/combination/global bank (.PCG).
    ProgramBank,
    Mpc,
    /// A style (.STY). Styles are cataloged, never decoded.
    Style,
    Script,
    Midi,
    Pad,
    /// The generic tagged container.
    Tagged,
    /// The indexed container with an explicit directory.
    Indexed,
    Archive,
    /// A package nested inside another package.
    SubPackage,
    Unknown,
}

impl FileKind {
    /// Identifies a buffer by its leading signature.
    pub fn from_signature(data: &[u8]) -> FileKind {
        let Some(header) = data.get(..4) else {
            return FileKind::Unknown;
        };
        match header {
            b"RIFF" if data.get(8..12) == Some(&b"WAVE"[..]) => FileKind::Wav,
            b"RIFF" => FileKind::Riff,
            b"KORG" => FileKind::Tagged,
            b"SETi" | b"SET1" => FileKind::Indexed,
            b"PCG1" | b"pcg1" => FileKind::ProgramBank,
            b"MPC1" => FileKind::Mpc,
            b"KMP1" | b"MSP1" | b"kmp1" => FileKind::Keymap,
            b"KSF1" | b"kSF1" => FileKind::Sample,
            b"STY1" => FileKind::Style,
            b"PK\x03\x04" | b"PK\x05\x06" => FileKind::Archive,
            b"KORF" => FileKind::Korf,
            _ => FileKind::Unknown,
        }
    }

    /// Identifies a file by its extension, case-insensitively.
    pub fn from_extension(name: &str) -> FileKind {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pcm") => FileKind::SampleContainer,
            Some("ksf") => FileKind::Sample,
            Some("wav") => FileKind::Wav,
            Some("kmp") => FileKind::Keymap,
            Some("pcg") => FileKind::ProgramBank,
            Some("sty") => FileKind::Style,
            Some("ksc") => FileKind::Script,
            Some("mid") => FileKind::Midi,
            Some("pad") => FileKind::Pad,
            Some("set") => FileKind::SubPackage,
            _ => FileKind::Unknown,
        }
    }

    /// Extension first, then signature.
    pub fn identify(name: &str, data: &[u8]) -> FileKind {
        match FileKind::from_extension(name) {
            FileKind::Unknown => FileKind::from_signature(data),
            kind => kind,
        }
    }

    /// True for kinds a decoder is expected to get something out of.
    pub fn is_decodable(&self) -> bool {
        matches!(
            self,
            FileKind::SampleContainer
                | FileKind::Korf
                | FileKind::Sample
                | FileKind::Wav
                | FileKind::Keymap
                | FileKind::ProgramBank
                | FileKind::Style
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::SampleContainer => "sample container",
            FileKind::Korf => "KORF container",
            FileKind::Sample => "sample",
            FileKind::Wav => "WAV audio",
            FileKind::Riff => "RIFF container",
            FileKind::Keymap => "multisample",
            FileKind::ProgramBank => "program bank",
            FileKind::Mpc => "MPC",
            FileKind::Style => "style",
            FileKind::Script => "script collection",
            FileKind::Midi => "MIDI",
            FileKind::Pad => "pad data",
            FileKind::Tagged => "tagged container",
            FileKind::Indexed => "indexed container",
            FileKind::Archive => "ZIP archive",
            FileKind::SubPackage => "sub-package",
            FileKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_signature() {
        assert_eq!(FileKind::from_signature(b"RIFF\0\0\0\0WAVEfmt "), FileKind::Wav);
        assert_eq!(FileKind::from_signature(b"RIFF\0\0\0\0sfbk"), FileKind::Riff);
        assert_eq!(FileKind::from_signature(b"KORG0000"), FileKind::Tagged);
        assert_eq!(FileKind::from_signature(b"SET1"), FileKind::Indexed);
        assert_eq!(FileKind::from_signature(b"KMP1"), FileKind::Keymap);
        assert_eq!(FileKind::from_signature(b"kSF1"), FileKind::Sample);
        assert_eq!(FileKind::from_signature(b"PK\x03\x04"), FileKind::Archive);
        assert_eq!(FileKind::from_signature(b"KORF"), FileKind::Korf);
        assert_eq!(FileKind::from_signature(b"KO"), FileKind::Unknown);
        assert_eq!(FileKind::from_signature(b"zzzz"), FileKind::Unknown);
    }

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(FileKind::from_extension("PCM/DRUMS01.PCM"), FileKind::SampleContainer);
        assert_eq!(FileKind::from_extension("user01.pcg"), FileKind::ProgramBank);
        assert_eq!(FileKind::from_extension("Piano.Kmp"), FileKind::Keymap);
        assert_eq!(FileKind::from_extension("README"), FileKind::Unknown);
    }

    #[test]
    fn test_identify_prefers_extension() {
        assert_eq!(FileKind::identify("a.kmp", b"KSF1...."), FileKind::Keymap);
        assert_eq!(FileKind::identify("blob", b"KSF1...."), FileKind::Sample);
    }
}
