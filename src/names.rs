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
//! Filters that separate real program names from decode noise.

const NOISE_SYMBOLS: &str = "@#$%^&*(){}[]|\\<>~`";
const FORBIDDEN_SYMBOLS: &str = "`~!@#$%^&*{}[]|\\<>?=";
const VOWELS: &str = "aeiouAEIOU";

/// Returns true if a name pulled out of a program bank looks like a name. It must be
/// at least three characters, contain a letter, and not be dominated by symbols.
pub fn is_plausible_name(name: &str) -> bool {
    let len = name.chars().count();
    if len < 3 {
        return false;
    }

    let symbols = name.chars().filter(|c| NOISE_SYMBOLS.contains(*c)).count();
    if symbols > len / 3 {
        return false;
    }

    name.chars().any(|c| c.is_alphabetic())
}

/// The stricter check applied before linking programs to samples. Bank fallbacks
/// can admit short runs of random bytes, which this rejects.
pub fn is_linkable_name(name: &str) -> bool {
    let name = name.trim();
    let len = name.chars().count();
    if len < 3 {
        return false;
    }

    let alpha = name.chars().filter(|c| c.is_alphabetic()).count();
    if alpha * 2 < len {
        return false;
    }

    if name.chars().any(|c| FORBIDDEN_SYMBOLS.contains(c)) {
        return false;
    }

    if !name.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        return false;
    }

    // Vowel-less names longer than three characters are almost always garbage.
    len <= 3 || name.chars().any(|c| VOWELS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_names() {
        assert!(is_plausible_name("Grand Piano"));
        assert!(is_plausible_name("E.Piano 2"));
        assert!(is_plausible_name("ab#"));
        assert!(!is_plausible_name("ab"));
        assert!(!is_plausible_name("1234"));
        assert!(!is_plausible_name("a#$%"));
    }

    #[test]
    fn test_linkable_names() {
        assert!(is_linkable_name("Toba Manele"));
        assert!(is_linkable_name("Sax"));
        assert!(is_linkable_name("BD1"));
        assert!(!is_linkable_name("xq"));
        assert!(!is_linkable_name("Q7#k"));
        assert!(!is_linkable_name("k=3a"));
        assert!(!is_linkable_name(" -Piano"));
        assert!(!is_linkable_name("Brkqz"));
        assert!(!is_linkable_name("1a2b3"));
    }
}
