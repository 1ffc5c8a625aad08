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

use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

const HEX_ROW: usize = 16;

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs the given duration in a minutes:seconds format.
pub fn duration_minutes_seconds(duration: Duration) -> String {
    let minutes = duration.as_secs() / 60;
    let secs = duration.as_secs() - minutes * 60;
    format!("{}:{:02}", minutes, secs)
}

/// Reduces a sample name to characters that are safe in a file name. Returns
/// None if nothing usable is left.
pub fn safe_file_stem(name: &str) -> Option<String> {
    let stem: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = stem.trim();
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Classic 16 bytes per row hex dump, offsets relative to `base`.
pub fn hex_dump(data: &[u8], base: usize) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(HEX_ROW).enumerate() {
        let _ = write!(out, "{:08x} ", base + row * HEX_ROW);
        for i in 0..HEX_ROW {
            match chunk.get(i) {
                Some(byte) => {
                    let _ = write!(out, " {:02x}", byte);
                }
                None => out.push_str("   "),
            }
        }
        out.push_str("  |");
        out.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }
    out
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::util::{duration_minutes_seconds, hex_dump, safe_file_stem};

    #[test]
    fn test_duration_minutes_strings() {
        assert_eq!("0:00", duration_minutes_seconds(Duration::new(0, 0)));
        assert_eq!("0:05", duration_minutes_seconds(Duration::new(5, 0)));
        assert_eq!("1:00", duration_minutes_seconds(Duration::new(60, 0)));
        assert_eq!("2:05", duration_minutes_seconds(Duration::new(125, 0)));
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Kick 1"), Some("Kick 1".to_string()));
        assert_eq!(safe_file_stem("a/b:c*d"), Some("abcd".to_string()));
        assert_eq!(safe_file_stem(" Do-1_x "), Some("Do-1_x".to_string()));
        assert_eq!(safe_file_stem("///"), None);
        assert_eq!(safe_file_stem(""), None);
    }

    #[test]
    fn test_hex_dump() {
        let dump = hex_dump(b"KORF\x00\x01", 0x20);
        assert_eq!(
            dump,
            format!("00000020  4b 4f 52 46 00 01{}  |KORF..|\n", " ".repeat(30))
        );
        let rows = hex_dump(&[0u8; 20], 0);
        assert_eq!(rows.lines().count(), 2);
        assert!(rows.lines().nth(1).unwrap().starts_with("00000010 "));
    }
}
