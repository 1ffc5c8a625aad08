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
//! Keymaps (.KMP): a zone table mapping key and velocity ranges to sample indices.
//!
//! The zone count's position and the zone record size both vary between
//! firmware versions, so every (count offset, record size) pair is tried in
//! order. Zone records start with:
//!
//! ```text
//! +0 low key  +1 high key  +2 root key  +3 fine tune (i8)
//! +4 low vel  +5 high vel  +6 sample index (LE u16)  +8 level  +9 pan
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::{KeyZone, Multisample};
use crate::scan;

pub const SIGNATURES: [&[u8]; 3] = [b"KMP1", b"MSP1", b"kmp1"];

/// Minimum size of a keymap with a header.
pub const MIN_KEYMAP_LEN: usize = 32;

const NAME_START: usize = 8;
const NAME_END: usize = 40;
const COUNT_OFFSETS: [usize; 3] = [32, 40, 48];
const ZONE_SIZES: [usize; 4] = [16, 20, 24, 32];
const MAX_ZONES: u16 = 128;
const MAX_REFERENCE_LEN: usize = 100;

/// Decodes a keymap. Never fails: anything unreadable becomes a single zone
/// covering the whole keyboard and pointing at sample 0.
pub fn decode(data: &[u8], name: &str) -> Multisample {
    let refs = sample_references(data);
    let signed = data.len() >= MIN_KEYMAP_LEN
        && SIGNATURES
            .iter()
            .any(|sig| data.get(..4) == Some(*sig));
    if !signed {
        debug!(keymap = name, "No keymap header, using a full-range zone");
        return Multisample::new(name, vec![KeyZone::full_range(0)]).with_sample_refs(refs);
    }

    let keymap_name = header_name(data).unwrap_or_else(|| name.to_string());
    let zones = COUNT_OFFSETS
        .iter()
        .find_map(|&offset| {
            let count = scan::le_u16(data, offset)?;
            if !(1..=MAX_ZONES).contains(&count) {
                return None;
            }
            let zones = read_zones(data, offset + 2, usize::from(count));
            if zones.is_empty() {
                None
            } else {
                debug!(keymap = name, offset, zones = zones.len(), "Zone table found");
                Some(zones)
            }
        })
        .unwrap_or_else(|| vec![KeyZone::full_range(0)]);

    Multisample::new(keymap_name, zones).with_sample_refs(refs)
}

fn header_name(data: &[u8]) -> Option<String> {
    let window = data.get(..NAME_END.min(data.len()))?;
    let end = scan::find_from(window, b"\0", NAME_START)?;
    if end == NAME_START {
        return None;
    }
    let name = scan::nul_terminated(&data[NAME_START..end]);
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Tries each record size and returns the first complete, valid zone list.
fn read_zones(data: &[u8], offset: usize, count: usize) -> Vec<KeyZone> {
    ZONE_SIZES
        .iter()
        .filter(|&&size| offset + count * size <= data.len())
        .find_map(|&size| {
            (0..count)
                .map(|i| read_zone(&data[offset + i * size..offset + (i + 1) * size]))
                .collect::<Option<Vec<KeyZone>>>()
        })
        .unwrap_or_default()
}

fn read_zone(record: &[u8]) -> Option<KeyZone> {
    let low_key = scan::byte(record, 0)?;
    let high_key = scan::byte(record, 1)?;
    let low_velocity = scan::byte(record, 4)?;
    let high_velocity = scan::byte(record, 5)?;
    if high_key > 127 || low_key > high_key {
        return None;
    }
    if high_velocity > 127 || low_velocity > high_velocity {
        return None;
    }

    let mut root_key = scan::byte(record, 2)?;
    if root_key > 127 {
        root_key = ((u16::from(low_key) + u16::from(high_key)) / 2) as u8;
    }

    Some(KeyZone {
        low_key,
        high_key,
        low_velocity,
        high_velocity,
        sample_index: scan::le_u16(record, 6)?,
        root_key,
        fine_tune: scan::byte(record, 3)? as i8,
        level: scan::byte(record, 8)?,
        pan: scan::byte(record, 9)?,
    })
}

/// Finds sample file names (`*.KSF`) mentioned in a keymap.
pub fn sample_references(data: &[u8]) -> Vec<String> {
    let mut refs = BTreeSet::new();
    for term in [b".KSF", b".ksf"] {
        for idx in scan::find_all(data, term) {
            let mut start = idx;
            while start > 0
                && !matches!(data[start - 1], 0 | b' ' | b'/')
                && idx - start <= MAX_REFERENCE_LEN
            {
                start -= 1;
            }
            if start < idx {
                let name = scan::nul_terminated(&data[start..idx + term.len()]);
                if name.len() > term.len() {
                    refs.insert(name);
                }
            }
        }
    }
    refs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::KmpFixture;

    #[test]
    fn test_zone_table_at_first_offset() {
        let data = KmpFixture::new("Piano MS")
            .zone(0, 59, 48, 0)
            .zone(60, 127, 72, 1)
            .build();
        let ms = decode(&data, "PIANO.KMP");
        assert_eq!(ms.name(), "Piano MS");
        assert_eq!(ms.zones().len(), 2);
        assert_eq!(ms.zones()[1].low_key, 60);
        assert_eq!(ms.zones()[1].root_key, 72);
        assert_eq!(ms.zones()[1].sample_index, 1);
        assert_eq!(ms.zones()[0].pan, 64);
    }

    #[test]
    fn test_invalid_count_tries_next_offset() {
        let data = KmpFixture::new("Strings")
            .count_offset(40)
            .zone(0, 127, 60, 0)
            .build();
        let ms = decode(&data, "STR.KMP");
        assert_eq!(ms.zones().len(), 1);
        assert_eq!(ms.zones()[0].high_key, 127);
    }

    #[test]
    fn test_root_key_clamped_to_midpoint() {
        let data = KmpFixture::new("Bass").zone(40, 60, 200, 0).build();
        let ms = decode(&data, "BASS.KMP");
        assert_eq!(ms.zones()[0].root_key, 50);
    }

    #[test]
    fn test_invalid_zones_fall_back_to_full_range() {
        let data = KmpFixture::new("Bad").zone(90, 10, 60, 0).build();
        let ms = decode(&data, "BAD.KMP");
        assert_eq!(ms.zones(), &[KeyZone::full_range(0)]);
        assert_eq!(ms.name(), "Bad");
    }

    #[test]
    fn test_unsigned_data_gets_full_range_zone() {
        let ms = decode(b"garbage", "X.KMP");
        assert_eq!(ms.name(), "X.KMP");
        assert_eq!(ms.zones().len(), 1);
        assert_eq!(ms.zones()[0].root_key, 60);
        assert_eq!(ms.zones()[0].sample_index, 0);
    }

    #[test]
    fn test_sample_references() {
        let mut data = KmpFixture::new("Refs").zone(0, 127, 60, 0).build();
        data.extend_from_slice(b"\0SAMPLES/PIANO_C4.KSF\0 violin.ksf\0PIANO_C4.KSF\0.KSF");
        let refs = decode(&data, "R.KMP").sample_refs().to_vec();
        assert_eq!(refs, vec!["PIANO_C4.KSF".to_string(), "violin.ksf".to_string()]);
    }
}
