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
use std::sync::Arc;

use serde::Serialize;

use super::SampleAsset;

/// Maps a key and velocity range onto a sample index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyZone {
    pub low_key: u8,
    pub high_key: u8,
    pub low_velocity: u8,
    pub high_velocity: u8,
    pub sample_index: u16,
    pub root_key: u8,
    pub fine_tune: i8,
    pub level: u8,
    pub pan: u8,
}

impl KeyZone {
    /// A zone covering every key and velocity.
    pub fn full_range(sample_index: u16) -> KeyZone {
        KeyZone {
            low_key: 0,
            high_key: 127,
            low_velocity: 0,
            high_velocity: 127,
            sample_index,
            root_key: 60,
            fine_tune: 0,
            level: 127,
            pan: 64,
        }
    }

    pub fn contains(&self, key: u8, velocity: u8) -> bool {
        (self.low_key..=self.high_key).contains(&key)
            && (self.low_velocity..=self.high_velocity).contains(&velocity)
    }
}

/// A keyboard layout: zones plus the samples they resolve to. Samples are shared with
/// the owning package.
#[derive(Debug, Clone)]
pub struct Multisample {
    name: String,
    zones: Vec<KeyZone>,
    samples: Vec<Option<Arc<SampleAsset>>>,
    sample_refs: Vec<String>,
}

impl Multisample {
    pub fn new(name: impl Into<String>, zones: Vec<KeyZone>) -> Multisample {
        let samples = vec![None; zones.len()];
        Multisample {
            name: name.into(),
            zones,
            samples,
            sample_refs: Vec::new(),
        }
    }

    /// Records the sample file names the keymap refers to.
    pub fn with_sample_refs(mut self, refs: Vec<String>) -> Multisample {
        self.sample_refs = refs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zones(&self) -> &[KeyZone] {
        &self.zones
    }

    pub fn sample_refs(&self) -> &[String] {
        &self.sample_refs
    }

    /// The resolved sample for each zone, in zone order.
    pub fn samples(&self) -> &[Option<Arc<SampleAsset>>] {
        &self.samples
    }

    /// Finds the zone for a key and velocity. Earlier zones win when zones overlap.
    pub fn zone_for(&self, key: u8, velocity: u8) -> Option<&KeyZone> {
        self.zone_index_for(key, velocity).map(|i| &self.zones[i])
    }

    pub fn zone_index_for(&self, key: u8, velocity: u8) -> Option<usize> {
        self.zones.iter().position(|zone| zone.contains(key, velocity))
    }

    /// The sample that plays for a key and velocity, if its zone resolved.
    pub fn sample_for(&self, key: u8, velocity: u8) -> Option<&Arc<SampleAsset>> {
        self.zone_index_for(key, velocity)
            .and_then(|i| self.samples[i].as_ref())
    }

    /// Resolves zone sample indices against a sample list. Zones pointing past the
    /// end stay unresolved. Returns how many zones were left unresolved.
    pub fn resolve(&mut self, samples: &[Arc<SampleAsset>]) -> usize {
        self.samples = self
            .zones
            .iter()
            .map(|zone| samples.get(usize::from(zone.sample_index)).cloned())
            .collect();
        self.unresolved_count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PcmFormat;

    fn zone(low: u8, high: u8, index: u16) -> KeyZone {
        KeyZone {
            low_key: low,
            high_key: high,
            ..KeyZone::full_range(index)
        }
    }

    #[test]
    fn test_earlier_zone_wins_overlap() {
        let ms = Multisample::new("ms", vec![zone(60, 70, 0), zone(50, 80, 1)]);
        assert_eq!(ms.zone_for(64, 100).map(|z| z.sample_index), Some(0));
        assert_eq!(ms.zone_for(75, 100).map(|z| z.sample_index), Some(1));
        assert!(ms.zone_for(20, 100).is_none());
    }

    #[test]
    fn test_velocity_containment() {
        let soft = KeyZone {
            high_velocity: 63,
            ..KeyZone::full_range(0)
        };
        let hard = KeyZone {
            low_velocity: 64,
            ..KeyZone::full_range(1)
        };
        let ms = Multisample::new("ms", vec![soft, hard]);
        assert_eq!(ms.zone_index_for(60, 10), Some(0));
        assert_eq!(ms.zone_index_for(60, 100), Some(1));
    }

    #[test]
    fn test_resolve_leaves_out_of_range_zones_unresolved() {
        let sample = Arc::new(SampleAsset::new(
            "s",
            "S.PCM",
            0,
            PcmFormat::pcm16_mono(48000),
            vec![0; 4],
        ));
        let mut ms = Multisample::new("ms", vec![zone(0, 63, 0), zone(64, 127, 5)]);
        assert_eq!(ms.resolve(&[sample]), 1);
        assert_eq!(ms.zones().len(), 2);
        assert_eq!(ms.sample_for(10, 100).map(|s| s.name()), Some("s"));
        assert!(ms.sample_for(100, 100).is_none());
    }
}
