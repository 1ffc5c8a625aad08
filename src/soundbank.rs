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
//! SoundFont 2 (`RIFF sfbk`) writer.
//!
//! A bank is a flat list of samples, instruments made of zones that reference
//! samples, and presets that reference instruments. Serialization writes the
//! three top-level lists in order:
//!
//! ```text
//! LIST INFO   ifil isng INAM [ICRD IENG IPRD ICOP ICMT ISFT]
//! LIST sdta   smpl: every sample's 16-bit PCM, each followed by 46 zero frames
//! LIST pdta   phdr pbag pmod pgen inst ibag imod igen shdr
//! ```
//!
//! Every header and bag table ends with a terminal record whose index fields
//! hold the size of the table it indexes into.

mod error;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, info};

pub use error::SoundBankError;

use crate::classify::Classifications;
use crate::config::BankInfo;
use crate::model::{LoopMode, SampleAsset, SampleId};

/// Zero frames written after every sample's data.
pub const SAMPLE_PADDING_FRAMES: u32 = 46;
/// Fixed width of every name field.
pub const NAME_LEN: usize = 20;

pub const PRESET_HEADER_SIZE: usize = 38;
pub const INSTRUMENT_HEADER_SIZE: usize = 22;
pub const SAMPLE_HEADER_SIZE: usize = 46;
pub const BAG_SIZE: usize = 4;
pub const GENERATOR_SIZE: usize = 4;
pub const MODULATOR_SIZE: usize = 10;

const VERSION: (u16, u16) = (2, 4);
const SOUND_ENGINE: &str = "EMU8000";
const MONO_SAMPLE: u16 = 1;
const PRESETS_PER_BANK: usize = 128;

/// Generator operators used by this writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Generator {
    Pan = 17,
    Instrument = 41,
    KeyRange = 43,
    VelRange = 44,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    OverridingRootKey = 58,
}

impl Generator {
    pub fn id(self) -> u16 {
        self as u16
    }
}

/// One sample: mono 16-bit little-endian PCM plus the header fields. Loop points
/// are frames relative to the sample's own start.
#[derive(Debug, Clone, PartialEq)]
pub struct BankSample {
    pub name: String,
    pub pcm: Vec<u8>,
    pub sample_rate: u32,
    pub root_key: u8,
    pub pitch_correction: i8,
    pub loop_start: u32,
    pub loop_end: u32,
}

impl BankSample {
    pub fn frames(&self) -> u32 {
        u32::try_from(self.pcm.len() / 2).unwrap_or(u32::MAX)
    }
}

/// An instrument zone. `generators` are written between the velocity range and
/// the terminal sample reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub key_range: (u8, u8),
    pub velocity_range: (u8, u8),
    pub sample: usize,
    pub generators: Vec<(Generator, i16)>,
}

impl Zone {
    /// A zone covering every key and velocity.
    pub fn full_range(sample: usize) -> Zone {
        Zone {
            key_range: (0, 127),
            velocity_range: (0, 127),
            sample,
            generators: Vec::new(),
        }
    }

    pub fn with_generator(mut self, generator: Generator, amount: i16) -> Zone {
        self.generators.push((generator, amount));
        self
    }

    /// Generators written for this zone, including the ranges and sample reference.
    fn generator_count(&self) -> usize {
        3 + self.generators.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub zones: Vec<Zone>,
}

/// A preset. Each referenced instrument becomes one full-keyboard preset zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub number: u16,
    pub bank: u16,
    pub instruments: Vec<usize>,
}

/// Absolute frame positions of one sample inside the `smpl` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub start: u32,
    pub end: u32,
    pub loop_start: u32,
    pub loop_end: u32,
}

/// A sound bank under construction.
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    info: BankInfo,
    samples: Vec<BankSample>,
    instruments: Vec<Instrument>,
    presets: Vec<Preset>,
}

impl SoundBank {
    pub fn new(info: BankInfo) -> SoundBank {
        SoundBank {
            info,
            ..Default::default()
        }
    }

    /// Builds a bank with one instrument and one preset per sample. Presets are
    /// numbered in sample order, 128 to a bank.
    ///
    /// `classifications` are looked up by position in `assets`. Pitched samples
    /// with a detected note use it as their root key.
    pub fn from_assets(
        assets: &[Arc<SampleAsset>],
        classifications: Option<&Classifications>,
        info: &BankInfo,
    ) -> Result<SoundBank, SoundBankError> {
        let mut bank = SoundBank::new(info.clone());
        for (i, asset) in assets.iter().enumerate() {
            let pcm = asset.to_pcm16_mono();
            if pcm.is_empty() {
                debug!(sample = asset.name(), "Skipping empty sample");
                continue;
            }

            let detected = classifications
                .and_then(|c| c.get(SampleId(i)))
                .and_then(|c| c.midi_note());
            let looping = asset.loop_mode() != LoopMode::None && asset.loop_end() > asset.loop_start();

            let mut zone = Zone::full_range(bank.samples.len());
            if let Some(note) = detected {
                zone = zone.with_generator(Generator::OverridingRootKey, i16::from(note));
            }
            if looping {
                zone = zone.with_generator(Generator::SampleModes, 1);
            }

            let sample = bank.add_sample(BankSample {
                name: asset.name().to_string(),
                pcm,
                sample_rate: asset.sample_rate(),
                root_key: detected.unwrap_or(asset.root_key()),
                pitch_correction: asset.fine_tune_cents().clamp(-99, 99) as i8,
                loop_start: if looping { asset.loop_start() } else { 0 },
                loop_end: if looping { asset.loop_end() } else { 0 },
            });
            zone.sample = sample;

            let instrument = bank.add_instrument(Instrument {
                name: asset.name().to_string(),
                zones: vec![zone],
            });
            bank.add_preset(Preset {
                name: asset.name().to_string(),
                number: (sample % PRESETS_PER_BANK) as u16,
                bank: (sample / PRESETS_PER_BANK) as u16,
                instruments: vec![instrument],
            });
        }

        if bank.samples.is_empty() {
            return Err(SoundBankError::NoSamples);
        }
        Ok(bank)
    }

    pub fn info(&self) -> &BankInfo {
        &self.info
    }

    pub fn samples(&self) -> &[BankSample] {
        &self.samples
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn add_sample(&mut self, sample: BankSample) -> usize {
        self.samples.push(sample);
        self.samples.len() - 1
    }

    pub fn add_instrument(&mut self, instrument: Instrument) -> usize {
        self.instruments.push(instrument);
        self.instruments.len() - 1
    }

    pub fn add_preset(&mut self, preset: Preset) -> usize {
        self.presets.push(preset);
        self.presets.len() - 1
    }

    /// Checks that the bank has content and that every reference resolves.
    pub fn validate(&self) -> Result<(), SoundBankError> {
        if self.samples.is_empty() {
            return Err(SoundBankError::NoSamples);
        }
        if self.presets.is_empty() {
            return Err(SoundBankError::NoPresets);
        }
        for instrument in &self.instruments {
            if let Some(zone) = instrument.zones.iter().find(|z| z.sample >= self.samples.len()) {
                return Err(SoundBankError::DanglingSample {
                    instrument: instrument.name.clone(),
                    sample: zone.sample,
                });
            }
        }
        for preset in &self.presets {
            if let Some(&missing) = preset.instruments.iter().find(|&&i| i >= self.instruments.len()) {
                return Err(SoundBankError::DanglingInstrument {
                    preset: preset.name.clone(),
                    instrument: missing,
                });
            }
        }
        Ok(())
    }

    /// Positions of every sample in the concatenated sample data, in insertion
    /// order. Samples without a usable loop loop over their whole length.
    pub fn placements(&self) -> Result<Vec<Placement>, SoundBankError> {
        let mut pos: u64 = 0;
        let mut placements = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            let start = frame_offset(pos, self.samples.len())?;
            let frames = sample.frames();
            let end = frame_offset(pos + u64::from(frames), self.samples.len())?;
            let (loop_start, loop_end) =
                if sample.loop_end > sample.loop_start && sample.loop_end <= frames {
                    (start + sample.loop_start, start + sample.loop_end)
                } else {
                    (start, end)
                };
            placements.push(Placement {
                start,
                end,
                loop_start,
                loop_end,
            });
            pos += u64::from(frames) + u64::from(SAMPLE_PADDING_FRAMES);
        }
        Ok(placements)
    }

    /// Serializes the bank.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SoundBankError> {
        self.validate()?;

        let mut body = b"sfbk".to_vec();
        body.extend_from_slice(&self.info_list()?);
        body.extend_from_slice(&self.sample_data_list()?);
        body.extend_from_slice(&self.parameter_list()?);

        let mut out = Vec::with_capacity(body.len() + 8);
        write_chunk(&mut out, b"RIFF", &body)?;
        Ok(out)
    }

    /// Serializes the bank and writes it to `path`.
    pub fn write(&self, path: &Path) -> Result<(), SoundBankError> {
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        info!(
            path = %path.display(),
            samples = self.samples.len(),
            presets = self.presets.len(),
            bytes = bytes.len(),
            "Sound bank written"
        );
        Ok(())
    }

    fn info_list(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::new();
        let mut version = Vec::with_capacity(4);
        version.write_u16::<LittleEndian>(VERSION.0)?;
        version.write_u16::<LittleEndian>(VERSION.1)?;
        write_chunk(&mut data, b"ifil", &version)?;
        write_chunk(&mut data, b"isng", &zstr(SOUND_ENGINE))?;
        write_chunk(&mut data, b"INAM", &zstr(&self.info.name))?;

        let optional: [(&[u8; 4], &str); 6] = [
            (b"ICRD", self.info.creation_date.as_str()),
            (b"IENG", self.info.engineer.as_str()),
            (b"IPRD", self.info.product.as_str()),
            (b"ICOP", self.info.copyright.as_str()),
            (b"ICMT", self.info.comment.as_str()),
            (b"ISFT", self.info.software.as_str()),
        ];
        for (tag, value) in optional {
            if !value.is_empty() {
                write_chunk(&mut data, tag, &zstr(value))?;
            }
        }
        list(b"INFO", &data)
    }

    fn sample_data_list(&self) -> Result<Vec<u8>, SoundBankError> {
        let padding = [0u8; SAMPLE_PADDING_FRAMES as usize * 2];
        let total: usize = self.samples.iter().map(|s| s.pcm.len() + padding.len()).sum();
        let mut smpl = Vec::with_capacity(total);
        for sample in &self.samples {
            // Whole frames only; the offsets are counted in frames.
            smpl.extend_from_slice(&sample.pcm[..sample.frames() as usize * 2]);
            smpl.extend_from_slice(&padding);
        }
        let mut data = Vec::with_capacity(smpl.len() + 8);
        write_chunk(&mut data, b"smpl", &smpl)?;
        list(b"sdta", &data)
    }

    fn parameter_list(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::new();
        write_chunk(&mut data, b"phdr", &self.preset_headers()?)?;
        write_chunk(&mut data, b"pbag", &self.preset_bags()?)?;
        write_chunk(&mut data, b"pmod", &[0u8; MODULATOR_SIZE])?;
        write_chunk(&mut data, b"pgen", &self.preset_generators()?)?;
        write_chunk(&mut data, b"inst", &self.instrument_headers()?)?;
        write_chunk(&mut data, b"ibag", &self.instrument_bags()?)?;
        write_chunk(&mut data, b"imod", &[0u8; MODULATOR_SIZE])?;
        write_chunk(&mut data, b"igen", &self.instrument_generators()?)?;
        write_chunk(&mut data, b"shdr", &self.sample_headers()?)?;
        list(b"pdta", &data)
    }

    fn preset_headers(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::with_capacity((self.presets.len() + 1) * PRESET_HEADER_SIZE);
        let mut bag = 0usize;
        for preset in &self.presets {
            data.extend_from_slice(&name_field(&preset.name));
            data.write_u16::<LittleEndian>(preset.number)?;
            data.write_u16::<LittleEndian>(preset.bank)?;
            data.write_u16::<LittleEndian>(index("pbag", bag)?)?;
            // Library, genre, morphology.
            data.extend_from_slice(&[0u8; 12]);
            bag += preset.instruments.len();
        }
        data.extend_from_slice(&name_field("EOP"));
        data.extend_from_slice(&[0u8; 4]);
        data.write_u16::<LittleEndian>(index("pbag", bag)?)?;
        data.extend_from_slice(&[0u8; 12]);
        Ok(data)
    }

    fn preset_bags(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::new();
        let mut generator = 0usize;
        for _ in self.presets.iter().flat_map(|p| &p.instruments) {
            data.write_u16::<LittleEndian>(index("pgen", generator)?)?;
            data.write_u16::<LittleEndian>(0)?;
            // Key range and instrument.
            generator += 2;
        }
        data.write_u16::<LittleEndian>(index("pgen", generator)?)?;
        data.write_u16::<LittleEndian>(0)?;
        Ok(data)
    }

    fn preset_generators(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::new();
        for &instrument in self.presets.iter().flat_map(|p| &p.instruments) {
            data.write_u16::<LittleEndian>(Generator::KeyRange.id())?;
            data.write_u8(0)?;
            data.write_u8(127)?;
            data.write_u16::<LittleEndian>(Generator::Instrument.id())?;
            data.write_u16::<LittleEndian>(index("inst", instrument)?)?;
        }
        data.extend_from_slice(&[0u8; GENERATOR_SIZE]);
        Ok(data)
    }

    fn instrument_headers(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::with_capacity((self.instruments.len() + 1) * INSTRUMENT_HEADER_SIZE);
        let mut bag = 0usize;
        for instrument in &self.instruments {
            data.extend_from_slice(&name_field(&instrument.name));
            data.write_u16::<LittleEndian>(index("ibag", bag)?)?;
            bag += instrument.zones.len();
        }
        data.extend_from_slice(&name_field("EOI"));
        data.write_u16::<LittleEndian>(index("ibag", bag)?)?;
        Ok(data)
    }

    fn instrument_bags(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::new();
        let mut generator = 0usize;
        for zone in self.instruments.iter().flat_map(|i| &i.zones) {
            data.write_u16::<LittleEndian>(index("igen", generator)?)?;
            data.write_u16::<LittleEndian>(0)?;
            generator += zone.generator_count();
        }
        data.write_u16::<LittleEndian>(index("igen", generator)?)?;
        data.write_u16::<LittleEndian>(0)?;
        Ok(data)
    }

    fn instrument_generators(&self) -> Result<Vec<u8>, SoundBankError> {
        let mut data = Vec::new();
        for zone in self.instruments.iter().flat_map(|i| &i.zones) {
            data.write_u16::<LittleEndian>(Generator::KeyRange.id())?;
            data.write_u8(zone.key_range.0)?;
            data.write_u8(zone.key_range.1)?;
            data.write_u16::<LittleEndian>(Generator::VelRange.id())?;
            data.write_u8(zone.velocity_range.0)?;
            data.write_u8(zone.velocity_range.1)?;
            for &(generator, amount) in &zone.generators {
                data.write_u16::<LittleEndian>(generator.id())?;
                data.write_i16::<LittleEndian>(amount)?;
            }
            // The sample reference must close the zone.
            data.write_u16::<LittleEndian>(Generator::SampleId.id())?;
            data.write_u16::<LittleEndian>(index("shdr", zone.sample)?)?;
        }
        data.extend_from_slice(&[0u8; GENERATOR_SIZE]);
        Ok(data)
    }

    fn sample_headers(&self) -> Result<Vec<u8>, SoundBankError> {
        let placements = self.placements()?;
        let mut data = Vec::with_capacity((self.samples.len() + 1) * SAMPLE_HEADER_SIZE);
        for (sample, place) in self.samples.iter().zip(&placements) {
            data.extend_from_slice(&name_field(&sample.name));
            data.write_u32::<LittleEndian>(place.start)?;
            data.write_u32::<LittleEndian>(place.end)?;
            data.write_u32::<LittleEndian>(place.loop_start)?;
            data.write_u32::<LittleEndian>(place.loop_end)?;
            data.write_u32::<LittleEndian>(sample.sample_rate)?;
            data.write_u8(sample.root_key.min(127))?;
            data.write_i8(sample.pitch_correction)?;
            // Sample link, then type.
            data.write_u16::<LittleEndian>(0)?;
            data.write_u16::<LittleEndian>(MONO_SAMPLE)?;
        }
        data.extend_from_slice(&name_field("EOS"));
        data.extend_from_slice(&[0u8; SAMPLE_HEADER_SIZE - NAME_LEN]);
        Ok(data)
    }
}

fn index(table: &'static str, value: usize) -> Result<u16, SoundBankError> {
    u16::try_from(value).map_err(|_| SoundBankError::TooManyRecords {
        table,
        count: value,
    })
}

fn frame_offset(pos: u64, count: usize) -> Result<u32, SoundBankError> {
    u32::try_from(pos).map_err(|_| SoundBankError::TooManyRecords {
        table: "smpl",
        count,
    })
}

/// Writes a chunk, padding odd-sized bodies to an even length.
fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) -> Result<(), SoundBankError> {
    let size = u32::try_from(body.len()).map_err(|_| SoundBankError::TooManyRecords {
        table: "chunk",
        count: body.len(),
    })?;
    out.extend_from_slice(tag);
    out.write_u32::<LittleEndian>(size)?;
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
    Ok(())
}

fn list(kind: &[u8; 4], data: &[u8]) -> Result<Vec<u8>, SoundBankError> {
    let mut body = Vec::with_capacity(data.len() + 4);
    body.extend_from_slice(kind);
    body.extend_from_slice(data);
    let mut out = Vec::with_capacity(body.len() + 8);
    write_chunk(&mut out, b"LIST", &body)?;
    Ok(out)
}

/// NUL-terminated ASCII, padded to an even length.
fn zstr(value: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = value
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();
    bytes.push(0);
    if bytes.len() % 2 == 1 {
        bytes.push(0);
    }
    bytes
}

fn name_field(name: &str) -> [u8; NAME_LEN] {
    let mut field = [0u8; NAME_LEN];
    for (slot, c) in field.iter_mut().zip(name.chars()) {
        *slot = if c.is_ascii() { c as u8 } else { b'?' };
    }
    field
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;
    use crate::classify::classify_package;
    use crate::model::{ContainerKind, Package, PcmFormat};

    /// Splits a run of chunks into (tag, body) pairs.
    fn chunks(mut data: &[u8]) -> Vec<(&[u8], &[u8])> {
        let mut out = Vec::new();
        while data.len() >= 8 {
            let size = LittleEndian::read_u32(&data[4..8]) as usize;
            out.push((&data[..4], &data[8..8 + size]));
            data = &data[(8 + size + size % 2).min(data.len())..];
        }
        out
    }

    /// The sub-chunks of the LIST chunk with the given kind.
    fn list_body<'a>(file: &'a [u8], kind: &[u8]) -> Vec<(&'a [u8], &'a [u8])> {
        let riff = chunks(file);
        let (_, body) = riff[0];
        chunks(&body[4..])
            .into_iter()
            .find(|(tag, body)| *tag == b"LIST" && &body[..4] == kind)
            .map(|(_, body)| chunks(&body[4..]))
            .unwrap()
    }

    fn find<'a>(chunks: &[(&'a [u8], &'a [u8])], tag: &[u8]) -> &'a [u8] {
        chunks.iter().find(|(t, _)| *t == tag).unwrap().1
    }

    fn sample(name: &str, frames: usize) -> BankSample {
        BankSample {
            name: name.to_string(),
            pcm: vec![1; frames * 2],
            sample_rate: 44100,
            root_key: 60,
            pitch_correction: 0,
            loop_start: 0,
            loop_end: 0,
        }
    }

    fn two_sample_bank() -> SoundBank {
        let mut bank = SoundBank::new(BankInfo::named("Test Bank"));
        let a = bank.add_sample(sample("A", 100));
        let mut looped = sample("B", 50);
        looped.loop_start = 10;
        looped.loop_end = 40;
        let b = bank.add_sample(looped);
        let i = bank.add_instrument(Instrument {
            name: "Both".to_string(),
            zones: vec![
                Zone {
                    key_range: (0, 59),
                    velocity_range: (0, 127),
                    sample: a,
                    generators: vec![(Generator::OverridingRootKey, 48)],
                },
                Zone {
                    key_range: (60, 127),
                    velocity_range: (0, 127),
                    sample: b,
                    generators: Vec::new(),
                },
            ],
        });
        let j = bank.add_instrument(Instrument {
            name: "Only A".to_string(),
            zones: vec![Zone::full_range(a)],
        });
        bank.add_preset(Preset {
            name: "Split".to_string(),
            number: 0,
            bank: 0,
            instruments: vec![i],
        });
        bank.add_preset(Preset {
            name: "Layer".to_string(),
            number: 1,
            bank: 0,
            instruments: vec![i, j],
        });
        bank
    }

    #[test]
    fn test_refuses_empty_banks() {
        let bank = SoundBank::new(BankInfo::default());
        assert!(matches!(bank.to_bytes(), Err(SoundBankError::NoSamples)));

        let mut bank = SoundBank::new(BankInfo::default());
        bank.add_sample(sample("A", 10));
        assert!(matches!(bank.to_bytes(), Err(SoundBankError::NoPresets)));

        let err = SoundBank::from_assets(&[], None, &BankInfo::default()).unwrap_err();
        assert!(matches!(err, SoundBankError::NoSamples));
    }

    #[test]
    fn test_dangling_references() {
        let mut bank = two_sample_bank();
        bank.add_preset(Preset {
            name: "Ghost".to_string(),
            number: 2,
            bank: 0,
            instruments: vec![7],
        });
        assert!(matches!(
            bank.validate(),
            Err(SoundBankError::DanglingInstrument { instrument: 7, .. })
        ));

        let mut bank = two_sample_bank();
        bank.add_instrument(Instrument {
            name: "Lost".to_string(),
            zones: vec![Zone::full_range(5)],
        });
        assert!(matches!(
            bank.validate(),
            Err(SoundBankError::DanglingSample { sample: 5, .. })
        ));
    }

    #[test]
    fn test_top_level_layout() {
        let bytes = two_sample_bank().to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(LittleEndian::read_u32(&bytes[4..8]) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"sfbk");

        let (_, body) = chunks(&bytes)[0];
        let kinds: Vec<&[u8]> = chunks(&body[4..]).into_iter().map(|(_, b)| &b[..4]).collect();
        assert_eq!(kinds, vec![&b"INFO"[..], b"sdta", b"pdta"]);

        let pdta: Vec<&[u8]> = list_body(&bytes, b"pdta").into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            pdta,
            vec![
                &b"phdr"[..],
                b"pbag",
                b"pmod",
                b"pgen",
                b"inst",
                b"ibag",
                b"imod",
                b"igen",
                b"shdr"
            ]
        );

        let info = list_body(&bytes, b"INFO");
        assert_eq!(find(&info, b"ifil"), &[2, 0, 4, 0]);
        assert_eq!(find(&info, b"INAM"), b"Test Bank\0");
        assert!(info.iter().all(|(tag, _)| *tag != b"ICOP"));
    }

    #[test]
    fn test_sample_data_is_padded() {
        let bytes = two_sample_bank().to_bytes().unwrap();
        let sdta = list_body(&bytes, b"sdta");
        let smpl = find(&sdta, b"smpl");
        assert_eq!(smpl.len(), (100 + 46 + 50 + 46) * 2);
        assert!(smpl[200..292].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sample_offsets_are_cumulative() {
        let bank = two_sample_bank();
        let placements = bank.placements().unwrap();
        assert_eq!(
            placements[0],
            Placement {
                start: 0,
                end: 100,
                loop_start: 0,
                loop_end: 100
            }
        );
        assert_eq!(
            placements[1],
            Placement {
                start: 146,
                end: 196,
                loop_start: 156,
                loop_end: 186
            }
        );

        let bytes = bank.to_bytes().unwrap();
        let pdta = list_body(&bytes, b"pdta");
        let shdr = find(&pdta, b"shdr");
        assert_eq!(shdr.len(), 3 * SAMPLE_HEADER_SIZE);
        let second = &shdr[SAMPLE_HEADER_SIZE..2 * SAMPLE_HEADER_SIZE];
        assert_eq!(LittleEndian::read_u32(&second[20..24]), 146);
        assert_eq!(LittleEndian::read_u32(&second[28..32]), 156);
        assert_eq!(LittleEndian::read_u16(&second[44..46]), MONO_SAMPLE);
        assert_eq!(&shdr[2 * SAMPLE_HEADER_SIZE..2 * SAMPLE_HEADER_SIZE + 3], b"EOS");
    }

    #[test]
    fn test_bags_delimit_generators() {
        let bytes = two_sample_bank().to_bytes().unwrap();
        let pdta = list_body(&bytes, b"pdta");

        for (headers, header_size, bags, gens) in [
            (&b"phdr"[..], PRESET_HEADER_SIZE, &b"pbag"[..], &b"pgen"[..]),
            (b"inst", INSTRUMENT_HEADER_SIZE, b"ibag", b"igen"),
        ] {
            let bag_data = find(&pdta, bags);
            let gen_count = find(&pdta, gens).len() / GENERATOR_SIZE - 1;
            let bag_count = bag_data.len() / BAG_SIZE - 1;

            let starts: Vec<u16> = bag_data
                .chunks_exact(BAG_SIZE)
                .map(|b| LittleEndian::read_u16(&b[..2]))
                .collect();
            assert!(starts.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(*starts.last().unwrap() as usize, gen_count);

            let header_data = find(&pdta, headers);
            let terminal = &header_data[header_data.len() - header_size..];
            let bag_field = header_size - if header_size == PRESET_HEADER_SIZE { 14 } else { 2 };
            assert_eq!(
                LittleEndian::read_u16(&terminal[bag_field..bag_field + 2]) as usize,
                bag_count
            );
        }
    }

    #[test]
    fn test_sample_reference_closes_each_zone() {
        let bytes = two_sample_bank().to_bytes().unwrap();
        let pdta = list_body(&bytes, b"pdta");
        let igen: Vec<(u16, u16)> = find(&pdta, b"igen")
            .chunks_exact(GENERATOR_SIZE)
            .map(|g| (LittleEndian::read_u16(&g[..2]), LittleEndian::read_u16(&g[2..])))
            .collect();
        let starts: Vec<usize> = find(&pdta, b"ibag")
            .chunks_exact(BAG_SIZE)
            .map(|b| LittleEndian::read_u16(&b[..2]) as usize)
            .collect();
        for bounds in starts.windows(2) {
            let zone = &igen[bounds[0]..bounds[1]];
            assert_eq!(zone[0].0, Generator::KeyRange.id());
            assert_eq!(zone[1].0, Generator::VelRange.id());
            assert_eq!(zone.last().unwrap().0, Generator::SampleId.id());
        }
        // First zone: keys 0..59, root key override, sample 0.
        assert_eq!(igen[0], (43, 59 << 8));
        assert_eq!(igen[2], (58, 48));
        assert_eq!(igen[3], (53, 0));
    }

    #[test]
    fn test_from_assets() {
        let mut package = Package::new("export", ContainerKind::Directory);
        package.push_sample(
            SampleAsset::new(
                "Piano_C#4",
                "KEYS.PCM",
                0,
                PcmFormat::pcm16_mono(32000),
                vec![0x10; 400],
            )
            .with_loop(LoopMode::Forward, 20, 180),
        );
        package.push_sample(SampleAsset::new(
            "A name that is far too long",
            "KEYS.PCM",
            1,
            PcmFormat::new(44100, 16, 2),
            vec![0x20; 400],
        ));
        package.push_sample(SampleAsset::new(
            "Empty",
            "KEYS.PCM",
            2,
            PcmFormat::pcm16_mono(44100),
            Vec::new(),
        ));
        let classes = classify_package(&package);

        let bank =
            SoundBank::from_assets(package.samples(), Some(&classes), &BankInfo::named("x")).unwrap();
        assert_eq!(bank.samples().len(), 2);
        assert_eq!(bank.presets().len(), 2);
        assert_eq!(bank.presets()[1].number, 1);

        let piano = &bank.samples()[0];
        assert_eq!(piano.root_key, 61);
        assert_eq!((piano.loop_start, piano.loop_end), (20, 180));
        let zone = &bank.instruments()[0].zones[0];
        assert_eq!(
            zone.generators,
            vec![(Generator::OverridingRootKey, 61), (Generator::SampleModes, 1)]
        );

        // Stereo input is reduced to its first channel.
        assert_eq!(bank.samples()[1].frames(), 100);
        let bytes = bank.to_bytes().unwrap();
        let pdta = list_body(&bytes, b"pdta");
        let phdr = find(&pdta, b"phdr");
        assert_eq!(&phdr[PRESET_HEADER_SIZE..PRESET_HEADER_SIZE + NAME_LEN], b"A name that is far t");
    }

    #[test]
    fn test_preset_numbering_wraps_into_banks() {
        let assets: Vec<Arc<SampleAsset>> = (0..130)
            .map(|i| {
                Arc::new(SampleAsset::new(
                    format!("S{i}"),
                    "C.PCM",
                    i,
                    PcmFormat::pcm16_mono(22050),
                    vec![0; 4],
                ))
            })
            .collect();
        let bank = SoundBank::from_assets(&assets, None, &BankInfo::default()).unwrap();
        let last = &bank.presets()[129];
        assert_eq!((last.bank, last.number), (1, 1));
        assert_eq!(bank.instruments()[0].zones[0].generators, Vec::new());
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sf2");
        two_sample_bank().write(&path).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(&written[8..12], b"sfbk");
    }
}
