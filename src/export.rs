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
//! Writes decoded samples out as WAV files.

mod error;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info};

pub use error::ExportError;

use crate::model::{SampleAsset, SampleId};
use crate::util::safe_file_stem;

/// Writes one sample as a WAV file with its native format.
pub fn write_wav(sample: &SampleAsset, path: &Path) -> Result<(), ExportError> {
    let bits = sample.bit_depth();
    if !matches!(bits, 8 | 16 | 24 | 32) {
        return Err(ExportError::UnsupportedFormat(sample.name().to_string(), bits));
    }

    let wav_error = |source| ExportError::Wav {
        path: path.to_path_buf(),
        source,
    };
    let spec = WavSpec {
        channels: sample.channel_count().max(1),
        sample_rate: sample.sample_rate(),
        bits_per_sample: bits,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for value in sample.samples_i32() {
        writer.write_sample(value).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(())
}

/// File names for a list of samples: safe stems, `_N` suffixes for repeats, and
/// `sample_NNN` for names with nothing usable in them.
pub fn export_names(samples: &[Arc<SampleAsset>]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let stem = safe_file_stem(sample.name()).unwrap_or_else(|| format!("sample_{i:03}"));
            let count = seen.entry(stem.to_lowercase()).or_insert(0);
            let name = match *count {
                0 => format!("{stem}.wav"),
                n => format!("{stem}_{n}.wav"),
            };
            *count += 1;
            name
        })
        .collect()
}

/// Writes every sample into `dir`, creating it if needed. Returns the written
/// paths keyed by sample.
pub fn export_samples(
    samples: &[Arc<SampleAsset>],
    dir: &Path,
) -> Result<Vec<(SampleId, PathBuf)>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(samples.len());
    for (i, (sample, name)) in samples.iter().zip(export_names(samples)).enumerate() {
        let path = dir.join(name);
        debug!(sample = sample.name(), path = %path.display(), "Exporting sample");
        write_wav(sample, &path)?;
        written.push((SampleId(i), path));
    }
    info!(dir = %dir.display(), samples = written.len(), "Samples exported");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use hound::WavReader;

    use super::*;
    use crate::model::PcmFormat;

    fn asset(name: &str, format: PcmFormat, pcm: Vec<u8>) -> Arc<SampleAsset> {
        Arc::new(SampleAsset::new(name, "T.PCM", 0, format, pcm))
    }

    #[test]
    fn test_export_names() {
        let pcm = vec![0u8; 4];
        let samples = vec![
            asset("Kick", PcmFormat::pcm16_mono(44100), pcm.clone()),
            asset("kick", PcmFormat::pcm16_mono(44100), pcm.clone()),
            asset("Sn/are?", PcmFormat::pcm16_mono(44100), pcm.clone()),
            asset("***", PcmFormat::pcm16_mono(44100), pcm.clone()),
            asset("Kick", PcmFormat::pcm16_mono(44100), pcm),
        ];
        assert_eq!(
            export_names(&samples),
            vec!["Kick.wav", "kick_1.wav", "Snare.wav", "sample_003.wav", "Kick_2.wav"]
        );
    }

    #[test]
    fn test_export_round_trips_through_hound() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("wavs");
        let pcm: Vec<u8> = [100i16, -100, 3000, -3000]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let samples = vec![
            asset("Flute C4", PcmFormat::pcm16_mono(32000), pcm.clone()),
            asset("Stereo", PcmFormat::new(48000, 16, 2), pcm),
        ];

        let written = export_samples(&samples, &out).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].1, out.join("Flute C4.wav"));

        let mut reader = WavReader::open(&written[0].1).unwrap();
        assert_eq!(reader.spec().sample_rate, 32000);
        assert_eq!(reader.spec().channels, 1);
        let values: Vec<i32> = reader.samples::<i32>().map(|s| s.unwrap()).collect();
        assert_eq!(values, vec![100, -100, 3000, -3000]);

        let reader = WavReader::open(&written[1].1).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 2);
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let dir = tempfile::tempdir().unwrap();
        let sample = asset("Odd", PcmFormat::new(44100, 12, 1), vec![0; 6]);
        let err = write_wav(&sample, &dir.path().join("odd.wav")).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_, 12)));
    }
}
