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

/// Errors raised while assembling or writing a sound bank.
#[derive(Debug, thiserror::Error)]
pub enum SoundBankError {
    #[error("Sound bank has no samples")]
    NoSamples,

    #[error("Sound bank has no presets")]
    NoPresets,

    #[error("Instrument \"{instrument}\" references missing sample {sample}")]
    DanglingSample { instrument: String, sample: usize },

    #[error("Preset \"{preset}\" references missing instrument {instrument}")]
    DanglingInstrument { preset: String, instrument: usize },

    #[error("Too many {table} records for a sound bank: {count}")]
    TooManyRecords { table: &'static str, count: usize },

    #[error("Error writing sound bank: {0}")]
    Io(#[from] std::io::Error),
}
