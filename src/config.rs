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
//! Decoder tunables and sound bank metadata, loaded from YAML with environment
//! overrides (`SETRIP_DECODE__WORKERS=4`, `SETRIP_BANK__NAME=...`).

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

mod error;

pub use error::ConfigError;

use crate::decode::pcm;

/// Default number of programs the linear bank scan will accept.
pub const DEFAULT_PROGRAM_SCAN_LIMIT: usize = 50;

/// Tunables for the heuristic decoders. Every field has a default matching the
/// layouts observed on real hardware.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct DecodeOptions {
    /// Size of the header preceding each sample block in a sample container.
    #[serde(default = "default_sample_header_size")]
    sample_header_size: usize,

    /// Size of one row in a sample container's fixed name table.
    #[serde(default = "default_name_row_size")]
    name_row_size: usize,

    /// Sample rate used when a header stores zero or has no rate field.
    #[serde(default = "default_sample_rate")]
    default_sample_rate: u32,

    /// Worker threads used to decode the files of a directory package.
    #[serde(default = "num_cpus::get")]
    workers: usize,

    /// Maximum number of names taken by the linear program scan.
    #[serde(default = "default_program_scan_limit")]
    program_scan_limit: usize,
}

fn default_sample_header_size() -> usize {
    pcm::SAMPLE_HEADER_SIZE
}

fn default_name_row_size() -> usize {
    pcm::NAME_ROW_SIZE
}

fn default_sample_rate() -> u32 {
    pcm::DEFAULT_SAMPLE_RATE
}

fn default_program_scan_limit() -> usize {
    DEFAULT_PROGRAM_SCAN_LIMIT
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            sample_header_size: default_sample_header_size(),
            name_row_size: default_name_row_size(),
            default_sample_rate: default_sample_rate(),
            workers: num_cpus::get(),
            program_scan_limit: default_program_scan_limit(),
        }
    }
}

impl DecodeOptions {
    pub fn sample_header_size(&self) -> usize {
        self.sample_header_size
    }

    pub fn name_row_size(&self) -> usize {
        self.name_row_size
    }

    pub fn default_sample_rate(&self) -> u32 {
        self.default_sample_rate
    }

    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }

    pub fn program_scan_limit(&self) -> usize {
        self.program_scan_limit
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_sample_header_size(mut self, size: usize) -> Self {
        self.sample_header_size = size;
        self
    }

    pub fn with_name_row_size(mut self, size: usize) -> Self {
        self.name_row_size = size;
        self
    }
}

/// Metadata written into the INFO list of an exported sound bank.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct BankInfo {
    #[serde(default = "default_bank_name")]
    pub name: String,
    #[serde(default)]
    pub engineer: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub copyright: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default = "default_software")]
    pub software: String,
}

fn default_bank_name() -> String {
    "setrip export".to_string()
}

fn default_software() -> String {
    format!("setrip {}", env!("CARGO_PKG_VERSION"))
}

impl Default for BankInfo {
    fn default() -> Self {
        BankInfo {
            name: default_bank_name(),
            engineer: String::new(),
            product: String::new(),
            copyright: String::new(),
            comment: String::new(),
            creation_date: String::new(),
            software: default_software(),
        }
    }
}

impl BankInfo {
    pub fn named(name: impl Into<String>) -> BankInfo {
        BankInfo {
            name: name.into(),
            ..BankInfo::default()
        }
    }
}

/// The top level configuration file.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    decode: DecodeOptions,
    #[serde(default)]
    bank: BankInfo,
}

impl Settings {
    /// Loads settings from an optional YAML file plus `SETRIP_` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path));
        }
        Ok(builder
            .add_source(
                Environment::with_prefix("SETRIP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    pub fn decode(&self) -> &DecodeOptions {
        &self.decode
    }

    pub fn bank(&self) -> &BankInfo {
        &self.bank
    }
}
