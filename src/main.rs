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
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use setrip::classify::{classify_package, midi_to_note};
use setrip::config::Settings;
use setrip::decode::pcm;
use setrip::export::export_samples;
use setrip::link::link_package;
use setrip::model::Package;
use setrip::package::PackageDecoder;
use setrip::report::{check_package, print_report};
use setrip::soundbank::SoundBank;
use setrip::util::{filename_display, hex_dump};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Recovers samples and programs from workstation SET packages."
)]
struct Cli {
    /// The path to a YAML config file with decoder and bank settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints a summary of a package.
    Info {
        /// The package file or directory.
        path: PathBuf,
        /// The output format.
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Lists the samples of a package, with their detected roles.
    List {
        /// The package file or directory.
        path: PathBuf,
        /// Lists programs too.
        #[arg(short, long)]
        programs: bool,
    },
    /// Dumps the footer table and leading bytes of a sample container.
    Analyze {
        /// The sample container file.
        path: PathBuf,
        /// How many leading bytes to dump.
        #[arg(short, long, default_value_t = 256)]
        bytes: usize,
    },
    /// Checks a decoded package for unresolved references and unnamed samples.
    Verify {
        /// The package file or directory.
        path: PathBuf,
    },
    /// Links programs to the samples they most likely use.
    Link {
        /// The package file or directory.
        path: PathBuf,
    },
    /// Writes every sample of a package as a WAV file.
    ExportWav {
        /// The package file or directory.
        path: PathBuf,
        /// The output directory.
        output: PathBuf,
    },
    /// Writes every sample of a package into a SoundFont bank.
    ExportSf2 {
        /// The package file or directory.
        path: PathBuf,
        /// The output .sf2 file.
        output: PathBuf,
        /// The bank name. Defaults to the configured name.
        #[arg(short, long)]
        name: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let decoder = PackageDecoder::new(settings.decode().clone());

    match cli.command {
        Commands::Info { path, format } => {
            let package = load(&decoder, &path)?;
            let summary = package.summary();
            match format {
                Format::Yaml => print!("{}", serde_yml::to_string(&summary)?),
                Format::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                Format::Text => {
                    println!("{}", package);
                    if !summary.model.is_empty() {
                        println!("Model: {}", summary.model);
                    }
                    if !summary.version.is_empty() {
                        println!("Version: {}", summary.version);
                    }
                    println!("Files: {}", summary.embedded_files);
                    for kind in &summary.file_kinds {
                        println!("- {}", kind);
                    }
                    let roles = classify_package(&package).summary();
                    println!(
                        "Roles: {} percussion, {} pitched, {} unknown",
                        roles.percussion, roles.pitched, roles.unknown
                    );
                    println!("Styles: {}", summary.styles);
                }
            }
        }
        Commands::List { path, programs } => {
            let package = load(&decoder, &path)?;
            if package.samples().is_empty() {
                println!("No samples found in {}.", filename_display(&path));
            } else {
                let classes = classify_package(&package);
                println!("Samples (count: {}):", package.samples().len());
                for (id, sample) in package.sample_ids() {
                    let pitch = classes
                        .get(id)
                        .and_then(|c| c.midi_note())
                        .map(|note| {
                            let (name, octave) = midi_to_note(note);
                            format!(" {}{}", name, octave)
                        })
                        .unwrap_or_default();
                    println!("- {} {} [{}{}]", id, sample, classes.role_of(id), pitch);
                }
            }

            if programs {
                println!("\nPrograms (count: {}):", package.programs().len());
                for program in package.programs() {
                    println!("- {}", program);
                }
            }
        }
        Commands::Analyze { path, bytes } => {
            let data = fs::read(&path)?;
            println!("{} ({} bytes)", filename_display(&path), data.len());
            for (key, value) in pcm::describe(&data) {
                println!("{}: {}", key, value);
            }
            let samples = pcm::decode(&data, filename_display(&path), settings.decode());
            println!("Samples: {}", samples.len());
            for sample in &samples {
                println!("- 0x{:X} {}", sample.data_offset(), sample);
            }
            println!();
            print!("{}", hex_dump(&data[..bytes.min(data.len())], 0));
        }
        Commands::Verify { path } => {
            let package = load(&decoder, &path)?;
            let report = check_package(&package);
            print_report(&report, &package);
            if report.has_errors() {
                return Err("package has decode errors".into());
            }
        }
        Commands::Link { path } => {
            let package = load(&decoder, &path)?;
            let links = link_package(&package);
            for link in links.iter() {
                let names: Vec<&str> = link
                    .samples
                    .iter()
                    .filter_map(|&id| package.sample(id))
                    .map(|s| s.name())
                    .collect();
                println!(
                    "- {} ({}, {:.1}): {}",
                    link.program,
                    link.method,
                    link.confidence,
                    names.join(", ")
                );
            }
            let summary = links.summary();
            println!(
                "\nLinked {} of {} program(s); {} sample(s) unlinked.",
                summary.linked_programs, summary.total_programs, summary.unlinked_samples
            );
        }
        Commands::ExportWav { path, output } => {
            let package = load(&decoder, &path)?;
            let written = export_samples(package.samples(), &output)?;
            println!("Wrote {} file(s) to {}.", written.len(), output.display());
        }
        Commands::ExportSf2 { path, output, name } => {
            let package = load(&decoder, &path)?;
            let mut bank_info = settings.bank().clone();
            if let Some(name) = name {
                bank_info.name = name;
            }
            let classes = classify_package(&package);
            let bank = SoundBank::from_assets(package.samples(), Some(&classes), &bank_info)?;
            bank.write(&output)?;
            println!(
                "Wrote {} sample(s) as {} preset(s) to {}.",
                bank.samples().len(),
                bank.presets().len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn load(decoder: &PackageDecoder, path: &Path) -> Result<Package, Box<dyn Error>> {
    let package = decoder.decode_path(path)?;
    info!(
        package = package.name(),
        samples = package.samples().len(),
        container = %package.kind(),
        "Loaded package"
    );
    Ok(package)
}
