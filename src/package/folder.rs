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
//! Directory-tree packages (`NAME.SET/`), one subfolder per content type:
//!
//! ```text
//! GLOBAL/  MULTISMP/*.KMP  PAD/  PCM/*.PCM  PERFORM/  SONGBOOK/  SOUND/*.PCG  STYLE/*.STY
//! ```
//!
//! Files in the decoded folders are read and decoded on a worker pool; results
//! are merged in folder order and then file-name order so sample indices are the
//! same on every run. Everything else is cataloged by name and size only.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use super::{absorb, decode_entry, Decoded, PackageDecoder, PackageError};
use crate::config::DecodeOptions;
use crate::model::{ContainerKind, EmbeddedFile, FileKind, Package};

/// Known subfolders, in the order they're processed.
const FOLDERS: [&str; 8] = [
    "GLOBAL", "MULTISMP", "PAD", "PCM", "PERFORM", "SONGBOOK", "SOUND", "STYLE",
];

const MODEL: &str = "Pa-series";

/// The extension and kind of the files a folder holds, for decoded folders.
fn decoded_kind(folder: &str) -> Option<(&'static str, FileKind)> {
    match folder {
        "MULTISMP" => Some(("kmp", FileKind::Keymap)),
        "PCM" => Some(("pcm", FileKind::SampleContainer)),
        "SOUND" => Some(("pcg", FileKind::ProgramBank)),
        "STYLE" => Some(("sty", FileKind::Style)),
        _ => None,
    }
}

/// One file to look at.
struct Work {
    name: String,
    path: PathBuf,
    kind: FileKind,
    decode: bool,
}

pub(super) fn decode(decoder: &PackageDecoder, root: &Path) -> Result<Package, PackageError> {
    let dir_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = dir_name
        .strip_suffix(".SET")
        .or_else(|| dir_name.strip_suffix(".set"))
        .unwrap_or(&dir_name);
    let mut package = Package::new(name, ContainerKind::Directory);
    package.set_model(MODEL);

    let mut subfolders = list(root)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect::<Vec<PathBuf>>();
    subfolders.sort();

    let mut work = Vec::new();
    for folder in FOLDERS {
        let found = subfolders
            .iter()
            .find(|path| file_name(path).eq_ignore_ascii_case(folder));
        if let Some(path) = found {
            collect_work(path, &file_name(path), decoded_kind(folder), &mut work);
        }
    }
    for path in &subfolders {
        let folder = file_name(path);
        if !FOLDERS.iter().any(|known| known.eq_ignore_ascii_case(&folder)) {
            debug!(package = name, folder = folder.as_str(), "Cataloging unrecognized folder");
            collect_work(path, &folder, None, &mut work);
        }
    }

    let workers = decoder.options().workers();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("setrip-decode-{i}"))
        .build()?;
    let options = decoder.options();
    let results: Vec<(EmbeddedFile, Decoded)> =
        pool.install(|| work.into_par_iter().map(|w| run(w, options)).collect());

    for (file, decoded) in results {
        absorb(&mut package, file, decoded);
    }
    Ok(package)
}

fn list(dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
    let entries = fs::read_dir(dir).map_err(|source| PackageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn collect_work(
    folder_path: &Path,
    folder: &str,
    decoded: Option<(&'static str, FileKind)>,
    work: &mut Vec<Work>,
) {
    let mut files = match list(folder_path) {
        Ok(paths) => paths.into_iter().filter(|p| p.is_file()).collect::<Vec<_>>(),
        Err(e) => {
            warn!(folder = folder, err = %e, "Unreadable package folder");
            return;
        }
    };
    files.sort();

    for path in files {
        let base = file_name(&path);
        let matching = decoded.filter(|(ext, _)| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        });
        let (kind, decode) = match matching {
            Some((_, kind)) => (kind, true),
            None => (FileKind::from_extension(&base), false),
        };
        work.push(Work {
            name: format!("{folder}/{base}"),
            path,
            kind,
            decode,
        });
    }
}

fn run(work: Work, options: &DecodeOptions) -> (EmbeddedFile, Decoded) {
    if !work.decode {
        let size = fs::metadata(&work.path).map(|m| m.len() as usize).unwrap_or(0);
        return (EmbeddedFile::new(work.name, work.kind, 0, size), Decoded::default());
    }

    match fs::read(&work.path) {
        Ok(data) => {
            let decoded = decode_entry(&work.name, work.kind, &data, options);
            (EmbeddedFile::new(work.name, work.kind, 0, data.len()), decoded)
        }
        Err(e) => {
            warn!(file = work.name.as_str(), err = %e, "Failed to read package file");
            (EmbeddedFile::new(work.name, work.kind, 0, 0), Decoded::default())
        }
    }
}
