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
//! Recovers samples, keymaps and programs from workstation SET packages.
//!
//! [`package::PackageDecoder`] turns a package (a directory tree, a ZIP archive,
//! or one of the tagged binary containers) into a [`model::Package`]. The
//! classifier and linker annotate a decoded package, and [`soundbank`] writes
//! its samples out as a SoundFont bank.

pub mod classify;
pub mod config;
pub mod decode;
pub mod export;
pub mod link;
pub mod model;
pub mod names;
pub mod package;
pub mod report;
pub mod scan;
pub mod soundbank;
pub mod util;

#[cfg(test)]
mod testutil;
