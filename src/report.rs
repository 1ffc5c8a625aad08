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

use std::collections::BTreeMap;

use crate::decode::pcm;
use crate::model::{Package, SampleAsset};

/// Severity level for a decode issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single issue found while checking a decoded package.
#[derive(Debug, Clone)]
pub struct Issue {
    pub severity: Severity,
    pub category: &'static str,
    pub container: String,
    pub message: String,
}

/// Result of checking a decoded package.
#[derive(Debug, Clone, Default)]
pub struct DecodeReport {
    pub issues: Vec<Issue>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: DecodeReport) {
        self.issues.extend(other.issues);
    }

    /// Issues grouped by the container they were found in.
    pub fn by_container(&self) -> BTreeMap<&str, Vec<&Issue>> {
        let mut grouped: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
        for issue in &self.issues {
            grouped.entry(&issue.container).or_default().push(issue);
        }
        grouped
    }
}

/// Checks a sample's fields against each other. Returns one issue per broken rule.
pub fn check_sample(sample: &SampleAsset) -> Vec<Issue> {
    let mut problems = Vec::new();
    if sample.name().is_empty() {
        problems.push(format!("sample {} has no name", sample.index()));
    }
    if sample.sample_rate() == 0 {
        problems.push(format!("\"{}\" has a zero sample rate", sample.name()));
    }
    if sample.loop_start() > sample.loop_end() || sample.loop_end() > sample.frame_count() {
        problems.push(format!(
            "\"{}\" loops {}..{} outside {} frames",
            sample.name(),
            sample.loop_start(),
            sample.loop_end(),
            sample.frame_count()
        ));
    }
    let needed = sample.frame_count() as usize * sample.format().bytes_per_frame();
    if needed > sample.pcm().len() {
        problems.push(format!(
            "\"{}\" declares {} frames but holds {} bytes",
            sample.name(),
            sample.frame_count(),
            sample.pcm().len()
        ));
    }

    problems
        .into_iter()
        .map(|message| Issue {
            severity: Severity::Error,
            category: "sample",
            container: sample.container().to_string(),
            message,
        })
        .collect()
}

/// Checks a decoded package for the ways a heuristic decode can come up short.
pub fn check_package(package: &Package) -> DecodeReport {
    let mut report = DecodeReport::default();

    for file in package.embedded_files() {
        if file.kind.is_decodable() && file.yielded == 0 {
            report.issues.push(Issue {
                severity: Severity::Warning,
                category: "empty-container",
                container: file.name.clone(),
                message: format!("{} ({} bytes) decoded to nothing", file.kind, file.size),
            });
        }
    }

    let mut synthesized: BTreeMap<&str, usize> = BTreeMap::new();
    for sample in package.samples() {
        report.issues.extend(check_sample(sample));
        if sample.name() == pcm::synthesized_name(sample.container(), sample.index()) {
            *synthesized.entry(sample.container()).or_default() += 1;
        }
    }
    for (container, count) in synthesized {
        report.issues.push(Issue {
            severity: Severity::Warning,
            category: "synthesized-name",
            container: container.to_string(),
            message: format!("{} sample(s) have no stored name", count),
        });
    }

    for multisample in package.multisamples() {
        let unresolved = multisample.unresolved_count();
        if unresolved > 0 {
            report.issues.push(Issue {
                severity: Severity::Warning,
                category: "unresolved-zone",
                container: multisample.name().to_string(),
                message: format!(
                    "{} of {} zone(s) reference samples that aren't in the package",
                    unresolved,
                    multisample.zones().len()
                ),
            });
        }
    }

    report
}

/// Prints a decode report grouped by container.
pub fn print_report(report: &DecodeReport, package: &Package) {
    if report.is_clean() {
        println!(
            "\u{2705} {}: {} sample(s), {} program(s), no issues.",
            package.name(),
            package.samples().len(),
            package.programs().len()
        );
        return;
    }

    let grouped = report.by_container();
    for (container, issues) in &grouped {
        let has_errors = issues.iter().any(|i| i.severity == Severity::Error);
        let icon = if has_errors {
            "\u{274c}"
        } else {
            "\u{26a0}\u{fe0f} "
        };
        println!("{} {}", icon, container);
        for issue in issues {
            let severity_icon = match issue.severity {
                Severity::Warning => "\u{26a0}\u{fe0f} ",
                Severity::Error => "\u{274c}",
            };
            println!("   {} [{}] {}", severity_icon, issue.category, issue.message);
        }
    }

    println!(
        "\nSummary: {} issue(s) found across {} container(s).",
        report.issues.len(),
        grouped.len()
    );
}
