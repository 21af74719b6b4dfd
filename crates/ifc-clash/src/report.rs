// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clash reporting: CSV export and per-tier summaries

use ifc_clash_model::{Clash, Severity};
use serde::Serialize;

/// Column headers of the CSV export
pub const CSV_HEADERS: [&str; 7] = [
    "#",
    "severity",
    "elementA id",
    "elementB id",
    "volume_liters",
    "description",
    "suggestedFix",
];

/// Clashes found above which a model needs a coordination review
pub const REVIEW_THRESHOLD: usize = 10;

fn push_row<I, S>(out: &mut String, cells: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        out.push('"');
        out.push_str(&cell.as_ref().replace('"', "\"\""));
        out.push('"');
    }
}

/// Export clashes as CSV
///
/// Every cell is quoted; rows are numbered from 1 in list order and volumes
/// are given in litres with two decimals.
pub fn to_csv(clashes: &[Clash]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADERS);
    for (i, clash) in clashes.iter().enumerate() {
        out.push('\n');
        push_row(
            &mut out,
            [
                (i + 1).to_string(),
                clash.severity.label().to_string(),
                clash.element_a.id.0.to_string(),
                clash.element_b.id.0.to_string(),
                format!("{:.2}", clash.volume_liters()),
                clash.description.clone(),
                clash.suggested_fix.clone(),
            ],
        );
    }
    out
}

/// Clash counts per severity tier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClashSummary {
    pub total: usize,
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
}

impl ClashSummary {
    pub fn from_clashes(clashes: &[Clash]) -> Self {
        let mut summary = Self::default();
        for clash in clashes {
            summary.total += 1;
            match clash.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Major => summary.major += 1,
                Severity::Minor => summary.minor += 1,
            }
        }
        summary
    }

    /// More clashes than a quick fix-up can handle
    pub fn needs_review(&self) -> bool {
        self.total > REVIEW_THRESHOLD
    }

    /// One-line status text
    pub fn headline(&self) -> String {
        format!(
            "{} clashes ({} critical, {} major, {} minor)",
            self.total, self.critical, self.major, self.minor
        )
    }
}
