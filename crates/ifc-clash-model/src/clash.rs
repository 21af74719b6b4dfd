// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clash results

use crate::{ElementId, ElementType};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clash severity tier
///
/// Variants are declared from most to least severe, so the derived ordering
/// sorts critical clashes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Two structural elements overlapping by more than 50 litres
    Critical,
    /// Any overlap larger than 100 litres
    Major,
    /// Everything else
    Minor,
}

impl Severity {
    /// Lower-case label used in exports
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One side of a clash
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClashParticipant {
    pub id: ElementId,
    pub element_type: ElementType,
}

/// A detected overlap between two elements
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clash {
    /// Element registered first of the two
    pub element_a: ClashParticipant,
    /// Element registered later
    pub element_b: ClashParticipant,
    pub severity: Severity,
    /// Volume of the bounding-box intersection in cubic metres
    pub intersection_volume: f64,
    /// Centre of the intersection box
    pub location: Point3<f64>,
    pub description: String,
    pub suggested_fix: String,
}

impl Clash {
    /// Intersection volume in litres
    pub fn volume_liters(&self) -> f64 {
        self.intersection_volume * 1000.0
    }

    /// Whether the clash involves the given element
    pub fn involves(&self, id: ElementId) -> bool {
        self.element_a.id == id || self.element_b.id == id
    }

    /// Pair identity independent of scan direction
    pub fn pair_key(&self) -> (ElementId, ElementId) {
        let (a, b) = (self.element_a.id, self.element_b.id);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}
