// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Narrow phase - exact AABB test and clash classification

use ifc_clash_model::{Clash, ClashParticipant, Element, ElementType, Severity};

/// Volume above which a structural/structural clash is critical (50 L)
pub const CRITICAL_VOLUME: f64 = 0.05;

/// Volume above which any clash is major (100 L)
pub const MAJOR_VOLUME: f64 = 0.1;

/// Classify a clash
///
/// The critical rule is checked first, so a structural pair is critical
/// from 50 L even though the major threshold is 100 L.
pub fn classify(a: ElementType, b: ElementType, volume: f64) -> Severity {
    if a.is_structural() && b.is_structural() && volume > CRITICAL_VOLUME {
        Severity::Critical
    } else if volume > MAJOR_VOLUME {
        Severity::Major
    } else {
        Severity::Minor
    }
}

/// Human-readable clash description with the volume in litres
pub fn describe(a: &Element, b: &Element, volume: f64) -> String {
    format!(
        "Clash between {} (ID: {}) and {} (ID: {}). Volume: {:.2}L",
        a.element_type,
        a.id.0,
        b.element_type,
        b.id.0,
        volume * 1000.0
    )
}

/// Remediation text for a severity tier
pub fn suggest_fix(a: &Element, b: &Element, severity: Severity) -> String {
    match severity {
        Severity::Critical => format!(
            "Reposition {} or adjust {}. Review the structural design.",
            b.element_type, a.element_type
        ),
        Severity::Major => {
            "Check compatibility. Consider adjusting height or position.".to_string()
        }
        Severity::Minor => {
            "Review detailing. Minor clash can be resolved in the field.".to_string()
        }
    }
}

/// Bounding-box narrow phase
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NarrowPhase {
    margin: f64,
}

impl NarrowPhase {
    /// Narrow phase growing both boxes by `margin` before testing
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Test a candidate pair
    ///
    /// Returns `None` when the boxes do not overlap with positive volume.
    /// The minimum-volume cut-off is applied by the caller.
    pub fn analyze(&self, a: &Element, b: &Element) -> Option<Clash> {
        let intersection = if self.margin > 0.0 {
            a.bbox
                .expanded(self.margin)
                .intersection(&b.bbox.expanded(self.margin))?
        } else {
            a.bbox.intersection(&b.bbox)?
        };

        let volume = intersection.volume();
        let severity = classify(a.element_type, b.element_type, volume);

        Some(Clash {
            element_a: ClashParticipant {
                id: a.id,
                element_type: a.element_type,
            },
            element_b: ClashParticipant {
                id: b.id,
                element_type: b.element_type,
            },
            severity,
            intersection_volume: volume,
            location: intersection.center(),
            description: describe(a, b, volume),
            suggested_fix: suggest_fix(a, b, severity),
        })
    }
}
