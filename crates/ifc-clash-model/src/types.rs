// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for building elements
//!
//! Elements are the unit of clash detection: a stable identifier, a category
//! and an axis-aligned extent in world coordinates (metres).

use crate::Aabb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe element identifier
///
/// Wraps the raw IFC express ID (e.g., #123 becomes ElementId(123))
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ElementId {
    fn from(id: u32) -> Self {
        ElementId(id)
    }
}

impl From<ElementId> for u32 {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

/// Element category
///
/// A closed set of building element categories. Anything the clash engine
/// does not distinguish is folded into [`ElementType::Other`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Wall,
    Column,
    Beam,
    Slab,
    Window,
    Door,
    Roof,
    Other,
}

impl ElementType {
    /// All categories, in declaration order
    pub const ALL: [ElementType; 8] = [
        ElementType::Wall,
        ElementType::Column,
        ElementType::Beam,
        ElementType::Slab,
        ElementType::Window,
        ElementType::Door,
        ElementType::Roof,
        ElementType::Other,
    ];

    /// Parse a category label
    ///
    /// Accepts both plain labels (`"WALL"`) and IFC entity names
    /// (`"IFCWALL"`, `"IfcWallStandardCase"`), case-insensitively.
    /// Unrecognised labels map to [`ElementType::Other`].
    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_uppercase();
        let name = upper.strip_prefix("IFC").unwrap_or(&upper);
        match name {
            "WALL" | "WALLSTANDARDCASE" | "WALLELEMENTEDCASE" => ElementType::Wall,
            "COLUMN" | "COLUMNSTANDARDCASE" => ElementType::Column,
            "BEAM" | "BEAMSTANDARDCASE" => ElementType::Beam,
            "SLAB" | "SLABSTANDARDCASE" | "SLABELEMENTEDCASE" => ElementType::Slab,
            "WINDOW" | "WINDOWSTANDARDCASE" => ElementType::Window,
            "DOOR" | "DOORSTANDARDCASE" => ElementType::Door,
            "ROOF" => ElementType::Roof,
            _ => ElementType::Other,
        }
    }

    /// Whether the category carries load
    ///
    /// Clashes between two structural elements are escalated to critical.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ElementType::Wall | ElementType::Column | ElementType::Beam | ElementType::Slab
        )
    }

    /// Upper-case label used in descriptions and exports
    pub fn label(&self) -> &'static str {
        match self {
            ElementType::Wall => "WALL",
            ElementType::Column => "COLUMN",
            ElementType::Beam => "BEAM",
            ElementType::Slab => "SLAB",
            ElementType::Window => "WINDOW",
            ElementType::Door => "DOOR",
            ElementType::Roof => "ROOF",
            ElementType::Other => "OTHER",
        }
    }
}

impl FromStr for ElementType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A building element registered for clash analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Stable identifier
    pub id: ElementId,
    /// Element category
    pub element_type: ElementType,
    /// World-space bounding box in metres
    pub bbox: Aabb,
}

impl Element {
    /// Create a new element
    pub fn new(id: impl Into<ElementId>, element_type: ElementType, bbox: Aabb) -> Self {
        Self {
            id: id.into(),
            element_type,
            bbox,
        }
    }

    /// Centre of the element's bounding box
    pub fn center(&self) -> nalgebra::Point3<f64> {
        self.bbox.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_ifc_labels() {
        assert_eq!(ElementType::parse("WALL"), ElementType::Wall);
        assert_eq!(ElementType::parse("IFCWALL"), ElementType::Wall);
        assert_eq!(
            ElementType::parse("IfcWallStandardCase"),
            ElementType::Wall
        );
        assert_eq!(ElementType::parse("ifcbeam"), ElementType::Beam);
        assert_eq!(ElementType::parse(" door "), ElementType::Door);
        assert_eq!(ElementType::parse("IFCFURNITURE"), ElementType::Other);
        assert_eq!("SLAB".parse::<ElementType>().unwrap(), ElementType::Slab);
    }

    #[test]
    fn test_structural_set() {
        let structural: Vec<_> = ElementType::ALL
            .iter()
            .filter(|t| t.is_structural())
            .copied()
            .collect();
        assert_eq!(
            structural,
            vec![
                ElementType::Wall,
                ElementType::Column,
                ElementType::Beam,
                ElementType::Slab
            ]
        );
    }

    #[test]
    fn test_label_round_trips_through_parse() {
        for ty in ElementType::ALL {
            assert_eq!(ElementType::parse(ty.label()), ty);
        }
    }

    #[test]
    fn test_element_id_display() {
        assert_eq!(ElementId(42).to_string(), "#42");
        assert_eq!(u32::from(ElementId::from(7)), 7);
    }

    #[test]
    fn test_element_type_serde_label() {
        let json = serde_json::to_string(&ElementType::Window).unwrap();
        assert_eq!(json, "\"WINDOW\"");
    }
}
