// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned bounding box in world coordinates (metres)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f64>,
    /// Maximum corner
    pub max: Point3<f64>,
}

/// Reason a bounding box cannot be indexed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryIssue {
    /// A corner coordinate is NaN or infinite
    NonFinite,
    /// `min > max` on the given axis (0 = x, 1 = y, 2 = z)
    Inverted { axis: usize },
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryIssue::NonFinite => f.write_str("non-finite bounding box coordinate"),
            GeometryIssue::Inverted { axis } => {
                let name = ["x", "y", "z"].get(*axis).copied().unwrap_or("?");
                write!(f, "bounding box min exceeds max on {} axis", name)
            }
        }
    }
}

impl Aabb {
    /// Create a box from its corners
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Create a box from raw corner coordinates
    pub fn from_coords(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min: Point3::new(min[0], min[1], min[2]),
            max: Point3::new(max[0], max[1], max[2]),
        }
    }

    /// Check the box can be indexed
    ///
    /// Flat boxes (`min == max` on an axis) are accepted; they simply never
    /// produce a positive intersection volume.
    pub fn validate(&self) -> Result<(), GeometryIssue> {
        let finite = self
            .min
            .iter()
            .chain(self.max.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(GeometryIssue::NonFinite);
        }
        for axis in 0..3 {
            if self.min[axis] > self.max[axis] {
                return Err(GeometryIssue::Inverted { axis });
            }
        }
        Ok(())
    }

    /// Whether the box can be indexed
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Centre point
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent along each axis
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Enclosed volume in cubic metres
    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Box grown by `margin` on every side
    pub fn expanded(&self, margin: f64) -> Self {
        let grow = Vector3::repeat(margin);
        Self {
            min: self.min - grow,
            max: self.max + grow,
        }
    }

    /// Overlapping region of two boxes
    ///
    /// Returns `None` unless the overlap has positive extent on all three
    /// axes, so boxes that merely share a face, edge or corner do not
    /// intersect.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let min = self.min.sup(&other.min);
        let max = self.max.inf(&other.max);
        if (0..3).all(|axis| max[axis] > min[axis]) {
            Some(Aabb { min, max })
        } else {
            None
        }
    }

    /// Whether the boxes overlap with positive volume
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.intersection(other).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intersection_of_overlapping_walls() {
        let a = Aabb::from_coords([0.0, 0.0, 0.0], [2.0, 0.2, 3.0]);
        let b = Aabb::from_coords([1.0, 0.0, 0.0], [3.0, 0.2, 3.0]);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.min, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(i.max, Point3::new(2.0, 0.2, 3.0));
        assert_relative_eq!(i.volume(), 0.6, epsilon = 1e-12);
        assert_relative_eq!(i.center().x, 1.5);
    }

    #[test]
    fn test_touching_faces_do_not_intersect() {
        let a = Aabb::from_coords([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Aabb::from_coords([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert!(a.intersection(&b).is_none());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_disjoint_boxes() {
        let a = Aabb::from_coords([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Aabb::from_coords([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_validate() {
        assert!(Aabb::from_coords([0.0; 3], [1.0; 3]).is_valid());
        // Flat boxes are allowed
        assert!(Aabb::from_coords([0.0; 3], [1.0, 0.0, 1.0]).is_valid());

        let nan = Aabb::from_coords([f64::NAN, 0.0, 0.0], [1.0; 3]);
        assert_eq!(nan.validate(), Err(GeometryIssue::NonFinite));

        let inf = Aabb::from_coords([0.0; 3], [1.0, f64::INFINITY, 1.0]);
        assert_eq!(inf.validate(), Err(GeometryIssue::NonFinite));

        let inverted = Aabb::from_coords([0.0, 2.0, 0.0], [1.0, 1.0, 1.0]);
        assert_eq!(
            inverted.validate(),
            Err(GeometryIssue::Inverted { axis: 1 })
        );
    }

    #[test]
    fn test_expanded_catches_near_miss() {
        let a = Aabb::from_coords([0.0; 3], [1.0; 3]);
        let b = Aabb::from_coords([1.005, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert!(!a.intersects(&b));
        assert!(a.expanded(0.01).intersects(&b.expanded(0.01)));
    }
}
