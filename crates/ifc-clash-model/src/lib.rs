// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Clash Model - Shared types for clash detection
//!
//! This crate defines the data exchanged between the clash engine and its
//! consumers: building elements with a category and a world-space bounding
//! box, and the classified clashes found between them.
//!
//! # Types
//!
//! - [`Element`] - id, [`ElementType`] and [`Aabb`] of one building element
//! - [`Aabb`] - axis-aligned box with intersection and validation helpers
//! - [`Clash`] - an overlapping pair with [`Severity`], volume and remediation text
//! - [`ClashError`] - configuration and validation failures
//!
//! # Example
//!
//! ```ignore
//! use ifc_clash_model::{Aabb, Element, ElementType};
//!
//! let wall = Element::new(1, ElementType::Wall, Aabb::from_coords([0.0; 3], [2.0, 0.2, 3.0]));
//! assert!(wall.element_type.is_structural());
//! ```

pub mod clash;
pub mod error;
pub mod geometry;
pub mod types;

// Re-export all public types
pub use clash::*;
pub use error::*;
pub use geometry::*;
pub use types::*;
