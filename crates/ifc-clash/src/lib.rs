// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC Clash Detection
//!
//! Finds overlapping pairs of building elements, ranks them by severity and
//! explains them. Elements are reduced to axis-aligned bounding boxes; exact
//! solid intersection is out of scope.
//!
//! ## Overview
//!
//! - **Element store**: registered elements in registration order ([`ElementStore`])
//! - **Broad phase**: uniform spatial hash over bbox centres ([`SpatialHash`])
//! - **Narrow phase**: AABB intersection, volume and severity ([`NarrowPhase`])
//! - **Orchestration**: filtered, de-duplicated, severity-sorted scans
//!   with progress and cancellation ([`ClashScene`], [`ClashEngine`])
//! - **Reporting**: CSV export and tier counts ([`report`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_clash::{Aabb, ClashConfig, ClashEngine, DetectOptions, Element, ElementType};
//!
//! let mut engine = ClashEngine::new(ClashConfig::default())?;
//! engine.register(vec![
//!     Element::new(1, ElementType::Wall, Aabb::from_coords([0.0; 3], [2.0, 0.2, 3.0])),
//!     Element::new(2, ElementType::Wall, Aabb::from_coords([1.0, 0.0, 0.0], [3.0, 0.2, 3.0])),
//! ]);
//!
//! let clashes = engine.detect(&DetectOptions::new().ignore(ElementType::Window))?;
//! println!("{}", ifc_clash::ClashSummary::from_clashes(&clashes).headline());
//! ```

pub mod config;
pub mod detector;
pub mod engine;
pub mod grid;
pub mod narrow;
pub mod report;
pub mod store;

// Re-export model types for convenience
pub use ifc_clash_model::{
    Aabb, Clash, ClashError, ClashParticipant, Element, ElementId, ElementType, GeometryIssue,
    Result, Severity,
};

// Re-export main types
pub use config::{ClashConfig, IndexMode};
pub use detector::{
    sort_by_severity, CancellationToken, ClashScene, DetectOptions, DetectionOutcome,
    DetectionStatus, ProgressCallback, DEFAULT_MIN_VOLUME,
};
pub use engine::{ClashEngine, EngineState};
pub use grid::{GridCell, SpatialHash};
pub use narrow::{classify, NarrowPhase};
pub use report::{to_csv, ClashSummary};
pub use store::{ElementStore, RegistrationReport, SkippedElement};
