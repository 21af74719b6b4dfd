// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration

use ifc_clash_model::{ClashError, Result};
use serde::{Deserialize, Serialize};

/// Default grid cell edge length in metres
pub const DEFAULT_GRID_SIZE: f64 = 1.0;

/// Most elements processed between two progress reports
pub const MAX_PROGRESS_STRIDE: usize = 10;

/// Default number of elements processed between cancellation checks
pub const DEFAULT_PROGRESS_INTERVAL: usize = MAX_PROGRESS_STRIDE;

/// Near-miss margin used by [`ClashConfig::strict`] (1 cm)
pub const CLASH_TOLERANCE: f64 = 0.01;

/// How elements are placed into grid cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// One cell per element, chosen by the bbox centre.
    ///
    /// Elements much larger than a cell are only visible to queries from
    /// cells adjacent to their centre, so long slabs or walls can miss
    /// overlaps near their far ends.
    #[default]
    Center,
    /// Every cell the bbox overlaps. Exact for AABB overlaps, at the cost
    /// of more buckets and candidate de-duplication.
    ///
    /// Elements covering more than [`MAX_COVERED_CELLS`](crate::grid::MAX_COVERED_CELLS)
    /// cells are not bucketed; they are appended to every query instead and
    /// query every element themselves.
    Covering,
}

/// Clash engine configuration
///
/// Fixed for the lifetime of one index build.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClashConfig {
    /// Grid cell edge length in metres
    pub grid_size: f64,
    /// Cell assignment strategy
    pub index_mode: IndexMode,
    /// Grow both boxes by this margin before testing, to report near misses
    pub near_miss_margin: Option<f64>,
    /// Elements processed between cancellation checks and async yields
    ///
    /// Progress is still reported at least every [`MAX_PROGRESS_STRIDE`]
    /// elements.
    pub progress_interval: usize,
}

impl Default for ClashConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            index_mode: IndexMode::Center,
            near_miss_margin: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ClashConfig {
    /// Coordination-review preset: centre indexing, no margin
    pub fn coordination() -> Self {
        Self::default()
    }

    /// Strict preset: covering indexing and a 1 cm near-miss margin
    pub fn strict() -> Self {
        Self {
            index_mode: IndexMode::Covering,
            near_miss_margin: Some(CLASH_TOLERANCE),
            ..Self::default()
        }
    }

    /// Decode a configuration from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ClashError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is in range
    pub fn validate(&self) -> Result<()> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ClashError::invalid_option(
                "grid_size",
                format!("must be a positive finite length, got {}", self.grid_size),
            ));
        }
        if let Some(margin) = self.near_miss_margin {
            if !(margin.is_finite() && margin >= 0.0) {
                return Err(ClashError::invalid_option(
                    "near_miss_margin",
                    format!("must be a non-negative finite length, got {}", margin),
                ));
            }
        }
        if self.progress_interval == 0 {
            return Err(ClashError::invalid_option(
                "progress_interval",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Elements processed between progress reports
    pub(crate) fn progress_stride(&self) -> usize {
        self.progress_interval.min(MAX_PROGRESS_STRIDE)
    }

    /// Margin actually applied to boxes, zero when disabled
    pub(crate) fn margin(&self) -> f64 {
        self.near_miss_margin.unwrap_or(0.0)
    }
}
