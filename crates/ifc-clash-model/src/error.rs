// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for clash detection

use crate::{ElementId, GeometryIssue};
use thiserror::Error;

/// Result type alias for clash operations
pub type Result<T> = std::result::Result<T, ClashError>;

/// Errors surfaced to callers
///
/// Malformed element geometry is normally skipped with a warning during
/// registration; these variants are reserved for configuration mistakes and
/// explicit validation requests.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClashError {
    /// Option value outside its valid range
    #[error("Invalid option {name}: {message}")]
    InvalidOption { name: &'static str, message: String },

    /// Element geometry cannot be indexed
    #[error("Invalid geometry for element {id}: {issue}")]
    InvalidGeometry { id: ElementId, issue: GeometryIssue },

    /// Configuration could not be decoded
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClashError {
    /// Create an invalid option error
    pub fn invalid_option(name: &'static str, msg: impl Into<String>) -> Self {
        ClashError::InvalidOption {
            name,
            message: msg.into(),
        }
    }

    /// Create an invalid geometry error
    pub fn invalid_geometry(id: ElementId, issue: GeometryIssue) -> Self {
        ClashError::InvalidGeometry { id, issue }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ClashError::Config(msg.into())
    }
}
