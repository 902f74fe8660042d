// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview errors.

use crate::selection::KeyRef;
use ability_timeline_model::{ClipId, ModelError};

/// Errors returned by timeline state operations
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// No ability is loaded
    #[error("No ability loaded")]
    NoAbility,
    /// Key reference does not resolve
    #[error("Key not found: {0:?}")]
    KeyNotFound(KeyRef),
    /// Clip does not exist on the track
    #[error("Clip not found: {0:?}")]
    ClipNotFound(ClipId),
    /// Track is locked against edits
    #[error("Track is locked: {0}")]
    TrackLocked(String),
    /// Operation needs a selection
    #[error("Nothing selected")]
    EmptySelection,
    /// Model edit rejected
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;
