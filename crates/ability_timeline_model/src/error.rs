// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model errors.

use crate::clip::ClipType;
use crate::hash::AbilityId;
use crate::key::KeyType;
use crate::track::TrackType;

/// Errors raised while editing, loading or resolving ability definitions
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No ability with this id in the table
    #[error("Unknown ability: {0}")]
    UnknownAbility(AbilityId),
    /// Key type not accepted by the track type
    #[error("{track_type:?} track does not accept {key_type:?} keys")]
    IncompatibleKey {
        /// Track type
        track_type: TrackType,
        /// Rejected key type
        key_type: KeyType,
    },
    /// Clip type not accepted by the track type
    #[error("{track_type:?} track does not accept {clip_type:?} clips")]
    IncompatibleClip {
        /// Track type
        track_type: TrackType,
        /// Rejected clip type
        clip_type: ClipType,
    },
    /// Track is locked against edits
    #[error("Track is locked: {0}")]
    TrackLocked(String),
    /// Phase index out of range
    #[error("Phase index out of range: {0}")]
    PhaseOutOfRange(usize),
    /// Track index out of range
    #[error("Track index out of range: {0}")]
    TrackOutOfRange(usize),
    /// Address does not resolve to a key or clip
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// Baked table written by another format version
    #[error("Unsupported format version {found} (expected {expected})")]
    VersionMismatch {
        /// Version found in the data
        found: u32,
        /// Version this build reads
        expected: u32,
    },
    /// File extension is not a known document format
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// RON parse error
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// RON serialization error
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Binary (de)serialization error
    #[error("Binary format error: {0}")]
    Binary(#[from] bincode::Error),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
