// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime errors.

use crate::entity::EntityId;

/// Errors returned by the runtime's caller-facing API.
///
/// Problems found while ticking are logged and skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Entity not found
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),
    /// Entity already exists
    #[error("Entity already exists: {0}")]
    EntityExists(EntityId),
    /// Config written by another version
    #[error("Unsupported config version {found} (expected {expected})")]
    ConfigVersion {
        /// Version found in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// RON parse error
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// RON serialization error
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
