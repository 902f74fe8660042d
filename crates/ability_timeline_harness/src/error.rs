// SPDX-License-Identifier: MIT OR Apache-2.0
//! Harness errors.

use ability_timeline_model::ModelError;
use ability_timeline_preview::PreviewError;
use ability_timeline_runtime::RuntimeError;

/// Errors that abort a harness command
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Loading or baking abilities failed
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Engine setup failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// Preview setup failed
    #[error(transparent)]
    Preview(#[from] PreviewError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Scenario file could not be parsed
    #[error("Scenario parse error: {0}")]
    Scenario(#[from] ron::error::SpannedError),
    /// Ability named on the command line or in a scenario is not in the table
    #[error("Unknown ability: {0}")]
    UnknownAbility(String),
    /// Validation found errors
    #[error("{0} validation error(s)")]
    Invalid(usize),
}

/// Result type for harness commands
pub type Result<T> = std::result::Result<T, HarnessError>;
