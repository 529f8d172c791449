//! Error taxonomy for rollup computation
//!
//! All failures are local and synchronous. A failed rollup aborts the whole
//! request; partial results are never returned.

use thiserror::Error;

/// Result alias for rollup operations
pub type Result<T> = std::result::Result<T, RollupError>;

/// Errors surfaced by the rollup engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollupError {
    /// A scope id (line/machine/task) does not resolve to an existing entity
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A malformed filter or patch value (e.g. an unrecognized dot color)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A (severity, probability) pair with no cell in the active matrix.
    /// Surfaced only when (re)scoring an assessment, never when reading rollups.
    #[error("no matrix cell for severity {severity}, probability {probability}")]
    InvalidMatrixCell { severity: u8, probability: u8 },
}

impl RollupError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RollupError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        RollupError::InvalidInput(message.into())
    }
}
