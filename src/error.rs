//! Error types for grammar configuration.
//!
//! Parsing model output never fails; only loading an integrator-supplied
//! grammar descriptor can.

use thiserror::Error;

/// Errors raised while building a [`ParseGrammar`](crate::ParseGrammar).
#[derive(Debug, Error)]
pub enum ReportError {
    /// Descriptor parsed but violates a grammar rule.
    #[error("invalid grammar: {0}")]
    InvalidGrammar(String),

    /// Descriptor is not valid JSON for the grammar schema.
    #[error("grammar json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for grammar operations.
pub type ReportResult<T> = Result<T, ReportError>;
