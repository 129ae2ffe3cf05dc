//! Errors for invalid analysis calls

use thiserror::Error;

/// Caller contract violations. Data problems (bad cells, missing columns,
/// degenerate statistics) never surface here; they are handled in place.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid threshold {0}: must be a finite number greater than 0")]
    InvalidThreshold(f64),

    #[error("unknown analysis mode '{0}' (expected 'component' or 'summary')")]
    UnknownMode(String),
}
