//! Core error types

use thiserror::Error;

/// Errors raised while building observer configurations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnveilError {
    /// Threshold outside of `[0, 1]`
    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// Root margin shorthand could not be parsed
    #[error("invalid root margin {input:?}: {reason}")]
    InvalidRootMargin { input: String, reason: String },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, UnveilError>;
