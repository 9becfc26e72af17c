//! Error types for graphex-ir
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

/// Main error type for graphex-ir operations
#[derive(Debug, Error)]
pub enum GraphexError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (fatal for the offending file only)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GraphexError {
    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        GraphexError::Parse(msg.into())
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        GraphexError::Analysis(msg.into())
    }
}

/// Result type alias for graphex operations
pub type Result<T> = std::result::Result<T, GraphexError>;
