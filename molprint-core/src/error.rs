//! Structured error types for molprint.

use thiserror::Error;

/// Unified error type for all molprint operations.
#[derive(Debug, Error)]
pub enum MolprintError {
    /// I/O error (file not found, broken pipe, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed SMILES, SMARTS or fingerprint text)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, out-of-range parameters)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A fingerprint could not be produced with the requested shape
    #[error("fingerprint error: {0}")]
    Fingerprint(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout molprint.
pub type Result<T> = std::result::Result<T, MolprintError>;
