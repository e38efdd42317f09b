//! Error types for ccviz
//!
//! All errors derive from `thiserror` for convenient error handling and
//! automatic `From` implementations. The three failure classes of the
//! normalization pipeline map onto dedicated variants:
//!
//! - malformed JSON text surfaces as [`CcvizError::Json`], carrying the
//!   underlying parser message verbatim
//! - an object that is not one of the five recognized report shapes, or a
//!   recognized shape whose records are not objects, surfaces as
//!   [`CcvizError::Format`]
//! - sources detected as different report kinds surface as
//!   [`CcvizError::MergeMismatch`], naming every distinct kind found
//!
//! All three are terminal for the operation that raised them; the caller
//! receives either a fully normalized result or exactly one error.

use thiserror::Error;

/// Main error type for ccviz operations
#[derive(Error, Debug)]
pub enum CcvizError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input shape is not one of the recognized report kinds
    #[error("Format error: {0}")]
    Format(String),

    /// Sources of different report kinds cannot be combined
    #[error("Cannot merge different report types: {0}")]
    MergeMismatch(String),
}

/// Convenience type alias for Results in ccviz
pub type Result<T> = std::result::Result<T, CcvizError>;
