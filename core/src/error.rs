//! Errors

use thiserror::Error;

/// Errors raised by the texture engine.
#[derive(Debug, Error)]
pub enum TexError {
    /// A named item (channel, texture, attribute) does not exist.
    #[error("\"{0}\" not found")]
    NotFound(String),

    /// An index is outside the valid range.
    #[error("index {index} out of range (length {len})")]
    Index {
        /// The offending index.
        index: usize,
        /// Number of valid entries.
        len: usize,
    },

    /// A texture file is missing, unreadable or malformed.
    #[error("invalid texture file \"{path}\": {reason}")]
    InvalidFile {
        /// Path of the file.
        path: String,
        /// Description of the problem.
        reason: String,
    },

    /// Parameters passed to an operation are inconsistent.
    #[error("bad parameters: {0}")]
    BadParams(String),

    /// An I/O error from the file system.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TexError {
    /// Returns a new `TexError::InvalidFile`.
    ///
    /// * `path`   - Path of the file.
    /// * `reason` - Description of the problem.
    pub fn invalid_file<S: ToString>(path: &str, reason: S) -> Self {
        Self::InvalidFile {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for texture engine operations.
pub type TexResult<T> = Result<T, TexError>;
