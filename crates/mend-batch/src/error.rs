//! Error types for batch runs
//!
//! Only [`BatchError::InvalidGlob`] and [`BatchError::Walk`] abort a run; the
//! per-file variants end up in the run report.

use mend_core::DecodeError;
use mend_document::DocumentError;
use std::path::PathBuf;

/// Errors while resolving or processing a file set
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Include or exclude pattern does not compile
    #[error("invalid glob '{glob}': {source}")]
    InvalidGlob {
        glob: String,
        #[source]
        source: globset::Error,
    },

    /// Directory traversal failed
    #[error("cannot walk {root}: {message}")]
    Walk { root: PathBuf, message: String },

    /// File is not valid text in the expected encoding
    #[error("cannot decode {path}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// IO error during read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic write or document error
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl BatchError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create decoding error for path
    pub fn encoding_error(path: impl Into<PathBuf>, source: DecodeError) -> Self {
        Self::Encoding {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_display() {
        let err = BatchError::encoding_error("site/index.html", DecodeError::InvalidUtf8 { valid_up_to: 10 });
        assert_eq!(
            err.to_string(),
            "cannot decode site/index.html: invalid UTF-8 after 10 bytes"
        );
    }

    #[test]
    fn document_errors_pass_through() {
        let err: BatchError = DocumentError::MissingNodes.into();
        assert_eq!(err.to_string(), "document has no nodes collection");
    }
}
