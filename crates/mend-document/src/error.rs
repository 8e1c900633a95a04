//! Error types for workflow documents
//!
//! Provides error handling for:
//! - Ingress (file → document): IO, size limit, decoding, JSON syntax
//! - Node edits (selector matched nothing, no node collection)
//! - Egress (document → file): serialization, atomic write

use mend_core::DecodeError;
use std::path::PathBuf;

/// Errors while loading, editing or saving a workflow document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Text is not valid JSON
    #[error("invalid JSON in {origin}: {message}")]
    Parse { origin: String, message: String },

    /// No node matched the selector
    #[error("node not found: {0}")]
    NotFound(String),

    /// Document has no `nodes` collection
    #[error("document has no nodes collection")]
    MissingNodes,

    /// IO error during read or write
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the size limit
    #[error("{path} is {size} bytes, over the {max} byte limit")]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    /// File bytes are not decodable text
    #[error("cannot decode {path}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// Serialization logic failed
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// Dump text holds no JSON object
    #[error("no JSON object found in {0}")]
    NoJson(String),
}

impl DocumentError {
    /// Create parse error for origin
    pub fn parse_error(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            message: message.into(),
        }
    }

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

/// Result type alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;
