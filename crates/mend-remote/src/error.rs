//! Error types for remote document operations

use mend_document::DocumentError;
use std::time::Duration;

/// Errors while talking to the workflow API
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Connection, DNS or protocol failure
    #[error("{op} {id} failed: {message}")]
    Network {
        op: &'static str,
        id: String,
        message: String,
    },

    /// Request exceeded its deadline
    #[error("{op} {id} timed out after {after:?}")]
    Timeout {
        op: &'static str,
        id: String,
        after: Duration,
    },

    /// Non-2xx response
    #[error("{op} {id} returned HTTP {status}: {body}")]
    Status {
        op: &'static str,
        id: String,
        status: u16,
        body: String,
    },

    /// Response body is not a JSON document
    #[error("GET {id} returned an unreadable document: {message}")]
    Decode { id: String, message: String },

    /// Client could not be configured
    #[error("remote configuration error: {0}")]
    Config(String),

    /// Fetched document could not be edited
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl RemoteError {
    /// Classify a transport error
    pub(crate) fn from_transport(
        op: &'static str,
        id: &str,
        after: Duration,
        err: &reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                op,
                id: id.to_string(),
                after,
            }
        } else {
            Self::Network {
                op,
                id: id.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_body() {
        let err = RemoteError::Status {
            op: "PUT",
            id: "abc".into(),
            status: 400,
            body: "request/body must NOT have additional properties".into(),
        };
        assert_eq!(
            err.to_string(),
            "PUT abc returned HTTP 400: request/body must NOT have additional properties"
        );
    }

    #[test]
    fn timeout_display() {
        let err = RemoteError::Timeout {
            op: "GET",
            id: "abc".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "GET abc timed out after 30s");
    }
}
