//! Error types for the ads API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the entity does not exist" from "the server returned an unexpected
//! status." Other non-2xx responses land in `Http` with the raw status and
//! body. Failures while following a pagination cursor are wrapped in
//! `Pagination`, which keeps the status when one arrived and chains the
//! underlying error as its source.

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors returned by the client, the pagination engine and the transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// Following a `next_link` cursor failed. Fatal to the whole list call.
    #[error("pagination failed (status: {})", display_status(.status))]
    Pagination {
        status: Option<u16>,
        #[source]
        source: Box<ApiError>,
    },

    #[error("pagination exceeded {max_pages} pages")]
    PageLimitExceeded { max_pages: usize },

    #[error("pagination cursor revisits {next_link}")]
    PaginationCycle { next_link: String },

    /// An expected key was absent from the response body.
    #[error("response is missing key `{key}`")]
    MissingKey { key: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The call was rejected locally before any I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An item inside a bulk response reported a failure.
    #[error("sub-request {status}: {message}")]
    SubRequest { status: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid proxy: {0}")]
    Proxy(String),
}

impl ApiError {
    /// HTTP status carried by this error, looking through pagination wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Pagination { status, .. } => *status,
            _ => None,
        }
    }
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn pagination_error_chains_source() {
        let err = ApiError::Pagination {
            status: Some(500),
            source: Box::new(ApiError::Http {
                status: 500,
                body: "boom".to_string(),
            }),
        };
        assert_eq!(err.to_string(), "pagination failed (status: 500)");
        assert_eq!(err.status(), Some(500));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn pagination_error_without_status() {
        let err = ApiError::Pagination {
            status: None,
            source: Box::new(ApiError::Transport("connection refused".to_string())),
        };
        assert_eq!(err.to_string(), "pagination failed (status: none)");
        assert_eq!(err.status(), None);
    }
}
