//! Error types for the HTTP parser.

use thiserror::Error;

/// Reasons a buffered request could not be turned into an [`HttpRequest`].
///
/// [`HttpRequest`]: crate::parser::HttpRequest
#[derive(Debug, Error)]
pub enum Error {
    /// The method token is not one routes can be registered for.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request target is empty or not an origin-form path.
    #[error("Invalid HTTP path: {0}")]
    InvalidPath(String),

    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    #[error("Invalid header line: {0}")]
    InvalidHeaderFormat(String),

    /// `Content-Length` is present but not a number.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    #[error("Empty request")]
    EmptyRequest,

    /// The body could not be decoded as JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
