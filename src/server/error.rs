//! Error types for the router and its server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur while setting up or serving routes.
///
/// Failures inside a handler chain are not represented here: handlers report
/// them through [`Context::fail`](crate::Context::fail) and they reach the
/// client as a response.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The request grew past the configured size limit before it was complete.
    #[error("Request exceeds {0} bytes")]
    RequestTooLarge(usize),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    /// A template could not be loaded or rendered.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// A handler panicked and no recovery middleware caught it.
    #[error("Handler panicked while serving {0}")]
    HandlerPanicked(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
