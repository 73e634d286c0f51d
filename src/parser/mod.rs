//! HTTP/1.x request parsing.
//!
//! The router itself only needs a method and a path; this module turns the
//! raw bytes read by the server into an [`HttpRequest`] carrying those plus
//! headers, decoded query parameters and the body.

mod request;
mod method;
mod version;
mod error;
mod tests;

pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{parse_request, request_len};
