//! Request dispatch and the HTTP server around it.
//!
//! [`Engine`] holds the route table and the group scopes and turns one
//! [`HttpRequest`](crate::HttpRequest) into one [`HttpResponse`] by running
//! the matching middleware and handler over a [`Context`]. [`HttpServer`]
//! feeds it requests read from TCP connections.

mod response;
mod config;
mod context;
mod engine;
mod error;
mod handler;
mod http_server;
mod middleware;
mod static_files;
mod template;

pub use response::{HttpResponse, StatusCode};
pub use config::ServerConfig;
pub use context::Context;
pub use engine::{Engine, GroupScope, RouterGroup};
pub use error::Error;
pub use handler::{handler_func, HandlerFunc};
pub use http_server::HttpServer;
pub use middleware::{logger, recovery};
pub use template::{TemplateFunc, Templates};
