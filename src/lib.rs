//! A small HTTP router.
//!
//! Routes are matched with a per-method segment trie supporting named
//! parameters (`/hello/:name`) and catch-all wildcards (`/assets/*filepath`).
//! Each request runs through a chain made of the middleware of every group
//! whose prefix matches the path, followed by the matched handler.
//!
//! # Features
//!
//! - Named parameters and catch-all wildcards, literal segments preferred
//! - Route groups with nested prefixes and per-group middleware
//! - Middleware that can wrap the rest of the chain or stop it with `fail`
//! - Panic recovery and request logging middleware
//! - JSON, text, byte and template responses, static file serving
//! - A tokio-based HTTP/1.1 server with connection limits and graceful shutdown
//!
//! # Examples
//!
//! ## Routing and groups
//!
//! ```
//! use microrouter::{Engine, HttpRequest, HttpVersion, Method, StatusCode};
//! use std::collections::HashMap;
//!
//! let mut engine = Engine::new();
//! engine.get("/hello/:name", |ctx| {
//!     let name = ctx.param("name").unwrap_or_default().to_string();
//!     ctx.string(StatusCode::Ok, format!("hello {name}, you are at {}", ctx.path()));
//! });
//!
//! let mut v1 = engine.group("/v1");
//! v1.use_middleware(|ctx| ctx.set_header("X-Api", "v1"));
//! v1.get("/ping", |ctx| ctx.json(StatusCode::Ok, &serde_json::json!({ "pong": true })));
//!
//! let request = HttpRequest::new(Method::GET, "/hello/geek", HttpVersion::Http11, HashMap::new());
//! let response = engine.dispatch(request);
//! assert_eq!(response.status, StatusCode::Ok);
//! assert_eq!(response.body_string(), "hello geek, you are at /hello/geek");
//! ```
//!
//! ## Failing fast
//!
//! ```
//! use microrouter::{Engine, HttpRequest, HttpVersion, Method, StatusCode};
//! use std::collections::HashMap;
//!
//! let mut engine = Engine::new();
//! let mut admin = engine.group("/admin");
//! admin.use_middleware(|ctx| ctx.fail(StatusCode::Unauthorized, "login required"));
//! admin.get("/panel", |_ctx| unreachable!());
//!
//! let request = HttpRequest::new(Method::GET, "/admin/panel", HttpVersion::Http11, HashMap::new());
//! let response = engine.dispatch(request);
//! assert_eq!(response.status, StatusCode::Unauthorized);
//! assert_eq!(response.body_string(), r#"{"message":"login required"}"#);
//! ```
//!
//! See `demos/http_server.rs` for a complete server.

pub mod parser;
pub mod router;
pub mod server;

pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use router::{Params, RouteTable};
pub use server::{
    Context, Engine, Error as ServerError, HandlerFunc, HttpResponse, HttpServer, RouterGroup,
    ServerConfig, StatusCode, Templates, handler_func, logger, recovery,
};
