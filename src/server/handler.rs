//! Handler and middleware callables.

use std::sync::Arc;

use crate::server::context::Context;
use crate::server::response::StatusCode;

/// A handler or middleware stored in a route table or group scope.
///
/// Middleware and terminal handlers share this type: both receive the
/// request's [`Context`] and may call [`Context::next`] to run the rest of
/// the chain.
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Box a closure as a [`HandlerFunc`].
pub fn handler_func<F>(handler: F) -> HandlerFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// The terminal handler used when no route matches.
pub(crate) fn not_found() -> HandlerFunc {
    handler_func(|ctx: &mut Context| {
        let body = format!("404 NOT FOUND: {}\n", ctx.path());
        ctx.string(StatusCode::NotFound, body);
    })
}
