//! Route registration, group scopes and request dispatch.

use std::path::PathBuf;
use std::sync::Arc;
use log::info;
use serde_json::Value;

use crate::parser::{HttpRequest, Method};
use crate::router::{Params, RouteTable};
use crate::server::context::Context;
use crate::server::error::Error;
use crate::server::handler::{handler_func, not_found, HandlerFunc};
use crate::server::middleware::{logger, recovery};
use crate::server::response::HttpResponse;
use crate::server::static_files::{static_handler, FILEPATH_PARAM};
use crate::server::template::Templates;

/// A path-prefix scope carrying its own middleware.
pub struct GroupScope {
    prefix: String,
    middleware: Vec<HandlerFunc>,
    parent: Option<usize>,
}

impl GroupScope {
    /// The absolute prefix, including every enclosing scope's prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Index of the enclosing scope in [`Engine::groups`]; `None` for the root.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn middleware_len(&self) -> usize {
        self.middleware.len()
    }
}

/// The router: routes, group scopes and templates.
///
/// An engine is built with `&mut` registration calls and then only read while
/// requests are dispatched, so it can be shared behind an `Arc` without a
/// lock.
///
/// ```
/// use microrouter::{Engine, StatusCode};
///
/// let mut engine = Engine::new();
/// engine.get("/hello/:name", |ctx| {
///     let name = ctx.param("name").unwrap_or_default().to_string();
///     ctx.string(StatusCode::Ok, format!("hello {name}"));
/// });
///
/// let mut api = engine.group("/api");
/// api.get("/ping", |ctx| ctx.string(StatusCode::Ok, "pong"));
/// ```
pub struct Engine {
    routes: RouteTable<HandlerFunc>,
    groups: Vec<GroupScope>,
    templates: Arc<Templates>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with no routes and no middleware.
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            groups: vec![GroupScope {
                prefix: String::new(),
                middleware: Vec::new(),
                parent: None,
            }],
            templates: Arc::new(Templates::new()),
        }
    }

    /// An engine with [`logger`] and [`recovery`] already installed.
    pub fn default_engine() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(logger());
        engine.use_middleware(recovery());
        engine
    }

    fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup { engine: self, index: 0 }
    }

    /// Create a scope directly below the root.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.create_group(0, prefix)
    }

    /// Reopen a scope previously created, by its index in [`groups`](Self::groups).
    pub fn group_at(&mut self, index: usize) -> Option<RouterGroup<'_>> {
        if index < self.groups.len() {
            Some(RouterGroup { engine: self, index })
        } else {
            None
        }
    }

    fn create_group(&mut self, parent: usize, prefix: &str) -> RouterGroup<'_> {
        let prefix = format!("{}{}", self.groups[parent].prefix, prefix);
        self.groups.push(GroupScope {
            prefix,
            middleware: Vec::new(),
            parent: Some(parent),
        });
        let index = self.groups.len() - 1;
        RouterGroup { engine: self, index }
    }

    /// Add middleware that applies to every request.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root().use_middleware(middleware);
        self
    }

    pub fn handle<F>(&mut self, method: Method, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root().handle(method, pattern, handler);
        self
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Serve the files under `root` at `relative/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> &mut Self {
        self.root().static_files(relative, root);
        self
    }

    /// Register a function callable from templates. Call before loading the
    /// templates that use it.
    pub fn set_func_map<F>(&mut self, name: &str, func: F) -> &mut Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.templates).add_func(name, func);
        self
    }

    /// Load every template file matching `pattern`, e.g. `templates/*`.
    pub fn load_html_glob(&mut self, pattern: &str) -> Result<&mut Self, Error> {
        let loaded = Arc::make_mut(&mut self.templates).load_glob(pattern)?;
        info!("Loaded {loaded} templates from {pattern}");
        Ok(self)
    }

    /// Register a single template from a string.
    pub fn add_html_template(&mut self, name: &str, source: &str) -> Result<&mut Self, Error> {
        Arc::make_mut(&mut self.templates).add(name, source)?;
        Ok(self)
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// All scopes in creation order; index 0 is the root.
    pub fn groups(&self) -> &[GroupScope] {
        &self.groups
    }

    pub fn routes(&self) -> &RouteTable<HandlerFunc> {
        &self.routes
    }

    /// Middleware applying to `path`, in scope creation order.
    ///
    /// Every scope whose prefix starts `path` contributes its middleware;
    /// nesting depth plays no part in the order.
    pub fn middleware_for(&self, path: &str) -> Vec<HandlerFunc> {
        self.groups
            .iter()
            .filter(|group| path.starts_with(group.prefix.as_str()))
            .flat_map(|group| group.middleware.iter().cloned())
            .collect()
    }

    /// Run one request through its middleware and handler.
    ///
    /// Unmatched requests still pass through their middleware and end in a
    /// plain-text 404.
    pub fn dispatch(&self, request: HttpRequest) -> HttpResponse {
        let mut handlers = self.middleware_for(&request.path);

        let (handler, params) = match self.routes.resolve(request.method, &request.path) {
            Some(found) => (Arc::clone(found.handler), found.params),
            None => (not_found(), Params::new()),
        };
        handlers.push(handler);

        let mut ctx = Context::new(request, handlers);
        ctx.set_params(params);
        ctx.set_templates(Arc::clone(&self.templates));
        ctx.next();
        ctx.into_response()
    }
}

/// A handle for registering routes and middleware on one scope.
pub struct RouterGroup<'a> {
    engine: &'a mut Engine,
    index: usize,
}

impl RouterGroup<'_> {
    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.index].prefix
    }

    /// Index of this scope in [`Engine::groups`].
    pub fn index(&self) -> usize {
        self.index
    }

    /// Create a nested scope whose prefix extends this one.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.engine.create_group(self.index, prefix)
    }

    /// Add middleware to this scope. Calls accumulate in order.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.engine.groups[self.index].middleware.push(handler_func(middleware));
        self
    }

    /// Register `handler` for `method` at this scope's prefix plus `pattern`.
    pub fn handle<F>(&mut self, method: Method, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(method, pattern, handler_func(handler));
        self
    }

    fn add_route(&mut self, method: Method, pattern: &str, handler: HandlerFunc) {
        let pattern = format!("{}{}", self.prefix(), pattern);
        info!("Route {:>4} - {}", method, pattern);
        self.engine.routes.register(method, &pattern, handler);
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Serve the files under `root` at `relative/*filepath` below this scope.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> &mut Self {
        let pattern = format!("{}/*{}", relative.trim_end_matches('/'), FILEPATH_PARAM);
        self.get(&pattern, static_handler(root.into()))
    }
}
