//! Per-method route table.

use std::collections::HashMap;

use crate::parser::Method;
use crate::router::trie::{parse_pattern, Node, PARAM_MARKER, WILDCARD_MARKER};

/// Parameters captured from a request path, keyed by name.
pub type Params = HashMap<String, String>;

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The pattern the route was registered with, e.g. `/hello/:name`.
    pub pattern: &'a str,
    pub params: Params,
    pub handler: &'a H,
}

/// One trie per method plus the handlers registered for each
/// `(method, pattern)` pair.
///
/// The table is filled during setup and only read afterwards.
#[derive(Debug)]
pub struct RouteTable<H> {
    roots: HashMap<Method, Node>,
    handlers: HashMap<(Method, String), H>,
    order: Vec<(Method, String)>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            roots: HashMap::new(),
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// Registering the same pair twice keeps the trie unchanged and replaces
    /// the handler.
    pub fn register(&mut self, method: Method, pattern: &str, handler: H) {
        let parts = parse_pattern(pattern);
        self.roots
            .entry(method)
            .or_insert_with(Node::root)
            .insert(pattern, &parts, 0);

        let key = (method, pattern.to_string());
        if self.handlers.insert(key.clone(), handler).is_none() {
            self.order.push(key);
        }
    }

    /// Resolve a request path.
    ///
    /// Returns `None` when no route is registered for `method` at all or when
    /// no registered pattern matches `path`.
    pub fn resolve(&self, method: Method, path: &str) -> Option<RouteMatch<'_, H>> {
        let search_parts = parse_pattern(path);
        let node = self.roots.get(&method)?.search(&search_parts, 0)?;
        let pattern = node.pattern()?;
        let handler = self.handlers.get(&(method, pattern.to_string()))?;

        Some(RouteMatch {
            pattern,
            params: extract_params(pattern, &search_parts),
            handler,
        })
    }

    /// The trie root for `method`, if any route was registered for it.
    pub fn root(&self, method: Method) -> Option<&Node> {
        self.roots.get(&method)
    }

    /// Registered `(method, pattern)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.order.iter().map(|(method, pattern)| (*method, pattern.as_str()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Bind the parameter segments of `pattern` to the matching path segments.
///
/// A named wildcard takes every remaining segment joined by `/`; a bare `*`
/// captures nothing.
pub fn extract_params(pattern: &str, search_parts: &[&str]) -> Params {
    let mut params = Params::new();
    for (index, part) in parse_pattern(pattern).into_iter().enumerate() {
        if let Some(name) = part.strip_prefix(PARAM_MARKER) {
            if let Some(value) = search_parts.get(index) {
                params.insert(name.to_string(), value.to_string());
            }
        } else if let Some(name) = part.strip_prefix(WILDCARD_MARKER) {
            if !name.is_empty() {
                let rest = search_parts.get(index..).unwrap_or_default();
                params.insert(name.to_string(), rest.join("/"));
            }
            break;
        }
    }
    params
}
