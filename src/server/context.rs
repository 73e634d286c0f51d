//! Per-request dispatch state.

use std::sync::Arc;
use log::warn;
use serde::Serialize;
use serde_json::json;

use crate::parser::{HttpRequest, Method};
use crate::router::Params;
use crate::server::handler::HandlerFunc;
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::template::Templates;

/// State for one in-flight request.
///
/// A context owns the request, the parameters captured by the matched route,
/// the handler chain (selected middleware followed by the route handler) and
/// the response being built. It is created by the dispatcher, handed to every
/// handler in the chain by mutable reference, and turned into an
/// [`HttpResponse`] once the chain has finished.
///
/// # Running the chain
///
/// [`next`](Context::next) runs the remaining handlers. A middleware can call
/// it to wrap the rest of the chain:
///
/// ```
/// use std::time::Instant;
/// use microrouter::Context;
///
/// fn timing(ctx: &mut Context) {
///     let start = Instant::now();
///     ctx.next();
///     let _elapsed = start.elapsed();
/// }
/// ```
///
/// A middleware that returns without calling `next` does not stop the chain:
/// the loop driving `next` moves on to the following handler by itself. Only
/// [`fail`](Context::fail) and [`abort`](Context::abort) stop it.
pub struct Context {
    request: HttpRequest,
    params: Params,
    handlers: Vec<HandlerFunc>,
    index: isize,
    aborted: bool,
    wrote_status: bool,
    response: HttpResponse,
    templates: Option<Arc<Templates>>,
}

impl Context {
    /// Create a context that will run `handlers` against `request`.
    pub fn new(request: HttpRequest, handlers: Vec<HandlerFunc>) -> Self {
        Self {
            request,
            params: Params::new(),
            handlers,
            index: -1,
            aborted: false,
            wrote_status: false,
            response: HttpResponse::new(StatusCode::Ok),
            templates: None,
        }
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) fn set_templates(&mut self, templates: Arc<Templates>) {
        self.templates = Some(templates);
    }

    /// Run the rest of the handler chain.
    ///
    /// Safe to call from inside a handler: the nested call runs everything
    /// after the current handler, and when it returns the outer loop finds
    /// the cursor past the end and stops.
    pub fn next(&mut self) {
        self.index += 1;
        while let Some(handler) = self.current() {
            handler(self);
            self.index += 1;
        }
    }

    fn current(&self) -> Option<HandlerFunc> {
        let index = usize::try_from(self.index).ok()?;
        self.handlers.get(index).cloned()
    }

    /// Skip every handler that has not run yet, without writing anything.
    pub fn abort(&mut self) {
        self.index = self.handlers.len() as isize;
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Stop the chain and respond with `{"message": message}`.
    pub fn fail(&mut self, code: StatusCode, message: &str) {
        self.abort();
        let body = json!({ "message": message }).to_string();
        self.set_header("Content-Type", "application/json");
        self.status(code);
        self.write(body.as_bytes());
    }

    /// Set the response status.
    ///
    /// Only the first call has an effect; later calls are logged and ignored.
    pub fn status(&mut self, code: StatusCode) {
        if self.wrote_status {
            warn!(
                "superfluous status {} for {}, keeping {}",
                code.as_u16(),
                self.request.path,
                self.response.status.as_u16()
            );
            return;
        }
        self.wrote_status = true;
        self.response.status = code;
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.response.headers.insert(key.to_string(), value.to_string());
    }

    /// Append raw bytes to the body, writing a 200 status first if none was set.
    pub fn write(&mut self, bytes: &[u8]) {
        if !self.wrote_status {
            self.status(StatusCode::Ok);
        }
        self.response.body.extend_from_slice(bytes);
    }

    /// Respond with a plain-text body.
    pub fn string(&mut self, code: StatusCode, body: impl AsRef<str>) {
        self.set_header("Content-Type", "text/plain");
        self.status(code);
        self.write(body.as_ref().as_bytes());
    }

    /// Respond with `value` encoded as JSON.
    ///
    /// A value that cannot be encoded turns into a 500 through
    /// [`fail`](Context::fail).
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set_header("Content-Type", "application/json");
                self.status(code);
                self.write(&body);
            }
            Err(err) => self.fail(StatusCode::InternalServerError, &err.to_string()),
        }
    }

    /// Respond with raw bytes.
    pub fn data(&mut self, code: StatusCode, data: &[u8]) {
        self.status(code);
        self.write(data);
    }

    /// Render the template `name` with `data` as an HTML body.
    ///
    /// Rendering errors turn into a 500 through [`fail`](Context::fail).
    pub fn html<T: Serialize + ?Sized>(&mut self, code: StatusCode, name: &str, data: &T) {
        let rendered = match &self.templates {
            Some(templates) => templates.render_serialize(name, data),
            None => Err(crate::server::Error::TemplateError("no templates loaded".to_string())),
        };
        match rendered {
            Ok(body) => {
                self.set_header("Content-Type", "text/html");
                self.status(code);
                self.write(body.as_bytes());
            }
            Err(err) => self.fail(StatusCode::InternalServerError, &err.to_string()),
        }
    }

    /// Throw away everything written so far so a fresh response can be built.
    pub fn reset(&mut self) {
        self.wrote_status = false;
        self.response = HttpResponse::new(StatusCode::Ok);
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn method(&self) -> Method {
        self.request.method
    }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn request_uri(&self) -> String {
        self.request.request_uri()
    }

    /// A parameter captured by the matched route.
    pub fn param(&self, key: &str) -> Option<&str> {
        let value = self.params.get(key).map(String::as_str);
        if value.is_none() {
            warn!("no route parameter {key:?} for {}", self.request.path);
        }
        value
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A decoded query-string parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.get_query_param(key).map(String::as_str)
    }

    /// A form field from a urlencoded body, falling back to the query string.
    pub fn post_form(&self, key: &str) -> Option<String> {
        self.request.form_value(key)
    }

    /// The status written so far, or 200 if none was.
    pub fn status_code(&self) -> StatusCode {
        self.response.status
    }

    pub fn wrote_status(&self) -> bool {
        self.wrote_status
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    /// Finish the request and hand back the response that was built.
    pub fn into_response(self) -> HttpResponse {
        self.response
    }
}
