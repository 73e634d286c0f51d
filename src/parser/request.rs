//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;
use serde::de::DeserializeOwned;
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The percent-decoded request path without the query string; this is
    /// what routes match against.
    pub path: String,
    /// The request path exactly as it appeared on the request line.
    pub raw_path: String,
    /// The raw query string, without the leading `?`.
    pub query: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
    /// Decoded query parameters; the first occurrence of a key wins.
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a request from a request target such as `/search?q=rust`.
    ///
    /// The target is split into [`path`](Self::path) and
    /// [`query`](Self::query). The path is percent-decoded and the query is
    /// decoded into [`query_params`](Self::query_params). The body starts out
    /// empty.
    pub fn new(method: Method, target: &str, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        Self {
            method,
            path: percent_decode_str(path).decode_utf8_lossy().into_owned(),
            raw_path: path.to_string(),
            query: query.to_string(),
            version,
            headers,
            body: Vec::new(),
            query_params: decode_pairs(query.as_bytes()),
        }
    }

    /// Create a request with a body.
    pub fn with_body(
        method: Method,
        target: &str,
        version: HttpVersion,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let mut request = Self::new(method, target, version, headers);
        request.body = body;
        request
    }

    /// Get a header value, ignoring the case of `name`.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Parse the request body as JSON.
    ///
    /// Fails with [`Error::MissingHeader`] unless the request declares an
    /// `application/json` content type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    pub fn is_json(&self) -> bool {
        self.content_type_is("application/json")
    }

    /// Get a decoded query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// Look up a form field.
    ///
    /// Fields of an `application/x-www-form-urlencoded` body take precedence
    /// over query parameters of the same name.
    pub fn form_value(&self, name: &str) -> Option<String> {
        if self.content_type_is("application/x-www-form-urlencoded") {
            let from_body = form_urlencoded::parse(&self.body)
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned());
            if from_body.is_some() {
                return from_body;
            }
        }
        self.get_query_param(name).cloned()
    }

    /// The path and query as they appeared on the request line.
    pub fn request_uri(&self) -> String {
        if self.query.is_empty() {
            self.raw_path.clone()
        } else {
            format!("{}?{}", self.raw_path, self.query)
        }
    }

    fn content_type_is(&self, mime: &str) -> bool {
        self.get_header("Content-Type")
            .map(|value| value.starts_with(mime))
            .unwrap_or(false)
    }
}

fn decode_pairs(input: &[u8]) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for (key, value) in form_urlencoded::parse(input) {
        pairs.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    pairs
}

/// Split a buffer at the blank line ending the header block.
///
/// Returns the head and the bytes following the separator, or `None` if no
/// separator has been seen yet.
fn split_head(input: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(pos) = input.windows(4).position(|w| w == b"\r\n\r\n") {
        return Some((&input[..pos], &input[pos + 4..]));
    }
    input
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| (&input[..pos], &input[pos + 2..]))
}

fn content_length<'a>(mut lines: impl Iterator<Item = &'a str>) -> Result<Option<usize>, Error> {
    let value = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim().eq_ignore_ascii_case("Content-Length").then(|| value.trim())
    });
    match value {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidContentLength(value.to_string())),
        None => Ok(None),
    }
}

/// Total length in bytes of the request at the start of `input`.
///
/// Returns `Ok(None)` while the header block is still incomplete; once it is
/// complete the result covers the head, the separator and a body of
/// `Content-Length` bytes, saturating at `usize::MAX` so an oversized
/// declaration still trips the caller's size limit.
pub fn request_len(input: &[u8]) -> Result<Option<usize>, Error> {
    let Some((head, rest)) = split_head(input) else {
        return Ok(None);
    };
    let separator = input.len() - head.len() - rest.len();
    let head_str = String::from_utf8_lossy(head);
    let body_len = content_length(head_str.lines().skip(1))?.unwrap_or(0);
    Ok(Some((head.len() + separator).saturating_add(body_len)))
}

/// Parse an HTTP request from a byte slice.
///
/// Everything after the blank line that ends the headers is taken as the
/// body, truncated to `Content-Length` when that header is present.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let (head, body) = split_head(input).unwrap_or((input, &input[input.len()..]));

    let head = std::str::from_utf8(head)
        .map_err(|_| Error::MalformedRequestLine("Invalid UTF-8".to_string()))?;
    let mut lines = head.lines();

    let request_line = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let &[method, target, version] = parts.as_slice() else {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    };

    let method = Method::from_str(method)?;
    if !target.starts_with('/') {
        return Err(Error::InvalidPath(target.to_string()));
    }
    let version = HttpVersion::from_str(version)?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        };
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    if version.requires_host() && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    let declared = content_length(head.lines().skip(1))?;
    let body_len = declared.map_or(body.len(), |len| len.min(body.len()));

    Ok(HttpRequest::with_body(method, target, version, headers, body[..body_len].to_vec()))
}
