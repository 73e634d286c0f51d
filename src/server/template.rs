//! Minimal HTML templates.
//!
//! A template is text with `{{ ... }}` actions. Supported actions:
//!
//! - `{{ . }}` the whole data value
//! - `{{ .title }}`, `{{ .user.name }}`, `{{ .items.0 }}` a field lookup
//! - `{{ formatAsDate .now }}` a registered function applied to a field
//!
//! Output of every action is HTML-escaped. Missing fields render as nothing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use serde::Serialize;
use serde_json::Value;

use crate::server::error::Error;

/// A function callable from a template action.
pub type TemplateFunc = Arc<dyn Fn(&Value) -> String + Send + Sync>;

#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Field(Vec<String>),
    Call(String, Vec<String>),
}

/// A named set of parsed templates sharing one function map.
#[derive(Clone, Default)]
pub struct Templates {
    funcs: HashMap<String, TemplateFunc>,
    templates: HashMap<String, Vec<Piece>>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function for use in actions. Functions must be registered
    /// before the templates that call them are added.
    pub fn add_func<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.funcs.insert(name.to_string(), Arc::new(func));
    }

    /// Parse `source` and store it under `name`, replacing any previous one.
    pub fn add(&mut self, name: &str, source: &str) -> Result<(), Error> {
        let pieces = self.parse(name, source)?;
        self.templates.insert(name.to_string(), pieces);
        Ok(())
    }

    /// Load every file matching `pattern`, each under its file name.
    ///
    /// The pattern may use `*` in its last component only, e.g.
    /// `templates/*` or `templates/*.tmpl`.
    pub fn load_glob(&mut self, pattern: &str) -> Result<usize, Error> {
        let (dir, file_pattern) = match pattern.rsplit_once('/') {
            Some((dir, file)) => (if dir.is_empty() { "/" } else { dir }, file),
            None => (".", pattern),
        };

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| glob_match(file_pattern, name))
                    .unwrap_or(false)
            })
            .collect();
        if paths.is_empty() {
            return Err(Error::TemplateError(format!("pattern matches no files: {pattern}")));
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        Ok(paths.len())
    }

    fn load_file(&mut self, path: &Path) -> Result<(), Error> {
        let source = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::TemplateError(format!("invalid template file name: {}", path.display())))?;
        self.add(name, &source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Render template `name` against `data`.
    pub fn render(&self, name: &str, data: &Value) -> Result<String, Error> {
        let pieces = self
            .templates
            .get(name)
            .ok_or_else(|| Error::TemplateError(format!("template {name:?} is not defined")))?;

        let mut out = String::new();
        for piece in pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Field(path) => out.push_str(&escape_html(&display(lookup(data, path)))),
                Piece::Call(func, path) => {
                    let func = self.funcs.get(func).ok_or_else(|| {
                        Error::TemplateError(format!("function {func:?} not defined"))
                    })?;
                    let arg = lookup(data, path).unwrap_or(&Value::Null);
                    out.push_str(&escape_html(&func(arg)));
                }
            }
        }
        Ok(out)
    }

    /// Serialize `data` and render template `name` with it.
    pub fn render_serialize<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String, Error> {
        let value = serde_json::to_value(data)?;
        self.render(name, &value)
    }

    fn parse(&self, name: &str, source: &str) -> Result<Vec<Piece>, Error> {
        let mut pieces = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                pieces.push(Piece::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| Error::TemplateError(format!("{name}: unclosed action")))?;
            pieces.push(self.parse_action(name, after[..end].trim())?);
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            pieces.push(Piece::Text(rest.to_string()));
        }
        Ok(pieces)
    }

    fn parse_action(&self, name: &str, action: &str) -> Result<Piece, Error> {
        let tokens: Vec<&str> = action.split_whitespace().collect();
        match tokens.as_slice() {
            [field] if field.starts_with('.') => Ok(Piece::Field(field_path(field))),
            [func, field] if field.starts_with('.') => {
                if !self.funcs.contains_key(*func) {
                    return Err(Error::TemplateError(format!("{name}: function {func:?} not defined")));
                }
                Ok(Piece::Call(func.to_string(), field_path(field)))
            }
            _ => Err(Error::TemplateError(format!("{name}: unsupported action {{{{{action}}}}}"))),
        }
    }
}

fn field_path(field: &str) -> Vec<String> {
    field
        .split('.')
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn lookup<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(data, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Match `name` against a pattern with at most one `*`.
fn glob_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len() && name.starts_with(prefix) && name.ends_with(suffix)
        }
        None => pattern == name,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_fields_and_functions() {
        let mut templates = Templates::new();
        templates.add_func("upper", |value| display(Some(value)).to_uppercase());
        templates
            .add("page", "<h1>{{ .title }}</h1><p>{{upper .user.name}}</p><i>{{ .tags.1 }}</i>{{ .missing }}")
            .unwrap();

        let data = json!({ "title": "gee", "user": { "name": "geek" }, "tags": ["a", "b"] });
        assert_eq!(templates.render("page", &data).unwrap(), "<h1>gee</h1><p>GEEK</p><i>b</i>");
    }

    #[test]
    fn test_output_is_escaped() {
        let mut templates = Templates::new();
        templates.add("x", "{{ . }}").unwrap();
        let rendered = templates.render("x", &json!("<script>'&'</script>")).unwrap();
        assert_eq!(rendered, "&lt;script&gt;&#39;&amp;&#39;&lt;/script&gt;");
    }

    #[test]
    fn test_parse_errors() {
        let mut templates = Templates::new();
        assert!(matches!(templates.add("a", "{{ .x"), Err(Error::TemplateError(_))));
        assert!(matches!(templates.add("b", "{{ nope .x }}"), Err(Error::TemplateError(_))));
        assert!(matches!(templates.add("c", "{{ range .x }}"), Err(Error::TemplateError(_))));
        assert!(matches!(templates.render("missing", &Value::Null), Err(Error::TemplateError(_))));
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*", "arr.tmpl"));
        assert!(glob_match("*.tmpl", "arr.tmpl"));
        assert!(!glob_match("*.tmpl", "arr.html"));
        assert!(glob_match("css.tmpl", "css.tmpl"));
        assert!(!glob_match("a*a", "a"));
    }
}
