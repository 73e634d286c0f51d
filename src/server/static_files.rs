//! Serving files from a directory.

use std::fs;
use std::path::{Component, Path, PathBuf};
use log::debug;

use crate::server::context::Context;
use crate::server::response::StatusCode;

/// Name of the route parameter holding the requested file.
pub(crate) const FILEPATH_PARAM: &str = "filepath";

/// Build the handler for `GET <prefix>/*filepath` serving files below `root`.
///
/// Files that are missing, unreadable or outside `root` produce a bare 404.
pub(crate) fn static_handler(root: PathBuf) -> impl Fn(&mut Context) + Send + Sync + 'static {
    move |ctx: &mut Context| {
        let relative = ctx.param(FILEPATH_PARAM).unwrap_or_default().to_string();
        let Some(path) = resolve(&root, &relative) else {
            debug!("refusing to serve {relative:?} from {}", root.display());
            ctx.status(StatusCode::NotFound);
            return;
        };

        match fs::read(&path) {
            Ok(bytes) => {
                ctx.set_header("Content-Type", content_type(&path));
                ctx.data(StatusCode::Ok, &bytes);
            }
            Err(err) => {
                debug!("cannot open {}: {err}", path.display());
                ctx.status(StatusCode::NotFound);
            }
        }
    }
}

/// Join `relative` under `root`, rejecting anything that would escape it.
///
/// A directory resolves to its `index.html`.
fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if path.is_dir() {
        path.push("index.html");
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/static");
        assert_eq!(resolve(root, "css/a.css"), Some(PathBuf::from("/srv/static/css/a.css")));
        assert_eq!(resolve(root, "./a.css"), Some(PathBuf::from("/srv/static/a.css")));
        assert_eq!(resolve(root, "../etc/passwd"), None);
        assert_eq!(resolve(root, "css/../../x"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("233.jpg")), "image/jpeg");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}
