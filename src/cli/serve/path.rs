//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// What a request URL maps to under the served directory.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    /// An existing file (or a directory's `index.html`)
    File(PathBuf),
    /// Nothing there; the app shell answers instead
    Fallback(PathBuf),
    /// Nothing there and no app shell
    NotFound,
}

/// Resolve a request URL, falling back to the root `index.html` so
/// client-side routes load the app.
///
/// URLs that escape `serve_root` never fall back.
pub fn resolve(url: &str, serve_root: &Path) -> Resolved {
    if let Some(path) = resolve_path(url, serve_root) {
        return Resolved::File(path);
    }
    if escapes_root(url) {
        return Resolved::NotFound;
    }

    let index = serve_root.join("index.html");
    if index.is_file() {
        Resolved::Fallback(index)
    } else {
        Resolved::NotFound
    }
}

/// Resolve URL to filesystem path, handling index.html for directories
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    // Reject paths with suspicious patterns early
    if clean.split('/').any(|seg| seg == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    // Canonicalize so symlinks cannot lead outside serve_root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

fn escapes_root(url: &str) -> bool {
    normalize_url(url).split('/').any(|seg| seg == "..")
}

/// Normalize URL: decode, strip query string and fragment, trim slashes
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.replace('\\', "/").trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::normalize_path;

    fn make_site() -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::Builder::new().prefix("livewasm").tempdir().unwrap();
        let root = normalize_path(temp.path()).join("server");
        std::fs::create_dir_all(root.join("assets")).unwrap();
        std::fs::write(root.join("index.html"), "<html></html>").unwrap();
        std::fs::write(root.join("main.wasm"), b"\0asm").unwrap();
        std::fs::write(root.join("assets/app.css"), "body{}").unwrap();
        std::fs::write(root.join("assets/my file.txt"), "x").unwrap();
        (temp, root)
    }

    #[test]
    fn test_resolve_existing_file() {
        let (_temp, root) = make_site();
        assert_eq!(resolve("/main.wasm", &root), Resolved::File(root.join("main.wasm")));
        assert_eq!(
            resolve("/assets/app.css?v=2", &root),
            Resolved::File(root.join("assets/app.css"))
        );
        assert_eq!(
            resolve("/assets/my%20file.txt", &root),
            Resolved::File(root.join("assets/my file.txt"))
        );
    }

    #[test]
    fn test_resolve_directory_index() {
        let (_temp, root) = make_site();
        assert_eq!(resolve("/", &root), Resolved::File(root.join("index.html")));
    }

    #[test]
    fn test_unknown_route_falls_back_to_index() {
        let (_temp, root) = make_site();
        assert_eq!(
            resolve("/about/team", &root),
            Resolved::Fallback(root.join("index.html"))
        );
        // Directory without its own index.html
        assert_eq!(
            resolve("/assets/", &root),
            Resolved::Fallback(root.join("index.html"))
        );
    }

    #[test]
    fn test_no_fallback_without_index() {
        let (_temp, root) = make_site();
        std::fs::remove_file(root.join("index.html")).unwrap();
        assert_eq!(resolve("/missing", &root), Resolved::NotFound);
    }

    #[test]
    fn test_traversal_rejected() {
        let (_temp, root) = make_site();
        std::fs::write(root.parent().unwrap().join("secret.go"), "package main").unwrap();

        assert_eq!(resolve("/../secret.go", &root), Resolved::NotFound);
        assert_eq!(resolve("/%2e%2e/secret.go", &root), Resolved::NotFound);
        assert_eq!(resolve("/assets/..%2F..%2Fsecret.go", &root), Resolved::NotFound);
    }
}
