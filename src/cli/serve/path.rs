//! URL to public-directory path resolution.

use std::path::{Path, PathBuf};

/// Resolve a request path to a file under `serve_root`.
///
/// Directories resolve to their `index.html`. Anything that escapes the
/// root (`..`, symlinks) resolves to `None`.
pub fn resolve_path(url_path: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url_path)?;
    if clean.split('/').any(|part| part == "..") {
        return None;
    }

    let canonical = serve_root.join(&clean).canonicalize().ok()?;
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

/// Decode and trim slashes. Invalid UTF-8 after decoding is `None`.
fn normalize_url(url_path: &str) -> Option<String> {
    use percent_encoding::percent_decode_str;
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}
