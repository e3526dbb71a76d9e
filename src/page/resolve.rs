//! Layered page lookup: stored override, then template file, then nothing.
//!
//! Resolution is pure with respect to rendering. Each HTTP entry point
//! decides on its own what a [`Resolution::NotFound`] turns into.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{PageKey, PageStore, StoreError};

/// Where a resolved page came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody {
    /// Saved through the editor; takes precedence over any file on disk.
    Stored(String),
    /// Shipped template file, streamed as-is.
    Template(PathBuf),
}

impl PageBody {
    /// Short source tag for logs.
    pub fn source(&self) -> &'static str {
        match self {
            Self::Stored(_) => "stored",
            Self::Template(_) => "template",
        }
    }

    /// Materialize the page as a string (reads template files from disk).
    pub fn into_string(self) -> io::Result<String> {
        match self {
            Self::Stored(content) => Ok(content),
            Self::Template(path) => fs::read_to_string(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PageBody),
    NotFound,
}

/// Resolve `key` against the store first, then `template_dir`.
///
/// Store failures are returned, never swallowed; a miss in both layers is
/// `Ok(NotFound)`.
pub fn resolve(
    store: &dyn PageStore,
    template_dir: &Path,
    key: &PageKey,
) -> Result<Resolution, StoreError> {
    if let Some(content) = store.get(key)? {
        return Ok(Resolution::Found(PageBody::Stored(content)));
    }

    let path = template_dir.join(key.as_str());
    if path.is_file() {
        return Ok(Resolution::Found(PageBody::Template(path)));
    }

    Ok(Resolution::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::store::test_store;
    use tempfile::TempDir;

    fn key(raw: &str) -> PageKey {
        PageKey::new(raw).unwrap()
    }

    #[test]
    fn test_stored_override_wins() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("about.html"), "<p>default</p>").unwrap();

        let store = test_store(dir.path());
        store.upsert(&key("about"), "<p>edited</p>").unwrap();

        let resolved = resolve(&store, &templates, &key("about")).unwrap();
        assert_eq!(
            resolved,
            Resolution::Found(PageBody::Stored("<p>edited</p>".into()))
        );
    }

    #[test]
    fn test_falls_back_to_template() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("about.html"), "<p>default</p>").unwrap();

        let store = test_store(dir.path());
        let Resolution::Found(body) = resolve(&store, &templates, &key("about")).unwrap() else {
            panic!("expected template hit");
        };
        assert_eq!(body.source(), "template");
        assert_eq!(body.into_string().unwrap(), "<p>default</p>");
    }

    #[test]
    fn test_not_found_when_neither_exists() {
        let dir = TempDir::new().unwrap();
        let store = test_store(dir.path());

        let resolved = resolve(&store, &dir.path().join("missing"), &key("ghost")).unwrap();
        assert_eq!(resolved, Resolution::NotFound);
    }

    #[test]
    fn test_directory_with_key_name_is_not_a_template() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("odd.html")).unwrap();

        let store = test_store(dir.path());
        let resolved = resolve(&store, dir.path(), &key("odd")).unwrap();
        assert_eq!(resolved, Resolution::NotFound);
    }
}
