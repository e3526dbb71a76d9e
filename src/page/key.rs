//! Page key normalization.
//!
//! Every entry point that names a page (fetch, save, load-by-id, reset)
//! goes through [`PageKey::new`], so a page saved as `about` is found again
//! as `about.html` and vice versa.

use std::fmt;
use thiserror::Error;

/// Extension every page key carries.
pub const PAGE_EXT: &str = ".html";

/// Rejected page identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("page name is empty")]
    Empty,

    #[error("page name `{0}` contains a path separator")]
    Separator(String),

    #[error("page name `{0}` refers to a parent directory")]
    ParentDir(String),

    #[error("page name contains a NUL byte")]
    Nul,
}

/// Normalized page identifier, used as the storage and lookup key.
///
/// Keys always end in `.html` and are a single path component, so joining
/// one onto the template directory never escapes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(String);

impl PageKey {
    /// Normalize a user-supplied page name.
    ///
    /// Appends `.html` unless already present. No case folding or trimming.
    pub fn new(raw: &str) -> Result<Self, KeyError> {
        if raw.trim().is_empty() {
            return Err(KeyError::Empty);
        }
        if raw.contains('\0') {
            return Err(KeyError::Nul);
        }
        if raw.contains(['/', '\\']) {
            return Err(KeyError::Separator(raw.to_string()));
        }
        if raw == ".." {
            return Err(KeyError::ParentDir(raw.to_string()));
        }

        if raw.ends_with(PAGE_EXT) {
            Ok(Self(raw.to_string()))
        } else {
            Ok(Self(format!("{raw}{PAGE_EXT}")))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_extension() {
        for raw in ["about", "index", "contact-us", "page.htm", "a.html.bak", "ABOUT"] {
            let key = PageKey::new(raw).unwrap();
            assert_eq!(key.as_str(), format!("{raw}.html"));
        }
    }

    #[test]
    fn test_keeps_existing_extension() {
        for raw in ["about.html", "index.html", ".html", "x.y.html"] {
            let key = PageKey::new(raw).unwrap();
            assert_eq!(key.as_str(), raw);
        }
    }

    #[test]
    fn test_extension_is_case_sensitive() {
        // Only the exact lowercase suffix counts
        assert_eq!(PageKey::new("about.HTML").unwrap().as_str(), "about.HTML.html");
    }

    #[test]
    fn test_normalizing_twice_is_stable() {
        let once = PageKey::new("about").unwrap();
        let twice = PageKey::new(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(matches!(PageKey::new("../secret"), Err(KeyError::Separator(_))));
        assert!(matches!(PageKey::new("a/b"), Err(KeyError::Separator(_))));
        assert!(matches!(PageKey::new("a\\b"), Err(KeyError::Separator(_))));
        assert!(matches!(PageKey::new(".."), Err(KeyError::ParentDir(_))));
    }

    #[test]
    fn test_rejects_empty_and_nul() {
        assert_eq!(PageKey::new(""), Err(KeyError::Empty));
        assert_eq!(PageKey::new("   "), Err(KeyError::Empty));
        assert_eq!(PageKey::new("a\0b"), Err(KeyError::Nul));
    }
}
