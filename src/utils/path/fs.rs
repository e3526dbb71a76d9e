//! Path normalization.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Paths that do not exist yet (a database about to be created, an archive
/// directory) fall back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_missing_absolute_path() {
        let path = Path::new("/absolute/not/created/yet.db");
        assert_eq!(normalize_path(path), PathBuf::from("/absolute/not/created/yet.db"));
    }

    #[test]
    fn test_normalize_relative_path() {
        let normalized = normalize_path(Path::new("relative/archives"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("relative/archives"));
    }

    #[test]
    fn test_normalize_existing_path_resolves_dots() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        let dotted = dir.path().join("templates/../templates");
        assert!(normalize_path(&dotted).ends_with("templates"));
        assert!(!normalize_path(&dotted).to_string_lossy().contains(".."));
    }
}
