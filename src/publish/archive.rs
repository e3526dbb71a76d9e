//! Zip packaging of a staging directory.
//!
//! [`write_archive`] returns only after the zip central directory is
//! written and the file is synced, so whatever runs next (mail dispatch,
//! the HTTP response) always sees a complete archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use jwalk::WalkDir;
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Deflate level used for site archives.
const COMPRESSION_LEVEL: i64 = 9;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error at `{0}`: {1}")]
    Io(PathBuf, #[source] io::Error),

    #[error("cannot walk staging directory: {0}")]
    Walk(#[from] jwalk::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// A closed archive on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: u64,
}

impl ArchiveInfo {
    /// File name of the archive, as used in download URLs and attachments.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Pack every file under `source` into `dest`, overwriting it.
///
/// The zip is written next to `dest` and renamed into place once complete.
pub fn write_archive(source: &Path, dest: &Path) -> Result<ArchiveInfo, ArchiveError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::Io(parent.to_path_buf(), e))?;
    }

    let partial = dest.with_extension("zip.partial");
    let file = File::create(&partial).map_err(|e| ArchiveError::Io(partial.clone(), e))?;

    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    let mut entries = 0;
    for entry in WalkDir::new(source).sort(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(name) = entry_name(source, &path) else {
            continue;
        };

        zip.start_file(name, options)?;
        let mut input = File::open(&path).map_err(|e| ArchiveError::Io(path.clone(), e))?;
        io::copy(&mut input, &mut zip).map_err(|e| ArchiveError::Io(path.clone(), e))?;
        entries += 1;
    }

    let file = zip.finish()?;
    file.sync_all()
        .map_err(|e| ArchiveError::Io(partial.clone(), e))?;
    drop(file);

    fs::rename(&partial, dest).map_err(|e| ArchiveError::Io(dest.to_path_buf(), e))?;
    let bytes = fs::metadata(dest)
        .map_err(|e| ArchiveError::Io(dest.to_path_buf(), e))?
        .len();

    Ok(ArchiveInfo {
        path: dest.to_path_buf(),
        entries,
        bytes,
    })
}

/// Zip entry name: path relative to `root` with `/` separators.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Delete all but the `keep` newest `.zip` files in `dir`.
///
/// Archives modified within `grace` are left alone even when over the
/// limit; another run may still be mailing or serving them. `keep == 0`
/// disables pruning. Returns the number of archives removed.
pub fn prune(dir: &Path, keep: usize, grace: Duration) -> io::Result<usize> {
    if keep == 0 || !dir.is_dir() {
        return Ok(0);
    }

    let mut archives: Vec<(SystemTime, PathBuf)> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "zip") && p.is_file())
        .map(|p| {
            let modified = fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, p)
        })
        .collect();

    if archives.len() <= keep {
        return Ok(0);
    }

    // Newest first; ties broken by name so the order is stable
    archives.sort_by(|a, b| b.cmp(a));

    let now = SystemTime::now();
    let mut removed = 0;
    for (modified, path) in archives.into_iter().skip(keep) {
        // clock skew counts as young
        let expired = now.duration_since(modified).is_ok_and(|age| age >= grace);
        if !expired {
            continue;
        }
        fs::remove_file(&path)?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
pub(crate) fn read_entry(archive: &Path, name: &str) -> String {
    use std::io::Read;

    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

#[cfg(test)]
pub(crate) fn entry_names(archive: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut names: Vec<String> = zip.file_names().map(String::from).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_contains_all_files() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("stage");
        fs::create_dir_all(source.join("images")).unwrap();
        fs::write(source.join("index.html"), "<h1>Hi</h1>").unwrap();
        fs::write(source.join("images").join("a.png"), [1, 2, 3]).unwrap();

        let dest = dir.path().join("out").join("site.zip");
        let info = write_archive(&source, &dest).unwrap();

        assert_eq!(info.entries, 2);
        assert_eq!(info.path, dest);
        assert_eq!(info.file_name(), "site.zip");
        assert!(info.bytes > 0);
        assert!(!dest.with_extension("zip.partial").exists());
        assert_eq!(entry_names(&dest), vec!["images/a.png", "index.html"]);
        assert_eq!(read_entry(&dest, "index.html"), "<h1>Hi</h1>");
    }

    #[test]
    fn test_archive_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("stage");
        fs::create_dir_all(&source).unwrap();
        let dest = dir.path().join("site.zip");

        fs::write(source.join("index.html"), "<a>").unwrap();
        write_archive(&source, &dest).unwrap();

        fs::remove_file(source.join("index.html")).unwrap();
        fs::write(source.join("other.html"), "<b>").unwrap();
        write_archive(&source, &dest).unwrap();

        assert_eq!(entry_names(&dest), vec!["other.html"]);
    }

    #[test]
    fn test_empty_directory_makes_empty_archive() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("stage");
        fs::create_dir_all(&source).unwrap();

        let info = write_archive(&source, &dir.path().join("empty.zip")).unwrap();
        assert_eq!(info.entries, 0);
        assert!(entry_names(&info.path).is_empty());
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = TempDir::new().unwrap();
        for name in ["a.zip", "b.zip", "c.zip"] {
            fs::write(dir.path().join(name), name).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        assert_eq!(prune(dir.path(), 2, Duration::ZERO).unwrap(), 1);
        assert!(!dir.path().join("a.zip").exists());
        assert!(dir.path().join("b.zip").exists());
        assert!(dir.path().join("c.zip").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_prune_disabled() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.zip"), "a").unwrap();
        assert_eq!(prune(dir.path(), 0, Duration::ZERO).unwrap(), 0);
        assert!(dir.path().join("a.zip").exists());
    }

    #[test]
    fn test_prune_spares_recent_archives() {
        let dir = TempDir::new().unwrap();
        for name in ["a.zip", "b.zip", "c.zip"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        assert_eq!(prune(dir.path(), 1, Duration::from_secs(600)).unwrap(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
