//! Per-publish staging directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::{PublishError, PublishId, StagedFile};
use crate::debug;
use crate::page::{PAGE_EXT, PageKey, PageStore};

/// A freshly cleared directory owned by one publish run.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create `<root>/<id>`, removing anything already there.
    pub fn prepare(root: &Path, id: &PublishId) -> Result<Self, PublishError> {
        let dir = root.join(id.as_str());
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| PublishError::Stage(dir.clone(), e))?;
        }
        fs::create_dir_all(&dir).map_err(|e| PublishError::Stage(dir.clone(), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write decoded files. Returns the number written.
    pub fn write_all(&self, files: &[StagedFile]) -> Result<usize, PublishError> {
        for file in files {
            self.write(&file.name, &file.bytes)?;
        }
        Ok(files.len())
    }

    /// Copy the fixed file list. Missing files are skipped.
    ///
    /// For `.html` names a stored override wins over the template file, so
    /// the bundle matches what the editor previews.
    pub fn copy_fixed(
        &self,
        template_dir: &Path,
        names: &[String],
        store: &dyn PageStore,
    ) -> Result<usize, PublishError> {
        let mut staged = 0;
        for name in names {
            if name.ends_with(PAGE_EXT)
                && let Ok(key) = PageKey::new(name)
                && let Some(content) = store.get(&key)?
            {
                self.write(name, content.as_bytes())?;
                staged += 1;
                continue;
            }

            let source = template_dir.join(name);
            if !source.is_file() {
                debug!("publish"; "skipping missing {}", source.display());
                continue;
            }

            let target = self.dir.join(name);
            fs::copy(&source, &target).map_err(|e| PublishError::Stage(target, e))?;
            staged += 1;
        }
        Ok(staged)
    }

    /// Remove the directory once the archive is closed.
    pub fn discard(self) -> std::io::Result<()> {
        fs::remove_dir_all(&self.dir)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PublishError> {
        let target = self.dir.join(name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| PublishError::Stage(parent.to_path_buf(), e))?;
        }
        fs::write(&target, bytes).map_err(|e| PublishError::Stage(target, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::store::test_store;
    use tempfile::TempDir;

    fn id(name: &str) -> PublishId {
        PublishId::from_string(name)
    }

    #[test]
    fn test_prepare_clears_previous_contents() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("run").join("stale.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let stage = StagingArea::prepare(dir.path(), &id("run")).unwrap();
        assert!(stage.dir().is_dir());
        assert!(!stale.exists());
    }

    #[test]
    fn test_write_all() {
        let dir = TempDir::new().unwrap();
        let stage = StagingArea::prepare(dir.path(), &id("run")).unwrap();

        let files = [
            StagedFile::new("index.html", "<p>x</p>"),
            StagedFile::new("logo.png", vec![1, 2, 3]),
        ];
        assert_eq!(stage.write_all(&files).unwrap(), 2);
        assert_eq!(fs::read(stage.dir().join("logo.png")).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_copy_fixed_skips_missing_and_prefers_store() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("index.html"), "template index").unwrap();
        fs::write(templates.join("about.html"), "template about").unwrap();
        fs::write(templates.join("style.css"), "body{}").unwrap();

        let store = test_store(dir.path());
        store
            .upsert(&PageKey::new("about").unwrap(), "edited about")
            .unwrap();

        let stage = StagingArea::prepare(&dir.path().join("staging"), &id("run")).unwrap();
        let names: Vec<String> = ["index.html", "about.html", "contact.html", "style.css"]
            .map(String::from)
            .to_vec();

        let staged = stage.copy_fixed(&templates, &names, &store).unwrap();
        assert_eq!(staged, 3);
        assert_eq!(
            fs::read_to_string(stage.dir().join("about.html")).unwrap(),
            "edited about"
        );
        assert_eq!(
            fs::read_to_string(stage.dir().join("index.html")).unwrap(),
            "template index"
        );
        assert!(!stage.dir().join("contact.html").exists());
    }

    #[test]
    fn test_discard_removes_directory() {
        let dir = TempDir::new().unwrap();
        let stage = StagingArea::prepare(dir.path(), &id("run")).unwrap();
        let path = stage.dir().to_path_buf();
        stage.discard().unwrap();
        assert!(!path.exists());
    }
}
