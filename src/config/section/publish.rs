//! `[publish]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [publish]
//! staging_dir = "publish/staging"    # Per-run scratch directories
//! archive_dir = "publish/archives"   # Finished site archives
//! keep_archives = 10                 # Newest archives to keep (0 = all)
//! prune_grace_secs = 600             # Archives younger than this are never pruned
//! files = ["index.html", "about.html", "contact.html", "style.css", "script.js"]
//! ```
//!
//! `files` is the fixed set copied from `serve.template_dir` by a
//! `GET /publish`; names missing on disk are skipped.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub staging_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub keep_archives: usize,
    pub prune_grace_secs: u64,
    pub files: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("publish/staging"),
            archive_dir: PathBuf::from("publish/archives"),
            keep_archives: 10,
            prune_grace_secs: 600,
            files: ["index.html", "about.html", "contact.html", "style.css", "script.js"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl PublishConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for name in &self.files {
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                diag.error_with_hint(
                    FieldPath::new("publish.files"),
                    format!("`{name}` is not a plain file name"),
                    "list files that sit directly in the template directory",
                );
            }
        }
        if self.staging_dir == self.archive_dir {
            diag.error(
                FieldPath::new("publish.archive_dir"),
                "must differ from `publish.staging_dir`",
            );
        }
    }
}
