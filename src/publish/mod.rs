//! Site publishing: stage, archive, dispatch.
//!
//! # Pipeline
//!
//! ```text
//! PublishSource ──► StagingArea ──► write_archive ──► Dispatch
//!  (fixed/dynamic)   (<staging>/<id>)  (<archives>/<id>.zip)  (return/email)
//! ```
//!
//! Every run gets its own [`PublishId`], so concurrent publishes never share
//! a staging directory or an archive path.

mod archive;
mod dispatch;
mod payload;
mod stage;

pub use archive::{ArchiveError, ArchiveInfo};
pub use dispatch::{MailError, Mailer, SmtpMailer};
pub use payload::{DecodeError, PublishPayload, StagedFile};

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::config::{PublishConfig, SiteConfig};
use crate::page::{PageStore, StoreError};
use crate::{debug, log};
use stage::StagingArea;

#[cfg(test)]
pub(crate) use archive::{entry_names, read_entry};
#[cfg(test)]
pub(crate) use dispatch::testing::RecordingMailer;

static PUBLISH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique name of one publish run; a safe single path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishId(String);

impl PublishId {
    pub fn next() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = PUBLISH_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("site-{millis}-{seq}"))
    }

    #[cfg(test)]
    pub(crate) fn from_string(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.0)
    }
}

impl fmt::Display for PublishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("cannot stage `{0}`: {1}")]
    Stage(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("cannot send `{}`: {source}", .archive.display())]
    Dispatch {
        archive: PathBuf,
        #[source]
        source: MailError,
    },
}

impl PublishError {
    /// HTTP status for this failure.
    pub fn status(&self) -> u16 {
        match self {
            Self::Decode(_) => 400,
            _ => 500,
        }
    }
}

/// What goes into the archive.
#[derive(Debug, Clone)]
pub enum PublishSource {
    /// Copy `publish.files` from the template directory.
    Fixed,
    /// Caller-supplied HTML/CSS/JS and images.
    Dynamic(PublishPayload),
}

/// What happens to the archive once it is closed.
#[derive(Clone, Copy)]
pub enum Dispatch<'a> {
    Return,
    Email(&'a dyn Mailer),
}

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub id: PublishId,
    pub archive: ArchiveInfo,
    pub emailed: bool,
}

pub struct Publisher<'a> {
    config: &'a PublishConfig,
    template_dir: &'a Path,
    store: &'a dyn PageStore,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a SiteConfig, store: &'a dyn PageStore) -> Self {
        Self {
            config: &config.publish,
            template_dir: &config.serve.template_dir,
            store,
        }
    }

    /// Run one publish to completion.
    ///
    /// Payloads are decoded before anything touches disk. On dispatch
    /// failure the archive is left in place.
    pub fn publish(
        &self,
        source: PublishSource,
        dispatch: Dispatch<'_>,
    ) -> Result<PublishOutcome, PublishError> {
        let decoded = match &source {
            PublishSource::Dynamic(payload) => Some(payload.decode()?),
            PublishSource::Fixed => None,
        };

        let id = PublishId::next();
        let stage = StagingArea::prepare(&self.config.staging_dir, &id)?;
        let staged = match decoded {
            Some(files) => stage.write_all(&files),
            None => stage.copy_fixed(self.template_dir, &self.config.files, self.store),
        };
        let staged = match staged {
            Ok(count) => count,
            Err(e) => {
                discard(stage);
                return Err(e);
            }
        };
        debug!("publish"; "{id}: staged {staged} file(s)");

        let archive_path = self.config.archive_dir.join(id.archive_name());
        let archive = archive::write_archive(stage.dir(), &archive_path);
        discard(stage);
        let archive = archive?;

        log!(
            "publish";
            "{} ({} file(s), {} bytes)",
            archive.path.display(),
            archive.entries,
            archive.bytes
        );

        let emailed = match dispatch {
            Dispatch::Return => false,
            Dispatch::Email(mailer) => {
                mailer
                    .send_archive(&archive)
                    .map_err(|source| PublishError::Dispatch {
                        archive: archive.path.clone(),
                        source,
                    })?;
                log!("mail"; "sent {}", archive.file_name());
                true
            }
        };

        let grace = Duration::from_secs(self.config.prune_grace_secs);
        match archive::prune(&self.config.archive_dir, self.config.keep_archives, grace) {
            Ok(0) => {}
            Ok(n) => debug!("publish"; "pruned {n} old archive(s)"),
            Err(e) => log!("publish"; "cannot prune archives: {e}"),
        }

        Ok(PublishOutcome {
            id,
            archive,
            emailed,
        })
    }
}

fn discard(stage: StagingArea) {
    let dir = stage.dir().to_path_buf();
    if let Err(e) = stage.discard() {
        log!("publish"; "cannot remove {}: {e}", dir.display());
    }
}

#[cfg(test)]
pub(crate) fn test_config(root: &Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.serve.template_dir = root.join("templates");
    config.serve.public_dir = root.join("public");
    config.publish.staging_dir = root.join("staging");
    config.publish.archive_dir = root.join("archives");
    config
}
