//! `pagesmith publish`: fixed-set publish from the command line.

use crate::config::SiteConfig;
use crate::log;
use crate::page::PageStore;
use crate::publish::{Dispatch, Mailer, PublishOutcome, PublishSource, Publisher};
use anyhow::{Context, Result};

/// Bundle `publish.files` and email the archive when a mailer is given.
pub fn publish_site(
    config: &SiteConfig,
    store: &dyn PageStore,
    mailer: Option<&dyn Mailer>,
) -> Result<PublishOutcome> {
    let dispatch = match mailer {
        Some(mailer) => Dispatch::Email(mailer),
        None => Dispatch::Return,
    };

    let outcome = Publisher::new(config, store)
        .publish(PublishSource::Fixed, dispatch)
        .context("publish failed")?;

    if outcome.emailed {
        log!(
            "publish";
            "{} emailed to {}",
            outcome.archive.file_name(),
            config.mail.to.as_deref().unwrap_or_default()
        );
    } else {
        log!("publish"; "{} ready at {}", outcome.id, outcome.archive.path.display());
    }
    Ok(outcome)
}
