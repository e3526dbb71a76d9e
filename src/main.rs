//! Pagesmith - editable pages, live preview and zipped site publishing.

mod cli;
mod config;
mod core;
mod logger;
mod page;
mod publish;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{SiteConfig, init_config};
use page::{PageStore, SqliteStore};
use publish::{Mailer, SmtpMailer};
use std::sync::Arc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = init_config(SiteConfig::load(&cli)?);
    debug!("config"; "root {}", config.get_root().display());

    let store = SqliteStore::open(&config.store.path, config.store.pool_size)
        .with_context(|| format!("cannot open page store `{}`", config.store.path.display()))?;

    match &cli.command {
        Commands::Serve { .. } => {
            let mailer = build_mailer(&config)?.map(|m| Arc::new(m) as Arc<dyn Mailer>);
            cli::serve::serve(Arc::new(store) as Arc<dyn PageStore>, mailer)
        }
        Commands::Publish { no_email } => {
            let mailer = if *no_email { None } else { build_mailer(&config)? };
            cli::publish::publish_site(&config, &store, mailer.as_ref().map(|m| m as &dyn Mailer))
                .map(|_| ())
        }
        Commands::Reset { page } => cli::reset::reset_pages(&store, page.as_deref()).map(|_| ()),
    }
}

/// SMTP mailer when `[mail]` is configured.
fn build_mailer(config: &SiteConfig) -> Result<Option<SmtpMailer>> {
    if !config.mail.is_configured() {
        debug!("mail"; "not configured, archives are returned only");
        return Ok(None);
    }
    SmtpMailer::from_config(&config.mail).context("invalid mail settings")
}
