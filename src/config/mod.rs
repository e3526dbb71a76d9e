//! Site configuration management for `pagesmith.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── mail       # [mail]
//! │   ├── publish    # [publish]
//! │   ├── serve      # [serve]
//! │   └── store      # [store]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Layering
//!
//! Later layers win: built-in defaults, then `pagesmith.toml` (optional),
//! then environment variables, then command-line flags.
//!
//! | Variable        | Field            |
//! |-----------------|------------------|
//! | `PORT`          | `serve.port`     |
//! | `DATABASE_PATH` | `store.path`     |
//! | `SMTP_HOST`     | `mail.host`      |
//! | `SMTP_PORT`     | `mail.port`      |
//! | `SMTP_USER`     | `mail.username`  |
//! | `SMTP_PASS`     | `mail.password`  |
//! | `SMTP_TLS`      | `mail.tls`       |
//! | `SMTP_CA_CERT`  | `mail.ca_cert`   |
//! | `MAIL_FROM`     | `mail.from`      |
//! | `MAIL_TO`       | `mail.to`        |

pub mod section;
pub mod types;
mod util;

use util::{expand_path, find_config_file};

pub use section::{MailConfig, PublishConfig, ServeConfig, StoreConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    cli::{Cli, Commands},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing pagesmith.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file, whether or not it exists (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Page override database
    #[serde(default)]
    pub store: StoreConfig,

    /// Publishing pipeline
    #[serde(default)]
    pub publish: PublishConfig,

    /// Archive delivery by email
    #[serde(default)]
    pub mail: MailConfig,
}

impl SiteConfig {
    /// Load configuration from CLI arguments and the process environment.
    ///
    /// Searches upward from cwd for the config file. Without one, built-in
    /// defaults apply and the project root is the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);

        let mut diag = ConfigDiagnostics::new();
        config.apply_env(|name| std::env::var(name).ok(), &mut diag);
        config.apply_command_options(cli);
        config.config_path = config_path;
        config.normalize_paths(&root);
        config.validate(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    // ========================================================================
    // environment and cli overrides
    // ========================================================================

    /// Apply environment overrides. Empty values count as unset.
    ///
    /// `lookup` is `std::env::var` outside of tests.
    fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
        diag: &mut ConfigDiagnostics,
    ) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT") {
            match port.trim().parse() {
                Ok(port) => self.serve.port = port,
                Err(_) => diag.error_with_hint(
                    FieldPath::new("PORT"),
                    format!("`{port}` is not a port number"),
                    "use a number between 0 and 65535",
                ),
            }
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.store.path = PathBuf::from(path);
        }

        if let Some(host) = var("SMTP_HOST") {
            self.mail.host = Some(host);
        }
        if let Some(port) = var("SMTP_PORT") {
            match port.trim().parse() {
                Ok(port) => self.mail.port = port,
                Err(_) => diag.error(
                    FieldPath::new("SMTP_PORT"),
                    format!("`{port}` is not a port number"),
                ),
            }
        }
        if let Some(user) = var("SMTP_USER") {
            self.mail.username = Some(user);
        }
        if let Some(pass) = var("SMTP_PASS") {
            self.mail.password = Some(pass);
        }
        if let Some(tls) = var("SMTP_TLS") {
            match parse_flag(&tls) {
                Some(tls) => self.mail.tls = tls,
                None => diag.error_with_hint(
                    FieldPath::new("SMTP_TLS"),
                    format!("`{tls}` is not a boolean"),
                    "use true/false, yes/no or 1/0",
                ),
            }
        }
        if let Some(ca_cert) = var("SMTP_CA_CERT") {
            self.mail.ca_cert = Some(PathBuf::from(ca_cert));
        }
        if let Some(from) = var("MAIL_FROM") {
            self.mail.from = Some(from);
        }
        if let Some(to) = var("MAIL_TO") {
            self.mail.to = Some(to);
        }
    }

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve { interface, port } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Publish { .. } | Commands::Reset { .. } => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve every configured path against the project root.
    fn normalize_paths(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);
        self.set_root(&root);
        self.config_path = crate::utils::path::normalize_path(&self.config_path);

        self.serve.public_dir = expand_path(&self.serve.public_dir, &root);
        self.serve.template_dir = expand_path(&self.serve.template_dir, &root);
        self.store.path = expand_path(&self.store.path, &root);
        self.publish.staging_dir = expand_path(&self.publish.staging_dir, &root);
        self.publish.archive_dir = expand_path(&self.publish.archive_dir, &root);

        if let Some(ca_cert) = self.mail.ca_cert.take() {
            self.mail.ca_cert = Some(expand_path(&ca_cert, &root));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, collecting errors into `diag`.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        self.serve.validate(diag);
        self.store.validate(diag);
        self.publish.validate(diag);
        self.mail.validate(diag);
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
