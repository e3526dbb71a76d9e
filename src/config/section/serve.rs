//! `[serve]` section configuration.
//!
//! Contains HTTP server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port number
//! workers = 4                 # Request handler threads
//! max_body = 52428800         # Largest accepted request body, in bytes
//! public_dir = "public"       # Static files and the homepage
//! template_dir = "templates"  # Default page templates
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Number of request handler threads.
    pub workers: usize,

    /// Largest accepted request body in bytes (publish payloads carry images).
    pub max_body: usize,

    /// Static files; `index.html` here is the homepage.
    pub public_dir: PathBuf,

    /// Default page templates, looked up after stored overrides.
    pub template_dir: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            workers: 4,
            max_body: 50 * 1024 * 1024,
            public_dir: PathBuf::from("public"),
            template_dir: PathBuf::from("templates"),
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.workers == 0 {
            diag.error(FieldPath::new("serve.workers"), "must be at least 1");
        }
        if self.max_body == 0 {
            diag.error(FieldPath::new("serve.max_body"), "must be greater than 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nworkers = 2");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.workers, 2);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.workers, 4);
        assert_eq!(config.serve.max_body, 50 * 1024 * 1024);
    }

    #[test]
    fn test_serve_config_interface_variants() {
        // Test IPv6 localhost
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config = test_parse_config("[serve]\ntemplate_dir = \"site/templates\"");

        assert_eq!(
            config.serve.template_dir,
            std::path::PathBuf::from("site/templates")
        );
        // public_dir uses default
        assert_eq!(config.serve.public_dir, std::path::PathBuf::from("public"));
    }
}
