//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Pagesmith website builder backend
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: pagesmith.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "pagesmith.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the editor API and the site
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Bundle the fixed page set into an archive
    #[command(visible_alias = "p")]
    Publish {
        /// Keep the archive local even when mail is configured
        #[arg(long)]
        no_email: bool,
    },

    /// Delete stored page overrides (all of them, or one page)
    Reset {
        /// Page to reset, e.g. `about` or `about.html`
        page: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["pagesmith", "serve", "-i", "0.0.0.0", "-p", "8080", "-v"]);
        assert!(cli.verbose);
        let Commands::Serve { interface, port } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(interface, Some("0.0.0.0".parse().unwrap()));
        assert_eq!(port, Some(8080));
    }

    #[test]
    fn test_parse_publish_and_reset() {
        let cli = Cli::parse_from(["pagesmith", "p", "--no-email"]);
        assert!(matches!(cli.command, Commands::Publish { no_email: true }));

        let cli = Cli::parse_from(["pagesmith", "reset", "about"]);
        assert!(matches!(cli.command, Commands::Reset { page: Some(ref p) } if p == "about"));

        let cli = Cli::parse_from(["pagesmith", "-C", "site.toml", "reset"]);
        assert!(matches!(cli.command, Commands::Reset { page: None }));
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }
}
