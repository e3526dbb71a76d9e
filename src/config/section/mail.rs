//! `[mail]` section configuration.
//!
//! Mail is optional. When `host`, `from` and `to` are all set, a fixed-set
//! publish emails the archive; otherwise the archive is only returned.
//!
//! # Example
//!
//! ```toml
//! [mail]
//! host = "smtp.example.com"
//! port = 587                  # 465 uses implicit TLS, anything else STARTTLS
//! username = "site@example.com"
//! password = "..."            # prefer the SMTP_PASS environment variable
//! from = "Site <site@example.com>"
//! to = "owner@example.com"
//! subject = "Your website"
//! tls = true
//! ca_cert = "~/certs/smtp-ca.pem"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: String,
    /// Encrypt the SMTP session. Disable only for local relays.
    pub tls: bool,
    /// Extra root certificate (PEM) trusted for the SMTP server.
    pub ca_cert: Option<PathBuf>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
            from: None,
            to: None,
            subject: "Your website".to_string(),
            tls: true,
            ca_cert: None,
        }
    }
}

// Keeps the password out of `{:?}` output.
impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("tls", &self.tls)
            .field("ca_cert", &self.ca_cert)
            .finish()
    }
}

impl MailConfig {
    /// Whether enough is set to send mail.
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.from.is_some() && self.to.is_some()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let set = [&self.host, &self.from, &self.to]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if set > 0 && set < 3 {
            diag.error_with_hint(
                FieldPath::new("mail"),
                "incomplete mail settings",
                "set `host`, `from` and `to` together (or none of them)",
            );
        }
        if self.username.is_some() != self.password.is_some() {
            diag.error(
                FieldPath::new("mail.username"),
                "`username` and `password` must be set together",
            );
        }
        if let Some(ca_cert) = &self.ca_cert
            && !ca_cert.is_file()
        {
            diag.error(
                FieldPath::new("mail.ca_cert"),
                format!("`{}` does not exist", ca_cert.display()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_mail_defaults_unconfigured() {
        let config = test_parse_config("");
        assert!(!config.mail.is_configured());
        assert_eq!(config.mail.port, 587);
        assert!(config.mail.tls);
    }

    #[test]
    fn test_mail_configured() {
        let config = test_parse_config(
            "[mail]\nhost = \"smtp.example.com\"\nfrom = \"a@example.com\"\nto = \"b@example.com\"",
        );
        assert!(config.mail.is_configured());

        let mut diag = ConfigDiagnostics::new();
        config.mail.validate(&mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_partial_mail_rejected() {
        let config = test_parse_config("[mail]\nhost = \"smtp.example.com\"");
        let mut diag = ConfigDiagnostics::new();
        config.mail.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = MailConfig {
            password: Some("hunter2".into()),
            ..MailConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
