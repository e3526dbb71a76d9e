//! Archive delivery by email.

use std::fs;
use std::io;
use std::path::PathBuf;

use lettre::address::AddressError;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Certificate, Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use super::ArchiveInfo;
use crate::config::MailConfig;
use crate::utils::mime::types::ZIP;

/// Port on which SMTP expects TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid {0} address")]
    Address(&'static str, #[source] AddressError),

    #[error("cannot read `{0}`")]
    Read(PathBuf, #[source] io::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] lettre::transport::smtp::Error),

    #[error("invalid attachment type: {0}")]
    ContentType(#[from] ContentTypeErr),

    #[error("cannot build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[source] lettre::transport::smtp::Error),
}

/// Sends a finished archive somewhere outside the process.
pub trait Mailer: Send + Sync {
    fn send_archive(&self, archive: &ArchiveInfo) -> Result<(), MailError>;
}

/// SMTP delivery through lettre.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
    subject: String,
}

impl SmtpMailer {
    /// Build a mailer from `[mail]`. Returns `None` when mail is not configured.
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>, MailError> {
        let (Some(host), Some(from), Some(to)) = (&config.host, &config.from, &config.to) else {
            return Ok(None);
        };

        let from: Mailbox = from.parse().map_err(|e| MailError::Address("from", e))?;
        let to: Mailbox = to.parse().map_err(|e| MailError::Address("to", e))?;

        let mut builder = SmtpTransport::builder_dangerous(host.as_str()).port(config.port);

        if config.tls {
            let mut params = TlsParameters::builder(host.clone());
            if let Some(ca_cert) = &config.ca_cert {
                let pem = fs::read(ca_cert).map_err(|e| MailError::Read(ca_cert.clone(), e))?;
                let cert = Certificate::from_pem(&pem).map_err(MailError::Tls)?;
                params = params.add_root_certificate(cert);
            }
            let params = params.build().map_err(MailError::Tls)?;
            builder = builder.tls(if config.port == IMPLICIT_TLS_PORT {
                Tls::Wrapper(params)
            } else {
                Tls::Required(params)
            });
        }

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from,
            to,
            subject: config.subject.clone(),
        }))
    }
}

impl Mailer for SmtpMailer {
    fn send_archive(&self, archive: &ArchiveInfo) -> Result<(), MailError> {
        let bytes = fs::read(&archive.path).map_err(|e| MailError::Read(archive.path.clone(), e))?;
        let message = build_message(&self.from, &self.to, &self.subject, archive, bytes)?;
        self.transport.send(&message).map_err(MailError::Smtp)?;
        Ok(())
    }
}

fn build_message(
    from: &Mailbox,
    to: &Mailbox,
    subject: &str,
    archive: &ArchiveInfo,
    bytes: Vec<u8>,
) -> Result<Message, MailError> {
    let body = format!(
        "Your website has been published.\n\nThe attached archive contains {} file(s).\n",
        archive.entries
    );
    let attachment = Attachment::new(archive.file_name()).body(bytes, ContentType::parse(ZIP)?);

    Ok(Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body))
                .singlepart(attachment),
        )?)
}
