//! Run-summary email notification.
//!
//! After a full rotation pass the binary mails a short summary with the
//! registry document attached, through a plain internal SMTP relay. The
//! whole feature sits behind an enabled flag and is fire-and-forget: a
//! notification failure is the caller's to log, never to propagate.

use std::collections::HashSet;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{Message, SmtpTransport, Transport};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while building or sending the summary notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Mail is enabled but the configuration is incomplete or unusable.
    #[error("notification configuration error: {0}")]
    Configuration(String),

    /// The message could not be assembled.
    #[error("invalid notification message: {0}")]
    Message(String),

    /// The SMTP relay refused or failed the send.
    #[error("failed to send notification: {0}")]
    Send(String),
}

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Summary notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Whether the summary email is sent at all.
    #[serde(default)]
    pub enabled: bool,
    /// SMTP relay host.
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Display name of the sender.
    pub sender_name: Option<String>,
    /// Sender address.
    pub from_address: Option<String>,
    /// Recipient addresses; invalid entries are skipped with a warning.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Message subject.
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_smtp_port() -> u16 {
    25
}

fn default_subject() -> String {
    "Managed portal account rotation".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            sender_name: None,
            from_address: None,
            recipients: Vec::new(),
            subject: default_subject(),
        }
    }
}

/// Sends the rotation run summary over SMTP.
pub struct Notifier {
    config: MailConfig,
}

impl Notifier {
    /// Create a notifier.
    #[must_use]
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Create a disabled notifier.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(MailConfig::default())
    }

    /// Whether the summary email is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send the run summary with the registry document attached.
    ///
    /// A no-op `Ok` when the feature is disabled. This call blocks on the
    /// SMTP exchange; run it off the async runtime.
    pub fn send_summary(
        &self,
        body: &str,
        attachment_name: &str,
        attachment: &[u8],
    ) -> NotifyResult<()> {
        if !self.config.enabled {
            debug!("mail notification disabled, skipping summary");
            return Ok(());
        }

        let host = self
            .config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifyError::Configuration("SMTP host not configured".to_string()))?;

        let message = self.build_message(body, attachment_name, attachment)?;

        // The relay is an internal plaintext listener; no TLS or auth.
        let mailer = SmtpTransport::builder_dangerous(host)
            .port(self.config.smtp_port)
            .build();
        mailer
            .send(&message)
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        info!(
            relay = host,
            attachment = attachment_name,
            "rotation summary emailed"
        );
        Ok(())
    }

    fn build_message(
        &self,
        body: &str,
        attachment_name: &str,
        attachment: &[u8],
    ) -> NotifyResult<Message> {
        let sender_name = self.config.sender_name.as_deref().ok_or_else(|| {
            NotifyError::Configuration("sender name not configured".to_string())
        })?;
        let from_address = self.config.from_address.as_deref().ok_or_else(|| {
            NotifyError::Configuration("sender address not configured".to_string())
        })?;
        let from: Mailbox = format!("{sender_name} <{from_address}>")
            .parse()
            .map_err(|e| NotifyError::Configuration(format!("invalid sender address: {e}")))?;

        let mut builder = Message::builder()
            .from(from)
            .subject(self.config.subject.clone());
        for recipient in self.valid_recipients()? {
            builder = builder.to(recipient);
        }

        let content_type = ContentType::parse("application/json")
            .map_err(|e| NotifyError::Message(e.to_string()))?;
        builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body.to_string()))
                    .singlepart(
                        Attachment::new(attachment_name.to_string())
                            .body(attachment.to_vec(), content_type),
                    ),
            )
            .map_err(|e| NotifyError::Message(e.to_string()))
    }

    /// Parse and dedupe the configured recipients. Invalid addresses are
    /// skipped with a warning; having none left is a configuration error.
    fn valid_recipients(&self) -> NotifyResult<Vec<Mailbox>> {
        let mut seen = HashSet::new();
        let mut recipients = Vec::new();
        for raw in &self.config.recipients {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<Mailbox>() {
                Ok(mailbox) => {
                    if seen.insert(mailbox.email.to_string().to_lowercase()) {
                        recipients.push(mailbox);
                    }
                }
                Err(e) => {
                    warn!(address = raw, error = %e, "skipping invalid recipient address");
                }
            }
        }
        if recipients.is_empty() {
            return Err(NotifyError::Configuration(
                "no valid recipient address".to_string(),
            ));
        }
        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_config() -> MailConfig {
        MailConfig {
            enabled: true,
            smtp_host: Some("relay.internal".to_string()),
            sender_name: Some("Rotation Bot".to_string()),
            from_address: Some("rotation@example.com".to_string()),
            recipients: vec!["ops@example.com".to_string()],
            ..MailConfig::default()
        }
    }

    #[test]
    fn disabled_notifier_is_a_no_op() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());
        notifier.send_summary("body", "registry.json", b"{}").unwrap();
    }

    #[test]
    fn missing_relay_host_is_a_configuration_error() {
        let config = MailConfig {
            smtp_host: None,
            ..enabled_config()
        };
        let err = Notifier::new(config)
            .send_summary("body", "registry.json", b"{}")
            .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }

    #[test]
    fn recipients_are_deduped_and_invalid_ones_skipped() {
        let config = MailConfig {
            recipients: vec![
                "ops@example.com".to_string(),
                "not-an-address".to_string(),
                "OPS@example.com".to_string(),
                String::new(),
                "second@example.com".to_string(),
            ],
            ..enabled_config()
        };
        let recipients = Notifier::new(config).valid_recipients().unwrap();
        assert_eq!(recipients.len(), 2);
    }

    #[test]
    fn no_valid_recipient_is_a_configuration_error() {
        let config = MailConfig {
            recipients: vec!["nope".to_string(), String::new()],
            ..enabled_config()
        };
        let err = Notifier::new(config).valid_recipients().unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }

    #[test]
    fn message_carries_body_and_attachment() {
        let notifier = Notifier::new(enabled_config());
        let message = notifier
            .build_message("2 rotated, 0 failed", "registry.json", b"{\"sheets\":{}}")
            .unwrap();
        let rendered = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(rendered.contains("Managed portal account rotation"));
        assert!(rendered.contains("registry.json"));
        assert!(rendered.contains("multipart/mixed"));
    }

    #[test]
    fn missing_sender_is_a_configuration_error() {
        let config = MailConfig {
            sender_name: None,
            ..enabled_config()
        };
        let err = Notifier::new(config)
            .build_message("body", "registry.json", b"{}")
            .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }
}
