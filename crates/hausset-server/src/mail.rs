//! Mail transport for the contact relay.

use std::sync::{Arc, Mutex, PoisonError};

use hausset_core::{MailConfig, MailProvider};
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::{debug, info};

const SENDGRID_HOST: &str = "smtp.sendgrid.net";
const MAILGUN_HOST: &str = "smtp.mailgun.org";

/// Mail transport errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// The transport is not configured or does not answer.
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),

    /// The message could not be assembled (bad address, bad header).
    #[error("invalid message: {0}")]
    Message(String),

    /// The transport refused or failed to deliver the message.
    #[error("send failed: {0}")]
    Send(String),
}

/// Result type for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;

/// A message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from_name: String,
    pub from_address: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OutgoingEmail {
    fn to_message(&self) -> Result<Message> {
        let from_address: Address = self
            .from_address
            .parse()
            .map_err(|e| MailError::Message(format!("sender address: {e}")))?;
        let reply_to: Address = self
            .reply_to
            .parse()
            .map_err(|e| MailError::Message(format!("reply-to address: {e}")))?;
        let to: Address = self
            .to
            .parse()
            .map_err(|e| MailError::Message(format!("recipient address: {e}")))?;

        Message::builder()
            .from(Mailbox::new(Some(self.from_name.clone()), from_address))
            .reply_to(Mailbox::new(None, reply_to))
            .to(Mailbox::new(None, to))
            .subject(self.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                self.text.clone(),
                self.html.clone(),
            ))
            .map_err(|e| MailError::Message(e.to_string()))
    }
}

/// In-memory transport. Messages are kept and logged instead of sent.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    messages: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first.
    pub fn messages(&self) -> Vec<OutgoingEmail> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, email: OutgoingEmail) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email);
    }
}

/// Mail transport selected from configuration.
#[derive(Clone)]
pub enum Mailer {
    /// SMTP relay (plain SMTP, SendGrid or Mailgun).
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    /// In-memory outbox.
    Outbox(Outbox),
    /// No usable transport; carries the reason.
    Unavailable(String),
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smtp(_) => f.write_str("Mailer::Smtp"),
            Self::Outbox(outbox) => f
                .debug_tuple("Mailer::Outbox")
                .field(&outbox.messages().len())
                .finish(),
            Self::Unavailable(reason) => f.debug_tuple("Mailer::Unavailable").field(reason).finish(),
        }
    }
}

fn smtp_relay(host: &str, port: u16, username: &str, password: &str) -> Mailer {
    match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
        Ok(builder) => Mailer::Smtp(
            builder
                .port(port)
                .credentials(Credentials::new(username.to_string(), password.to_string()))
                .build(),
        ),
        Err(e) => Mailer::Unavailable(format!("cannot configure SMTP relay {host}: {e}")),
    }
}

impl Mailer {
    /// Select the transport described by `[mail]`.
    ///
    /// Missing credentials do not fail startup; they produce a mailer that
    /// reports itself unavailable on every delivery.
    pub fn from_config(config: &MailConfig) -> Self {
        let mailer = match config.provider {
            MailProvider::None => Self::Unavailable("no mail provider configured".to_string()),
            MailProvider::Outbox => Self::Outbox(Outbox::new()),
            MailProvider::Sendgrid => match &config.api_key {
                Some(key) => smtp_relay(SENDGRID_HOST, config.port, "apikey", key),
                None => Self::Unavailable("SendGrid API key not configured".to_string()),
            },
            MailProvider::Mailgun => match (&config.username, &config.password) {
                (Some(user), Some(pass)) => smtp_relay(MAILGUN_HOST, config.port, user, pass),
                _ => Self::Unavailable("Mailgun credentials not configured".to_string()),
            },
            MailProvider::Smtp => match (&config.username, &config.password) {
                (Some(user), Some(pass)) => smtp_relay(&config.host, config.port, user, pass),
                _ => Self::Unavailable("SMTP credentials not configured".to_string()),
            },
        };
        debug!(provider = ?config.provider, mailer = ?mailer, "mail transport selected");
        mailer
    }

    /// Check the transport can accept mail.
    pub async fn verify(&self) -> Result<()> {
        match self {
            Self::Smtp(transport) => match transport.test_connection().await {
                Ok(true) => Ok(()),
                Ok(false) => Err(MailError::Unavailable(
                    "SMTP server refused the connection".to_string(),
                )),
                Err(e) => Err(MailError::Unavailable(e.to_string())),
            },
            Self::Outbox(_) => Ok(()),
            Self::Unavailable(reason) => Err(MailError::Unavailable(reason.clone())),
        }
    }

    /// Deliver one message.
    pub async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        match self {
            Self::Smtp(transport) => {
                let message = email.to_message()?;
                transport
                    .send(message)
                    .await
                    .map_err(|e| MailError::Send(e.to_string()))?;
                Ok(())
            }
            Self::Outbox(outbox) => {
                info!(to = %email.to, subject = %email.subject, "message kept in outbox");
                debug!(text = %email.text, "outbox message body");
                outbox.push(email.clone());
                Ok(())
            }
            Self::Unavailable(reason) => Err(MailError::Unavailable(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from_name: "Jane \"JD\" Doe".to_string(),
            from_address: "noreply@hausset.com".to_string(),
            to: "hello@hausset.com".to_string(),
            reply_to: "jane@example.com".to_string(),
            subject: "[Hausset Contact] Hello".to_string(),
            text: "plain".to_string(),
            html: "<p>html</p>".to_string(),
        }
    }

    #[test]
    fn test_message_builds_with_quoted_name() {
        assert!(email().to_message().is_ok());
    }

    #[test]
    fn test_message_rejects_bad_recipient() {
        let mut e = email();
        e.to = "not an address".to_string();
        let err = e.to_message().expect_err("bad recipient");
        assert!(err.to_string().contains("recipient address"));
    }

    #[test]
    fn test_unconfigured_providers_are_unavailable() {
        let config = MailConfig::default();
        assert!(matches!(Mailer::from_config(&config), Mailer::Unavailable(_)));

        let config = MailConfig {
            provider: MailProvider::Sendgrid,
            ..MailConfig::default()
        };
        assert!(matches!(Mailer::from_config(&config), Mailer::Unavailable(_)));

        let config = MailConfig {
            provider: MailProvider::Smtp,
            username: Some("user".to_string()),
            ..MailConfig::default()
        };
        assert!(matches!(Mailer::from_config(&config), Mailer::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_configured_smtp_provider() {
        let config = MailConfig {
            provider: MailProvider::Sendgrid,
            api_key: Some("SG.test".to_string()),
            ..MailConfig::default()
        };
        assert!(matches!(Mailer::from_config(&config), Mailer::Smtp(_)));
    }

    #[tokio::test]
    async fn test_outbox_keeps_messages() {
        let outbox = Outbox::new();
        let mailer = Mailer::Outbox(outbox.clone());

        mailer.verify().await.expect("outbox always verifies");
        mailer.send(&email()).await.expect("send");

        let messages = outbox.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].reply_to, "jane@example.com");
    }

    #[tokio::test]
    async fn test_unavailable_mailer_fails_verify_and_send() {
        let mailer = Mailer::Unavailable("no mail provider configured".to_string());
        assert!(matches!(mailer.verify().await, Err(MailError::Unavailable(_))));
        assert!(matches!(mailer.send(&email()).await, Err(MailError::Unavailable(_))));
    }
}
