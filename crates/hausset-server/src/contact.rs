//! Contact relay: turns a validated submission into an email.

use chrono::{DateTime, Utc};
use hausset_core::{Config, ContactSubmission};
use thiserror::Error;
use tracing::{error, info};

use crate::mail::{MailError, Mailer, OutgoingEmail};

/// Relay failures, each mapped to one visitor-facing message.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Transport check failed before sending.
    #[error("Email service unavailable. Please try again later.")]
    Unavailable(#[source] MailError),

    /// Sending failed after the transport checked out.
    #[error("Failed to send message. Please try again later.")]
    Send(#[source] MailError),
}

/// Forwards contact submissions to the site inbox.
#[derive(Debug, Clone)]
pub struct ContactRelay {
    mailer: Mailer,
    recipient: String,
    sender: String,
    subject_prefix: String,
}

impl ContactRelay {
    pub fn new(mailer: Mailer, recipient: impl Into<String>) -> Self {
        let recipient = recipient.into();
        Self {
            mailer,
            sender: recipient.clone(),
            recipient,
            subject_prefix: "[Hausset Contact]".to_string(),
        }
    }

    /// Build the relay from `[contact]` and `[mail]`.
    pub fn from_config(config: &Config) -> Self {
        let sender = config
            .mail
            .from
            .clone()
            .or_else(|| config.mail.username.clone().filter(|u| u.contains('@')))
            .unwrap_or_else(|| config.contact.recipient.clone());

        Self {
            mailer: Mailer::from_config(&config.mail),
            recipient: config.contact.recipient.clone(),
            sender,
            subject_prefix: config.contact.subject_prefix.clone(),
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    /// Compose the email for an already validated submission.
    pub fn compose(&self, submission: &ContactSubmission, sent_at: DateTime<Utc>) -> OutgoingEmail {
        let sent_at = sent_at.format("%Y-%m-%d %H:%M:%S UTC");
        let company_text = submission
            .company
            .as_ref()
            .map(|c| format!("Company: {c}\n"))
            .unwrap_or_default();
        let company_html = submission
            .company
            .as_ref()
            .map(|c| format!("<p><strong>Company:</strong> {}</p>", html_escape(c)))
            .unwrap_or_default();

        let text = format!(
            "New Contact Form Submission\n\n\
             Name: {name}\n\
             Email: {email}\n\
             {company_text}\
             Subject: {subject}\n\n\
             Message:\n{message}\n\n\
             Sent from Hausset website at {sent_at}\n",
            name = submission.name,
            email = submission.email,
            subject = submission.subject,
            message = submission.message,
        );

        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #4285f4; border-bottom: 2px solid #4285f4; padding-bottom: 10px;">New Contact Form Submission</h2>
  <div style="background: #f9f9f9; padding: 20px; border-radius: 5px; margin: 20px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> {email}</p>
    {company_html}
    <p><strong>Subject:</strong> {subject}</p>
  </div>
  <div style="background: white; padding: 20px; border-left: 4px solid #4285f4;">
    <h3>Message:</h3>
    <p style="line-height: 1.6;">{message}</p>
  </div>
  <p style="font-size: 12px; color: #666;">Sent from Hausset website contact form at {sent_at}</p>
</div>"#,
            name = html_escape(&submission.name),
            email = html_escape(&submission.email),
            subject = html_escape(&submission.subject),
            message = html_escape(&submission.message).replace('\n', "<br>"),
        );

        OutgoingEmail {
            from_name: submission.name.clone(),
            from_address: self.sender.clone(),
            to: self.recipient.clone(),
            reply_to: submission.email.clone(),
            subject: format!("{} {}", self.subject_prefix, submission.subject),
            text,
            html,
        }
    }

    /// Verify the transport, then send the submission.
    pub async fn relay(&self, submission: &ContactSubmission) -> Result<(), RelayError> {
        if let Err(e) = self.mailer.verify().await {
            error!(error = %e, "email configuration error");
            return Err(RelayError::Unavailable(e));
        }

        let email = self.compose(submission, Utc::now());
        if let Err(e) = self.mailer.send(&email).await {
            error!(error = %e, "contact form delivery failed");
            return Err(RelayError::Send(e));
        }

        info!(
            name = %submission.name,
            email = %submission.email,
            "contact form submitted"
        );
        Ok(())
    }
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::mail::Outbox;

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Jane <b>Doe</b>".to_string(),
            email: "jane@example.com".to_string(),
            company: Some("Acme & Co".to_string()),
            subject: "Early access".to_string(),
            message: "Line one\nLine two".to_string(),
        }
    }

    fn sent_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).single().expect("valid date")
    }

    #[test]
    fn test_compose_headers() {
        let relay = ContactRelay::new(Mailer::Outbox(Outbox::new()), "hello@hausset.com")
            .with_sender("noreply@hausset.com");
        let email = relay.compose(&submission(), sent_at());

        assert_eq!(email.to, "hello@hausset.com");
        assert_eq!(email.from_address, "noreply@hausset.com");
        assert_eq!(email.from_name, "Jane <b>Doe</b>");
        assert_eq!(email.reply_to, "jane@example.com");
        assert_eq!(email.subject, "[Hausset Contact] Early access");
    }

    #[test]
    fn test_compose_bodies() {
        let relay = ContactRelay::new(Mailer::Outbox(Outbox::new()), "hello@hausset.com");
        let email = relay.compose(&submission(), sent_at());

        assert!(email.text.contains("Company: Acme & Co\n"));
        assert!(email.text.contains("Line one\nLine two"));
        assert!(email.text.contains("2025-03-04 05:06:07 UTC"));

        assert!(email.html.contains("Jane &lt;b&gt;Doe&lt;/b&gt;"));
        assert!(email.html.contains("Acme &amp; Co"));
        assert!(email.html.contains("Line one<br>Line two"));
    }

    #[test]
    fn test_compose_without_company() {
        let relay = ContactRelay::new(Mailer::Outbox(Outbox::new()), "hello@hausset.com");
        let mut s = submission();
        s.company = None;
        let email = relay.compose(&s, sent_at());
        assert!(!email.text.contains("Company:"));
        assert!(!email.html.contains("Company:"));
    }

    #[test]
    fn test_sender_falls_back_to_username_then_recipient() {
        let mut config = Config::default();
        assert_eq!(ContactRelay::from_config(&config).sender, "hello@hausset.com");

        config.mail.username = Some("apikey".to_string());
        assert_eq!(ContactRelay::from_config(&config).sender, "hello@hausset.com");

        config.mail.username = Some("mailer@hausset.com".to_string());
        assert_eq!(ContactRelay::from_config(&config).sender, "mailer@hausset.com");

        config.mail.from = Some("site@hausset.com".to_string());
        assert_eq!(ContactRelay::from_config(&config).sender, "site@hausset.com");
    }

    #[tokio::test]
    async fn test_relay_delivers_through_outbox() {
        let outbox = Outbox::new();
        let relay = ContactRelay::new(Mailer::Outbox(outbox.clone()), "hello@hausset.com");

        relay.relay(&submission()).await.expect("relayed");
        assert_eq!(outbox.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_relay_unavailable_transport() {
        let relay = ContactRelay::new(
            Mailer::Unavailable("no mail provider configured".to_string()),
            "hello@hausset.com",
        );
        let err = relay.relay(&submission()).await.expect_err("unavailable");
        assert!(matches!(err, RelayError::Unavailable(_)));
        assert_eq!(
            err.to_string(),
            "Email service unavailable. Please try again later."
        );
    }
}
