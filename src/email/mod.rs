pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;

use crate::config::{MailConfig, ResendConfig, SmtpConfig};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OutgoingEmail {
    pub fn password_reset(to: &str, reset_url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset your TailTrack password".to_string(),
            html: templates::render_password_reset(reset_url),
            text: templates::render_password_reset_text(reset_url),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String>;
}

/// Build the configured transport, or `None` when mail is disabled or the
/// SMTP relay cannot be set up.
pub fn from_config(config: &MailConfig) -> Option<Arc<dyn Mailer>> {
    match config {
        MailConfig::Disabled => None,
        MailConfig::Smtp(smtp) => match SmtpMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("SMTP mailer configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("SMTP mailer not available: {e}");
                None
            }
        },
        MailConfig::Resend(resend) => {
            tracing::info!("Resend mailer configured");
            Some(Arc::new(ResendMailer::new(resend)))
        }
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

/// Resend-compatible HTTP API mailer.
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(config: &ResendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String> {
        let body = json!({
            "from": self.from,
            "to": [email.to],
            "subject": email.subject,
            "html": email.html,
            "text": email.text,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Failed to reach mail API: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("Mail API returned {status}: {detail}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_reset_email_carries_the_link() {
        let email = OutgoingEmail::password_reset(
            "sam@example.com",
            "https://tailtrack.app/reset-password?token=abc123",
        );
        assert_eq!(email.to, "sam@example.com");
        assert!(email.html.contains("token=abc123"));
        assert!(email.text.contains("token=abc123"));
        assert!(email.text.contains("1 hour"));
    }

    #[test]
    fn disabled_config_builds_no_mailer() {
        assert!(from_config(&MailConfig::Disabled).is_none());
    }
}
