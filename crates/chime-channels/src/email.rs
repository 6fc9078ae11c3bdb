//! Email Channel — SMTP sending via async lettre.
//!
//! Subject comes from the message title, the body goes out as HTML. When the
//! request carries an unsubscribe URL it is emitted as a `List-Unsubscribe`
//! header so mail clients surface their native opt-out.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as LettreMessage, Tokio1Executor};

use chime_core::config::SmtpConfig;
use chime_core::error::{ChimeError, Result};
use chime_core::types::NotificationRequest;

use crate::ChannelSender;

#[derive(Debug, Clone)]
struct ListUnsubscribe(String);

impl Header for ListUnsubscribe {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("List-Unsubscribe")
    }

    fn parse(s: &str) -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.into()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

pub struct EmailSender {
    config: SmtpConfig,
}

impl EmailSender {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, request: &NotificationRequest) -> Result<()> {
        let settings = request
            .email_notification_settings
            .as_ref()
            .ok_or_else(|| ChimeError::Delivery("missing emailNotificationSettings".into()))?;

        let from_mailbox: Mailbox = settings
            .from_email_address
            .parse()
            .map_err(|e| ChimeError::Delivery(format!("Invalid from: {e}")))?;
        let to_mailbox: Mailbox = settings
            .to_email_address
            .parse()
            .map_err(|e| ChimeError::Delivery(format!("Invalid to: {e}")))?;

        tracing::info!(
            "sending email to {}, subject: {}",
            settings.to_email_address,
            request.message.title
        );

        let mut builder = LettreMessage::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(request.message.title.as_str())
            .header(ContentType::TEXT_HTML);

        if let Some(unsubscribe_url) = &settings.unsubscribe_url {
            builder = builder.header(ListUnsubscribe(format!("<{unsubscribe_url}>")));
        }

        let email = builder
            .body(request.message.body.clone())
            .map_err(|e| ChimeError::Delivery(format!("Build email: {e}")))?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| ChimeError::Delivery(format!("SMTP relay: {e}")))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| ChimeError::Delivery(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Email sent to: {}", settings.to_email_address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_unsubscribe_header_shape() {
        let header = ListUnsubscribe("<https://example.com/unsub>".into());
        assert_eq!(ListUnsubscribe::name().to_string(), "List-Unsubscribe");
        assert!(
            header
                .display()
                .to_string()
                .contains("https://example.com/unsub")
        );
    }
}
