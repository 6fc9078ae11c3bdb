//! SMS Channel — Twilio Messages REST API.
//!
//! Title and body are combined into one text (push splits them, SMS can't).
//! Phone numbers get a US-biased best-effort E.164 normalization; an invalid
//! destination is a delivery failure for that request, never a crash.

use async_trait::async_trait;

use chime_core::config::TwilioConfig;
use chime_core::error::{ChimeError, Result};
use chime_core::types::{MessageContent, NotificationRequest};

use crate::ChannelSender;

pub struct SmsSender {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl SmsSender {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

/// Combine the split message parts for a single text.
fn sms_text(message: &MessageContent) -> String {
    format!("{} - {}", message.title, message.body)
}

/// Best-effort E.164 normalization, biased to US numbers.
fn normalize_e164(raw: &str) -> Option<String> {
    let plus = raw.trim().starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match (plus, digits.len()) {
        (true, 8..=15) => Some(format!("+{digits}")),
        (false, 10) => Some(format!("+1{digits}")),
        (false, 11) if digits.starts_with('1') => Some(format!("+{digits}")),
        _ => None,
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn name(&self) -> &str {
        "sms"
    }

    async fn send(&self, request: &NotificationRequest) -> Result<()> {
        let settings = request
            .sms_notification_settings
            .as_ref()
            .ok_or_else(|| ChimeError::Delivery("missing smsNotificationSettings".into()))?;

        let to = normalize_e164(&settings.phone_number).ok_or_else(|| {
            ChimeError::Delivery(format!(
                "invalid target phone number '{}'",
                settings.phone_number
            ))
        })?;
        let from = normalize_e164(&self.config.from_number).ok_or_else(|| {
            ChimeError::Delivery(format!(
                "invalid source phone number '{}'",
                self.config.from_number
            ))
        })?;

        let text = sms_text(&request.message);
        tracing::info!("texting {} chars to {to} ...", text.len());

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to.as_str()),
                ("From", from.as_str()),
                ("Body", text.as_str()),
            ])
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ChimeError::Delivery(format!("Twilio send failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChimeError::Delivery(format!(
                "Twilio API error {status}: {body}"
            )));
        }

        let sid = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v["sid"].as_str().map(str::to_owned))
            .unwrap_or_default();
        tracing::info!("✅ SMS sent to {to}, sid: {sid}");
        Ok(())
    }
}
