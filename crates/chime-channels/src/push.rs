//! Push Channel — JSON POST to the configured push gateway.
//!
//! The gateway owns the platform plumbing (APNs/FCM tokens, retries); this
//! side just hands it the device token and the split message parts.

use async_trait::async_trait;

use chime_core::config::PushGatewayConfig;
use chime_core::error::{ChimeError, Result};
use chime_core::types::NotificationRequest;

use crate::ChannelSender;

pub struct PushSender {
    config: PushGatewayConfig,
    client: reqwest::Client,
}

impl PushSender {
    pub fn new(config: PushGatewayConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    fn name(&self) -> &str {
        "push"
    }

    async fn send(&self, request: &NotificationRequest) -> Result<()> {
        let settings = request
            .push_notification_settings
            .as_ref()
            .ok_or_else(|| ChimeError::Delivery("missing pushNotificationSettings".into()))?;

        let mut req = self
            .client
            .post(&self.config.gateway_url)
            .json(&serde_json::json!({
                "deviceToken": settings.device_token,
                "appId": settings.app_id,
                "title": request.message.title,
                "subtitle": request.message.subtitle,
                "body": request.message.body,
            }))
            .timeout(std::time::Duration::from_secs(10));

        if !self.config.api_key.is_empty() {
            req = req.header("x-api-key", &self.config.api_key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ChimeError::Delivery(format!("Push gateway send failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(ChimeError::Delivery(format!("Push gateway error {status}")));
        }

        tracing::info!("✅ Push notification sent: {}", request.message.title);
        Ok(())
    }
}
