//! # Chime Channels
//!
//! Transport integrations the processor routes to: SMS (Twilio), email
//! (SMTP), push (HTTP gateway). Each follows the same `ChannelSender`
//! trait; the registry picks one by notification type.

pub mod email;
pub mod push;
pub mod sms;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use chime_core::config::ChannelConfig;
use chime_core::error::{ChimeError, Result};
use chime_core::types::{NotificationRequest, NotificationType};

pub use email::EmailSender;
pub use push::PushSender;
pub use sms::SmsSender;

/// A channel transport.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, request: &NotificationRequest) -> Result<()>;
}

/// Routes a request to the sender configured for its notification type.
#[derive(Default)]
pub struct SenderRegistry {
    senders: HashMap<NotificationType, Arc<dyn ChannelSender>>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from config — only enabled channels register.
    pub fn from_config(config: &ChannelConfig) -> Self {
        let mut registry = Self::new();
        if let Some(sms) = &config.sms
            && sms.enabled
        {
            registry.register(NotificationType::Sms, Arc::new(SmsSender::new(sms.clone())));
        }
        if let Some(email) = &config.email
            && email.enabled
        {
            registry.register(
                NotificationType::Email,
                Arc::new(EmailSender::new(email.clone())),
            );
        }
        if let Some(push) = &config.push
            && push.enabled
        {
            registry.register(
                NotificationType::Push,
                Arc::new(PushSender::new(push.clone())),
            );
        }
        registry
    }

    pub fn register(&mut self, channel: NotificationType, sender: Arc<dyn ChannelSender>) {
        self.senders.insert(channel, sender);
    }

    /// Dispatch to the matching sender.
    pub async fn send(&self, request: &NotificationRequest) -> Result<()> {
        let sender = self.senders.get(&request.notification_type).ok_or_else(|| {
            ChimeError::Delivery(format!(
                "no sender configured for channel {}",
                request.notification_type
            ))
        })?;
        sender.send(request).await
    }
}
