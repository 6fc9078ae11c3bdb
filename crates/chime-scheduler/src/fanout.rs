//! Fan-out channel — hands notifications to the processor side.
//!
//! At-least-once, no ordering guarantee. The HTTP implementation posts to a
//! topic endpoint; the in-memory one backs the single-process pipeline mode
//! and tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use chime_core::config::FanOutConfig;
use chime_core::error::{ChimeError, Result};
use chime_core::types::NotificationRequest;

#[async_trait]
pub trait FanOut: Send + Sync {
    async fn publish(&self, request: &NotificationRequest) -> Result<()>;
}

/// Publishes the request JSON to a topic endpoint.
pub struct HttpFanOut {
    url: String,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

impl HttpFanOut {
    pub fn new(config: &FanOutConfig) -> Result<Self> {
        let url = config
            .topic_url
            .clone()
            .ok_or_else(|| ChimeError::Config("fanout.topic_url is not set".into()))?;
        Ok(Self {
            url,
            timeout: std::time::Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl FanOut for HttpFanOut {
    async fn publish(&self, request: &NotificationRequest) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ChimeError::Publish(format!("POST {}: {e}", self.url)))?;
        if !resp.status().is_success() {
            return Err(ChimeError::Publish(format!(
                "topic endpoint returned {}",
                resp.status()
            )));
        }
        tracing::debug!("published {} to {}", request.uid(), self.url);
        Ok(())
    }
}

/// Stand-in for deployments with no fan-out configured — publishing fails
/// loudly instead of silently dropping the notification.
pub struct NullFanOut;

#[async_trait]
impl FanOut for NullFanOut {
    async fn publish(&self, request: &NotificationRequest) -> Result<()> {
        Err(ChimeError::Publish(format!(
            "cannot publish '{}': fanout.topic_url is not set",
            request.uid()
        )))
    }
}

/// In-process fan-out over an unbounded tokio channel.
pub struct MemoryFanOut {
    tx: mpsc::UnboundedSender<NotificationRequest>,
}

impl MemoryFanOut {
    /// Create the fan-out plus the receiving end the processor loop drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl FanOut for MemoryFanOut {
    async fn publish(&self, request: &NotificationRequest) -> Result<()> {
        self.tx
            .send(request.clone())
            .map_err(|_| ChimeError::Publish("fan-out channel closed".into()))
    }
}
