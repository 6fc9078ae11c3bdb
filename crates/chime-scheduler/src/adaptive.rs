//! Adaptive-timing callback — last-moment send-time override.
//!
//! A failing or slow callback must never sink the schedule operation; the
//! caller logs and keeps the originally computed slot.

use chime_core::config::CallbackConfig;
use chime_core::error::{ChimeError, Result};

/// Time-bounded GET client for the adaptive-timing endpoint.
pub struct AdaptiveTimingClient {
    api_key: String,
    api_key_header: String,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

impl AdaptiveTimingClient {
    pub fn new(config: &CallbackConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_key_header: config.api_key_header.clone(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch a replacement send time. The response body is the new
    /// timestamp string.
    pub async fn fetch_send_time(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(&self.api_key_header, &self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ChimeError::Callback(format!("GET {url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(ChimeError::Callback(format!(
                "adaptive-timing endpoint returned {}",
                resp.status()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ChimeError::Callback(format!("read body: {e}")))?;
        let body = body.trim().trim_matches('"').to_string();
        if body.is_empty() {
            return Err(ChimeError::Callback("empty adaptive-timing response".into()));
        }
        Ok(body)
    }
}
