//! Adaptive-content callback — last-moment body override.
//!
//! Same contract as the timing callback: time-bounded, and any failure or
//! empty response means "no override available".

use chime_core::config::CallbackConfig;
use chime_core::error::{ChimeError, Result};

/// Time-bounded GET client for the content-adaptation endpoint.
pub struct ContentClient {
    api_key: String,
    api_key_header: String,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

impl ContentClient {
    pub fn new(config: &CallbackConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_key_header: config.api_key_header.clone(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch replacement message text.
    pub async fn fetch_content(&self, url: &str) -> Result<String> {
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
                "content endpoint returned {}",
                resp.status()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ChimeError::Callback(format!("read body: {e}")))?;
        let body = body.trim().to_string();
        if body.is_empty() {
            return Err(ChimeError::Callback("empty content response".into()));
        }
        Ok(body)
    }
}
