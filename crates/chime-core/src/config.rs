//! Chime configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ChimeError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub limits: RateLimitConfig,
    #[serde(default)]
    pub callbacks: CallbackConfig,
    #[serde(default)]
    pub fanout: FanOutConfig,
    #[serde(default)]
    pub drain: DrainConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl ChimeConfig {
    /// Load config from the default path (~/.chime/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChimeError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ChimeError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ChimeError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Chime home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chime")
    }

    /// Resolve the object-store root directory.
    pub fn store_root(&self) -> PathBuf {
        match &self.store.root {
            Some(root) => root.clone(),
            None => Self::home_dir().join("data"),
        }
    }
}

/// Object-store backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory for the filesystem backend. Defaults to ~/.chime/data.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Per-user delivery quota limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_hourly_limit")]
    pub hourly_limit: u32,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
}

fn default_hourly_limit() -> u32 {
    5
}
fn default_daily_limit() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            hourly_limit: default_hourly_limit(),
            daily_limit: default_daily_limit(),
        }
    }
}

/// Adaptive-timing/content callback client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// API key sent on every callback request.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    #[serde(default = "default_callback_timeout")]
    pub timeout_secs: u64,
}

fn default_api_key_header() -> String {
    "x-api-key".into()
}
fn default_callback_timeout() -> u64 {
    10
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_key_header: default_api_key_header(),
            timeout_secs: default_callback_timeout(),
        }
    }
}

/// Fan-out channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutConfig {
    /// Topic endpoint drained notifications are POSTed to.
    #[serde(default)]
    pub topic_url: Option<String>,
    #[serde(default = "default_publish_timeout")]
    pub timeout_secs: u64,
}

fn default_publish_timeout() -> u64 {
    10
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            topic_url: None,
            timeout_secs: default_publish_timeout(),
        }
    }
}

/// Drain cadence for the in-process pipeline mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainConfig {
    #[serde(default = "default_drain_interval")]
    pub interval_secs: u64,
}

fn default_drain_interval() -> u64 {
    60
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_drain_interval(),
        }
    }
}

/// Channel transport configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub sms: Option<TwilioConfig>,
    #[serde(default)]
    pub email: Option<SmtpConfig>,
    #[serde(default)]
    pub push: Option<PushGatewayConfig>,
}

/// Twilio SMS transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// SMTP email transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Push gateway transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushGatewayConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub gateway_url: String,
    #[serde(default)]
    pub api_key: String,
}

fn bool_true() -> bool {
    true
}
