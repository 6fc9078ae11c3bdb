//! Per-user quota record: `userNotificationMetrics/{userId}`.
//!
//! Durable counters, created lazily on first check and never deleted —
//! the windows self-expire.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chime_core::error::Result;

use crate::object::ObjectStore;

const QUOTA_PREFIX: &str = "userNotificationMetrics";

/// Sliding hourly/daily delivery counters for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    pub hourly_count: u32,
    pub hourly_window_start: DateTime<Utc>,
    pub daily_count: u32,
    pub daily_window_start: DateTime<Utc>,
}

impl RateLimitRecord {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            hourly_count: 0,
            hourly_window_start: now,
            daily_count: 0,
            daily_window_start: now,
        }
    }
}

/// Quota-record view of the object store.
#[derive(Clone)]
pub struct QuotaStore {
    store: Arc<dyn ObjectStore>,
}

impl QuotaStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn object_key(user_id: &str) -> String {
        format!("{QUOTA_PREFIX}/{user_id}.json")
    }

    pub fn read(&self, user_id: &str) -> Result<Option<RateLimitRecord>> {
        match self.store.get(&Self::object_key(user_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn write(&self, user_id: &str, record: &RateLimitRecord) -> Result<()> {
        let body = serde_json::to_vec_pretty(record)?;
        self.store.put(&Self::object_key(user_id), &body)
    }
}
