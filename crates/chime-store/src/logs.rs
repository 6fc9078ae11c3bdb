//! Per-user delivery log: `logs/{userId}` → `{messages: [...]}`.
//!
//! Append-only, kept ascending by actual send time. Entries are never
//! mutated or removed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chime_core::error::Result;
use chime_core::types::{MessageContent, NotificationType};

use crate::object::ObjectStore;

const LOG_PREFIX: &str = "logs";

/// One delivery attempt, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLogEntry {
    pub message_id: String,
    pub message: MessageContent,
    /// What the request asked for.
    pub send_time_utc: String,
    /// When dispatch actually happened.
    pub actual_send_time_utc: DateTime<Utc>,
    pub notification_type: NotificationType,
    pub result: DeliveryResult,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryResult {
    Success,
    Failure,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryLog {
    pub messages: Vec<DeliveryLogEntry>,
}

/// Delivery-log view of the object store.
#[derive(Clone)]
pub struct DeliveryLogStore {
    store: Arc<dyn ObjectStore>,
}

impl DeliveryLogStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn object_key(user_id: &str) -> String {
        format!("{LOG_PREFIX}/{user_id}.json")
    }

    /// Read a user's log; users with no deliveries yet get an empty one.
    pub fn read(&self, user_id: &str) -> Result<DeliveryLog> {
        match self.store.get(&Self::object_key(user_id))? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(DeliveryLog::default()),
        }
    }

    /// Append an entry, keeping the log ascending by actual send time.
    pub fn append(&self, user_id: &str, entry: DeliveryLogEntry) -> Result<()> {
        let mut log = self.read(user_id)?;
        log.messages.push(entry);
        log.messages.sort_by_key(|m| m.actual_send_time_utc);
        let body = serde_json::to_vec_pretty(&log)?;
        self.store.put(&Self::object_key(user_id), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::FsObjectStore;
    use chrono::TimeZone;

    fn entry(message_id: &str, at: DateTime<Utc>) -> DeliveryLogEntry {
        DeliveryLogEntry {
            message_id: message_id.into(),
            message: MessageContent {
                title: "Daily check-in".into(),
                subtitle: None,
                body: "Time to log your day".into(),
                content_callback_url: None,
            },
            send_time_utc: "13:55".into(),
            actual_send_time_utc: at,
            notification_type: NotificationType::Sms,
            result: DeliveryResult::Success,
        }
    }

    #[test]
    fn test_append_keeps_ascending_order() {
        let dir = std::env::temp_dir().join("chime-test-logs-order");
        std::fs::remove_dir_all(&dir).ok();
        let logs = DeliveryLogStore::new(Arc::new(FsObjectStore::new(&dir)));

        let t1 = Utc.with_ymd_and_hms(2023, 12, 26, 13, 55, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2023, 12, 26, 14, 0, 0).unwrap();

        // append out of order
        logs.append("user123", entry("second", t2)).unwrap();
        logs.append("user123", entry("first", t1)).unwrap();

        let log = logs.read("user123").unwrap();
        let ids: Vec<_> = log.messages.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_user_reads_empty() {
        let dir = std::env::temp_dir().join("chime-test-logs-empty");
        std::fs::remove_dir_all(&dir).ok();
        let logs = DeliveryLogStore::new(Arc::new(FsObjectStore::new(&dir)));
        assert!(logs.read("user999").unwrap().messages.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
