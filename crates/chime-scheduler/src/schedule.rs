//! Schedule-or-cancel entry — placement, dedup, relocation, cancellation.
//!
//! Upholds the placement invariant: after any successful call, the request's
//! Uid lives in exactly the target slot and nowhere else. A failure partway
//! through stale-copy deletion can transiently leave more than one live
//! copy; the next schedule call for the same Uid reconciles, and the drain
//! side tolerates the duplicate in the meantime.

use std::sync::Arc;

use tracing::Instrument;

use chime_core::error::Result;
use chime_core::slot::{SEND_NOW, SlotId, slot_from_send_time};
use chime_core::types::{NotificationRequest, NotificationType};
use chime_store::SlotStore;

use crate::adaptive::AdaptiveTimingClient;
use crate::fanout::FanOut;

pub struct Scheduler {
    slots: SlotStore,
    fanout: Arc<dyn FanOut>,
    timing: AdaptiveTimingClient,
}

/// What a schedule call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Written to its target slot (relocating as needed).
    Placed { slot: SlotId },
    /// Fast path: handed straight to the fan-out channel.
    Published,
    /// Cancellation: removed from this many slots.
    Cancelled { removed: usize },
}

impl Scheduler {
    pub fn new(slots: SlotStore, fanout: Arc<dyn FanOut>, timing: AdaptiveTimingClient) -> Self {
        Self {
            slots,
            fanout,
            timing,
        }
    }

    /// Schedule, relocate, or cancel one notification.
    pub async fn schedule(
        &self,
        correlation_id: &str,
        request: &NotificationRequest,
    ) -> Result<ScheduleOutcome> {
        let span = tracing::info_span!("schedule", correlation = %correlation_id);
        self.schedule_inner(request).instrument(span).await
    }

    async fn schedule_inner(&self, request: &NotificationRequest) -> Result<ScheduleOutcome> {
        request.validate()?;
        let uid = request.uid();

        if request.notification_type == NotificationType::None {
            let removed = self.cancel(&uid)?;
            tracing::info!("🗑️ cancelled '{uid}' ({removed} copies removed)");
            return Ok(ScheduleOutcome::Cancelled { removed });
        }

        // Fast path: don't make operators wait out a drain cycle.
        if request.send_time_utc == SEND_NOW {
            self.fanout.publish(request).await?;
            tracing::info!("⚡ fast-pathed '{uid}' to the fan-out channel");
            return Ok(ScheduleOutcome::Published);
        }

        let target = self.resolve_target_slot(request).await?;

        // Remove stale copies everywhere else; a copy already in the target
        // slot is simply overwritten below.
        for slot in self.slots.slots_containing(&uid)? {
            if slot != target {
                self.slots.delete(&slot, &uid)?;
                tracing::debug!("removed stale copy of '{uid}' from slot {slot}");
            }
        }

        // Unconditional write: content must reflect the latest request even
        // when the slot didn't change.
        self.slots.put(&target, &uid, request)?;
        tracing::info!("📌 placed '{uid}' in slot {target}");
        Ok(ScheduleOutcome::Placed { slot: target })
    }

    /// Delete every live copy of a Uid. Idempotent.
    fn cancel(&self, uid: &str) -> Result<usize> {
        let found = self.slots.slots_containing(uid)?;
        for slot in &found {
            self.slots.delete(slot, uid)?;
        }
        Ok(found.len())
    }

    /// Target slot from the request, with an optional adaptive override.
    async fn resolve_target_slot(&self, request: &NotificationRequest) -> Result<SlotId> {
        let target = slot_from_send_time(&request.send_time_utc)?;
        if !request.enable_adaptive_timing {
            return Ok(target);
        }
        let Some(url) = request.adaptive_timing_callback_url.as_deref() else {
            return Ok(target);
        };
        match self.timing.fetch_send_time(url).await {
            Ok(adapted) => match slot_from_send_time(&adapted) {
                Ok(slot) => {
                    tracing::info!("adaptive timing moved '{}' to slot {slot}", request.uid());
                    Ok(slot)
                }
                Err(e) => {
                    tracing::warn!("adaptive timing returned an unusable time, keeping {target}: {e}");
                    Ok(target)
                }
            },
            Err(e) => {
                tracing::warn!("adaptive timing callback failed, keeping {target}: {e}");
                Ok(target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_core::config::CallbackConfig;
    use chime_core::error::ChimeError;
    use chime_core::types::{MessageContent, ScheduleType, SmsSettings, UniqueProperties};
    use chime_store::FsObjectStore;
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::fanout::MemoryFanOut;

    fn request(message_id: &str, send_time: &str) -> NotificationRequest {
        NotificationRequest {
            unique_properties: UniqueProperties {
                user_id: "user123".into(),
                message_id: message_id.into(),
            },
            message: MessageContent {
                title: "Daily check-in".into(),
                subtitle: None,
                body: "Time to log your day".into(),
                content_callback_url: None,
            },
            schedule_type: ScheduleType::Recurring,
            notification_type: NotificationType::Sms,
            sms_notification_settings: Some(SmsSettings {
                phone_number: "212-555-0100".into(),
            }),
            email_notification_settings: None,
            push_notification_settings: None,
            send_time_utc: send_time.into(),
            enable_adaptive_timing: false,
            adaptive_timing_callback_url: None,
        }
    }

    fn scheduler(
        name: &str,
    ) -> (
        Scheduler,
        SlotStore,
        UnboundedReceiver<NotificationRequest>,
        std::path::PathBuf,
    ) {
        let dir = std::env::temp_dir().join(format!("chime-test-sched-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        let slots = SlotStore::new(Arc::new(FsObjectStore::new(&dir)));
        let (fanout, rx) = MemoryFanOut::channel();
        let scheduler = Scheduler::new(
            slots.clone(),
            Arc::new(fanout),
            AdaptiveTimingClient::new(&CallbackConfig::default()),
        );
        (scheduler, slots, rx, dir)
    }

    #[tokio::test]
    async fn test_new_notification_is_placed() {
        let (scheduler, slots, _rx, dir) = scheduler("place");
        let req = request("dailyReminder", "2023-12-26T02:35:00Z");

        let outcome = scheduler.schedule("test", &req).await.unwrap();
        assert_eq!(
            outcome,
            ScheduleOutcome::Placed {
                slot: SlotId::at(2, 35)
            }
        );
        let stored = slots
            .get(&SlotId::at(2, 35), "user123-dailyReminder")
            .unwrap()
            .unwrap();
        assert_eq!(stored.unique_properties.message_id, "dailyReminder");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_reschedule_relocates_single_copy() {
        let (scheduler, slots, _rx, dir) = scheduler("relocate");
        let uid = "user123-dailyReminder";

        scheduler
            .schedule("test", &request("dailyReminder", "2019-01-01T13:57:00Z"))
            .await
            .unwrap();
        scheduler
            .schedule("test", &request("dailyReminder", "2023-12-26T02:35:00Z"))
            .await
            .unwrap();

        assert!(slots.get(&SlotId::at(13, 55), uid).unwrap().is_none());
        assert!(slots.get(&SlotId::at(2, 35), uid).unwrap().is_some());
        assert_eq!(slots.slots_containing(uid).unwrap(), vec![SlotId::at(2, 35)]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_same_slot_reschedule_rewrites_content() {
        let (scheduler, slots, _rx, dir) = scheduler("rewrite");

        scheduler
            .schedule("test", &request("dailyReminder", "13:55"))
            .await
            .unwrap();
        let mut updated = request("dailyReminder", "13:57");
        updated.message.title = "Updated title".into();
        scheduler.schedule("test", &updated).await.unwrap();

        let uid = "user123-dailyReminder";
        assert_eq!(slots.slots_containing(uid).unwrap(), vec![SlotId::at(13, 55)]);
        let stored = slots.get(&SlotId::at(13, 55), uid).unwrap().unwrap();
        assert_eq!(stored.message.title, "Updated title");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_cancel_removes_all_copies_and_is_idempotent() {
        let (scheduler, slots, _rx, dir) = scheduler("cancel");

        scheduler
            .schedule("test", &request("dailyReminder", "13:55"))
            .await
            .unwrap();

        let mut cancel = request("dailyReminder", "13:55");
        cancel.notification_type = NotificationType::None;
        cancel.sms_notification_settings = None;

        let outcome = scheduler.schedule("test", &cancel).await.unwrap();
        assert_eq!(outcome, ScheduleOutcome::Cancelled { removed: 1 });
        assert!(
            slots
                .slots_containing("user123-dailyReminder")
                .unwrap()
                .is_empty()
        );

        // cancelling nothing is a no-op, not an error
        let outcome = scheduler.schedule("test", &cancel).await.unwrap();
        assert_eq!(outcome, ScheduleOutcome::Cancelled { removed: 0 });

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_send_now_bypasses_placement() {
        let (scheduler, slots, mut rx, dir) = scheduler("fastpath");

        let outcome = scheduler
            .schedule("test", &request("dailyReminder", "now"))
            .await
            .unwrap();
        assert_eq!(outcome, ScheduleOutcome::Published);

        let published = rx.try_recv().unwrap();
        assert_eq!(published.uid(), "user123-dailyReminder");
        assert!(
            slots
                .slots_containing("user123-dailyReminder")
                .unwrap()
                .is_empty()
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_invalid_request_mutates_nothing() {
        let (scheduler, slots, _rx, dir) = scheduler("invalid");

        let mut req = request("dailyReminder", "13:55");
        req.unique_properties.user_id = "usr".into();
        let err = scheduler.schedule("test", &req).await.unwrap_err();
        assert!(matches!(err, ChimeError::Validation(_)));
        assert!(slots.list_slots().unwrap().is_empty());

        // unparseable send time is fatal to the request, nothing written
        let req = request("dailyReminder", "25:00");
        let err = scheduler.schedule("test", &req).await.unwrap_err();
        assert!(matches!(err, ChimeError::TimeFormat(_)));
        assert!(slots.list_slots().unwrap().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
