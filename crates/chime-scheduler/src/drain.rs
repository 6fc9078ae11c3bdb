//! Drain — list due slots and hand their contents to the fan-out channel.
//!
//! Two-speed by design: the `now` partition is drained every cycle, regular
//! slots only when the trigger lands on a 5-minute boundary. Safe to overlap
//! with itself — one-time deletes are idempotent and recurring re-publishes
//! are at-least-once anyway.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tracing::Instrument;

use chime_core::error::{ChimeError, Result};
use chime_core::slot::{SlotId, slot_from_event_time};
use chime_core::types::ScheduleType;
use chime_store::SlotStore;

use crate::fanout::FanOut;

pub struct Submitter {
    slots: SlotStore,
    fanout: Arc<dyn FanOut>,
}

/// Aggregate counts for one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Handed to the fan-out channel.
    pub submitted: usize,
    /// One-time items removed after hand-off.
    pub deleted: usize,
    /// Poisoned items logged and left behind.
    pub skipped: usize,
}

impl Submitter {
    pub fn new(slots: SlotStore, fanout: Arc<dyn FanOut>) -> Self {
        Self { slots, fanout }
    }

    /// Run one drain cycle against the given event clock.
    pub async fn drain(&self, correlation_id: &str, now: DateTime<Utc>) -> Result<DrainOutcome> {
        let span = tracing::info_span!("drain", correlation = %correlation_id);
        self.drain_inner(now).instrument(span).await
    }

    async fn drain_inner(&self, now: DateTime<Utc>) -> Result<DrainOutcome> {
        let mut due = vec![SlotId::Now];
        if now.minute() % 5 == 0 {
            due.push(slot_from_event_time(now));
        }

        let mut outcome = DrainOutcome::default();
        for slot in &due {
            let uids = self.slots.list_uids(slot)?;
            tracing::info!("processing {} notification(s) in slot {slot}", uids.len());
            for uid in uids {
                // One poisoned item must not block the rest of the cycle.
                match self.drain_one(slot, &uid).await {
                    Ok(deleted) => {
                        outcome.submitted += 1;
                        if deleted {
                            outcome.deleted += 1;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("⚠️ skipping '{uid}' in slot {slot}: {e}");
                        outcome.skipped += 1;
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// Publish one item; returns whether it was deleted (one-time).
    async fn drain_one(&self, slot: &SlotId, uid: &str) -> Result<bool> {
        let request = self.slots.get(slot, uid)?.ok_or_else(|| {
            ChimeError::Storage(format!("'{uid}' vanished from slot {slot} mid-drain"))
        })?;
        self.fanout.publish(&request).await?;
        if request.schedule_type == ScheduleType::OneTime {
            self.slots.delete(slot, uid)?;
            tracing::debug!("deleted one-time notification '{uid}' from slot {slot}");
            return Ok(true);
        }
        Ok(false)
    }
}
