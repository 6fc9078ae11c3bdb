//! Typed view over the slot partition: `notifications/slots/{slot}/{uid}`.
//!
//! The store is logically `SlotId → Map<Uid, NotificationRequest>`, with the
//! placement invariant (a Uid lives in at most one slot) upheld by the
//! scheduler, not here.

use std::sync::Arc;

use chime_core::error::Result;
use chime_core::slot::SlotId;
use chime_core::types::NotificationRequest;

use crate::object::ObjectStore;

const SLOT_PREFIX: &str = "notifications/slots";

/// Slot-partition view of the object store.
#[derive(Clone)]
pub struct SlotStore {
    store: Arc<dyn ObjectStore>,
}

impl SlotStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn object_key(slot: &SlotId, uid: &str) -> String {
        format!("{SLOT_PREFIX}/{slot}/{uid}.json")
    }

    pub fn get(&self, slot: &SlotId, uid: &str) -> Result<Option<NotificationRequest>> {
        match self.store.get(&Self::object_key(slot, uid))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put(&self, slot: &SlotId, uid: &str, request: &NotificationRequest) -> Result<()> {
        let body = serde_json::to_vec_pretty(request)?;
        self.store.put(&Self::object_key(slot, uid), &body)
    }

    pub fn delete(&self, slot: &SlotId, uid: &str) -> Result<()> {
        self.store.delete(&Self::object_key(slot, uid))
    }

    /// List the Uids present in one slot.
    pub fn list_uids(&self, slot: &SlotId) -> Result<Vec<String>> {
        let names = self.store.list(&format!("{SLOT_PREFIX}/{slot}"))?;
        Ok(names
            .into_iter()
            .map(|n| n.strip_suffix(".json").map(str::to_owned).unwrap_or(n))
            .collect())
    }

    /// List every slot partition present in the store.
    ///
    /// Partition names that are not valid slot ids are skipped with a
    /// warning rather than failing the scan.
    pub fn list_slots(&self) -> Result<Vec<SlotId>> {
        let names = self.store.list(SLOT_PREFIX)?;
        let mut slots = Vec::with_capacity(names.len());
        for name in names {
            match name.parse::<SlotId>() {
                Ok(slot) => slots.push(slot),
                Err(_) => tracing::warn!("skipping unrecognized slot partition '{name}'"),
            }
        }
        Ok(slots)
    }

    /// Full-namespace scan: every slot whose partition contains `uid`.
    ///
    /// O(slots × items) — fine while the live notification count stays
    /// modest, and the first place to add a Uid→slot index if it stops
    /// being fine.
    pub fn slots_containing(&self, uid: &str) -> Result<Vec<SlotId>> {
        let mut found = Vec::new();
        for slot in self.list_slots()? {
            if self.list_uids(&slot)?.iter().any(|u| u == uid) {
                found.push(slot);
            }
        }
        Ok(found)
    }
}
