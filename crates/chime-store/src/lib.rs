//! # Chime Store
//!
//! Object-store abstraction (get/put/delete/list with not-found-returns-
//! empty semantics) plus the typed views the pipeline works through:
//!
//! ```text
//! notifications/slots/{slot}/{uid}   pending notifications, one slot each
//! logs/{userId}                      append-only delivery log, ascending
//! userNotificationMetrics/{userId}   durable quota counters
//! ```

pub mod logs;
pub mod object;
pub mod quota;
pub mod slots;

pub use logs::{DeliveryLog, DeliveryLogEntry, DeliveryLogStore, DeliveryResult};
pub use object::{FsObjectStore, ObjectStore};
pub use quota::{QuotaStore, RateLimitRecord};
pub use slots::SlotStore;
