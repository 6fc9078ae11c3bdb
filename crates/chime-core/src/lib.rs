//! # Chime Core
//!
//! Shared foundation for the Chime notification pipeline: the notification
//! contract (one definition for every entry point), the error taxonomy,
//! time-slot identity, and configuration.

pub mod config;
pub mod error;
pub mod slot;
pub mod types;

pub use config::ChimeConfig;
pub use error::{ChimeError, Result};
pub use slot::{SEND_NOW, SlotId, slot_from_event_time, slot_from_send_time};
pub use types::{
    MessageContent, NotificationRequest, NotificationType, ScheduleType, generate_uid,
};
