//! # Chime Processor
//!
//! The delivery side of the pipeline: consumes fanned-out notifications,
//! re-validates them, applies per-user quotas, optionally adapts the message
//! body, routes to a channel sender, and records the outcome in the
//! per-user delivery log.

pub mod content;
pub mod process;
pub mod rate_limit;

pub use content::ContentClient;
pub use process::{ProcessOutcome, Processor};
pub use rate_limit::RateLimiter;
