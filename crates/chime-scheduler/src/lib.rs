//! # Chime Scheduler
//!
//! The scheduling side of the pipeline: slot placement with dedup and
//! relocation, cancellation, the cron-driven drain, and the fan-out channel
//! that hands due notifications to the processor.
//!
//! ## Architecture
//! ```text
//! schedule request ──▶ Scheduler ──▶ slot store (one copy per Uid)
//!                          │
//!                          └─ sendTimeUtc == "now" ─▶ fan-out (fast path)
//!
//! cron trigger ──▶ Submitter.drain(now)
//!                    ├── slot "now"          every cycle
//!                    └── slot HH-MM          when minute % 5 == 0
//!                          └─▶ fan-out ─▶ processor (one-time: deleted)
//! ```

pub mod adaptive;
pub mod drain;
pub mod fanout;
pub mod schedule;

pub use adaptive::AdaptiveTimingClient;
pub use drain::{DrainOutcome, Submitter};
pub use fanout::{FanOut, HttpFanOut, MemoryFanOut, NullFanOut};
pub use schedule::{ScheduleOutcome, Scheduler};
