//! Time-slot identity and derivation.
//!
//! A slot is a 5-minute UTC partition (`HH-MM`) or the special `now`
//! partition. Two derivation policies coexist on purpose:
//! - placement (`slot_from_send_time`) floors the minute, so a request is
//!   never placed in a slot later than the time it asked for;
//! - the drain clock (`slot_from_event_time`) rounds to nearest, absorbing
//!   trigger jitter around the 5-minute boundary.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{ChimeError, Result};

/// The literal send-time token that bypasses slot placement.
pub const SEND_NOW: &str = "now";

/// Slot granularity in minutes.
const SLOT_MINUTES: u32 = 5;

/// A time-slot partition identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    /// The immediate partition, drained every cycle.
    Now,
    /// A 5-minute UTC partition. Minute is always a multiple of 5.
    At { hour: u8, minute: u8 },
}

impl SlotId {
    pub fn at(hour: u32, minute: u32) -> Self {
        debug_assert!(hour < 24 && minute < 60 && minute % SLOT_MINUTES == 0);
        Self::At {
            hour: hour as u8,
            minute: minute as u8,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Now => write!(f, "{SEND_NOW}"),
            SlotId::At { hour, minute } => write!(f, "{hour:02}-{minute:02}"),
        }
    }
}

impl FromStr for SlotId {
    type Err = ChimeError;

    fn from_str(s: &str) -> Result<Self> {
        if s == SEND_NOW {
            return Ok(SlotId::Now);
        }
        let invalid = || ChimeError::Storage(format!("not a slot id: {s}"));
        let (h, m) = s.split_once('-').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        if hour >= 24 || minute >= 60 || minute % SLOT_MINUTES != 0 {
            return Err(invalid());
        }
        Ok(SlotId::at(hour, minute))
    }
}

/// Derive the placement slot from a request's `sendTimeUtc`.
///
/// Accepts the literal `now`, a bare `HH:MM` time-of-day, or an ISO-8601
/// instant. The minute is floored to the slot boundary.
pub fn slot_from_send_time(send_time: &str) -> Result<SlotId> {
    if send_time == SEND_NOW {
        return Ok(SlotId::Now);
    }
    let (hour, minute) = if let Ok(t) = NaiveTime::parse_from_str(send_time, "%H:%M") {
        (t.hour(), t.minute())
    } else if let Ok(t) = DateTime::parse_from_rfc3339(send_time) {
        let t = t.with_timezone(&Utc);
        (t.hour(), t.minute())
    } else {
        return Err(ChimeError::TimeFormat(format!(
            "expected 'now', HH:MM, or an ISO-8601 instant, got '{send_time}'"
        )));
    };
    Ok(SlotId::at(hour, minute - minute % SLOT_MINUTES))
}

/// Derive the drain slot from the trigger's event clock.
///
/// Rounds the minute to the nearest slot boundary, carrying into the next
/// hour (wrapping past midnight) when rounding reaches 60.
pub fn slot_from_event_time(event_time: DateTime<Utc>) -> SlotId {
    let hour = event_time.hour();
    let minute = event_time.minute();
    let rounded = (minute + SLOT_MINUTES / 2) / SLOT_MINUTES * SLOT_MINUTES;
    if rounded == 60 {
        SlotId::at((hour + 1) % 24, 0)
    } else {
        SlotId::at(hour, rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slot_from_iso_instant_floors() {
        let cases = [
            ("2019-01-01T00:00:00Z", "00-00"),
            ("2019-01-01T00:01:00Z", "00-00"),
            ("2019-01-01T00:04:00Z", "00-00"),
            ("2019-01-01T00:05:00Z", "00-05"),
            ("2019-01-01T00:06:00Z", "00-05"),
            ("2019-01-01T00:10:00Z", "00-10"),
            ("2019-01-01T13:55:00Z", "13-55"),
            ("2019-01-01T13:57:00Z", "13-55"),
            ("2019-01-01T13:59:00Z", "13-55"),
        ];
        for (input, expected) in cases {
            assert_eq!(slot_from_send_time(input).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_slot_from_time_of_day_floors() {
        let cases = [
            ("00:00", "00-00"),
            ("00:01", "00-00"),
            ("00:04", "00-00"),
            ("00:05", "00-05"),
            ("00:06", "00-05"),
            ("00:10", "00-10"),
            ("13:55", "13-55"),
            ("13:57", "13-55"),
            ("13:59", "13-55"),
        ];
        for (input, expected) in cases {
            assert_eq!(slot_from_send_time(input).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_slot_from_now_token() {
        assert_eq!(slot_from_send_time("now").unwrap(), SlotId::Now);
    }

    #[test]
    fn test_slot_from_invalid_input() {
        for input in ["invalid", "25:00", "00:60", "2019-01-01", ""] {
            let err = slot_from_send_time(input).unwrap_err();
            assert!(matches!(err, ChimeError::TimeFormat(_)), "input: {input}");
        }
    }

    #[test]
    fn test_event_time_rounds_to_nearest() {
        let t = Utc.with_ymd_and_hms(2023, 12, 26, 3, 38, 0).unwrap();
        assert_eq!(slot_from_event_time(t).to_string(), "03-40");

        let t = Utc.with_ymd_and_hms(2023, 12, 26, 3, 37, 0).unwrap();
        assert_eq!(slot_from_event_time(t).to_string(), "03-35");

        let t = Utc.with_ymd_and_hms(2023, 12, 26, 3, 40, 0).unwrap();
        assert_eq!(slot_from_event_time(t).to_string(), "03-40");
    }

    #[test]
    fn test_event_time_carries_into_next_hour() {
        let t = Utc.with_ymd_and_hms(2023, 12, 26, 3, 58, 0).unwrap();
        assert_eq!(slot_from_event_time(t).to_string(), "04-00");

        let t = Utc.with_ymd_and_hms(2023, 12, 26, 23, 59, 0).unwrap();
        assert_eq!(slot_from_event_time(t).to_string(), "00-00");
    }

    #[test]
    fn test_slot_id_round_trip() {
        for s in ["now", "00-00", "13-55", "23-00"] {
            assert_eq!(s.parse::<SlotId>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_slot_id_rejects_bad_names() {
        for s in ["24-00", "12-03", "12-60", "1-05", "noon", "1200"] {
            assert!(s.parse::<SlotId>().is_err(), "name: {s}");
        }
    }
}
