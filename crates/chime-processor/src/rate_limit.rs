//! Per-user sliding-window delivery quotas.
//!
//! The quota is consumed and persisted before any delivery side effect, so a
//! downstream failure can never bypass the cap on retry. The converse — a
//! consumed quota on a send that then fails — is the accepted bias against
//! over-notifying.

use chrono::{DateTime, Duration, Utc};

use chime_core::config::RateLimitConfig;
use chime_core::error::Result;
use chime_store::{QuotaStore, RateLimitRecord};

pub struct RateLimiter {
    quotas: QuotaStore,
    hourly_limit: u32,
    daily_limit: u32,
}

impl RateLimiter {
    pub fn new(quotas: QuotaStore, config: &RateLimitConfig) -> Self {
        Self {
            quotas,
            hourly_limit: config.hourly_limit,
            daily_limit: config.daily_limit,
        }
    }

    /// Check-and-consume one delivery for a user at the given instant.
    ///
    /// Denials mutate nothing durable. The per-user record is created
    /// lazily and never deleted — expired windows reset on the next check.
    pub fn try_consume(&self, user_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut record = self
            .quotas
            .read(user_id)?
            .unwrap_or_else(|| RateLimitRecord::fresh(now));

        if now - record.hourly_window_start >= Duration::hours(1) {
            record.hourly_count = 0;
            record.hourly_window_start = now;
        }
        if now - record.daily_window_start >= Duration::hours(24) {
            record.daily_count = 0;
            record.daily_window_start = now;
        }

        if record.hourly_count >= self.hourly_limit || record.daily_count >= self.daily_limit {
            tracing::info!(
                "rate limit reached for user {user_id} (hourly {}/{}, daily {}/{})",
                record.hourly_count,
                self.hourly_limit,
                record.daily_count,
                self.daily_limit
            );
            return Ok(false);
        }

        record.hourly_count += 1;
        record.daily_count += 1;
        self.quotas.write(user_id, &record)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_store::FsObjectStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn limiter(name: &str, hourly: u32, daily: u32) -> (RateLimiter, QuotaStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("chime-test-ratelimit-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        let quotas = QuotaStore::new(Arc::new(FsObjectStore::new(&dir)));
        let limiter = RateLimiter::new(
            quotas.clone(),
            &RateLimitConfig {
                hourly_limit: hourly,
                daily_limit: daily,
            },
        );
        (limiter, quotas, dir)
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 26, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_denies_after_hourly_limit_without_increment() {
        let (limiter, quotas, dir) = limiter("hourly", 3, 100);
        let now = at(10, 0);

        for _ in 0..3 {
            assert!(limiter.try_consume("user123", now).unwrap());
        }
        assert!(!limiter.try_consume("user123", now).unwrap());

        let record = quotas.read("user123").unwrap().unwrap();
        assert_eq!(record.hourly_count, 3);
        assert_eq!(record.daily_count, 3);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_hourly_window_elapses() {
        let (limiter, _quotas, dir) = limiter("window", 1, 100);

        assert!(limiter.try_consume("user123", at(10, 0)).unwrap());
        assert!(!limiter.try_consume("user123", at(10, 59)).unwrap());
        // one hour on from the window start, the count resets
        assert!(limiter.try_consume("user123", at(11, 0)).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_daily_limit_outlives_hourly_resets() {
        let (limiter, _quotas, dir) = limiter("daily", 100, 2);

        assert!(limiter.try_consume("user123", at(1, 0)).unwrap());
        assert!(limiter.try_consume("user123", at(5, 0)).unwrap());
        // hourly window has long reset; the daily cap still holds
        assert!(!limiter.try_consume("user123", at(9, 0)).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_users_are_independent() {
        let (limiter, _quotas, dir) = limiter("independent", 1, 100);
        let now = at(10, 0);

        assert!(limiter.try_consume("user123", now).unwrap());
        assert!(!limiter.try_consume("user123", now).unwrap());
        assert!(limiter.try_consume("user456", now).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }
}
