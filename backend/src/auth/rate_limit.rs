//! Fixed-window attempt counter for authentication endpoints.
//!
//! Entries live for the lifetime of the process and are never evicted; the
//! map is shared by every request handled by this instance only.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ServiceError, ServiceResult};
use crate::utils::clock::Clock;

struct RateLimitEntry {
    count: u32,
    reset_at: i64,
}

/// In-memory rate limiter keyed by `action:client`.
pub struct RateLimiter {
    max_attempts: u32,
    window_ms: i64,
    clock: Arc<dyn Clock>,
    attempts: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_attempts,
            window_ms: i64::try_from(window_ms).unwrap_or(i64::MAX),
            clock,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Records an attempt for `key`, failing once `max_attempts` have already
    /// been made in the current window.
    pub fn assert_within_limit(&self, key: &str) -> ServiceResult<()> {
        let now = self.clock.now_ms();
        let mut attempts = self.attempts.lock();

        if let Some(entry) = attempts.get_mut(key) {
            if entry.reset_at > now {
                if entry.count >= self.max_attempts {
                    tracing::warn!(key = %key, "Rate limit exceeded");
                    return Err(ServiceError::rate_limited("Too many requests"));
                }
                entry.count += 1;
                return Ok(());
            }
        }

        attempts.insert(
            key.to_string(),
            RateLimitEntry {
                count: 1,
                reset_at: now.saturating_add(self.window_ms),
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ManualClock;

    fn limiter(max: u32, window_ms: u64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(1_000_000));
        (RateLimiter::new(max, window_ms, clock.clone()), clock)
    }

    #[test]
    fn test_blocks_after_max_attempts() {
        let (limiter, _) = limiter(3, 60_000);

        for _ in 0..3 {
            assert!(limiter.assert_within_limit("login:1.2.3.4").is_ok());
        }
        let err = limiter.assert_within_limit("login:1.2.3.4").unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited { .. }));

        // Blocked attempts do not extend the window
        assert!(limiter.assert_within_limit("login:1.2.3.4").is_err());
    }

    #[test]
    fn test_window_reset() {
        let (limiter, clock) = limiter(2, 60_000);

        limiter.assert_within_limit("refresh:a").unwrap();
        limiter.assert_within_limit("refresh:a").unwrap();
        assert!(limiter.assert_within_limit("refresh:a").is_err());

        clock.advance(59_999);
        assert!(limiter.assert_within_limit("refresh:a").is_err());

        // reset_at <= now starts a fresh window
        clock.advance(1);
        assert!(limiter.assert_within_limit("refresh:a").is_ok());
        assert!(limiter.assert_within_limit("refresh:a").is_ok());
        assert!(limiter.assert_within_limit("refresh:a").is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _) = limiter(1, 60_000);

        limiter.assert_within_limit("login:a").unwrap();
        assert!(limiter.assert_within_limit("login:a").is_err());
        assert!(limiter.assert_within_limit("login:b").is_ok());
        assert!(limiter.assert_within_limit("refresh:a").is_ok());
    }

    #[test]
    fn test_concurrent_attempts_are_counted_once_each() {
        let (limiter, _) = limiter(50, 60_000);
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| limiter.assert_within_limit("login:shared").is_ok())
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }
}
