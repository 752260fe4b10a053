use std::hash::Hash;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// Fixed-window counters keyed by `K`.
struct WindowCounter<K: Eq + Hash> {
    entries: DashMap<K, (u32, Instant)>,
}

impl<K: Eq + Hash> WindowCounter<K> {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Seconds until the window for `key` resets, if it is at or above `limit`.
    fn blocked_for(&self, key: &K, limit: u32, window: Duration) -> Option<u64> {
        let entry = self.entries.get(key)?;
        let (count, start) = *entry.value();
        let elapsed = start.elapsed();
        if elapsed > window || count < limit {
            return None;
        }
        Some(window.as_secs().saturating_sub(elapsed.as_secs()))
    }

    fn increment(&self, key: K, window: Duration) {
        let now = Instant::now();
        let mut entry = self.entries.entry(key).or_insert((0, now));
        let (count, start) = entry.value_mut();
        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

/// Per-project-per-IP limiter for public group submissions.
pub struct SubmissionRateLimiter {
    counter: WindowCounter<(Uuid, IpAddr)>,
}

impl SubmissionRateLimiter {
    pub fn new() -> Self {
        Self {
            counter: WindowCounter::new(),
        }
    }

    /// Counts the attempt. Returns Err with retry-after seconds when over the limit.
    pub fn check(&self, project_id: Uuid, ip: IpAddr, limit: u32, window_secs: u64) -> Result<(), u64> {
        let window = Duration::from_secs(window_secs);
        let key = (project_id, ip);
        if let Some(retry_after) = self.counter.blocked_for(&key, limit, window) {
            return Err(retry_after);
        }
        self.counter.increment(key, window);
        Ok(())
    }

    pub fn cleanup(&self, max_age: Duration) {
        self.counter.cleanup(max_age);
    }
}

impl Default for SubmissionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

const LOGIN_MAX_FAILURES: u32 = 5;
const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-username login brute force limiter: 5 failures per 15 minutes.
pub struct LoginRateLimiter {
    counter: WindowCounter<String>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            counter: WindowCounter::new(),
        }
    }

    /// Does not count the attempt; call `record_failure()` on a bad password.
    pub fn check(&self, username: &str) -> Result<(), u64> {
        match self
            .counter
            .blocked_for(&username.to_lowercase(), LOGIN_MAX_FAILURES, LOGIN_WINDOW)
        {
            Some(retry_after) => Err(retry_after),
            None => Ok(()),
        }
    }

    pub fn record_failure(&self, username: &str) {
        self.counter.increment(username.to_lowercase(), LOGIN_WINDOW);
    }

    pub fn cleanup(&self, max_age: Duration) {
        self.counter.cleanup(max_age);
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submissions_blocked_after_limit() {
        let limiter = SubmissionRateLimiter::new();
        let project = Uuid::now_v7();
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(project, ip, 3, 60).is_ok());
        }
        let retry = limiter.check(project, ip, 3, 60).unwrap_err();
        assert!(retry <= 60);

        let other_ip: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check(project, other_ip, 3, 60).is_ok());
        assert!(limiter.check(Uuid::now_v7(), ip, 3, 60).is_ok());
    }

    #[test]
    fn login_blocks_after_five_failures_any_case() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("Prof");
            assert!(limiter.check("prof").is_ok());
        }
        limiter.record_failure("PROF");
        assert!(limiter.check("prof").is_err());
        assert!(limiter.check("someone-else").is_ok());
    }

    #[test]
    fn cleanup_drops_old_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failure("prof");
        limiter.cleanup(Duration::ZERO);
        assert_eq!(limiter.counter.entries.len(), 0);
    }
}
