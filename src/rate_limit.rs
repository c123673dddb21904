use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Fixed-window attempt counter keyed by lowercased email.
pub struct AttemptLimiter {
    limit: u32,
    window: Duration,
    /// email -> (count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl AttemptLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            entries: DashMap::new(),
        }
    }

    /// 5 failed logins per email per 15 minutes.
    pub fn login() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }

    /// 3 reset requests per email per hour.
    pub fn password_reset() -> Self {
        Self::new(3, Duration::from_secs(60 * 60))
    }

    /// Check without counting. Err carries retry-after seconds.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let Some(entry) = self.entries.get(&key.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = *entry.value();
        self.verdict(now, count, start)
    }

    /// Count one attempt, whatever its outcome.
    pub fn record(&self, key: &str) {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Check and count in one step.
    pub fn hit(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }
        self.verdict(now, *count, *start)?;
        *count += 1;
        Ok(())
    }

    pub fn clear(&self, key: &str) {
        self.entries.remove(&key.to_lowercase());
    }

    /// Drop entries whose window has passed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < self.window);
    }

    fn verdict(&self, now: Instant, count: u32, start: Instant) -> Result<(), u64> {
        let elapsed = now.duration_since(start);
        if elapsed > self.window || count < self.limit {
            return Ok(());
        }
        Err(self.window.as_secs().saturating_sub(elapsed.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_does_not_count() {
        let limiter = AttemptLimiter::new(2, Duration::from_secs(60));
        for _ in 0..10 {
            assert!(limiter.check("a@example.com").is_ok());
        }
    }

    #[test]
    fn blocks_after_limit_failures() {
        let limiter = AttemptLimiter::login();
        for _ in 0..5 {
            assert!(limiter.check("A@Example.com").is_ok());
            limiter.record("A@Example.com");
        }
        let retry = limiter.check("a@example.com").unwrap_err();
        assert!(retry > 0 && retry <= 15 * 60);
        assert!(limiter.check("b@example.com").is_ok());
    }

    #[test]
    fn hit_counts_and_blocks() {
        let limiter = AttemptLimiter::password_reset();
        assert!(limiter.hit("a@example.com").is_ok());
        assert!(limiter.hit("a@example.com").is_ok());
        assert!(limiter.hit("a@example.com").is_ok());
        assert!(limiter.hit("a@example.com").is_err());
    }

    #[test]
    fn clear_resets_the_key() {
        let limiter = AttemptLimiter::new(1, Duration::from_secs(60));
        limiter.record("a@example.com");
        assert!(limiter.check("a@example.com").is_err());
        limiter.clear("a@example.com");
        assert!(limiter.check("a@example.com").is_ok());
    }

    #[test]
    fn window_expiry_resets() {
        let limiter = AttemptLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.hit("a@example.com").is_ok());
        assert!(limiter.hit("a@example.com").is_err());
        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.hit("a@example.com").is_ok());

        std::thread::sleep(Duration::from_millis(40));
        limiter.cleanup();
        assert!(limiter.entries.is_empty());
    }
}
