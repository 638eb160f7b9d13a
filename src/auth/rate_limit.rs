//! Per-email sign-in attempt limiting

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use super::AuthError;

/// Default attempt budget per email per window
pub const DEFAULT_ATTEMPTS_PER_MINUTE: u32 = 10;

/// Fixed-window attempt counter keyed by normalized email
pub struct LoginRateLimiter {
    attempts_per_window: u32,
    window: Duration,
    counts: RwLock<HashMap<String, (u32, Instant)>>,
}

impl LoginRateLimiter {
    pub fn new(attempts_per_minute: u32) -> Self {
        Self::with_window(attempts_per_minute, Duration::from_secs(60))
    }

    pub fn with_window(attempts_per_window: u32, window: Duration) -> Self {
        Self {
            attempts_per_window,
            window,
            counts: RwLock::new(HashMap::new()),
        }
    }

    /// Count an attempt, failing once the budget is spent
    pub fn check(&self, email: &str) -> Result<(), AuthError> {
        let mut counts = self.counts.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        // Drop emails whose window has passed
        counts.retain(|_, (_, started)| now.duration_since(*started) < self.window);

        let entry = counts.entry(normalize(email)).or_insert((0, now));

        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }

        if entry.0 >= self.attempts_per_window {
            return Err(AuthError::TooManyRequests);
        }

        entry.0 += 1;

        Ok(())
    }

    /// Attempts left in the current window
    pub fn remaining(&self, email: &str) -> u32 {
        let counts = self.counts.read().unwrap_or_else(PoisonError::into_inner);

        match counts.get(&normalize(email)) {
            Some((count, started)) => {
                if Instant::now().duration_since(*started) >= self.window {
                    self.attempts_per_window
                } else {
                    self.attempts_per_window.saturating_sub(*count)
                }
            }
            None => self.attempts_per_window,
        }
    }

    /// Number of emails with an open window
    pub fn tracked(&self) -> usize {
        self.counts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forget an email's attempts (after a successful sign-in)
    pub fn reset(&self, email: &str) {
        self.counts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize(email));
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS_PER_MINUTE)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter() {
        let limiter = LoginRateLimiter::new(5);
        let key = "clerk@ranchiuniversity.ac.in";

        for _ in 0..5 {
            assert!(limiter.check(key).is_ok());
        }

        assert_eq!(limiter.check(key), Err(AuthError::TooManyRequests));
    }

    #[test]
    fn test_remaining_and_normalization() {
        let limiter = LoginRateLimiter::new(10);

        assert_eq!(limiter.remaining("HR@Company.com"), 10);
        limiter.check(" hr@company.com").unwrap();
        assert_eq!(limiter.remaining("HR@Company.com"), 9);

        limiter.reset("hr@company.com");
        assert_eq!(limiter.remaining("hr@company.com"), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expires() {
        let limiter = LoginRateLimiter::new(1);
        limiter.check("a@b.co").unwrap();
        assert!(limiter.check("a@b.co").is_err());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.remaining("a@b.co"), 1);
        assert!(limiter.check("a@b.co").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_windows_are_pruned() {
        let limiter = LoginRateLimiter::new(3);
        for n in 0..5 {
            limiter.check(&format!("user{n}@college.edu")).unwrap();
        }
        assert_eq!(limiter.tracked(), 5);

        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.check("late@college.edu").unwrap();
        assert_eq!(limiter.tracked(), 1);
    }
}
