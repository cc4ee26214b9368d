//! Fixed-window rate limiting keyed by client address.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use hausset_core::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts submissions per client within a fixed window.
///
/// A client's window starts with its first submission and resets once
/// `window` has elapsed.
#[derive(Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_submissions,
            Duration::from_secs(config.window_secs),
        )
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an attempt from `client`. Returns `false` once the client is
    /// over its allowance for the current window.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop windows that have run out so the map does not grow unbounded.
        clients.retain(|_, w| now.duration_since(w.started) < self.window);

        let entry = clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max
    }

    /// Number of clients with an open window.
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_max_then_blocks() {
        let limiter = RateLimiter::new(5, Duration::from_secs(900));
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.check_at("1.2.3.4", now));
        }
        assert!(!limiter.check_at("1.2.3.4", now));
        assert!(!limiter.check_at("1.2.3.4", now + Duration::from_secs(60)));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(900));
        let now = Instant::now();
        assert!(limiter.check_at("a", now));
        assert!(!limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let now = Instant::now();
        assert!(limiter.check_at("a", now));
        assert!(limiter.check_at("a", now));
        assert!(!limiter.check_at("a", now + Duration::from_secs(9)));
        assert!(limiter.check_at("a", now + Duration::from_secs(10)));
    }

    #[test]
    fn test_expired_windows_are_dropped() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10));
        let now = Instant::now();
        limiter.check_at("a", now);
        limiter.check_at("b", now);
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.check_at("c", now + Duration::from_secs(11));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_count_saturates_at_max_value() {
        let limiter = RateLimiter::new(u32::MAX, Duration::from_secs(900));
        let now = Instant::now();
        limiter.clients.lock().expect("lock").insert(
            "a".to_string(),
            Window {
                started: now,
                count: u32::MAX - 1,
            },
        );

        assert!(limiter.check_at("a", now));
        assert!(limiter.check_at("a", now));
        assert_eq!(limiter.clients.lock().expect("lock")["a"].count, u32::MAX);
    }

    #[test]
    fn test_from_config_defaults() {
        let limiter = RateLimiter::from_config(&RateLimitConfig::default());
        assert_eq!(limiter.window(), Duration::from_secs(900));
        assert_eq!(limiter.max, 5);
    }
}
