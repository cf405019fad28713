//! Sliding-window request counter, the secondary admission check alongside
//! the token bucket.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tracks request timestamps within a trailing window and admits up to
/// `limit` per `size`.
#[derive(Debug)]
pub struct SlidingWindow {
    timestamps: VecDeque<Instant>,
    limit: u32,
    size: Duration,
}

impl SlidingWindow {
    pub fn new(limit: u32, size: Duration) -> Self {
        Self {
            timestamps: VecDeque::new(),
            limit,
            size,
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(&front) = self.timestamps.front() {
            if now.saturating_duration_since(front) > self.size {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record an attempt at `now`, returning `true` if it is admitted
    /// (i.e. the window was not already full).
    pub fn check_and_record(&mut self, now: Instant) -> bool {
        self.evict_expired(now);
        if self.timestamps.len() as u32 >= self.limit {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    /// Requests currently counted within the window.
    pub fn count(&mut self) -> u32 {
        self.evict_expired(Instant::now());
        self.timestamps.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_then_denies() {
        let mut window = SlidingWindow::new(2, Duration::from_secs(1));
        let now = Instant::now();
        assert!(window.check_and_record(now));
        assert!(window.check_and_record(now));
        assert!(!window.check_and_record(now));
    }

    #[test]
    fn expired_entries_free_up_capacity() {
        let mut window = SlidingWindow::new(1, Duration::from_millis(50));
        let now = Instant::now();
        assert!(window.check_and_record(now));
        let later = now + Duration::from_millis(100);
        assert!(window.check_and_record(later));
    }
}
