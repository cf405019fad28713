//! Token-bucket admission control.

use std::time::Instant;

/// Classic token bucket: `capacity` tokens refilled continuously at
/// `refill_per_sec`, each admitted request consuming one.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket with the given capacity and refill rate.
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            self.last_refill = now;
        }
    }

    /// Try to consume one token. Returns `true` if admitted.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available, for stats reporting.
    pub fn available(&mut self) -> f64 {
        self.refill(Instant::now());
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn exhausts_after_burst_size_requests() {
        let mut bucket = TokenBucket::new(3, 1.0);
        assert!(bucket.try_acquire_at(Instant::now()));
        assert!(bucket.try_acquire_at(Instant::now()));
        assert!(bucket.try_acquire_at(Instant::now()));
        assert!(!bucket.try_acquire_at(Instant::now()));
    }

    #[test]
    fn refills_over_time() {
        let mut bucket = TokenBucket::new(1, 10.0);
        assert!(bucket.try_acquire_at(Instant::now()));
        let later = Instant::now() + Duration::from_millis(200);
        assert!(bucket.try_acquire_at(later));
    }
}
