//! A stopwatch for timing an operation and emitting its duration as a
//! structured log field.

use std::time::{Duration, Instant};

/// Starts on construction; call [`Timer::stop`] to read the elapsed time.
#[derive(Debug)]
pub struct Timer {
    label: String,
    started_at: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self { label: label.into(), started_at: Instant::now() }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Consumes the timer, returning its label and elapsed duration.
    pub fn stop(self) -> (String, Duration) {
        (self.label, self.started_at.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_grows_monotonically() {
        let timer = Timer::start("op");
        let first = timer.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        let second = timer.elapsed();
        assert!(second >= first);
    }

    #[test]
    fn stop_returns_label_and_duration() {
        let timer = Timer::start("gossip_round");
        let (label, elapsed) = timer.stop();
        assert_eq!(label, "gossip_round");
        assert!(elapsed >= Duration::ZERO);
    }
}
