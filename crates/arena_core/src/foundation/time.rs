//! Time management utilities
//!
//! Simulation code is frame-stepped, so throttling uses [`Cooldown`], which
//! only advances when the caller feeds it a delta time. [`Stopwatch`] measures
//! real elapsed time and is only used for diagnostics.

use std::time::{Duration, Instant};

/// Frame-stepped throttle: becomes ready once `interval` seconds have been ticked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    interval: f32,
    elapsed: f32,
}

impl Cooldown {
    /// Create a cooldown that starts ready
    pub const fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: interval,
        }
    }

    /// Create a cooldown that has to wait a full interval first
    pub const fn started(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Advance by `delta_time` seconds
    pub fn tick(&mut self, delta_time: f32) {
        if delta_time.is_finite() && delta_time > 0.0 {
            self.elapsed = (self.elapsed + delta_time).min(self.interval.max(0.0));
        }
    }

    /// True once a full interval has elapsed since the last reset
    pub fn is_ready(&self) -> bool {
        self.elapsed >= self.interval
    }

    /// Start waiting again from zero
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Seconds left until ready
    pub fn remaining(&self) -> f32 {
        (self.interval - self.elapsed).max(0.0)
    }

    /// Configured interval in seconds
    pub const fn interval(&self) -> f32 {
        self.interval
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Instant,
}

impl Stopwatch {
    /// Create a stopwatch running from now
    pub fn start_new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_starts_ready_and_waits_after_reset() {
        let mut cooldown = Cooldown::new(0.5);
        assert!(cooldown.is_ready());

        cooldown.reset();
        assert!(!cooldown.is_ready());
        cooldown.tick(0.25);
        assert!(!cooldown.is_ready());
        cooldown.tick(0.25);
        assert!(cooldown.is_ready());
    }

    #[test]
    fn test_cooldown_ignores_negative_and_nan_deltas() {
        let mut cooldown = Cooldown::started(1.0);
        cooldown.tick(-5.0);
        cooldown.tick(f32::NAN);
        assert!((cooldown.remaining() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_interval_is_always_ready() {
        let mut cooldown = Cooldown::started(0.0);
        assert!(cooldown.is_ready());
        cooldown.reset();
        assert!(cooldown.is_ready());
    }

    #[test]
    fn test_stopwatch_elapsed_is_monotonic() {
        let stopwatch = Stopwatch::start_new();
        let first = stopwatch.elapsed();
        let second = stopwatch.elapsed();
        assert!(second >= first);
        assert!(stopwatch.elapsed_millis() >= 0.0);
    }
}
