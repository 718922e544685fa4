//! Application-wide animation clock.

use std::time::Instant;

/// Upper bound for the clock rate.
pub const MAX_RATE: f64 = 1000.0;

/// A rate-adjustable clock that every animation samples.
///
/// The clock accumulates `(wall - last_seen) * rate` on every read, so a
/// rate change only affects time that passes after it.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    origin: Instant,
    wall_base: f64,
    current_time: f64,
    last_seen: f64,
    rate: f64,
    complete_instantly: bool,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock {
    /// Create a clock reading zero at the current instant.
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Create a clock reading `time` seconds at the current instant.
    pub fn starting_at(time: f64) -> Self {
        Self {
            origin: Instant::now(),
            wall_base: time,
            current_time: time,
            last_seen: time,
            rate: 1.0,
            complete_instantly: false,
        }
    }

    /// Sample the clock against the monotonic wall time.
    pub fn now(&mut self) -> f64 {
        let wall = self.wall_base + self.origin.elapsed().as_secs_f64();
        self.advance_to(wall)
    }

    /// Sample the clock against an explicit wall time in seconds.
    ///
    /// Wall times earlier than the last sample leave the clock untouched.
    pub fn advance_to(&mut self, wall: f64) -> f64 {
        if wall > self.last_seen {
            self.current_time += (wall - self.last_seen) * self.rate;
            self.last_seen = wall;
        }
        self.current_time
    }

    /// Last sampled time without reading the wall clock.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Change the rate, re-sampling first so elapsed time keeps the old rate.
    pub fn set_rate(&mut self, rate: f64) {
        self.now();
        self.apply_rate(rate);
    }

    /// Like [`set_rate`](Self::set_rate) but re-samples at an explicit wall time.
    pub fn set_rate_at(&mut self, rate: f64, wall: f64) {
        self.advance_to(wall);
        self.apply_rate(rate);
    }

    fn apply_rate(&mut self, rate: f64) {
        if rate.is_nan() {
            return;
        }
        self.rate = rate.clamp(0.0, MAX_RATE);
    }

    /// When set, every animation reports its target immediately.
    pub fn complete_instantly(&self) -> bool {
        self.complete_instantly
    }

    pub fn set_complete_instantly(&mut self, value: bool) {
        self.complete_instantly = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_accumulates_scaled_time() {
        let mut clock = AnimationClock::starting_at(0.0);
        assert_eq!(clock.advance_to(1.0), 1.0);

        clock.set_rate_at(2.0, 1.0);
        assert_eq!(clock.advance_to(2.0), 3.0);
    }

    #[test]
    fn test_rate_change_resamples_first() {
        let mut clock = AnimationClock::starting_at(0.0);
        // Half a second passes at rate 1 before the change is applied
        clock.set_rate_at(0.0, 0.5);
        assert_eq!(clock.current_time(), 0.5);
        assert_eq!(clock.advance_to(10.0), 0.5);
    }

    #[test]
    fn test_rate_is_clamped() {
        let mut clock = AnimationClock::starting_at(0.0);
        clock.set_rate_at(-3.0, 0.0);
        assert_eq!(clock.rate(), 0.0);
        clock.set_rate_at(5000.0, 0.0);
        assert_eq!(clock.rate(), MAX_RATE);
        clock.set_rate_at(f64::NAN, 0.0);
        assert_eq!(clock.rate(), MAX_RATE);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut clock = AnimationClock::starting_at(5.0);
        assert_eq!(clock.advance_to(6.0), 6.0);
        assert_eq!(clock.advance_to(4.0), 6.0);
        assert!(clock.now() >= 6.0);
    }
}
