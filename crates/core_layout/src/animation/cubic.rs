use serde::{Deserialize, Serialize};

use super::Animate;

/// Shortest accepted duration for a cubic animation.
pub const MIN_CUBIC_DURATION: f64 = 0.01;

/// Configuration for an ease-out cubic animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubicConfig {
    /// Duration in seconds.
    pub duration: f64,
}

impl Default for CubicConfig {
    fn default() -> Self {
        Self { duration: 0.3 }
    }
}

impl CubicConfig {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(MIN_CUBIC_DURATION),
        }
    }
}

/// Fixed-duration ease-out cubic from `from` to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicAnimation {
    from: f64,
    target: f64,
    start_time: f64,
    duration: f64,
}

impl CubicAnimation {
    pub fn new(from: f64, target: f64, start_time: f64, config: CubicConfig) -> Self {
        Self {
            from,
            target,
            start_time,
            duration: config.duration.max(MIN_CUBIC_DURATION),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn progress(&self, time: f64) -> f64 {
        let elapsed = (time - self.start_time).max(0.0);
        (elapsed / self.duration).min(1.0)
    }
}

impl Animate for CubicAnimation {
    fn value(&self, time: f64) -> f64 {
        let p = self.progress(time);
        let eased = 1.0 - (1.0 - p).powi(3);
        self.from + (self.target - self.from) * eased
    }

    fn is_complete(&self, time: f64) -> bool {
        time - self.start_time >= self.duration
    }

    fn target(&self) -> f64 {
        self.target
    }

    fn offset_by(&mut self, delta: f64) {
        self.from += delta;
        self.target += delta;
    }
}
