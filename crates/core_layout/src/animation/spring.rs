use serde::{Deserialize, Serialize};

use super::Animate;

/// Step used for the numeric slope in settle-time root finding.
const NEWTON_DELTA: f64 = 0.001;
/// Root finding gives up (and reports zero) after this many refinements.
const MAX_NEWTON_ITERATIONS: u32 = 1000;
/// Stepped scan cap, in milliseconds.
const MAX_CLAMPED_STEPS: u32 = 3000;

fn near_critical(beta: f64, omega0: f64) -> bool {
    (beta - omega0).abs() <= f32::EPSILON as f64
}

/// Parameters of a damped harmonic oscillator with unit mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping_ratio: f64,
    /// Distance from the target below which the spring counts as settled.
    pub epsilon: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::SNAPPY
    }
}

impl SpringConfig {
    pub const SNAPPY: SpringConfig = SpringConfig {
        stiffness: 800.0,
        damping_ratio: 1.0,
        epsilon: 0.0001,
    };
    pub const SMOOTH: SpringConfig = SpringConfig {
        stiffness: 400.0,
        damping_ratio: 1.0,
        epsilon: 0.0001,
    };
    pub const BOUNCY: SpringConfig = SpringConfig {
        stiffness: 600.0,
        damping_ratio: 0.7,
        epsilon: 0.0001,
    };

    /// Negative parameters are clamped to zero.
    pub fn new(stiffness: f64, damping_ratio: f64, epsilon: f64) -> Self {
        Self {
            stiffness: stiffness.max(0.0),
            damping_ratio: damping_ratio.max(0.0),
            epsilon: epsilon.max(0.0),
        }
    }

    /// Look up a named preset (`snappy`, `smooth`, `bouncy`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "snappy" => Some(Self::SNAPPY),
            "smooth" => Some(Self::SMOOTH),
            "bouncy" => Some(Self::BOUNCY),
            _ => None,
        }
    }
}

/// Closed-form spring from `from` to `target`.
///
/// Three regimes are handled: critically damped, under-damped (cos/sin) and
/// over-damped (cosh/sinh). The sampled value is clamped to ten times the
/// travel distance on either side.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringAnimation {
    from: f64,
    target: f64,
    initial_velocity: f64,
    start_time: f64,
    config: SpringConfig,
    beta: f64,
    omega0: f64,
}

impl SpringAnimation {
    /// `initial_velocity` is in value units per second of clock time.
    pub fn new(
        from: f64,
        target: f64,
        initial_velocity: f64,
        start_time: f64,
        config: SpringConfig,
    ) -> Self {
        let config = SpringConfig::new(config.stiffness, config.damping_ratio, config.epsilon);
        let mass = 1.0;
        let damping = 2.0 * config.damping_ratio * (config.stiffness * mass).sqrt();
        Self {
            from,
            target,
            initial_velocity,
            start_time,
            config,
            beta: damping / (2.0 * mass),
            omega0: (config.stiffness / mass).sqrt(),
        }
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    fn oscillate(&self, t: f64) -> f64 {
        let x0 = self.from - self.target;
        let v0 = self.initial_velocity;
        let envelope = (-self.beta * t).exp();

        if near_critical(self.beta, self.omega0) {
            self.target + envelope * (x0 + (self.beta * x0 + v0) * t)
        } else if self.beta < self.omega0 {
            let omega1 = (self.omega0 * self.omega0 - self.beta * self.beta).sqrt();
            self.target
                + envelope
                    * (x0 * (omega1 * t).cos() + ((self.beta * x0 + v0) / omega1) * (omega1 * t).sin())
        } else {
            let omega2 = (self.beta * self.beta - self.omega0 * self.omega0).sqrt();
            self.target
                + envelope
                    * (x0 * (omega2 * t).cosh()
                        + ((self.beta * x0 + v0) / omega2) * (omega2 * t).sinh())
        }
    }

    /// Estimated settle time in seconds.
    ///
    /// Returns infinity for springs without damping and zero when there is
    /// nothing to travel or the refinement does not converge.
    pub fn duration(&self) -> f64 {
        if self.beta.abs() <= f64::EPSILON || self.beta < 0.0 || self.config.epsilon <= 0.0 {
            return f64::INFINITY;
        }
        if (self.target - self.from).abs() <= f64::EPSILON {
            return 0.0;
        }

        let envelope_guess = -self.config.epsilon.ln() / self.beta;

        if !near_critical(self.beta, self.omega0) && self.beta < self.omega0 {
            // The oscillation is bounded by the decaying amplitude envelope.
            let x0 = self.from - self.target;
            let omega1 = (self.omega0 * self.omega0 - self.beta * self.beta).sqrt();
            let amplitude = x0.abs() + ((self.beta * x0 + self.initial_velocity) / omega1).abs();
            if amplitude <= self.config.epsilon {
                return 0.0;
            }
            return (amplitude / self.config.epsilon).ln() / self.beta;
        }

        self.refine_settle_time(envelope_guess.max(0.0))
    }

    fn refine_settle_time(&self, start: f64) -> f64 {
        let mut x0 = start;
        let mut y0 = self.oscillate(x0);
        let mut m = (self.oscillate(x0 + NEWTON_DELTA) - y0) / NEWTON_DELTA;
        let mut x1 = (self.target - y0 + m * x0) / m;
        let mut y1 = self.oscillate(x1);
        if !y1.is_finite() || !x1.is_finite() {
            return x0;
        }

        let mut i = 0;
        while (self.target - y1).abs() > self.config.epsilon {
            if i > MAX_NEWTON_ITERATIONS {
                return 0.0;
            }

            x0 = x1;
            y0 = y1;
            m = (self.oscillate(x0 + NEWTON_DELTA) - y0) / NEWTON_DELTA;
            x1 = (self.target - y0 + m * x0) / m;
            y1 = self.oscillate(x1);

            if !y1.is_finite() || !x1.is_finite() {
                return x0;
            }
            i += 1;
        }

        x1
    }

    /// Time at which the spring first gets within epsilon of the target,
    /// scanned in one millisecond steps. `None` past three seconds.
    pub fn clamped_duration(&self) -> Option<f64> {
        if self.beta.abs() <= f64::EPSILON || self.beta < 0.0 {
            return Some(f64::INFINITY);
        }
        if (self.target - self.from).abs() <= f64::EPSILON {
            return Some(0.0);
        }

        let rising = self.target - self.from > f64::EPSILON;
        let mut i: u32 = 1;
        let mut y = self.oscillate(f64::from(i) / 1000.0);
        while (rising && self.target - y > self.config.epsilon)
            || (!rising && y - self.target > self.config.epsilon)
        {
            if i > MAX_CLAMPED_STEPS {
                return None;
            }
            i += 1;
            y = self.oscillate(f64::from(i) / 1000.0);
        }

        Some(f64::from(i) / 1000.0)
    }
}

impl Animate for SpringAnimation {
    fn value(&self, time: f64) -> f64 {
        let t = (time - self.start_time).max(0.0);
        let value = self.oscillate(t);

        let range = (self.target - self.from) * 10.0;
        let a = self.from - range;
        let b = self.target + range;
        if self.from <= self.target {
            value.max(a).min(b)
        } else {
            value.max(b).min(a)
        }
    }

    fn is_complete(&self, time: f64) -> bool {
        let t = (time - self.start_time).max(0.0);
        (self.oscillate(t) - self.target).abs() < self.config.epsilon
    }

    fn target(&self) -> f64 {
        self.target
    }

    fn offset_by(&mut self, delta: f64) {
        self.from += delta;
        self.target += delta;
    }
}
