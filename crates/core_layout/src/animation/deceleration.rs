use super::Animate;

/// Per-millisecond velocity retention used for scroll momentum.
pub const DEFAULT_DECELERATION_RATE: f64 = 0.997;

/// Rates outside this range either never stop or stop instantly.
pub const MIN_DECELERATION_RATE: f64 = 0.9;
pub const MAX_DECELERATION_RATE: f64 = 0.9999;

const VELOCITY_THRESHOLD: f64 = 0.001;
const DISTANCE_THRESHOLD: f64 = 0.01;

/// Momentum that decays exponentially from an initial velocity.
///
/// `value = from + (rate^(1000 t) - 1) / coeff * v0` with
/// `coeff = 1000 ln(rate)`, so it converges on `from - v0 / coeff`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecelerationAnimation {
    from: f64,
    initial_velocity: f64,
    start_time: f64,
    rate: f64,
    coeff: f64,
    projected_end: f64,
}

impl DecelerationAnimation {
    /// `initial_velocity` is in value units per second.
    pub fn new(from: f64, initial_velocity: f64, start_time: f64, rate: f64) -> Self {
        let rate = if rate.is_nan() {
            DEFAULT_DECELERATION_RATE
        } else {
            rate.clamp(MIN_DECELERATION_RATE, MAX_DECELERATION_RATE)
        };
        let coeff = 1000.0 * rate.ln();
        Self {
            from,
            initial_velocity,
            start_time,
            rate,
            coeff,
            projected_end: from - initial_velocity / coeff,
        }
    }

    fn decay(&self, elapsed: f64) -> f64 {
        self.rate.powf(1000.0 * elapsed)
    }
}

impl Animate for DecelerationAnimation {
    fn value(&self, time: f64) -> f64 {
        let elapsed = time - self.start_time;
        if elapsed < 0.0 {
            return self.from;
        }
        self.from + (self.decay(elapsed) - 1.0) / self.coeff * self.initial_velocity
    }

    fn is_complete(&self, time: f64) -> bool {
        self.velocity(time).abs() < VELOCITY_THRESHOLD
            && (self.value(time) - self.projected_end).abs() < DISTANCE_THRESHOLD
    }

    fn target(&self) -> f64 {
        self.projected_end
    }

    fn offset_by(&mut self, delta: f64) {
        self.from += delta;
        self.projected_end += delta;
    }

    fn velocity(&self, time: f64) -> f64 {
        let elapsed = time - self.start_time;
        if elapsed < 0.0 {
            return self.initial_velocity;
        }
        self.initial_velocity * self.decay(elapsed)
    }
}
