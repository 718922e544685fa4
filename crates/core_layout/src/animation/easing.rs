use serde::{Deserialize, Serialize};

use super::Animate;

const BEZIER_ITERATIONS: usize = 31;
const BEZIER_EPSILON: f64 = 0.0001;

/// Easing curve mapping linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingCurve {
    Linear,
    EaseOutQuad,
    #[default]
    EaseOutCubic,
    EaseOutExpo,
    /// CSS-style cubic bezier with fixed end points (0,0) and (1,1).
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl EasingCurve {
    /// The named curves, in menu order.
    pub const SIMPLE: [EasingCurve; 4] = [
        EasingCurve::Linear,
        EasingCurve::EaseOutQuad,
        EasingCurve::EaseOutCubic,
        EasingCurve::EaseOutExpo,
    ];

    /// Evaluate the curve. Input outside `[0, 1]` is clamped.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            EasingCurve::Linear => t,
            EasingCurve::EaseOutQuad => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            EasingCurve::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            EasingCurve::EaseOutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            EasingCurve::CubicBezier { x1, y1, x2, y2 } => {
                let param = solve_bezier_x(t, x1, x2);
                bezier_component(param, y1, y2)
            }
        }
    }
}

/// Bisection for the curve parameter whose x equals `x`.
fn solve_bezier_x(x: f64, x1: f64, x2: f64) -> f64 {
    let mut low = 0.0;
    let mut high = 1.0;
    let mut mid = x;

    for _ in 0..BEZIER_ITERATIONS {
        let x_at_mid = bezier_component(mid, x1, x2);
        if (x_at_mid - x).abs() < BEZIER_EPSILON {
            return mid;
        }
        if x_at_mid < x {
            low = mid;
        } else {
            high = mid;
        }
        mid = (low + high) / 2.0;
    }
    mid
}

fn bezier_component(t: f64, p1: f64, p2: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

/// Fixed-duration animation driven by an [`EasingCurve`].
#[derive(Debug, Clone, PartialEq)]
pub struct EasingAnimation {
    from: f64,
    to: f64,
    duration: f64,
    curve: EasingCurve,
    start_time: f64,
}

impl EasingAnimation {
    pub fn new(from: f64, to: f64, duration: f64, curve: EasingCurve, start_time: f64) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            curve,
            start_time,
        }
    }

    pub fn curve(&self) -> EasingCurve {
        self.curve
    }
}

impl Animate for EasingAnimation {
    fn value(&self, time: f64) -> f64 {
        let elapsed = time - self.start_time;
        if elapsed < 0.0 {
            return self.from;
        }
        if elapsed >= self.duration {
            return self.to;
        }
        let eased = self.curve.apply(elapsed / self.duration);
        self.from + (self.to - self.from) * eased
    }

    fn is_complete(&self, time: f64) -> bool {
        time - self.start_time >= self.duration
    }

    fn target(&self) -> f64 {
        self.to
    }

    fn offset_by(&mut self, delta: f64) {
        self.from += delta;
        self.to += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_curves_hit_boundaries() {
        for curve in EasingCurve::SIMPLE {
            assert_eq!(curve.apply(0.0), 0.0, "{curve:?} at 0");
            assert_eq!(curve.apply(1.0), 1.0, "{curve:?} at 1");
        }
    }

    #[test]
    fn test_named_curves_are_monotonic() {
        for curve in EasingCurve::SIMPLE {
            let mut previous = 0.0;
            for i in 0..=100 {
                let v = curve.apply(f64::from(i) / 100.0);
                assert!(v >= previous, "{curve:?} decreased at {i}");
                previous = v;
            }
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(EasingCurve::Linear.apply(-1.0), 0.0);
        assert_eq!(EasingCurve::EaseOutQuad.apply(3.0), 1.0);
    }

    #[test]
    fn test_bezier_matches_css_ease() {
        let ease = EasingCurve::CubicBezier { x1: 0.25, y1: 0.1, x2: 0.25, y2: 1.0 };
        assert!(ease.apply(0.0).abs() < 1e-3);
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-3);
        // CSS `ease` is about 0.8024 at the midpoint
        assert!((ease.apply(0.5) - 0.8024).abs() < 0.01);

        let linear = EasingCurve::CubicBezier { x1: 0.0, y1: 0.0, x2: 1.0, y2: 1.0 };
        assert!((linear.apply(0.3) - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_easing_animation_bounds() {
        let anim = EasingAnimation::new(10.0, 20.0, 0.5, EasingCurve::Linear, 1.0);
        assert_eq!(anim.value(0.0), 10.0);
        assert_eq!(anim.value(1.25), 15.0);
        assert_eq!(anim.value(1.5), 20.0);
        assert!(anim.is_complete(1.5));
        assert!(!anim.is_complete(1.49));
    }

    #[test]
    fn test_zero_duration_jumps_to_target() {
        let anim = EasingAnimation::new(0.0, 5.0, 0.0, EasingCurve::EaseOutExpo, 0.0);
        assert_eq!(anim.value(0.0), 5.0);
        assert!(anim.is_complete(0.0));
    }

    #[test]
    fn test_curve_serde_names() {
        let json = serde_json::to_string(&EasingCurve::EaseOutExpo).unwrap();
        assert_eq!(json, "\"ease_out_expo\"");
        let bezier: EasingCurve =
            serde_json::from_str(r#"{"cubic_bezier":{"x1":0.1,"y1":0.2,"x2":0.3,"y2":0.4}}"#).unwrap();
        assert_eq!(bezier, EasingCurve::CubicBezier { x1: 0.1, y1: 0.2, x2: 0.3, y2: 0.4 });
    }
}
