//! Time-sampled animation primitives.
//!
//! Every animation is a pure function of time: it is constructed once with a
//! start time and then sampled with [`Animate::value`]. Nothing here owns a
//! timer. The shared [`AnimationClock`] is passed by reference to decide the
//! "complete instantly" policy and to scale velocities by the clock rate.

mod clock;
mod cubic;
mod deceleration;
mod easing;
mod spring;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::{Orientation, Point};

pub use clock::{AnimationClock, MAX_RATE};
pub use cubic::{CubicAnimation, CubicConfig, MIN_CUBIC_DURATION};
pub use deceleration::{
    DecelerationAnimation, DEFAULT_DECELERATION_RATE, MAX_DECELERATION_RATE, MIN_DECELERATION_RATE,
};
pub use easing::{EasingAnimation, EasingCurve};
pub use spring::{SpringAnimation, SpringConfig};

/// Time step for numeric velocity estimates.
const VELOCITY_PROBE: f64 = 0.001;

/// Uniform capability interface of every animation kind.
#[enum_dispatch]
pub trait Animate {
    /// Sample the animated value at `time` (seconds of clock time).
    fn value(&self, time: f64) -> f64;

    fn is_complete(&self, time: f64) -> bool;

    /// The value the animation settles on.
    fn target(&self) -> f64;

    /// Re-base both ends of the animation, e.g. while the user drags.
    fn offset_by(&mut self, delta: f64);

    /// Rate of change at `time`, in value units per second.
    fn velocity(&self, time: f64) -> f64 {
        (self.value(time + VELOCITY_PROBE) - self.value(time)) / VELOCITY_PROBE
    }
}

/// One of the four animation kinds.
///
/// The kind is chosen from configuration when a transition starts and never
/// changes while it runs.
#[enum_dispatch(Animate)]
#[derive(Debug, Clone, PartialEq)]
pub enum Animation {
    Cubic(CubicAnimation),
    Spring(SpringAnimation),
    Easing(EasingAnimation),
    Deceleration(DecelerationAnimation),
}

/// A scalar that is either at rest or animating.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatedValue {
    Static(f64),
    Animating(Animation),
}

impl Default for AnimatedValue {
    fn default() -> Self {
        AnimatedValue::Static(0.0)
    }
}

impl AnimatedValue {
    /// Current value. With `complete_instantly` set, animations report their target.
    pub fn value_at(&self, clock: &AnimationClock, time: f64) -> f64 {
        match self {
            AnimatedValue::Static(v) => *v,
            AnimatedValue::Animating(anim) => {
                if clock.complete_instantly() {
                    anim.target()
                } else {
                    anim.value(time)
                }
            }
        }
    }

    /// Value the animation will come to rest at.
    pub fn target(&self) -> f64 {
        match self {
            AnimatedValue::Static(v) => *v,
            AnimatedValue::Animating(anim) => anim.target(),
        }
    }

    pub fn is_animating(&self, clock: &AnimationClock, time: f64) -> bool {
        match self {
            AnimatedValue::Static(_) => false,
            AnimatedValue::Animating(anim) => !clock.complete_instantly() && !anim.is_complete(time),
        }
    }

    pub fn velocity_at(&self, clock: &AnimationClock, time: f64) -> f64 {
        match self {
            AnimatedValue::Animating(anim) if !clock.complete_instantly() => anim.velocity(time),
            _ => 0.0,
        }
    }

    /// Collapse a finished animation into its resting value.
    ///
    /// Returns `true` while the value is still moving.
    pub fn settle(&mut self, clock: &AnimationClock, time: f64) -> bool {
        if self.is_animating(clock, time) {
            return true;
        }
        if let AnimatedValue::Animating(anim) = self {
            *self = AnimatedValue::Static(anim.target());
        }
        false
    }

    pub fn offset_by(&mut self, delta: f64) {
        match self {
            AnimatedValue::Static(v) => *v += delta,
            AnimatedValue::Animating(anim) => anim.offset_by(delta),
        }
    }
}

/// Which animation a UI context uses for its transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationConfig {
    Spring(SpringConfig),
    Easing { curve: EasingCurve, duration: f64 },
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig::Spring(SpringConfig::default())
    }
}

impl AnimationConfig {
    /// Start a transition from `from` to `to` at `time`.
    ///
    /// `velocity` carries the motion of an interrupted transition into a
    /// spring; it is expressed in clock time, so it is divided by the rate.
    pub fn animate(
        &self,
        from: f64,
        to: f64,
        velocity: f64,
        clock: &AnimationClock,
        time: f64,
    ) -> AnimatedValue {
        if clock.complete_instantly() || (to - from).abs() < f64::EPSILON {
            return AnimatedValue::Static(to);
        }
        let anim = match *self {
            AnimationConfig::Spring(config) => {
                let scaled = velocity / clock.rate().max(0.001);
                Animation::from(SpringAnimation::new(from, to, scaled, time, config))
            }
            AnimationConfig::Easing { curve, duration } => {
                Animation::from(EasingAnimation::new(from, to, duration, curve, time))
            }
        };
        AnimatedValue::Animating(anim)
    }
}

/// Two-axis visual offset that decays back to zero.
///
/// Used to slide containers and windows from where they were drawn to their
/// new slot without touching the layout itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderOffset {
    x: AnimatedValue,
    y: AnimatedValue,
}

impl RenderOffset {
    pub fn value_at(&self, clock: &AnimationClock, time: f64) -> Point {
        Point::new(self.x.value_at(clock, time), self.y.value_at(clock, time))
    }

    /// Start sliding from `delta` (added to the current offset) back to zero.
    pub fn animate_from(
        &mut self,
        axis: Orientation,
        delta: f64,
        config: CubicConfig,
        clock: &AnimationClock,
        time: f64,
    ) {
        let slot = match axis {
            Orientation::Horizontal => &mut self.x,
            Orientation::Vertical => &mut self.y,
        };
        let from = slot.value_at(clock, time) + delta;
        *slot = if clock.complete_instantly() || from.abs() < f64::EPSILON {
            AnimatedValue::Static(0.0)
        } else {
            AnimatedValue::Animating(CubicAnimation::new(from, 0.0, time, config).into())
        };
    }

    pub fn is_animating(&self, clock: &AnimationClock, time: f64) -> bool {
        self.x.is_animating(clock, time) || self.y.is_animating(clock, time)
    }

    pub fn settle(&mut self, clock: &AnimationClock, time: f64) -> bool {
        let x = self.x.settle(clock, time);
        let y = self.y.settle(clock, time);
        x || y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_instantly_reports_target() {
        let mut clock = AnimationClock::starting_at(0.0);
        let value = AnimationConfig::default().animate(0.0, 100.0, 0.0, &clock, 0.0);
        assert!(value.is_animating(&clock, 0.0));
        assert_eq!(value.value_at(&clock, 0.0), 0.0);

        clock.set_complete_instantly(true);
        assert_eq!(value.value_at(&clock, 0.0), 100.0);
        assert!(!value.is_animating(&clock, 0.0));

        let snapped = AnimationConfig::default().animate(0.0, 100.0, 0.0, &clock, 0.0);
        assert_eq!(snapped, AnimatedValue::Static(100.0));
    }

    #[test]
    fn test_settle_collapses_finished_animation() {
        let clock = AnimationClock::starting_at(0.0);
        let config = AnimationConfig::Easing {
            curve: EasingCurve::Linear,
            duration: 0.2,
        };
        let mut value = config.animate(10.0, 20.0, 0.0, &clock, 0.0);
        assert!(value.settle(&clock, 0.1));
        assert!(matches!(value, AnimatedValue::Animating(_)));
        assert!(!value.settle(&clock, 0.2));
        assert_eq!(value, AnimatedValue::Static(20.0));
    }

    #[test]
    fn test_dispatch_over_every_kind() {
        let kinds: Vec<Animation> = vec![
            CubicAnimation::new(0.0, 1.0, 0.0, CubicConfig::default()).into(),
            SpringAnimation::new(0.0, 1.0, 0.0, 0.0, SpringConfig::SNAPPY).into(),
            EasingAnimation::new(0.0, 1.0, 0.3, EasingCurve::EaseOutQuad, 0.0).into(),
            DecelerationAnimation::new(0.0, 1.0, 0.0, DEFAULT_DECELERATION_RATE).into(),
        ];
        for anim in kinds {
            assert_eq!(anim.value(0.0), 0.0);
            assert!(anim.is_complete(60.0));
        }
    }

    #[test]
    fn test_offset_by_static_and_animating() {
        let clock = AnimationClock::starting_at(0.0);
        let mut value = AnimatedValue::Static(5.0);
        value.offset_by(3.0);
        assert_eq!(value.target(), 8.0);

        let mut moving = AnimationConfig::default().animate(0.0, 10.0, 0.0, &clock, 0.0);
        moving.offset_by(-10.0);
        assert_eq!(moving.target(), 0.0);
        assert_eq!(moving.value_at(&clock, 0.0), -10.0);
    }

    #[test]
    fn test_render_offset_slides_back_to_zero() {
        let clock = AnimationClock::starting_at(0.0);
        let mut offset = RenderOffset::default();
        offset.animate_from(Orientation::Horizontal, 120.0, CubicConfig::new(0.25), &clock, 1.0);
        assert_eq!(offset.value_at(&clock, 1.0), Point::new(120.0, 0.0));
        assert!(offset.is_animating(&clock, 1.1));
        assert!(!offset.settle(&clock, 1.25));
        assert_eq!(offset.value_at(&clock, 5.0), Point::ZERO);
    }

    #[test]
    fn test_config_serde_shape() {
        let config: AnimationConfig =
            serde_json::from_str(r#"{"kind":"easing","curve":"linear","duration":0.4}"#).unwrap();
        assert_eq!(
            config,
            AnimationConfig::Easing {
                curve: EasingCurve::Linear,
                duration: 0.4
            }
        );
        let spring: AnimationConfig =
            serde_json::from_str(r#"{"kind":"spring","stiffness":400.0}"#).unwrap();
        assert_eq!(spring, AnimationConfig::Spring(SpringConfig { stiffness: 400.0, ..SpringConfig::SNAPPY }));
    }
}
