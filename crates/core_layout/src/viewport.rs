//! Viewport over the strip of containers.
//!
//! The viewport is the pair `(active_column_index, view_offset_pixels)`: the
//! view's leading edge sits at `position(active) + offset` on the strip. The
//! offset is an [`AnimatedValue`], so every transition is a new animation
//! starting from wherever the view is drawn right now.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::animation::{
    AnimatedValue, Animate, AnimationClock, AnimationConfig, DecelerationAnimation,
};

/// Tolerance for "already fully visible" comparisons, in logical pixels.
const FIT_TOLERANCE: f64 = 1e-6;

/// How long gesture samples count towards the release velocity, in seconds.
const GESTURE_HISTORY: f64 = 0.150;

/// How the view reacts when a container becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenteringMode {
    /// Always center the active container.
    Center,
    /// Scroll just enough to bring the container fully into view.
    #[default]
    JustInView,
    /// Like `JustInView`, but center when the container and the one we came
    /// from do not fit on screen together.
    OnOverflow,
}

/// Which edge of the target container a transition reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealEdge {
    /// Leading edge (left, or top on vertical monitors).
    Left,
    /// Trailing edge (right, or bottom).
    Right,
}

/// Resolved container sizes along the scroll axis.
#[derive(Debug, Clone, Copy)]
pub struct Strip<'a> {
    pub spans: &'a [f64],
    pub gap: f64,
    pub view_span: f64,
}

impl<'a> Strip<'a> {
    pub fn new(spans: &'a [f64], gap: f64, view_span: f64) -> Self {
        Self { spans, gap, view_span }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Leading edge of container `idx` on the strip.
    pub fn position(&self, idx: usize) -> f64 {
        self.spans
            .iter()
            .take(idx)
            .map(|span| span + self.gap)
            .sum()
    }

    pub fn span(&self, idx: usize) -> f64 {
        self.spans.get(idx).copied().unwrap_or(0.0)
    }

    /// Length of all containers plus the gaps between them.
    pub fn total_span(&self) -> f64 {
        let spans: f64 = self.spans.iter().sum();
        spans + self.gap * self.spans.len().saturating_sub(1) as f64
    }

    /// Keep a view position within one gap of the strip's ends.
    pub fn clamp_view_position(&self, pos: f64) -> f64 {
        let min = -self.gap;
        let max = (self.total_span() + self.gap - self.view_span).max(min);
        pos.clamp(min, max)
    }

    fn centered_offset(&self, idx: usize) -> Option<f64> {
        let span = self.span(idx);
        (span < self.view_span).then(|| -(self.view_span - span) / 2.0)
    }

    /// Offset that brings container `idx` fully on screen from `view_pos`.
    fn fit_offset(&self, view_pos: f64, idx: usize, edge: Option<RevealEdge>) -> f64 {
        let col_x = self.position(idx);
        let span = self.span(idx);

        if span + 2.0 * self.gap >= self.view_span {
            return 0.0;
        }

        let leading = col_x - self.gap;
        let trailing = col_x + span + self.gap;
        let view_end = view_pos + self.view_span;
        if leading >= view_pos - FIT_TOLERANCE && trailing <= view_end + FIT_TOLERANCE {
            return view_pos - col_x;
        }

        let edge = edge.unwrap_or_else(|| {
            if (view_pos - leading).abs() <= (view_end - trailing).abs() {
                RevealEdge::Left
            } else {
                RevealEdge::Right
            }
        });
        match edge {
            RevealEdge::Left => -self.gap,
            RevealEdge::Right => span + self.gap - self.view_span,
        }
    }

    /// Resting offset for container `idx` after a gesture.
    fn snap_offset(&self, idx: usize, centering: CenteringMode) -> f64 {
        if centering == CenteringMode::Center {
            if let Some(offset) = self.centered_offset(idx) {
                return offset;
            }
        }
        if self.span(idx) + 2.0 * self.gap >= self.view_span {
            0.0
        } else {
            -self.gap
        }
    }
}

/// Animation settings and time of a transition.
#[derive(Debug, Clone, Copy)]
pub struct Motion<'a> {
    pub config: AnimationConfig,
    pub clock: &'a AnimationClock,
    pub time: f64,
}

impl<'a> Motion<'a> {
    pub fn new(config: AnimationConfig, clock: &'a AnimationClock, time: f64) -> Self {
        Self { config, clock, time }
    }
}

/// An in-progress touchpad swipe over the strip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewGesture {
    /// Offset relative to the active container, following the fingers.
    pub current_offset: f64,
    samples: Vec<(f64, f64)>,
}

impl ViewGesture {
    pub(crate) fn push(&mut self, time: f64, delta: f64) {
        self.samples.push((time, delta));
        self.samples.retain(|&(t, _)| time - t <= GESTURE_HISTORY);
    }

    /// Release velocity in pixels per second over the recent history.
    pub fn velocity(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return 0.0;
        };
        let dt = last.0 - first.0;
        if dt <= 0.0 {
            return 0.0;
        }
        let travelled: f64 = self.samples.iter().skip(1).map(|&(_, d)| d).sum();
        travelled / dt
    }
}

/// Scroll state of one workspace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportState {
    pub active_column_index: usize,
    /// Offset of the view's leading edge from the active container's.
    pub view_offset_pixels: AnimatedValue,
    /// Progress of the selection highlight, reset on every reveal.
    pub selection_progress: f64,
    /// Index to activate when the active container is removed. Read once.
    pub activate_prev_column_on_removal: Option<usize>,
    pub gesture: Option<ViewGesture>,
}

impl ViewportState {
    pub fn current_offset(&self, clock: &AnimationClock, time: f64) -> f64 {
        self.view_offset_pixels.value_at(clock, time)
    }

    /// Leading edge of the view on the strip.
    pub fn view_position(&self, strip: &Strip<'_>, clock: &AnimationClock, time: f64) -> f64 {
        let active = self.active_column_index.min(strip.len().saturating_sub(1));
        strip.position(active) + self.current_offset(clock, time)
    }

    /// Activate container `target_idx` and move the view to show it.
    ///
    /// `from_column_index` is where the move started (the previously active
    /// index when `None`); it picks the edge to reveal.
    pub fn transition_to_column(
        &mut self,
        target_idx: usize,
        strip: &Strip<'_>,
        animate: bool,
        centering: CenteringMode,
        from_column_index: Option<usize>,
        motion: &Motion<'_>,
    ) {
        if strip.is_empty() {
            return;
        }
        let last = strip.len() - 1;
        let target = target_idx.min(last);
        let active = self.active_column_index.min(last);
        let prev = from_column_index.unwrap_or(active).min(last);

        let active_x = strip.position(active);
        let current_pos = active_x + self.current_offset(motion.clock, motion.time);
        // Fit decisions look at where the view is heading, not where it is.
        let final_pos = active_x + self.view_offset_pixels.target();

        let edge = match target.cmp(&prev) {
            Ordering::Greater => Some(RevealEdge::Right),
            Ordering::Less => Some(RevealEdge::Left),
            Ordering::Equal => None,
        };

        let new_offset = match centering {
            CenteringMode::Center => strip
                .centered_offset(target)
                .unwrap_or_else(|| strip.fit_offset(final_pos, target, edge)),
            CenteringMode::JustInView => strip.fit_offset(final_pos, target, edge),
            CenteringMode::OnOverflow => {
                if target == prev || fits_with_neighbour(strip, prev, target) {
                    strip.fit_offset(final_pos, target, edge)
                } else {
                    strip
                        .centered_offset(target)
                        .unwrap_or_else(|| strip.fit_offset(final_pos, target, edge))
                }
            }
        };

        let col_x = strip.position(target);
        trace!("Viewport transition to {} (offset {:.1}, animate {})", target, new_offset, animate);

        self.active_column_index = target;
        self.gesture = None;

        if !animate {
            self.view_offset_pixels = AnimatedValue::Static(new_offset);
            return;
        }

        let still_heading_there = (final_pos - col_x - new_offset).abs() < FIT_TOLERANCE;
        if still_heading_there && self.view_offset_pixels.is_animating(motion.clock, motion.time) {
            self.view_offset_pixels.offset_by(active_x - col_x);
            return;
        }

        let velocity =
            self.view_offset_pixels.velocity_at(motion.clock, motion.time) * motion.clock.rate();
        self.view_offset_pixels = motion.config.animate(
            current_pos - col_x,
            new_offset,
            velocity,
            motion.clock,
            motion.time,
        );
    }

    /// The vertical-monitor counterpart of [`transition_to_column`](Self::transition_to_column).
    pub fn ensure_row_visible(
        &mut self,
        target_idx: usize,
        strip: &Strip<'_>,
        animate: bool,
        centering: CenteringMode,
        from_row_index: Option<usize>,
        motion: &Motion<'_>,
    ) {
        self.transition_to_column(target_idx, strip, animate, centering, from_row_index, motion);
    }

    /// Scroll the view by `delta` pixels without animating.
    pub fn scroll_by(&mut self, delta: f64, strip: &Strip<'_>, clock: &AnimationClock, time: f64) {
        if strip.is_empty() {
            return;
        }
        let active = self.active_column_index.min(strip.len() - 1);
        let col_x = strip.position(active);
        let pos = strip.clamp_view_position(col_x + self.current_offset(clock, time) + delta);
        self.gesture = None;
        self.view_offset_pixels = AnimatedValue::Static(pos - col_x);
    }

    /// Shift the offset (and any running animation) by `delta`.
    pub fn offset_view_by(&mut self, delta: f64) {
        self.view_offset_pixels.offset_by(delta);
        if let Some(gesture) = &mut self.gesture {
            gesture.current_offset += delta;
        }
    }

    pub fn set_selection_progress(&mut self, progress: f64) {
        self.selection_progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    }

    /// Freeze the view where it is drawn and start following a swipe.
    pub fn begin_gesture(&mut self, clock: &AnimationClock, time: f64) {
        let current = self.current_offset(clock, time);
        self.view_offset_pixels = AnimatedValue::Static(current);
        self.gesture = Some(ViewGesture {
            current_offset: current,
            samples: Vec::new(),
        });
    }

    /// Move the view by `delta` pixels of swipe. Ignored without a gesture.
    pub fn update_gesture(&mut self, delta: f64, time: f64) {
        let Some(gesture) = &mut self.gesture else {
            return;
        };
        gesture.current_offset += delta;
        gesture.push(time, delta);
        self.view_offset_pixels = AnimatedValue::Static(gesture.current_offset);
    }

    /// Release the swipe and snap to the container nearest the projected
    /// resting position. Returns the newly active index.
    pub fn end_gesture(
        &mut self,
        strip: &Strip<'_>,
        centering: CenteringMode,
        deceleration_rate: f64,
        motion: &Motion<'_>,
    ) -> Option<usize> {
        let gesture = self.gesture.take()?;
        if strip.is_empty() {
            self.view_offset_pixels = AnimatedValue::Static(0.0);
            return None;
        }

        let velocity = gesture.velocity();
        let active = self.active_column_index.min(strip.len() - 1);
        let current_pos = strip.position(active) + gesture.current_offset;
        let projected =
            DecelerationAnimation::new(current_pos, velocity, motion.time, deceleration_rate).target();

        let mut best = active;
        let mut best_distance = f64::INFINITY;
        for idx in 0..strip.len() {
            let snap = strip.position(idx) + strip.snap_offset(idx, centering);
            let distance = (snap - projected).abs();
            if distance < best_distance {
                best = idx;
                best_distance = distance;
            }
        }

        let col_x = strip.position(best);
        let new_offset = strip.snap_offset(best, centering);
        trace!("Gesture released at {:.1} px/s, projected {:.1} -> container {}", velocity, projected, best);

        self.active_column_index = best;
        self.activate_prev_column_on_removal = None;
        self.view_offset_pixels = motion.config.animate(
            current_pos - col_x,
            new_offset,
            velocity,
            motion.clock,
            motion.time,
        );
        Some(best)
    }

    pub fn is_animating(&self, clock: &AnimationClock, time: f64) -> bool {
        self.gesture.is_some() || self.view_offset_pixels.is_animating(clock, time)
    }

    /// Collapse a finished view animation. Returns `true` while still moving.
    pub fn settle(&mut self, clock: &AnimationClock, time: f64) -> bool {
        if self.gesture.is_some() {
            return true;
        }
        self.view_offset_pixels.settle(clock, time)
    }
}

/// Whether `target` and the neighbour on the side we came from fit on screen together.
fn fits_with_neighbour(strip: &Strip<'_>, prev: usize, target: usize) -> bool {
    let last = strip.len() - 1;
    let source = if prev > target {
        (target + 1).min(last)
    } else {
        target.saturating_sub(1)
    };
    let source_x = strip.position(source);
    let target_x = strip.position(target);
    let covered = if source_x < target_x {
        target_x - source_x + strip.span(target)
    } else {
        source_x - target_x + strip.span(source)
    };
    covered + strip.gap * 2.0 <= strip.view_span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{EasingCurve, SpringConfig};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    fn spring_motion(clock: &AnimationClock, time: f64) -> Motion<'_> {
        Motion::new(AnimationConfig::Spring(SpringConfig::SNAPPY), clock, time)
    }

    #[test]
    fn test_strip_positions() {
        let w = (1200.0 - 20.0) / 3.0;
        let spans = [w, w, w];
        let strip = Strip::new(&spans, 10.0, 1200.0);
        assert_close(strip.position(0), 0.0);
        assert_close(strip.position(1), 403.333_333_333_333_3);
        assert_close(strip.position(2), 806.666_666_666_666_6);
        assert_close(strip.total_span(), 1200.0);
    }

    #[test]
    fn test_reveal_trailing_edge_when_moving_right() {
        let clock = AnimationClock::starting_at(0.0);
        let spans = [600.0, 600.0, 600.0];
        let strip = Strip::new(&spans, 10.0, 1000.0);
        let mut state = ViewportState {
            view_offset_pixels: AnimatedValue::Static(-10.0),
            ..Default::default()
        };

        let motion = spring_motion(&clock, 0.0);
        state.transition_to_column(1, &strip, false, CenteringMode::JustInView, None, &motion);
        assert_eq!(state.active_column_index, 1);
        assert_close(state.view_offset_pixels.target(), -390.0);
        // Trailing edge plus gap lines up with the view's end
        let view_end = state.view_position(&strip, &clock, 0.0) + 1000.0;
        assert_close(view_end, strip.position(1) + 600.0 + 10.0);

        state.transition_to_column(0, &strip, false, CenteringMode::JustInView, Some(1), &motion);
        assert_close(state.view_offset_pixels.target(), -10.0);
    }

    #[test]
    fn test_fully_visible_target_keeps_view() {
        let clock = AnimationClock::starting_at(0.0);
        let spans = [300.0, 300.0, 300.0];
        let strip = Strip::new(&spans, 10.0, 1000.0);
        let mut state = ViewportState {
            view_offset_pixels: AnimatedValue::Static(-10.0),
            ..Default::default()
        };
        let before = state.view_position(&strip, &clock, 0.0);
        state.transition_to_column(1, &strip, true, CenteringMode::JustInView, None, &spring_motion(&clock, 0.0));
        assert_eq!(state.active_column_index, 1);
        assert_close(state.view_position(&strip, &clock, 0.0), before);
        assert!(!state.is_animating(&clock, 0.0));
    }

    #[test]
    fn test_center_mode() {
        let clock = AnimationClock::starting_at(0.0);
        let spans = [400.0, 400.0, 400.0];
        let strip = Strip::new(&spans, 10.0, 1200.0);
        let mut state = ViewportState::default();
        state.transition_to_column(2, &strip, false, CenteringMode::Center, None, &spring_motion(&clock, 0.0));
        assert_close(state.view_offset_pixels.target(), -400.0);

        // Too wide to center falls back to fitting
        let wide = [1300.0];
        let strip = Strip::new(&wide, 10.0, 1200.0);
        state.transition_to_column(0, &strip, false, CenteringMode::Center, None, &spring_motion(&clock, 0.0));
        assert_close(state.view_offset_pixels.target(), 0.0);
    }

    #[test]
    fn test_on_overflow_centers_only_when_pair_does_not_fit() {
        let clock = AnimationClock::starting_at(0.0);
        let motion = spring_motion(&clock, 0.0);

        let big = [600.0, 600.0];
        let strip = Strip::new(&big, 10.0, 1000.0);
        let mut state = ViewportState::default();
        state.transition_to_column(1, &strip, false, CenteringMode::OnOverflow, Some(0), &motion);
        assert_close(state.view_offset_pixels.target(), -200.0);

        let small = [300.0, 300.0, 300.0, 300.0];
        let strip = Strip::new(&small, 10.0, 1000.0);
        let mut state = ViewportState {
            view_offset_pixels: AnimatedValue::Static(-10.0),
            ..Default::default()
        };
        state.transition_to_column(3, &strip, false, CenteringMode::OnOverflow, Some(2), &motion);
        assert_close(state.view_offset_pixels.target(), 300.0 + 10.0 - 1000.0);
    }

    #[test]
    fn test_animated_transition_starts_where_view_is() {
        let clock = AnimationClock::starting_at(0.0);
        let spans = [600.0, 600.0, 600.0];
        let strip = Strip::new(&spans, 10.0, 1000.0);
        let mut state = ViewportState {
            view_offset_pixels: AnimatedValue::Static(-10.0),
            ..Default::default()
        };
        let before = state.view_position(&strip, &clock, 1.0);
        state.transition_to_column(2, &strip, true, CenteringMode::JustInView, None, &spring_motion(&clock, 1.0));

        assert!(state.is_animating(&clock, 1.1));
        assert_close(state.view_position(&strip, &clock, 1.0), before);
        assert!(!state.settle(&clock, 10.0));
        assert_eq!(state.view_offset_pixels, AnimatedValue::Static(600.0 + 10.0 - 1000.0));
    }

    #[test]
    fn test_easing_transition_and_instant_clock() {
        let mut clock = AnimationClock::starting_at(0.0);
        let spans = [600.0, 600.0];
        let strip = Strip::new(&spans, 10.0, 1000.0);
        let config = AnimationConfig::Easing {
            curve: EasingCurve::EaseOutCubic,
            duration: 0.25,
        };
        let mut state = ViewportState::default();
        state.transition_to_column(1, &strip, true, CenteringMode::JustInView, Some(0), &Motion::new(config, &clock, 0.0));
        assert!(state.is_animating(&clock, 0.1));

        clock.set_complete_instantly(true);
        assert!(!state.is_animating(&clock, 0.1));
        assert_close(state.current_offset(&clock, 0.1), -390.0);
    }

    #[test]
    fn test_scroll_by_is_clamped() {
        let clock = AnimationClock::starting_at(0.0);
        let spans = [500.0, 500.0];
        let strip = Strip::new(&spans, 10.0, 800.0);
        let mut state = ViewportState::default();
        state.scroll_by(-500.0, &strip, &clock, 0.0);
        assert_close(state.view_position(&strip, &clock, 0.0), -10.0);
        state.scroll_by(5000.0, &strip, &clock, 0.0);
        assert_close(state.view_position(&strip, &clock, 0.0), 1010.0 + 10.0 - 800.0);
    }

    #[test]
    fn test_gesture_fling_lands_on_a_container() {
        let clock = AnimationClock::starting_at(0.0);
        let spans = [500.0, 500.0, 500.0, 500.0];
        let strip = Strip::new(&spans, 10.0, 1000.0);
        let mut state = ViewportState {
            view_offset_pixels: AnimatedValue::Static(-10.0),
            ..Default::default()
        };

        state.begin_gesture(&clock, 0.0);
        for step in 1..=10 {
            state.update_gesture(20.0, f64::from(step) * 0.01);
        }
        assert!(state.is_animating(&clock, 0.1));
        assert_close(state.current_offset(&clock, 0.1), 190.0);

        let motion = spring_motion(&clock, 0.1);
        let landed = state.end_gesture(&strip, CenteringMode::JustInView, 0.997, &motion).unwrap();
        assert!(landed > 0, "a fast swipe right should move forward");
        assert!(state.gesture.is_none());
        assert!(!state.settle(&clock, 10.0));
        assert_close(state.view_offset_pixels.target(), -10.0);
    }

    #[test]
    fn test_gesture_without_history_snaps_nearest() {
        let clock = AnimationClock::starting_at(0.0);
        let spans = [500.0, 500.0];
        let strip = Strip::new(&spans, 10.0, 1000.0);
        let mut state = ViewportState::default();
        state.begin_gesture(&clock, 0.0);
        state.update_gesture(400.0, 0.0);
        let landed = state.end_gesture(&strip, CenteringMode::JustInView, 0.997, &spring_motion(&clock, 0.0));
        assert_eq!(landed, Some(1));
        assert!(state.end_gesture(&strip, CenteringMode::JustInView, 0.997, &spring_motion(&clock, 0.0)).is_none());
    }

    #[test]
    fn test_selection_progress_is_clamped() {
        let mut state = ViewportState::default();
        state.set_selection_progress(3.0);
        assert_eq!(state.selection_progress, 1.0);
        state.set_selection_progress(f64::NAN);
        assert_eq!(state.selection_progress, 0.0);
    }
}
