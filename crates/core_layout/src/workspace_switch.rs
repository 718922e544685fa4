//! Switching between the workspaces stacked on one monitor.
//!
//! Workspaces of a monitor sit on a vertical stack. The stack position is a
//! fractional index: `1.5` means half way between the second and the third
//! workspace. A switch either animates that index toward a workspace or
//! follows a swipe.

use tracing::{debug, trace};

use crate::animation::{
    AnimatedValue, Animate, AnimationClock, AnimationConfig, DecelerationAnimation,
};
use crate::viewport::ViewGesture;
use crate::workspace::WorkspaceId;

/// A swipe across the workspace stack.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSwitchGesture {
    pub start_index: f64,
    pub current_index: f64,
    /// Workspace that was active when the swipe began. The swipe reaches at
    /// most one workspace past it in either direction.
    pub center_index: usize,
    tracker: ViewGesture,
}

impl WorkspaceSwitchGesture {
    fn new(current_index: f64, center_index: usize) -> Self {
        Self {
            start_index: current_index,
            current_index,
            center_index,
            tracker: ViewGesture::default(),
        }
    }

    /// Release velocity in workspaces per second.
    pub fn velocity(&self) -> f64 {
        self.tracker.velocity()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceSwitch {
    Animation(AnimatedValue),
    Gesture(WorkspaceSwitchGesture),
}

impl WorkspaceSwitch {
    pub fn current_index(&self, clock: &AnimationClock, time: f64) -> f64 {
        match self {
            WorkspaceSwitch::Animation(value) => value.value_at(clock, time),
            WorkspaceSwitch::Gesture(gesture) => gesture.current_index,
        }
    }

    /// A gesture keeps the switch alive until it is released.
    pub fn is_animating(&self, clock: &AnimationClock, time: f64) -> bool {
        match self {
            WorkspaceSwitch::Animation(value) => value.is_animating(clock, time),
            WorkspaceSwitch::Gesture(_) => true,
        }
    }
}

/// The workspaces of one monitor and the switch between them.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceStack {
    workspaces: Vec<WorkspaceId>,
    active: usize,
    switch: Option<WorkspaceSwitch>,
}

impl WorkspaceStack {
    pub fn new(workspaces: Vec<WorkspaceId>) -> Self {
        Self {
            workspaces,
            active: 0,
            switch: None,
        }
    }

    pub fn workspaces(&self) -> &[WorkspaceId] {
        &self.workspaces
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_workspace(&self) -> Option<WorkspaceId> {
        self.workspaces.get(self.active).copied()
    }

    pub fn switch(&self) -> Option<&WorkspaceSwitch> {
        self.switch.as_ref()
    }

    pub fn push(&mut self, workspace: WorkspaceId) {
        if !self.workspaces.contains(&workspace) {
            self.workspaces.push(workspace);
        }
    }

    /// Drop a workspace from the stack, keeping the active one where possible.
    pub fn remove(&mut self, workspace: WorkspaceId) -> bool {
        let Some(pos) = self.workspaces.iter().position(|&w| w == workspace) else {
            return false;
        };
        self.workspaces.remove(pos);
        if pos < self.active {
            self.active -= 1;
        }
        self.active = self.active.min(self.workspaces.len().saturating_sub(1));
        self.switch = None;
        true
    }

    /// Stack position as drawn at `time`.
    pub fn current_index(&self, clock: &AnimationClock, time: f64) -> f64 {
        self.switch
            .as_ref()
            .map_or(self.active as f64, |s| s.current_index(clock, time))
    }

    /// Make the workspace at `index` active and animate the stack there.
    ///
    /// Returns `false` for an out-of-range index or the already active one.
    pub fn activate(
        &mut self,
        index: usize,
        config: AnimationConfig,
        clock: &AnimationClock,
        time: f64,
    ) -> bool {
        if index >= self.workspaces.len() || (index == self.active && self.switch.is_none()) {
            return false;
        }
        let from = self.current_index(clock, time);
        let velocity = match &self.switch {
            Some(WorkspaceSwitch::Animation(value)) => value.velocity_at(clock, time),
            _ => 0.0,
        };
        debug!("Switching workspace {} -> {}", self.active, index);
        self.active = index;
        self.switch = Some(WorkspaceSwitch::Animation(config.animate(
            from,
            index as f64,
            velocity,
            clock,
            time,
        )));
        true
    }

    pub fn activate_workspace(
        &mut self,
        workspace: WorkspaceId,
        config: AnimationConfig,
        clock: &AnimationClock,
        time: f64,
    ) -> bool {
        match self.workspaces.iter().position(|&w| w == workspace) {
            Some(index) => self.activate(index, config, clock, time),
            None => false,
        }
    }

    /// Freeze the stack where it is drawn and start following a swipe.
    pub fn begin_gesture(&mut self, clock: &AnimationClock, time: f64) {
        if self.workspaces.is_empty() {
            return;
        }
        let current = self.current_index(clock, time);
        self.switch = Some(WorkspaceSwitch::Gesture(WorkspaceSwitchGesture::new(current, self.active)));
    }

    /// Move the stack by `delta` pixels of swipe over a monitor `span`
    /// pixels tall. Returns `false` without a gesture.
    pub fn update_gesture(&mut self, delta: f64, span: f64, time: f64) -> bool {
        let last = self.workspaces.len().saturating_sub(1) as f64;
        let Some(WorkspaceSwitch::Gesture(gesture)) = &mut self.switch else {
            return false;
        };
        if span <= 0.0 {
            return true;
        }
        let center = gesture.center_index as f64;
        let low = (center - 1.0).max(0.0);
        let high = (center + 1.0).min(last);
        let step = delta / span;
        gesture.current_index = (gesture.current_index + step).clamp(low, high);
        gesture.tracker.push(time, step);
        true
    }

    /// Release the swipe and land on the workspace nearest the projected
    /// position. Returns the newly active workspace.
    pub fn end_gesture(
        &mut self,
        config: AnimationConfig,
        deceleration_rate: f64,
        clock: &AnimationClock,
        time: f64,
    ) -> Option<WorkspaceId> {
        if !matches!(self.switch, Some(WorkspaceSwitch::Gesture(_))) {
            return None;
        }
        let Some(WorkspaceSwitch::Gesture(gesture)) = self.switch.take() else {
            return None;
        };
        let velocity = gesture.velocity();
        let projected =
            DecelerationAnimation::new(gesture.current_index, velocity, time, deceleration_rate).target();

        let center = gesture.center_index as f64;
        let last = self.workspaces.len().saturating_sub(1) as f64;
        let target = projected.round().clamp((center - 1.0).max(0.0), (center + 1.0).min(last));
        trace!(
            "Workspace swipe released at {:.2}/s, projected {:.2} -> {}",
            velocity,
            projected,
            target
        );

        self.active = target as usize;
        self.switch = Some(WorkspaceSwitch::Animation(config.animate(
            gesture.current_index,
            target,
            velocity,
            clock,
            time,
        )));
        self.active_workspace()
    }

    /// Workspaces drawn at `time`, each with its offset from the monitor in
    /// monitor spans (`-0.5` means half a monitor above).
    pub fn visible(&self, clock: &AnimationClock, time: f64) -> Vec<(WorkspaceId, f64)> {
        let current = self.current_index(clock, time);
        self.workspaces
            .iter()
            .enumerate()
            .map(|(i, &ws)| (ws, i as f64 - current))
            .filter(|&(_, offset)| offset.abs() < 1.0)
            .collect()
    }

    pub fn is_animating(&self, clock: &AnimationClock, time: f64) -> bool {
        self.switch.as_ref().is_some_and(|s| s.is_animating(clock, time))
    }

    /// Drop a finished switch. Returns `true` while the stack is still moving.
    pub fn settle(&mut self, clock: &AnimationClock, time: f64) -> bool {
        if self.is_animating(clock, time) {
            return true;
        }
        self.switch = None;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::EasingCurve;

    fn stack(count: u32) -> WorkspaceStack {
        WorkspaceStack::new((1..=count).map(WorkspaceId).collect())
    }

    fn linear(duration: f64) -> AnimationConfig {
        AnimationConfig::Easing {
            curve: EasingCurve::Linear,
            duration,
        }
    }

    #[test]
    fn test_activate_animates_index() {
        let clock = AnimationClock::starting_at(0.0);
        let mut stack = stack(3);
        assert!(stack.activate(2, linear(1.0), &clock, 0.0));
        assert_eq!(stack.active_workspace(), Some(WorkspaceId(3)));
        assert_eq!(stack.current_index(&clock, 0.0), 0.0);
        assert_eq!(stack.current_index(&clock, 0.5), 1.0);
        assert!(stack.is_animating(&clock, 0.5));

        let visible = stack.visible(&clock, 0.25);
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0], (WorkspaceId(1), -0.5));
        assert_eq!(visible[1], (WorkspaceId(2), 0.5));

        assert!(!stack.settle(&clock, 1.0));
        assert!(stack.switch().is_none());
        assert_eq!(stack.visible(&clock, 1.0), vec![(WorkspaceId(3), 0.0)]);
    }

    #[test]
    fn test_activate_rejects_bad_targets() {
        let clock = AnimationClock::starting_at(0.0);
        let mut stack = stack(2);
        assert!(!stack.activate(0, linear(0.2), &clock, 0.0));
        assert!(!stack.activate(5, linear(0.2), &clock, 0.0));
        assert!(!stack.activate_workspace(WorkspaceId(9), linear(0.2), &clock, 0.0));
        assert!(stack.activate_workspace(WorkspaceId(2), linear(0.2), &clock, 0.0));
    }

    #[test]
    fn test_complete_instantly_snaps() {
        let mut clock = AnimationClock::starting_at(0.0);
        clock.set_complete_instantly(true);
        let mut stack = stack(3);
        stack.activate(1, AnimationConfig::default(), &clock, 0.0);
        assert_eq!(stack.current_index(&clock, 0.0), 1.0);
        assert!(!stack.is_animating(&clock, 0.0));
    }

    #[test]
    fn test_gesture_is_limited_to_neighbours() {
        let clock = AnimationClock::starting_at(0.0);
        let mut stack = stack(4);
        assert!(!stack.update_gesture(100.0, 1000.0, 0.0));

        stack.begin_gesture(&clock, 0.0);
        assert!(stack.is_animating(&clock, 0.0));
        assert!(stack.update_gesture(500.0, 1000.0, 0.01));
        assert_eq!(stack.current_index(&clock, 0.01), 0.5);
        stack.update_gesture(5000.0, 1000.0, 0.02);
        assert_eq!(stack.current_index(&clock, 0.02), 1.0);
        stack.update_gesture(-9000.0, 1000.0, 0.03);
        assert_eq!(stack.current_index(&clock, 0.03), 0.0);
    }

    #[test]
    fn test_gesture_release_lands_on_nearest() {
        let clock = AnimationClock::starting_at(0.0);
        let mut stack = stack(3);
        stack.begin_gesture(&clock, 0.0);
        // Slow drag to 0.7 of a workspace
        for i in 1..=7 {
            stack.update_gesture(100.0, 1000.0, i as f64);
        }
        let landed = stack.end_gesture(linear(0.3), 0.997, &clock, 7.0);
        assert_eq!(landed, Some(WorkspaceId(2)));
        assert_eq!(stack.active_index(), 1);
        assert!(matches!(stack.switch(), Some(WorkspaceSwitch::Animation(_))));
        assert_eq!(stack.end_gesture(linear(0.3), 0.997, &clock, 7.1), None);
        assert!(stack.switch().is_some());
        assert!(!stack.settle(&clock, 8.0));
        assert_eq!(stack.current_index(&clock, 8.0), 1.0);
    }

    #[test]
    fn test_fast_flick_moves_one_workspace() {
        let clock = AnimationClock::starting_at(0.0);
        let mut stack = stack(3);
        stack.begin_gesture(&clock, 0.0);
        stack.update_gesture(50.0, 1000.0, 0.00);
        stack.update_gesture(100.0, 1000.0, 0.05);
        // Only 0.15 travelled, but the velocity carries it over
        let landed = stack.end_gesture(linear(0.3), 0.997, &clock, 0.05);
        assert_eq!(landed, Some(WorkspaceId(2)));
    }

    #[test]
    fn test_remove_keeps_active_workspace() {
        let clock = AnimationClock::starting_at(0.0);
        let mut stack = stack(3);
        stack.activate(2, linear(0.1), &clock, 0.0);
        assert!(stack.remove(WorkspaceId(1)));
        assert_eq!(stack.active_workspace(), Some(WorkspaceId(3)));
        assert!(!stack.remove(WorkspaceId(1)));
        stack.push(WorkspaceId(3));
        assert_eq!(stack.len(), 2);
    }
}
