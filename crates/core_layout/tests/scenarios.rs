//! End-to-end engine scenarios.
//!
//! These drive the engine the way the daemon does: discovery events and
//! focus commands mutate it, and layout is sampled at increasing times.

use scrollwm_core_layout::{
    AnimationClock, ColumnSize, Direction, FrozenWorld, Gaps, HideSide, Insertion, LayoutEngine,
    LayoutOptions, LayoutParams, Rect, ViewContext, WindowHints, WindowId, WorkspaceId,
};

const WS: WorkspaceId = WorkspaceId(1);
const MONITOR: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1200.0,
    height: 800.0,
};

fn ctx(clock: &AnimationClock, time: f64) -> ViewContext<'_> {
    ViewContext::new(MONITOR, Gaps::uniform(10.0), clock, time)
}

fn params(clock: &AnimationClock, time: f64) -> LayoutParams<'_> {
    LayoutParams::new(MONITOR, clock, time).with_gaps(Gaps::uniform(10.0))
}

fn engine_with(handles: &[WindowId], clock: &AnimationClock) -> LayoutEngine {
    let mut engine = LayoutEngine::new(LayoutOptions::default());
    engine.add_workspace(WS);
    for &handle in handles {
        engine
            .add_window(WS, handle, WindowHints::default(), Insertion::NewColumn, &ctx(clock, 0.0))
            .unwrap();
    }
    engine
}

#[test]
fn test_navigation_animates_then_settles() {
    let clock = AnimationClock::starting_at(0.0);
    let mut engine = engine_with(&[1, 2, 3], &clock);
    assert!(!engine.settle(&clock, 5.0));

    let start = engine.calculate_layout(WS, &params(&clock, 5.0));
    let current = engine.selected_window(WS).unwrap();
    let target = engine
        .focus_target(Direction::Left, current, WS, &ctx(&clock, 5.0))
        .and_then(|n| engine.handle_of(n));
    assert_eq!(target, Some(2));

    // The first sample after the command still shows the old frame
    let first = engine.calculate_layout(WS, &params(&clock, 5.0));
    assert_eq!(first.frames.get(&3), start.frames.get(&3));

    let mut previous_x = first.frames[&2].x;
    for step in 1..=20 {
        let time = 5.0 + f64::from(step) * 0.016;
        let x = engine.calculate_layout(WS, &params(&clock, time)).frames[&2].x;
        assert!(x >= previous_x - 0.5, "column moved backwards at {time}");
        previous_x = x;
    }

    assert!(!engine.settle(&clock, 10.0));
    let settled = engine.calculate_layout(WS, &params(&clock, 10.0));
    assert_eq!(settled.frames[&2].x, 10.0);
    assert_eq!(settled.frames[&3].x, 615.0);
    assert_eq!(settled.hidden_handles.get(&1).copied(), Some(HideSide::Left));
}

#[test]
fn test_removal_keeps_view_in_place() {
    let clock = AnimationClock::starting_at(0.0);
    let mut engine = engine_with(&[1, 2, 3], &clock);
    engine.settle(&clock, 5.0);

    let before = engine.calculate_layout(WS, &params(&clock, 5.0));
    engine.remove_window(3, &ctx(&clock, 5.0)).unwrap();
    let after = engine.calculate_layout(WS, &params(&clock, 5.0));

    assert_eq!(after.frames.get(&2), before.frames.get(&2));
    assert!(engine.is_animating(&clock, 5.1));
    assert!(!engine.settle(&clock, 10.0));

    let ws = engine.workspace(WS).unwrap();
    assert_eq!(ws.column_count(), 2);
    assert_eq!(ws.viewport.active_column_index, 1);
}

#[test]
fn test_instant_clock_skips_animation() {
    let mut clock = AnimationClock::starting_at(0.0);
    clock.set_complete_instantly(true);
    let mut engine = engine_with(&[1, 2, 3, 4], &clock);
    assert!(!engine.is_animating(&clock, 0.0));

    let current = engine.selected_window(WS).unwrap();
    engine.focus_column_first(current, WS, &ctx(&clock, 1.0));
    assert!(!engine.is_animating(&clock, 1.0));
    let result = engine.calculate_layout(WS, &params(&clock, 1.0));
    assert_eq!(result.frames[&1].x, 10.0);
}

#[test]
fn test_swipe_lands_on_a_container() {
    let clock = AnimationClock::starting_at(0.0);
    let mut engine = engine_with(&[1, 2, 3, 4], &clock);
    let current = engine.selected_window(WS).unwrap();
    engine.focus_column_first(current, WS, &ctx(&clock, 0.0));
    engine.settle(&clock, 5.0);

    assert!(engine.begin_gesture(WS, &ctx(&clock, 5.0)));
    for step in 1..=10 {
        let time = 5.0 + f64::from(step) * 0.01;
        assert!(engine.update_gesture(WS, 30.0, &ctx(&clock, time)));
    }
    let landed = engine.end_gesture(WS, &ctx(&clock, 5.1)).unwrap();
    let ws = engine.workspace(WS).unwrap();
    assert!(ws.viewport.active_column_index > 0);
    assert_eq!(ws.selected(), Some(landed));
    assert!(!engine.update_gesture(WS, 1.0, &ctx(&clock, 5.2)));
}

#[test]
fn test_scroll_is_clamped_to_strip() {
    let clock = AnimationClock::starting_at(0.0);
    let mut engine = engine_with(&[1, 2], &clock);
    engine.settle(&clock, 5.0);
    assert!(engine.scroll_by(WS, -10_000.0, &ctx(&clock, 5.0)));
    let result = engine.calculate_layout(WS, &params(&clock, 5.0));
    assert_eq!(result.frames[&1].x, 10.0);
    assert!(!engine.scroll_by(WorkspaceId(42), 10.0, &ctx(&clock, 5.0)));
}

#[test]
fn test_session_restore_resumes_navigation() {
    let clock = AnimationClock::starting_at(0.0);
    let mut engine = engine_with(&[1, 2, 3], &clock);
    engine
        .set_column_width(WS, 1, ColumnSize::Proportion(1.0))
        .unwrap();
    engine.settle(&clock, 5.0);

    let json = serde_json::to_string_pretty(&engine.freeze(&clock, 5.0)).unwrap();
    let world: FrozenWorld = serde_json::from_str(&json).unwrap();

    let mut restored = LayoutEngine::new(LayoutOptions::default());
    restored.restore(&world).unwrap();
    assert_eq!(restored.workspace(WS).unwrap().column_count(), 3);

    let current = restored.selected_window(WS).unwrap();
    assert_eq!(restored.handle_of(current), Some(3));
    let left = restored
        .focus_target(Direction::Left, current, WS, &ctx(&clock, 6.0))
        .and_then(|n| restored.handle_of(n));
    assert_eq!(left, Some(2));
    restored.settle(&clock, 10.0);
    let result = restored.calculate_layout(WS, &params(&clock, 10.0));
    assert_eq!(result.frames[&2].width, 1200.0);
}
