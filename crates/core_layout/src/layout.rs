//! Frame computation.
//!
//! `calculate_layout` samples the viewport and every render offset at the
//! given time and produces physical-pixel-aligned frames. It only reads the
//! structure; the memo `Cell`s on the nodes are the one thing it writes.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::animation::AnimationClock;
use crate::engine::LayoutEngine;
use crate::options::Gaps;
use crate::solver::{self, SolverInput};
use crate::tree::{Container, NodeId, SizingMode};
use crate::viewport::Strip;
use crate::workspace::{Monitor, WorkspaceId};
use crate::{HideSide, Orientation, Point, Rect, WindowId};

/// Inset of the parked rect from the view's far corner.
const PARKED_INSET: f64 = 2.0;

/// Usable part of a monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingArea {
    /// Area windows are tiled in (monitor minus docks and bars).
    pub working_frame: Rect,
    /// Area fullscreen windows cover.
    pub view_frame: Rect,
    pub scale: f64,
}

/// Geometry and time for one layout pass.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams<'a> {
    pub monitor_frame: Rect,
    pub working_area: Option<WorkingArea>,
    pub gaps: Gaps,
    pub scale: f64,
    pub orientation: Orientation,
    pub clock: &'a AnimationClock,
    pub time: f64,
}

impl<'a> LayoutParams<'a> {
    pub fn new(monitor_frame: Rect, clock: &'a AnimationClock, time: f64) -> Self {
        Self {
            monitor_frame,
            working_area: None,
            gaps: Gaps::default(),
            scale: 1.0,
            orientation: Orientation::Horizontal,
            clock,
            time,
        }
    }

    pub fn for_monitor(monitor: &Monitor, clock: &'a AnimationClock, time: f64) -> Self {
        Self::new(monitor.frame, clock, time)
            .with_scale(monitor.scale)
            .with_orientation(monitor.orientation)
    }

    pub fn with_gaps(mut self, gaps: Gaps) -> Self {
        self.gaps = gaps;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_working_area(mut self, area: WorkingArea) -> Self {
        self.working_area = Some(area);
        self
    }

    fn working_frame(&self) -> Rect {
        self.working_area.map_or(self.monitor_frame, |a| a.working_frame)
    }

    fn view_frame(&self) -> Rect {
        self.working_area.map_or(self.monitor_frame, |a| a.view_frame)
    }

    fn effective_scale(&self) -> f64 {
        self.working_area.map_or(self.scale, |a| a.scale)
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    /// On-screen frames of windows in visible containers.
    pub frames: HashMap<WindowId, Rect>,
    /// Side of the view each off-screen window fell off.
    pub hidden_handles: HashMap<WindowId, HideSide>,
    /// Corner placement of off-screen windows.
    pub parked_frames: HashMap<WindowId, Rect>,
    /// Tabs that are not the active tile of their container.
    pub inactive_tiles: HashSet<WindowId>,
}

impl LayoutResult {
    pub fn is_visible(&self, window: WindowId) -> bool {
        self.frames.contains_key(&window)
    }
}

struct Placement {
    handle: WindowId,
    frame: Rect,
    inactive: bool,
}

impl LayoutEngine {
    /// Compute every window frame of `workspace` at `params.time`.
    pub fn calculate_layout(&self, workspace: WorkspaceId, params: &LayoutParams<'_>) -> LayoutResult {
        let mut result = LayoutResult::default();
        let Some(ws) = self.workspaces.get(&workspace) else {
            return result;
        };
        if ws.is_empty() {
            return result;
        }

        let axis = params.orientation;
        let across = axis.perpendicular();
        let working = params.working_frame();
        let view = params.view_frame();
        let scale = params.effective_scale();
        let gap = params.gaps.along(axis);
        let across_gap = params.gaps.along(across);
        let view_span = working.span_along(axis);

        let spans: Vec<f64> = ws
            .columns
            .iter()
            .map(|&c| self.tree.resolve_and_cache_span(c, axis, view_span, gap))
            .collect();
        let strip = Strip::new(&spans, gap, view_span);
        let view_start = ws.viewport.view_position(&strip, params.clock, params.time);
        let view_end = view_start + view_span;

        // Outer gap on both cross-axis edges
        let across_origin = working.origin_along(across) + across_gap;
        let across_len = (working.span_along(across) - 2.0 * across_gap).max(1.0);

        let average_span = spans.iter().sum::<f64>() / spans.len() as f64;
        let corner = Point::new(view.right() - PARKED_INSET, view.bottom() - PARKED_INSET);
        let parked_rect = Rect::from_axes(
            axis,
            corner.along(axis),
            average_span,
            corner.along(across),
            across_len,
        );

        for (idx, &column) in ws.columns.iter().enumerate() {
            let Some(container) = self.tree.container(column) else {
                continue;
            };
            let col_start = strip.position(idx);
            let span = spans[idx];
            let col_end = col_start + span;

            if col_start < view_end && col_end > view_start {
                let along_origin = working.origin_along(axis) + col_start - view_start;
                let offset = container.render_offset.value_at(params.clock, params.time);
                let frame = Rect::from_axes(axis, along_origin, span, across_origin, across_len)
                    .offset_by(offset)
                    .round_to_physical(scale);
                container.set_frame(frame);

                for placement in self.place_windows(container, frame, axis, across_gap, view, scale, params) {
                    if placement.inactive {
                        result.inactive_tiles.insert(placement.handle);
                    }
                    result.frames.insert(placement.handle, placement.frame);
                }
            } else {
                let side = if col_end <= view_start {
                    HideSide::Left
                } else {
                    HideSide::Right
                };
                let frame = parked_rect.round_to_physical(scale);
                container.set_frame(frame);

                for placement in self.place_windows(container, frame, axis, across_gap, view, scale, params) {
                    if placement.inactive {
                        result.inactive_tiles.insert(placement.handle);
                    }
                    result.hidden_handles.insert(placement.handle, side);
                    result.parked_frames.insert(placement.handle, placement.frame);
                }
            }
        }

        trace!(
            "Layout of {:?}: {} visible, {} hidden",
            workspace,
            result.frames.len(),
            result.hidden_handles.len()
        );
        result
    }

    /// Place the windows of one container inside `frame`.
    #[allow(clippy::too_many_arguments)]
    fn place_windows(
        &self,
        container: &Container,
        frame: Rect,
        axis: Orientation,
        gap: f64,
        view: Rect,
        scale: f64,
        params: &LayoutParams<'_>,
    ) -> Vec<Placement> {
        let across = axis.perpendicular();
        let windows: Vec<(NodeId, _)> = container
            .children
            .iter()
            .filter_map(|&id| self.tree.window(id).map(|w| (id, w)))
            .collect();
        if windows.is_empty() {
            return Vec::new();
        }

        let tabbed = container.is_tabbed();
        let content = if tabbed {
            let stripe = self.options.tab_indicator_width.min(frame.width - 1.0).max(0.0);
            Rect::new(frame.x + stripe, frame.y, frame.width - stripe, frame.height)
        } else {
            frame
        };

        let inputs: Vec<SolverInput> = windows
            .iter()
            .map(|(_, w)| {
                let request = w.size_along(across);
                let input = match request.fixed() {
                    Some(size) => SolverInput::fixed(size),
                    None => SolverInput::auto(request.weight()),
                };
                input.with_bounds(w.constraints.min_along(across), w.constraints.max_along(across))
            })
            .collect();
        let sizes = solver::solve(&inputs, content.span_along(across), gap, tabbed);

        let along_origin = content.origin_along(axis);
        let along_len = content.span_along(axis);
        let mut cursor = content.origin_along(across);
        let mut placements = Vec::with_capacity(windows.len());

        for (idx, ((_, window), output)) in windows.iter().zip(&sizes).enumerate() {
            let slot = if tabbed {
                content
            } else {
                let slot = Rect::from_axes(axis, along_origin, along_len, cursor, output.size);
                cursor += output.size + gap;
                slot
            };

            let base = match window.sizing_mode {
                SizingMode::Fullscreen => view,
                SizingMode::Maximized => content,
                SizingMode::Normal => slot,
            };
            let offset = window.render_offset.value_at(params.clock, params.time);
            let placed = base.offset_by(offset).round_to_physical(scale);

            window.record_placement(placed, axis, base.span_along(axis), false);
            window.record_placement(placed, across, output.size, output.was_constrained);

            placements.push(Placement {
                handle: window.handle,
                frame: placed,
                inactive: tabbed && idx != container.active_tile_idx,
            });
        }
        placements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Insertion, ViewContext, WindowHints};
    use crate::options::LayoutOptions;
    use crate::tree::{ColumnDisplay, ColumnSize, WindowSize};
    use crate::workspace::MonitorId;

    const WS: WorkspaceId = WorkspaceId(1);

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }

    fn still_engine(column_width: ColumnSize) -> LayoutEngine {
        let mut options = LayoutOptions::default();
        options.default_column_width = column_width;
        options.animations.enabled = false;
        let mut engine = LayoutEngine::new(options);
        engine.add_workspace(WS);
        engine
    }

    fn fill(engine: &mut LayoutEngine, ctx: &ViewContext<'_>, handles: &[WindowId]) {
        for &handle in handles {
            engine
                .add_window(WS, handle, WindowHints::default(), Insertion::NewColumn, ctx)
                .unwrap();
        }
    }

    #[test]
    fn test_three_equal_columns() {
        let clock = AnimationClock::starting_at(0.0);
        let monitor = Rect::new(0.0, 0.0, 1200.0, 800.0);
        let ctx = ViewContext::new(monitor, Gaps::uniform(10.0), &clock, 0.0);
        let mut engine = still_engine(ColumnSize::Proportion(1.0 / 3.0));
        fill(&mut engine, &ctx, &[1, 2, 3]);

        let params = LayoutParams::new(monitor, &clock, 0.0).with_scale(3.0);
        let result = engine.calculate_layout(WS, &params);
        assert_eq!(result.frames.len(), 3);
        assert!(result.hidden_handles.is_empty());

        let frames: Vec<Rect> = (1..=3).map(|h| result.frames[&h]).collect();
        for frame in &frames {
            assert_close(frame.width, 393.333);
            assert_close(frame.y, 10.0);
            assert_close(frame.height, 780.0);
        }
        assert_close(frames[1].x - frames[0].x, 403.333);
        assert_close(frames[2].x - frames[1].x, 403.333);

        let column = engine.workspace(WS).unwrap().columns()[0];
        assert_close(engine.tree().container(column).unwrap().cached_width(), 393.333);
    }

    #[test]
    fn test_hidden_side_matches_strip_position() {
        let clock = AnimationClock::starting_at(0.0);
        let monitor = Rect::new(0.0, 0.0, 1200.0, 800.0);
        let ctx = ViewContext::new(monitor, Gaps::uniform(10.0), &clock, 0.0);
        let mut engine = still_engine(ColumnSize::Proportion(0.5));
        fill(&mut engine, &ctx, &[1, 2, 3, 4]);

        // Column 4 is revealed at the trailing edge: the view covers [1220, 2420)
        let params = LayoutParams::new(monitor, &clock, 0.0);
        let result = engine.calculate_layout(WS, &params);
        assert_eq!(result.hidden_handles.get(&1), Some(&HideSide::Left));
        assert_eq!(result.hidden_handles.get(&2), Some(&HideSide::Left));
        assert!(result.is_visible(3) && result.is_visible(4));
        assert!(!result.frames.contains_key(&1));
        assert_eq!(result.parked_frames[&1].x, 1198.0);
        assert_eq!(result.parked_frames[&1].y, 798.0);

        engine.focus_window(1, &ctx).unwrap();
        let result = engine.calculate_layout(WS, &params);
        assert_eq!(result.frames[&1].x, 10.0);
        assert_eq!(result.hidden_handles.get(&3), Some(&HideSide::Right));
        assert_eq!(result.hidden_handles.get(&4), Some(&HideSide::Right));
        assert!(!result.hidden_handles.contains_key(&2));
    }

    #[test]
    fn test_stacked_windows_use_solver() {
        let clock = AnimationClock::starting_at(0.0);
        let monitor = Rect::new(0.0, 0.0, 1000.0, 820.0);
        let ctx = ViewContext::new(monitor, Gaps::uniform(10.0), &clock, 0.0);
        let mut engine = still_engine(ColumnSize::Proportion(0.5));
        fill(&mut engine, &ctx, &[1]);
        let hints = WindowHints {
            height: WindowSize::Fixed(100.0),
            ..Default::default()
        };
        engine.add_window(WS, 2, hints, Insertion::IntoColumn(0), &ctx).unwrap();
        engine.add_window(WS, 3, WindowHints::default(), Insertion::IntoColumn(0), &ctx).unwrap();

        let result = engine.calculate_layout(WS, &LayoutParams::new(monitor, &clock, 0.0));
        // 800 tall content, two gaps, one fixed window of 100
        assert_eq!(result.frames[&2].height, 100.0);
        assert_eq!(result.frames[&1].height, 340.0);
        assert_eq!(result.frames[&3].height, 340.0);
        assert_eq!(result.frames[&2].y, result.frames[&1].bottom() + 10.0);
        assert_eq!(result.frames[&3].y, result.frames[&2].bottom() + 10.0);
    }

    #[test]
    fn test_tabbed_container_overlaps_tiles() {
        let clock = AnimationClock::starting_at(0.0);
        let monitor = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let ctx = ViewContext::new(monitor, Gaps::uniform(10.0), &clock, 0.0);
        let mut engine = still_engine(ColumnSize::Proportion(0.5));
        fill(&mut engine, &ctx, &[1]);
        engine.add_window(WS, 2, WindowHints::default(), Insertion::IntoColumn(0), &ctx).unwrap();
        engine.set_column_display(WS, 0, ColumnDisplay::Tabbed).unwrap();

        let result = engine.calculate_layout(WS, &LayoutParams::new(monitor, &clock, 0.0));
        let column = engine.tree().container(engine.workspace(WS).unwrap().columns()[0]).unwrap();
        let outer = column.frame().unwrap();
        assert_eq!(result.frames[&1], result.frames[&2]);
        assert_eq!(result.frames[&1].x, outer.x + 12.0);
        assert_eq!(result.frames[&1].height, outer.height);
        assert!(result.inactive_tiles.contains(&1));
        assert!(!result.inactive_tiles.contains(&2));
    }

    #[test]
    fn test_sizing_modes() {
        let clock = AnimationClock::starting_at(0.0);
        let monitor = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let ctx = ViewContext::new(monitor, Gaps::uniform(10.0), &clock, 0.0);
        let mut engine = still_engine(ColumnSize::Proportion(0.5));
        fill(&mut engine, &ctx, &[1]);
        engine.add_window(WS, 2, WindowHints::default(), Insertion::IntoColumn(0), &ctx).unwrap();
        engine.set_sizing_mode(1, SizingMode::Maximized).unwrap();

        let area = WorkingArea {
            working_frame: Rect::new(0.0, 30.0, 1000.0, 770.0),
            view_frame: monitor,
            scale: 1.0,
        };
        let params = LayoutParams::new(monitor, &clock, 0.0).with_working_area(area);
        let result = engine.calculate_layout(WS, &params);
        assert_eq!(result.frames[&1].y, 40.0);
        assert_eq!(result.frames[&1].height, 750.0);

        engine.set_sizing_mode(2, SizingMode::Fullscreen).unwrap();
        let result = engine.calculate_layout(WS, &params);
        assert_eq!(result.frames[&2], monitor);
    }

    #[test]
    fn test_vertical_monitor_transposes() {
        let clock = AnimationClock::starting_at(0.0);
        let monitor = Monitor::new(MonitorId(0), "portrait", Rect::new(0.0, 0.0, 800.0, 1200.0))
            .with_orientation(Orientation::Vertical);
        let ctx = ViewContext::for_monitor(&monitor, Gaps::uniform(10.0), &clock, 0.0);
        let mut engine = still_engine(ColumnSize::Proportion(0.5));
        fill(&mut engine, &ctx, &[1, 2]);

        let params = LayoutParams::for_monitor(&monitor, &clock, 0.0);
        let result = engine.calculate_layout(WS, &params);
        let (a, b) = (result.frames[&1], result.frames[&2]);
        assert_eq!(a.x, 10.0);
        assert_eq!(a.width, 780.0);
        assert_eq!(a.height, 595.0);
        assert_eq!(b.y - a.y, 605.0);
        assert_eq!(engine.tree().window(engine.node_for_handle(1).unwrap()).unwrap().resolved_size(Orientation::Vertical), 595.0);
    }

    #[test]
    fn test_layout_does_not_change_structure() {
        let clock = AnimationClock::starting_at(0.0);
        let monitor = Rect::new(0.0, 0.0, 1200.0, 800.0);
        let ctx = ViewContext::new(monitor, Gaps::uniform(10.0), &clock, 0.0);
        let mut engine = still_engine(ColumnSize::Proportion(0.5));
        fill(&mut engine, &ctx, &[1, 2, 3]);
        let params = LayoutParams::new(monitor, &clock, 0.0);

        let before = engine.workspace(WS).unwrap().viewport.clone();
        let first = engine.calculate_layout(WS, &params);
        let second = engine.calculate_layout(WS, &params);
        assert_eq!(first, second);
        assert_eq!(engine.workspace(WS).unwrap().viewport, before);
        assert!(engine.calculate_layout(WorkspaceId(7), &params).frames.is_empty());
    }
}
