//! Structural operations: window-discovery events and user edits.
//!
//! The engine owns the node arena and every workspace. Mutations go through
//! `&mut self`; layout sampling (see `layout.rs`) only ever takes `&self`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::animation::{AnimationClock, AnimationConfig, EasingCurve};
use crate::options::{Gaps, LayoutOptions};
use crate::tree::{
    ColumnDisplay, ColumnSize, Container, NodeId, NodeTree, SizeConstraints, SizingMode,
    WindowNode, WindowSize,
};
use crate::viewport::{Motion, Strip, ViewportState};
use crate::workspace::{Monitor, Workspace, WorkspaceId};
use crate::{Direction, LayoutError, Orientation, Rect, WindowId};

/// Smallest span `resize_column_by` shrinks a container to.
pub const MIN_COLUMN_SPAN: f64 = 100.0;

/// Geometry and time that viewport-moving operations work against.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub working_frame: Rect,
    pub gaps: Gaps,
    pub orientation: Orientation,
    pub clock: &'a AnimationClock,
    pub time: f64,
}

impl<'a> ViewContext<'a> {
    pub fn new(working_frame: Rect, gaps: Gaps, clock: &'a AnimationClock, time: f64) -> Self {
        Self {
            working_frame,
            gaps,
            orientation: Orientation::Horizontal,
            clock,
            time,
        }
    }

    pub fn for_monitor(monitor: &Monitor, gaps: Gaps, clock: &'a AnimationClock, time: f64) -> Self {
        Self::new(monitor.frame, gaps, clock, time).with_orientation(monitor.orientation)
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub(crate) fn strip_gap(&self) -> f64 {
        self.gaps.along(self.orientation)
    }

    pub(crate) fn view_span(&self) -> f64 {
        self.working_frame.span_along(self.orientation)
    }
}

/// What the discovery layer knows about a new window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowHints {
    pub constraints: SizeConstraints,
    pub width: WindowSize,
    pub height: WindowSize,
    pub sizing_mode: SizingMode,
    /// Select the window and scroll to it.
    pub focus: bool,
}

impl Default for WindowHints {
    fn default() -> Self {
        Self {
            constraints: SizeConstraints::default(),
            width: WindowSize::default(),
            height: WindowSize::default(),
            sizing_mode: SizingMode::Normal,
            focus: true,
        }
    }
}

/// Where a new window goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Insertion {
    /// A fresh container right after the active one.
    #[default]
    NewColumn,
    /// The end of an existing container.
    IntoColumn(usize),
}

/// The layout engine: node arena, workspaces and options.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    pub(crate) tree: NodeTree,
    pub(crate) workspaces: BTreeMap<WorkspaceId, Workspace>,
    pub options: LayoutOptions,
    focus_sequence: u64,
}

impl LayoutEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Create a workspace, or return the existing one.
    pub fn add_workspace(&mut self, id: WorkspaceId) -> &mut Workspace {
        self.workspaces.entry(id).or_insert_with(|| Workspace::new(id))
    }

    /// Remove a workspace together with its containers and windows.
    pub fn remove_workspace(&mut self, id: WorkspaceId) -> Option<Workspace> {
        let workspace = self.workspaces.remove(&id)?;
        for &column in &workspace.columns {
            self.tree.remove_container(column);
        }
        Some(workspace)
    }

    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    pub fn workspace_mut(&mut self, id: WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.get_mut(&id)
    }

    pub fn workspace_ids(&self) -> impl Iterator<Item = WorkspaceId> + '_ {
        self.workspaces.keys().copied()
    }

    pub fn node_for_handle(&self, handle: WindowId) -> Option<NodeId> {
        self.tree.node_for_handle(handle)
    }

    pub fn handle_of(&self, node: NodeId) -> Option<WindowId> {
        self.tree.window(node).map(|w| w.handle)
    }

    /// Workspace holding `node` (a window or a container).
    pub fn workspace_of(&self, node: NodeId) -> Option<WorkspaceId> {
        let column = self.tree.column_of(node)?;
        self.workspaces
            .values()
            .find(|ws| ws.columns.contains(&column))
            .map(|ws| ws.id)
    }

    /// Strip index of the container holding `node`.
    pub fn column_index_of(&self, node: NodeId, workspace: WorkspaceId) -> Option<usize> {
        let column = self.tree.column_of(node)?;
        self.workspaces.get(&workspace)?.column_index(column)
    }

    pub fn selected_window(&self, workspace: WorkspaceId) -> Option<NodeId> {
        self.workspaces.get(&workspace)?.selected
    }

    /// Make `node` the selected window of its workspace and record the focus.
    pub fn select(&mut self, node: NodeId) -> bool {
        let Some(ws_id) = self.workspace_of(node) else {
            return false;
        };
        if self.tree.window(node).is_none() {
            return false;
        }
        if let Some(ws) = self.workspaces.get_mut(&ws_id) {
            ws.selected = Some(node);
        }
        self.note_focus(node);
        true
    }

    fn note_focus(&mut self, node: NodeId) {
        self.focus_sequence += 1;
        let sequence = self.focus_sequence;
        if let Some(window) = self.tree.window_mut(node) {
            window.last_focused = sequence;
        }
    }

    /// Resolved container spans along the context's scroll axis.
    pub(crate) fn strip_spans(&self, workspace: &Workspace, ctx: &ViewContext<'_>) -> Vec<f64> {
        workspace
            .columns
            .iter()
            .map(|&column| {
                self.tree.resolve_and_cache_span(
                    column,
                    ctx.orientation,
                    ctx.view_span(),
                    ctx.strip_gap(),
                )
            })
            .collect()
    }

    /// Make the container of `node` active and move the view to reveal it.
    pub(crate) fn reveal(
        &mut self,
        workspace: WorkspaceId,
        node: NodeId,
        ctx: &ViewContext<'_>,
        config: AnimationConfig,
        from_column_index: Option<usize>,
        animate: bool,
    ) -> bool {
        let Some(column) = self.tree.column_of(node) else {
            return false;
        };
        let Some(ws) = self.workspaces.get(&workspace) else {
            return false;
        };
        let Some(target) = ws.column_index(column) else {
            return false;
        };
        let spans = self.strip_spans(ws, ctx);
        let strip = Strip::new(&spans, ctx.strip_gap(), ctx.view_span());
        let animate = animate && self.options.animations.enabled;
        let centering = self.options.centering_mode;
        let motion = Motion::new(config, ctx.clock, ctx.time);

        let Some(ws) = self.workspaces.get_mut(&workspace) else {
            return false;
        };
        match ctx.orientation {
            Orientation::Horizontal => ws.viewport.transition_to_column(
                target,
                &strip,
                animate,
                centering,
                from_column_index,
                &motion,
            ),
            Orientation::Vertical => ws.viewport.ensure_row_visible(
                target,
                &strip,
                animate,
                centering,
                from_column_index,
                &motion,
            ),
        }
        ws.viewport.selection_progress = 0.0;
        true
    }

    /// Bring the active container back into view, e.g. after a resize.
    pub fn ensure_active_visible(&mut self, workspace: WorkspaceId, ctx: &ViewContext<'_>) -> bool {
        let Some(column) = self.workspaces.get(&workspace).and_then(Workspace::active_column) else {
            return false;
        };
        let config = self.options.animations.column_reveal;
        self.reveal(workspace, column, ctx, config, None, true)
    }

    /// Insert a newly discovered window.
    pub fn add_window(
        &mut self,
        workspace: WorkspaceId,
        handle: WindowId,
        hints: WindowHints,
        insertion: Insertion,
        ctx: &ViewContext<'_>,
    ) -> Result<NodeId, LayoutError> {
        let ws = self
            .workspaces
            .get(&workspace)
            .ok_or(LayoutError::WorkspaceNotFound(workspace))?;
        if self.tree.node_for_handle(handle).is_some() {
            return Err(LayoutError::DuplicateWindow(handle));
        }

        let had_columns = !ws.is_empty();
        let prev_active = ws
            .viewport
            .active_column_index
            .min(ws.columns.len().saturating_sub(1));

        let mut window = WindowNode::new(handle);
        window.constraints = hints.constraints;
        window.width = hints.width;
        window.height = hints.height;
        window.sizing_mode = hints.sizing_mode;

        let node = match insertion {
            Insertion::NewColumn => {
                let index = if had_columns { prev_active + 1 } else { 0 };
                let container = self
                    .tree
                    .insert_container(Container::new(self.options.default_column_width));
                let node = match self.tree.push_window(container, window) {
                    Ok(node) => node,
                    Err(e) => {
                        self.tree.remove_container(container);
                        return Err(e);
                    }
                };
                if let Some(ws) = self.workspaces.get_mut(&workspace) {
                    ws.columns.insert(index, container);
                }
                node
            }
            Insertion::IntoColumn(index) => {
                let Some(&container) = ws.columns.get(index) else {
                    return Err(LayoutError::ColumnOutOfBounds(
                        index,
                        ws.columns.len().saturating_sub(1),
                    ));
                };
                let node = self.tree.push_window(container, window)?;
                if hints.focus {
                    let last = self.tree.container(container).map_or(0, |c| c.children.len() - 1);
                    self.tree.set_active_tile_idx(container, last);
                }
                node
            }
        };

        debug!("Added window {} to workspace {:?} ({:?})", handle, workspace, insertion);

        if hints.focus || !had_columns {
            if let Some(ws) = self.workspaces.get_mut(&workspace) {
                ws.selected = Some(node);
            }
            self.note_focus(node);
            let config = self.options.animations.column_reveal;
            let from = had_columns.then_some(prev_active);
            self.reveal(workspace, node, ctx, config, from, had_columns);
            if insertion == Insertion::NewColumn && had_columns {
                if let Some(ws) = self.workspaces.get_mut(&workspace) {
                    ws.viewport.activate_prev_column_on_removal = Some(prev_active);
                }
            }
        }

        Ok(node)
    }

    /// Remove a closed window. An emptied container goes with it.
    pub fn remove_window(&mut self, handle: WindowId, ctx: &ViewContext<'_>) -> Result<(), LayoutError> {
        let node = self
            .tree
            .node_for_handle(handle)
            .ok_or(LayoutError::WindowNotFound(handle))?;
        let container = self
            .tree
            .column_of(node)
            .ok_or(LayoutError::WindowNotFound(handle))?;
        let ws_id = self
            .workspace_of(container)
            .ok_or(LayoutError::WindowNotFound(handle))?;
        let row = self.tree.index_in_parent(node).unwrap_or(0);

        let old_view_pos = {
            let ws = self
                .workspaces
                .get(&ws_id)
                .ok_or(LayoutError::WorkspaceNotFound(ws_id))?;
            let spans = self.strip_spans(ws, ctx);
            let strip = Strip::new(&spans, ctx.strip_gap(), ctx.view_span());
            ws.viewport.view_position(&strip, ctx.clock, ctx.time)
        };

        self.tree.detach_window(node);
        debug!("Removed window {} from workspace {:?}", handle, ws_id);

        let remaining = self
            .tree
            .container(container)
            .map_or(0, |c| c.children.len());
        if remaining > 0 {
            let replacement = self
                .tree
                .container(container)
                .and_then(|c| c.children.get(row.min(remaining - 1)).copied());
            if let Some(ws) = self.workspaces.get_mut(&ws_id) {
                if ws.selected == Some(node) {
                    ws.selected = replacement;
                }
            }
            return Ok(());
        }

        let Some(ws) = self.workspaces.get_mut(&ws_id) else {
            return Ok(());
        };
        let Some(col_idx) = ws.column_index(container) else {
            return Ok(());
        };
        ws.columns.remove(col_idx);
        self.tree.remove_container(container);

        if ws.columns.is_empty() {
            ws.viewport = ViewportState::default();
            ws.selected = None;
            trace!("Workspace {:?} is now empty", ws_id);
            return Ok(());
        }

        let len = ws.columns.len();
        let active = ws.viewport.active_column_index;
        let hint = ws.viewport.activate_prev_column_on_removal.take();
        let shift = |p: usize| if p > col_idx { p - 1 } else { p };

        match col_idx.cmp(&active) {
            Ordering::Less => {
                ws.viewport.active_column_index = active - 1;
                ws.viewport.activate_prev_column_on_removal =
                    hint.filter(|&p| p != col_idx).map(shift);
            }
            Ordering::Greater => {
                ws.viewport.active_column_index = active.min(len - 1);
                ws.viewport.activate_prev_column_on_removal =
                    hint.filter(|&p| p != col_idx).map(shift);
            }
            Ordering::Equal => {
                let new_active = hint.map(shift).unwrap_or(col_idx).min(len - 1);
                let new_column = ws.columns[new_active];
                ws.viewport.active_column_index = new_active;

                let ws = &self.workspaces[&ws_id];
                let spans = self.strip_spans(ws, ctx);
                let strip = Strip::new(&spans, ctx.strip_gap(), ctx.view_span());
                let new_x = strip.position(new_active);
                if let Some(ws) = self.workspaces.get_mut(&ws_id) {
                    let current = ws.viewport.current_offset(ctx.clock, ctx.time);
                    ws.viewport.offset_view_by(old_view_pos - new_x - current);
                }

                let config = self.options.animations.column_reveal;
                self.reveal(ws_id, new_column, ctx, config, Some(col_idx), true);
            }
        }

        let Some(ws) = self.workspaces.get_mut(&ws_id) else {
            return Ok(());
        };
        if ws.selected == Some(node) || ws.selected.is_none() {
            let column = ws.active_column();
            ws.selected = column.and_then(|c| {
                let container = self.tree.container(c)?;
                let idx = if container.is_tabbed() {
                    container.active_tile_idx
                } else {
                    row.min(container.children.len().saturating_sub(1))
                };
                container.children.get(idx).copied()
            });
        }
        Ok(())
    }

    /// Handle a window-focused event.
    pub fn focus_window(&mut self, handle: WindowId, ctx: &ViewContext<'_>) -> Result<NodeId, LayoutError> {
        let node = self
            .tree
            .node_for_handle(handle)
            .ok_or(LayoutError::WindowNotFound(handle))?;
        let container = self
            .tree
            .column_of(node)
            .ok_or(LayoutError::WindowNotFound(handle))?;
        let ws_id = self
            .workspace_of(container)
            .ok_or(LayoutError::WindowNotFound(handle))?;

        if self.tree.container(container).is_some_and(Container::is_tabbed) {
            if let Some(idx) = self.tree.index_in_parent(node) {
                self.tree.set_active_tile_idx(container, idx);
            }
        }

        let Some(ws) = self.workspaces.get_mut(&ws_id) else {
            return Err(LayoutError::WorkspaceNotFound(ws_id));
        };
        let from = ws.viewport.active_column_index;
        if ws.column_index(container) != Some(from) {
            ws.viewport.activate_prev_column_on_removal = None;
        }
        ws.selected = Some(node);
        self.note_focus(node);

        let config = self.options.animations.column_reveal;
        self.reveal(ws_id, node, ctx, config, Some(from), true);
        Ok(node)
    }

    /// Swap the active container with its neighbour in `direction`.
    ///
    /// Both containers slide from where they were drawn into their new slots.
    pub fn move_column(&mut self, workspace: WorkspaceId, direction: Direction, ctx: &ViewContext<'_>) -> bool {
        let Some(ws) = self.workspaces.get(&workspace) else {
            return false;
        };
        let len = ws.columns.len();
        if len < 2 {
            return false;
        }
        let active = ws.viewport.active_column_index.min(len - 1);
        let forward = match (ctx.orientation, direction) {
            (Orientation::Horizontal, Direction::Left) | (Orientation::Vertical, Direction::Up) => false,
            (Orientation::Horizontal, Direction::Right) | (Orientation::Vertical, Direction::Down) => true,
            _ => return false,
        };
        let target = if forward {
            if active + 1 >= len {
                return false;
            }
            active + 1
        } else {
            match active.checked_sub(1) {
                Some(t) => t,
                None => return false,
            }
        };

        let mut spans = self.strip_spans(ws, ctx);
        let gap = ctx.strip_gap();
        let view_span = ctx.view_span();
        let old_active_x = Strip::new(&spans, gap, view_span).position(active);
        let old_target_x = Strip::new(&spans, gap, view_span).position(target);
        spans.swap(active, target);
        let new_moved_x = Strip::new(&spans, gap, view_span).position(target);
        let new_other_x = Strip::new(&spans, gap, view_span).position(active);

        let moved = ws.columns[active];
        let other = ws.columns[target];
        if let Some(ws) = self.workspaces.get_mut(&workspace) {
            ws.columns.swap(active, target);
            ws.viewport.active_column_index = target;
            ws.viewport.offset_view_by(old_active_x - new_moved_x);
            ws.viewport.activate_prev_column_on_removal = None;
        }

        if self.options.animations.enabled {
            let config = self.options.animations.window_movement;
            for (column, delta) in [(moved, old_active_x - new_moved_x), (other, old_target_x - new_other_x)] {
                if let Some(c) = self.tree.container_mut(column) {
                    c.render_offset
                        .animate_from(ctx.orientation, delta, config, ctx.clock, ctx.time);
                }
            }
        }

        debug!("Moved column {} -> {} in workspace {:?}", active, target, workspace);
        let config = self.options.animations.focus_change;
        self.reveal(workspace, moved, ctx, config, Some(active), true);
        true
    }

    fn column_at(&self, workspace: WorkspaceId, index: usize) -> Result<NodeId, LayoutError> {
        let ws = self
            .workspaces
            .get(&workspace)
            .ok_or(LayoutError::WorkspaceNotFound(workspace))?;
        ws.columns
            .get(index)
            .copied()
            .ok_or(LayoutError::ColumnOutOfBounds(index, ws.columns.len().saturating_sub(1)))
    }

    /// Set the size of a container along both axes.
    pub fn set_column_width(
        &mut self,
        workspace: WorkspaceId,
        index: usize,
        size: ColumnSize,
    ) -> Result<(), LayoutError> {
        let column = self.column_at(workspace, index)?;
        let container = self.tree.container_mut(column).ok_or(LayoutError::NotAContainer)?;
        container.width = size;
        container.height = size;
        container.is_full_width = false;
        container.invalidate();
        Ok(())
    }

    /// Toggle a container between its own size and the full working span.
    pub fn toggle_full_width(&mut self, workspace: WorkspaceId, index: usize) -> Result<bool, LayoutError> {
        let column = self.column_at(workspace, index)?;
        let container = self.tree.container_mut(column).ok_or(LayoutError::NotAContainer)?;
        container.is_full_width = !container.is_full_width;
        container.invalidate();
        Ok(container.is_full_width)
    }

    pub fn set_column_display(
        &mut self,
        workspace: WorkspaceId,
        index: usize,
        display: ColumnDisplay,
    ) -> Result<(), LayoutError> {
        let column = self.column_at(workspace, index)?;
        let selected = self.selected_window(workspace);
        let mode = display;
        let container = self.tree.container_mut(column).ok_or(LayoutError::NotAContainer)?;
        container.display = mode;
        container.invalidate();
        let active_tile = selected.and_then(|s| container.children.iter().position(|&c| c == s));
        let idx = active_tile.unwrap_or(container.active_tile_idx);
        self.tree.set_active_tile_idx(column, idx);
        debug!("Column {} in workspace {:?} is now {:?}", index, workspace, mode);
        Ok(())
    }

    /// Grow or shrink the active container by `delta` pixels along the scroll axis.
    pub fn resize_column_by(&mut self, workspace: WorkspaceId, delta: f64, ctx: &ViewContext<'_>) -> bool {
        let Some(column) = self.workspaces.get(&workspace).and_then(Workspace::active_column) else {
            return false;
        };
        let current = self
            .tree
            .resolve_and_cache_span(column, ctx.orientation, ctx.view_span(), ctx.strip_gap());
        let new_span = (current + delta).max(MIN_COLUMN_SPAN);
        let Some(container) = self.tree.container_mut(column) else {
            return false;
        };
        match ctx.orientation {
            Orientation::Horizontal => container.width = ColumnSize::Fixed(new_span),
            Orientation::Vertical => container.height = ColumnSize::Fixed(new_span),
        }
        container.is_full_width = false;
        container.invalidate();
        trace!("Resized active column to {:.1}", new_span);
        self.ensure_active_visible(workspace, ctx)
    }

    fn with_window<F>(&mut self, handle: WindowId, edit: F) -> Result<(), LayoutError>
    where
        F: FnOnce(&mut WindowNode),
    {
        let node = self
            .tree
            .node_for_handle(handle)
            .ok_or(LayoutError::WindowNotFound(handle))?;
        let window = self
            .tree
            .window_mut(node)
            .ok_or(LayoutError::WindowNotFound(handle))?;
        edit(window);
        if let Some(column) = self.tree.column_of(node) {
            self.tree.invalidate(column);
        }
        Ok(())
    }

    /// Change how a window is sized. `None` leaves that axis alone.
    pub fn set_window_size(
        &mut self,
        handle: WindowId,
        width: Option<WindowSize>,
        height: Option<WindowSize>,
    ) -> Result<(), LayoutError> {
        self.with_window(handle, |w| {
            if let Some(width) = width {
                w.width = width;
            }
            if let Some(height) = height {
                w.height = height;
            }
        })
    }

    pub fn set_sizing_mode(&mut self, handle: WindowId, mode: SizingMode) -> Result<(), LayoutError> {
        self.with_window(handle, |w| w.sizing_mode = mode)
    }

    /// Update the min/max size the application reports.
    pub fn set_window_constraints(
        &mut self,
        handle: WindowId,
        constraints: SizeConstraints,
    ) -> Result<(), LayoutError> {
        self.with_window(handle, |w| w.constraints = constraints)
    }

    /// Scroll the view without changing the active container.
    pub fn scroll_by(&mut self, workspace: WorkspaceId, delta: f64, ctx: &ViewContext<'_>) -> bool {
        let Some(ws) = self.workspaces.get(&workspace) else {
            return false;
        };
        let spans = self.strip_spans(ws, ctx);
        let strip = Strip::new(&spans, ctx.strip_gap(), ctx.view_span());
        let Some(ws) = self.workspaces.get_mut(&workspace) else {
            return false;
        };
        ws.viewport.scroll_by(delta, &strip, ctx.clock, ctx.time);
        true
    }

    pub fn begin_gesture(&mut self, workspace: WorkspaceId, ctx: &ViewContext<'_>) -> bool {
        let Some(ws) = self.workspaces.get_mut(&workspace) else {
            return false;
        };
        ws.viewport.begin_gesture(ctx.clock, ctx.time);
        true
    }

    pub fn update_gesture(&mut self, workspace: WorkspaceId, delta: f64, ctx: &ViewContext<'_>) -> bool {
        let Some(ws) = self.workspaces.get_mut(&workspace) else {
            return false;
        };
        if ws.viewport.gesture.is_none() {
            return false;
        }
        ws.viewport.update_gesture(delta, ctx.time);
        true
    }

    /// Release a swipe. The container it lands on becomes active and its
    /// visible tile selected.
    pub fn end_gesture(&mut self, workspace: WorkspaceId, ctx: &ViewContext<'_>) -> Option<NodeId> {
        let ws = self.workspaces.get(&workspace)?;
        let spans = self.strip_spans(ws, ctx);
        let strip = Strip::new(&spans, ctx.strip_gap(), ctx.view_span());
        let animations = self.options.animations;
        let config = if animations.enabled {
            animations.gesture
        } else {
            AnimationConfig::Easing {
                curve: EasingCurve::Linear,
                duration: 0.0,
            }
        };
        let motion = Motion::new(config, ctx.clock, ctx.time);
        let centering = self.options.centering_mode;

        let ws = self.workspaces.get_mut(&workspace)?;
        let landed = ws
            .viewport
            .end_gesture(&strip, centering, animations.deceleration_rate, &motion)?;
        let column = *ws.columns.get(landed)?;
        let container = self.tree.container(column)?;
        let target = container
            .children()
            .get(container.active_tile_idx())
            .copied()?;
        self.select(target);
        debug!("Gesture landed on column {} in workspace {:?}", landed, workspace);
        Some(target)
    }

    /// Whether any viewport or render offset is still moving.
    pub fn is_animating(&self, clock: &AnimationClock, time: f64) -> bool {
        self.workspaces
            .values()
            .any(|ws| ws.viewport.is_animating(clock, time))
            || self.tree.is_animating(clock, time)
    }

    /// Collapse finished animations. Returns `true` while anything still moves.
    pub fn settle(&mut self, clock: &AnimationClock, time: f64) -> bool {
        let mut moving = false;
        for ws in self.workspaces.values_mut() {
            moving |= ws.viewport.settle(clock, time);
        }
        moving |= self.tree.settle(clock, time);
        moving
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimatedValue;

    const WS: WorkspaceId = WorkspaceId(1);

    fn engine() -> LayoutEngine {
        let mut engine = LayoutEngine::new(LayoutOptions::default());
        engine.add_workspace(WS);
        engine
    }

    fn ctx(clock: &AnimationClock) -> ViewContext<'_> {
        ViewContext::new(Rect::new(0.0, 0.0, 1200.0, 800.0), Gaps::uniform(10.0), clock, 0.0)
    }

    fn add(engine: &mut LayoutEngine, handle: WindowId, clock: &AnimationClock) -> NodeId {
        engine
            .add_window(WS, handle, WindowHints::default(), Insertion::NewColumn, &ctx(clock))
            .unwrap()
    }

    #[test]
    fn test_new_columns_insert_after_active() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        let a = add(&mut engine, 1, &clock);
        let b = add(&mut engine, 2, &clock);

        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.column_count(), 2);
        assert_eq!(ws.viewport.active_column_index, 1);
        assert_eq!(ws.viewport.activate_prev_column_on_removal, Some(0));
        assert_eq!(ws.selected(), Some(b));
        assert_eq!(engine.column_index_of(a, WS), Some(0));

        // Inserting from the first column lands between the two
        engine.focus_window(1, &ctx(&clock)).unwrap();
        let c = add(&mut engine, 3, &clock);
        assert_eq!(engine.column_index_of(c, WS), Some(1));
        assert_eq!(engine.column_index_of(b, WS), Some(2));
    }

    #[test]
    fn test_add_window_errors() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        let err = engine
            .add_window(WS, 1, WindowHints::default(), Insertion::NewColumn, &ctx(&clock))
            .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateWindow(1));

        let err = engine
            .add_window(WS, 2, WindowHints::default(), Insertion::IntoColumn(4), &ctx(&clock))
            .unwrap_err();
        assert_eq!(err, LayoutError::ColumnOutOfBounds(4, 0));

        let err = engine
            .add_window(WorkspaceId(9), 3, WindowHints::default(), Insertion::NewColumn, &ctx(&clock))
            .unwrap_err();
        assert_eq!(err, LayoutError::WorkspaceNotFound(WorkspaceId(9)));
        assert_eq!(engine.tree().window_count(), 1);
    }

    #[test]
    fn test_removing_last_window_removes_container() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        engine
            .add_window(WS, 2, WindowHints::default(), Insertion::IntoColumn(0), &ctx(&clock))
            .unwrap();

        engine.remove_window(2, &ctx(&clock)).unwrap();
        assert_eq!(engine.workspace(WS).unwrap().column_count(), 1);
        engine.remove_window(1, &ctx(&clock)).unwrap();

        let ws = engine.workspace(WS).unwrap();
        assert!(ws.is_empty());
        assert_eq!(ws.selected(), None);
        assert_eq!(ws.viewport.view_offset_pixels, AnimatedValue::Static(0.0));
        assert_eq!(engine.remove_window(1, &ctx(&clock)), Err(LayoutError::WindowNotFound(1)));
    }

    #[test]
    fn test_removing_active_column_consumes_prev_hint() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        let a = add(&mut engine, 1, &clock);
        add(&mut engine, 2, &clock);
        add(&mut engine, 3, &clock);
        // Columns are [1, 2, 3], window 3 active with a hint back to column 1
        engine.remove_window(3, &ctx(&clock)).unwrap();

        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.viewport.active_column_index, 1);
        assert_eq!(ws.viewport.activate_prev_column_on_removal, None);

        engine.focus_window(1, &ctx(&clock)).unwrap();
        engine.remove_window(1, &ctx(&clock)).unwrap();
        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.viewport.active_column_index, 0);
        assert_eq!(engine.handle_of(ws.selected().unwrap()), Some(2));
        assert!(engine.tree().get(a).is_none());
    }

    #[test]
    fn test_removing_column_left_of_active_shifts_index() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        add(&mut engine, 2, &clock);
        add(&mut engine, 3, &clock);
        engine.remove_window(1, &ctx(&clock)).unwrap();
        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.viewport.active_column_index, 1);
        assert_eq!(engine.handle_of(ws.selected().unwrap()), Some(3));
    }

    #[test]
    fn test_move_column_swaps_and_animates() {
        let clock = AnimationClock::starting_at(0.0);
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        let b = add(&mut engine, 2, &clock);
        assert!(engine.move_column(WS, Direction::Left, &ctx(&clock)));

        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.viewport.active_column_index, 0);
        assert_eq!(engine.column_index_of(b, WS), Some(0));
        assert!(engine.tree().is_animating(&clock, 0.1));
        assert!(!engine.move_column(WS, Direction::Left, &ctx(&clock)));
        assert!(!engine.move_column(WS, Direction::Up, &ctx(&clock)));
    }

    #[test]
    fn test_resize_column_has_floor() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        assert!(engine.resize_column_by(WS, -5000.0, &ctx(&clock)));
        let column = engine.workspace(WS).unwrap().active_column().unwrap();
        assert_eq!(engine.tree().container(column).unwrap().width, ColumnSize::Fixed(MIN_COLUMN_SPAN));
    }

    #[test]
    fn test_full_width_and_tabbed_toggles() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        let second = engine
            .add_window(WS, 2, WindowHints::default(), Insertion::IntoColumn(0), &ctx(&clock))
            .unwrap();

        assert_eq!(engine.toggle_full_width(WS, 0), Ok(true));
        engine.set_column_display(WS, 0, ColumnDisplay::Tabbed).unwrap();
        let column = engine.workspace(WS).unwrap().columns()[0];
        let container = engine.tree().container(column).unwrap();
        assert!(container.is_tabbed());
        assert_eq!(container.children()[container.active_tile_idx()], second);
        assert_eq!(engine.set_column_display(WS, 3, ColumnDisplay::Normal), Err(LayoutError::ColumnOutOfBounds(3, 0)));
    }

    fn assert_shown_tab_is_selected(engine: &LayoutEngine) {
        let ws = engine.workspace(WS).unwrap();
        let column = engine.tree().container(ws.active_column().unwrap()).unwrap();
        assert_eq!(Some(column.children()[column.active_tile_idx()]), ws.selected());
    }

    #[test]
    fn test_removing_tab_keeps_selected_tab_shown() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        for handle in [2, 3, 4] {
            engine
                .add_window(WS, handle, WindowHints::default(), Insertion::IntoColumn(0), &ctx(&clock))
                .unwrap();
        }
        engine.set_column_display(WS, 0, ColumnDisplay::Tabbed).unwrap();
        engine.focus_window(2, &ctx(&clock)).unwrap();
        assert_shown_tab_is_selected(&engine);

        // Tab before the active one
        engine.remove_window(1, &ctx(&clock)).unwrap();
        assert_shown_tab_is_selected(&engine);
        assert_eq!(engine.handle_of(engine.workspace(WS).unwrap().selected().unwrap()), Some(2));

        // Tab after the active one
        engine.remove_window(4, &ctx(&clock)).unwrap();
        assert_shown_tab_is_selected(&engine);
        assert_eq!(engine.handle_of(engine.workspace(WS).unwrap().selected().unwrap()), Some(2));

        // The active tab itself
        engine.remove_window(2, &ctx(&clock)).unwrap();
        assert_shown_tab_is_selected(&engine);
        assert_eq!(engine.handle_of(engine.workspace(WS).unwrap().selected().unwrap()), Some(3));
    }

    #[test]
    fn test_background_window_keeps_selection() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        let a = add(&mut engine, 1, &clock);
        let hints = WindowHints {
            focus: false,
            ..Default::default()
        };
        engine.add_window(WS, 2, hints, Insertion::NewColumn, &ctx(&clock)).unwrap();
        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.selected(), Some(a));
        assert_eq!(ws.viewport.active_column_index, 0);
    }

    #[test]
    fn test_window_edits_invalidate_cache() {
        let clock = AnimationClock::new();
        let mut engine = engine();
        add(&mut engine, 1, &clock);
        let column = engine.workspace(WS).unwrap().columns()[0];
        engine.tree().resolve_and_cache_width(column, 1200.0, 10.0);
        assert!(engine.tree().container(column).unwrap().cached_width() > 0.0);

        engine
            .set_window_constraints(1, SizeConstraints { min_width: 900.0, ..Default::default() })
            .unwrap();
        assert!(engine.tree().container(column).unwrap().cached_width() <= 0.0);
        assert_eq!(engine.tree().resolve_and_cache_width(column, 1200.0, 10.0), 900.0);
        assert_eq!(engine.set_sizing_mode(42, SizingMode::Fullscreen), Err(LayoutError::WindowNotFound(42)));
    }
}
