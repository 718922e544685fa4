//! Directional focus movement.
//!
//! Every operation takes the currently selected node and answers with the
//! newly selected one, or `None` when the move is not possible. A successful
//! move updates the workspace selection and brings the target into view.
//!
//! Screen coordinates have their origin at the top left, so `Up` goes to the
//! previous window of a container and `Down` to the next.

use tracing::debug;

use crate::engine::{LayoutEngine, ViewContext};
use crate::tree::NodeId;
use crate::workspace::WorkspaceId;
use crate::{Direction, Orientation};

impl LayoutEngine {
    /// Pure lookup of the window `steps` containers away from `current`.
    ///
    /// The row is kept (or `target_row` used) and clamped to the target
    /// container. Past either end this wraps with `infinite_loop`, otherwise
    /// it answers `None`.
    pub fn move_selection_by_columns(
        &self,
        steps: isize,
        current: NodeId,
        workspace: WorkspaceId,
        target_row: Option<usize>,
    ) -> Option<NodeId> {
        if steps == 0 {
            return Some(current);
        }
        let ws = self.workspaces.get(&workspace)?;
        if ws.is_empty() {
            return None;
        }
        let column = self.tree.column_of(current)?;
        let current_idx = ws.column_index(column)? as isize;
        let current_row = self.tree.index_in_parent(current).unwrap_or(0);

        let len = ws.columns.len() as isize;
        let raw = current_idx + steps;
        let target_idx = if self.options.infinite_loop {
            raw.rem_euclid(len)
        } else if (0..len).contains(&raw) {
            raw
        } else {
            return None;
        };

        let target_column = ws.columns[target_idx as usize];
        let rows = self.tree.container(target_column)?.children();
        if rows.is_empty() {
            return self.tree.first_child(target_column);
        }
        let row = target_row.unwrap_or(current_row).min(rows.len() - 1);
        rows.get(row).copied()
    }

    /// Move to the container on the left or right.
    pub fn move_selection_horizontal(
        &mut self,
        direction: Direction,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
        target_row: Option<usize>,
    ) -> Option<NodeId> {
        let steps = match direction {
            Direction::Right => 1,
            Direction::Left => -1,
            Direction::Up | Direction::Down => return None,
        };
        let target = self.move_selection_by_columns(steps, current, workspace, target_row)?;
        let from = self.clear_removal_hint(workspace);
        self.ensure_selection_visible(target, workspace, ctx, from);
        self.select(target);
        debug!("Focus {:?} -> column {:?}", direction, self.column_index_of(target, workspace));
        Some(target)
    }

    /// Move up or down inside the current container.
    ///
    /// In a tabbed container this switches the active tab instead.
    pub fn move_selection_vertical(&mut self, direction: Direction, current: NodeId) -> Option<NodeId> {
        let backward = match direction {
            Direction::Up => true,
            Direction::Down => false,
            Direction::Left | Direction::Right => return None,
        };
        self.step_within_container(current, backward)
    }

    fn move_selection_within_row(&mut self, direction: Direction, current: NodeId) -> Option<NodeId> {
        let backward = match direction {
            Direction::Left => true,
            Direction::Right => false,
            Direction::Up | Direction::Down => return None,
        };
        self.step_within_container(current, backward)
    }

    fn step_within_container(&mut self, current: NodeId, backward: bool) -> Option<NodeId> {
        let Some(column) = self.tree.column_of(current) else {
            return if backward {
                self.tree.prev_sibling(current)
            } else {
                self.tree.next_sibling(current)
            };
        };
        let container = self.tree.container(column)?;
        if !container.is_tabbed() {
            return if backward {
                self.tree.prev_sibling(current)
            } else {
                self.tree.next_sibling(current)
            };
        }

        let len = container.children().len();
        let active = container.active_tile_idx();
        let next = if backward {
            active.checked_sub(1)?
        } else if active + 1 < len {
            active + 1
        } else {
            return None;
        };
        let target = container.children().get(next).copied()?;
        self.tree.set_active_tile_idx(column, next);
        Some(target)
    }

    fn is_tab_switch(&self, from: NodeId, to: NodeId) -> bool {
        let column = self.tree.column_of(from);
        column.is_some()
            && column == self.tree.column_of(to)
            && column
                .and_then(|c| self.tree.container(c))
                .is_some_and(|c| c.is_tabbed())
    }

    /// Reveal the container of `node` with the focus-change animation.
    pub fn ensure_selection_visible(
        &mut self,
        node: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
        from_column_index: Option<usize>,
    ) -> bool {
        let config = self.options.animations.focus_change;
        self.reveal(workspace, node, ctx, config, from_column_index, true)
    }

    /// Reveal the row of `node` on a vertical monitor.
    pub fn ensure_selection_visible_vertical(
        &mut self,
        node: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
        from_row_index: Option<usize>,
    ) -> bool {
        let from = self.clear_removal_hint(workspace);
        let ctx = ctx.with_orientation(Orientation::Vertical);
        self.ensure_selection_visible(node, workspace, &ctx, from_row_index.or(from))
    }

    /// Drop the removal hint and return the active index.
    fn clear_removal_hint(&mut self, workspace: WorkspaceId) -> Option<usize> {
        let ws = self.workspaces.get_mut(&workspace)?;
        ws.viewport.activate_prev_column_on_removal = None;
        Some(ws.viewport.active_column_index)
    }

    /// Directional focus, honouring the monitor orientation in `ctx`.
    pub fn focus_target(
        &mut self,
        direction: Direction,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        match ctx.orientation {
            Orientation::Horizontal => match direction {
                Direction::Left | Direction::Right => {
                    self.move_selection_horizontal(direction, current, workspace, ctx, None)
                }
                Direction::Up | Direction::Down => {
                    let target = self.move_selection_vertical(direction, current)?;
                    self.settle_within_container(current, target, workspace, ctx);
                    Some(target)
                }
            },
            Orientation::Vertical => match direction {
                Direction::Up | Direction::Down => {
                    let steps = if direction == Direction::Down { 1 } else { -1 };
                    let target = self.move_selection_by_columns(steps, current, workspace, None)?;
                    self.ensure_selection_visible_vertical(target, workspace, ctx, None);
                    self.select(target);
                    Some(target)
                }
                Direction::Left | Direction::Right => {
                    let target = self.move_selection_within_row(direction, current)?;
                    self.settle_within_container(current, target, workspace, ctx);
                    Some(target)
                }
            },
        }
    }

    fn settle_within_container(
        &mut self,
        current: NodeId,
        target: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) {
        if !self.is_tab_switch(current, target) {
            self.ensure_selection_visible(target, workspace, ctx, None);
        }
        self.select(target);
    }

    /// Try the next window below; otherwise the top window of the container
    /// on the left.
    pub fn focus_down_or_left(
        &mut self,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        if let Some(target) = self.move_selection_vertical(Direction::Down, current) {
            self.settle_within_container(current, target, workspace, ctx);
            return Some(target);
        }
        self.move_selection_horizontal(Direction::Left, current, workspace, ctx, Some(0))
    }

    /// Try the window above; otherwise the same row of the container on the right.
    pub fn focus_up_or_right(
        &mut self,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        if let Some(target) = self.move_selection_vertical(Direction::Up, current) {
            self.settle_within_container(current, target, workspace, ctx);
            return Some(target);
        }
        self.move_selection_horizontal(Direction::Right, current, workspace, ctx, None)
    }

    pub fn focus_column_first(
        &mut self,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        self.focus_column(0, current, workspace, ctx)
    }

    pub fn focus_column_last(
        &mut self,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        let last = self.workspaces.get(&workspace)?.column_count().checked_sub(1)?;
        self.focus_column(last, current, workspace, ctx)
    }

    /// Jump to container `index`, keeping the current row where possible.
    pub fn focus_column(
        &mut self,
        index: usize,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        let column = *self.workspaces.get(&workspace)?.columns.get(index)?;
        let row = self.tree.index_in_parent(current).unwrap_or(0);
        let rows = self.tree.container(column)?.children();
        let target = match rows.len() {
            0 => self.tree.first_child(column)?,
            len => rows[row.min(len - 1)],
        };

        let from = self.clear_removal_hint(workspace);
        self.ensure_selection_visible(target, workspace, ctx, from);
        self.select(target);
        Some(target)
    }

    /// Jump to window `index` of the current container.
    pub fn focus_window_in_column(
        &mut self,
        index: usize,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        let column = self.tree.column_of(current)?;
        let container = self.tree.container(column)?;
        let target = container.children().get(index).copied()?;
        if container.is_tabbed() {
            self.tree.set_active_tile_idx(column, index);
        }
        self.ensure_selection_visible(target, workspace, ctx, None);
        self.select(target);
        Some(target)
    }

    pub fn focus_window_top(
        &mut self,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        self.focus_window_in_column(0, current, workspace, ctx)
    }

    pub fn focus_window_bottom(
        &mut self,
        current: NodeId,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
    ) -> Option<NodeId> {
        let column = self.tree.column_of(current)?;
        let last = self.tree.container(column)?.children().len().checked_sub(1)?;
        self.focus_window_in_column(last, current, workspace, ctx)
    }

    /// Go back to the most recently focused other window.
    ///
    /// With `limit_to_workspace` unset, windows of other workspaces count
    /// too; the target is revealed in its own workspace.
    pub fn focus_previous(
        &mut self,
        current: Option<NodeId>,
        workspace: WorkspaceId,
        ctx: &ViewContext<'_>,
        limit_to_workspace: bool,
    ) -> Option<NodeId> {
        let scope = limit_to_workspace.then_some(workspace);
        let target = self.find_most_recently_focused_window(current, scope)?;
        let target_ws = self.workspace_of(target)?;
        let from = self.clear_removal_hint(target_ws);
        self.ensure_selection_visible(target, target_ws, ctx, from);
        self.select(target);
        Some(target)
    }

    /// The window with the latest focus, skipping `excluding` and windows
    /// that were never focused.
    pub fn find_most_recently_focused_window(
        &self,
        excluding: Option<NodeId>,
        workspace: Option<WorkspaceId>,
    ) -> Option<NodeId> {
        self.tree
            .windows()
            .filter(|&(id, w)| Some(id) != excluding && w.last_focused() > 0)
            .filter(|&(id, _)| workspace.is_none() || self.workspace_of(id) == workspace)
            .max_by_key(|&(_, w)| w.last_focused())
            .map(|(id, _)| id)
    }
}
