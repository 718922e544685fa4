//! Serializable snapshot of every workspace.
//!
//! Freezing samples the animated view offset, so a restored engine starts at
//! rest exactly where the frozen one was drawn.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animation::{AnimatedValue, AnimationClock};
use crate::engine::LayoutEngine;
use crate::tree::{ColumnDisplay, ColumnSize, Container, SizeConstraints, SizingMode, WindowNode, WindowSize};
use crate::viewport::ViewportState;
use crate::workspace::{Workspace, WorkspaceId};
use crate::{LayoutError, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrozenViewportState {
    pub active_column_index: usize,
    pub view_offset_pixels: f64,
    pub selection_progress: f64,
}

impl FrozenViewportState {
    pub fn capture(state: &ViewportState, clock: &AnimationClock, time: f64) -> Self {
        Self {
            active_column_index: state.active_column_index,
            view_offset_pixels: state.current_offset(clock, time),
            selection_progress: state.selection_progress,
        }
    }

    /// A viewport at rest at the frozen offset.
    pub fn to_viewport_state(&self) -> ViewportState {
        ViewportState {
            active_column_index: self.active_column_index,
            view_offset_pixels: AnimatedValue::Static(self.view_offset_pixels),
            selection_progress: self.selection_progress,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenColumn {
    pub index: usize,
    pub width: ColumnSize,
    pub height: ColumnSize,
    pub display: ColumnDisplay,
    pub active_tile_idx: usize,
    pub is_full_width: bool,
    pub window_ids: Vec<WindowId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenWindow {
    pub window_id: WindowId,
    pub workspace_id: WorkspaceId,
    pub column_index: usize,
    pub window_index_in_column: usize,
    pub width: WindowSize,
    pub height: WindowSize,
    pub sizing_mode: SizingMode,
    #[serde(default)]
    pub constraints: SizeConstraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenWorkspace {
    pub workspace_id: WorkspaceId,
    pub columns: Vec<FrozenColumn>,
    pub viewport_state: FrozenViewportState,
    #[serde(default)]
    pub selected: Option<WindowId>,
}

/// Everything needed to rebuild the engine's structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrozenWorld {
    pub workspaces: Vec<FrozenWorkspace>,
    pub windows: BTreeMap<WindowId, FrozenWindow>,
    /// Application time of the snapshot.
    pub timestamp: f64,
}

impl FrozenWorld {
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window_ids(&self) -> HashSet<WindowId> {
        self.windows.keys().copied().collect()
    }
}

impl LayoutEngine {
    /// Snapshot every workspace, sampling view offsets at `time`.
    pub fn freeze(&self, clock: &AnimationClock, time: f64) -> FrozenWorld {
        let mut world = FrozenWorld {
            timestamp: time,
            ..Default::default()
        };

        for ws in self.workspaces.values() {
            let mut columns = Vec::with_capacity(ws.columns.len());
            for (index, &column) in ws.columns.iter().enumerate() {
                let Some(container) = self.tree.container(column) else {
                    continue;
                };
                let mut window_ids = Vec::with_capacity(container.children().len());
                for (row, &child) in container.children().iter().enumerate() {
                    let Some(window) = self.tree.window(child) else {
                        continue;
                    };
                    window_ids.push(window.handle);
                    world.windows.insert(
                        window.handle,
                        FrozenWindow {
                            window_id: window.handle,
                            workspace_id: ws.id,
                            column_index: index,
                            window_index_in_column: row,
                            width: window.width,
                            height: window.height,
                            sizing_mode: window.sizing_mode,
                            constraints: window.constraints,
                        },
                    );
                }
                columns.push(FrozenColumn {
                    index,
                    width: container.width,
                    height: container.height,
                    display: container.display,
                    active_tile_idx: container.active_tile_idx(),
                    is_full_width: container.is_full_width,
                    window_ids,
                });
            }

            world.workspaces.push(FrozenWorkspace {
                workspace_id: ws.id,
                columns,
                viewport_state: FrozenViewportState::capture(&ws.viewport, clock, time),
                selected: ws.selected.and_then(|s| self.handle_of(s)),
            });
        }

        debug!(
            "Froze {} workspaces with {} windows",
            world.workspaces.len(),
            world.windows.len()
        );
        world
    }

    /// Rebuild the workspaces of `world`, replacing any with the same id.
    ///
    /// Nothing changes when a window id appears twice or is already managed
    /// by a workspace that is not being replaced.
    pub fn restore(&mut self, world: &FrozenWorld) -> Result<(), LayoutError> {
        let replaced: HashSet<WorkspaceId> = world.workspaces.iter().map(|w| w.workspace_id).collect();
        let mut seen = HashSet::new();
        for handle in world
            .workspaces
            .iter()
            .flat_map(|w| &w.columns)
            .flat_map(|c| &c.window_ids)
        {
            if !seen.insert(*handle) {
                return Err(LayoutError::DuplicateWindow(*handle));
            }
            if let Some(node) = self.tree.node_for_handle(*handle) {
                if self.workspace_of(node).is_some_and(|ws| !replaced.contains(&ws)) {
                    return Err(LayoutError::DuplicateWindow(*handle));
                }
            }
        }

        for &id in &replaced {
            self.remove_workspace(id);
        }

        for frozen in &world.workspaces {
            let mut ws = Workspace::new(frozen.workspace_id);

            let mut ordered: Vec<&FrozenColumn> = frozen.columns.iter().collect();
            ordered.sort_by_key(|c| c.index);

            let mut kept = Vec::new();
            for column in ordered {
                if column.window_ids.is_empty() {
                    continue;
                }
                kept.push(column.index);
                let mut container = Container::new(column.width);
                container.height = column.height;
                container.display = column.display;
                container.is_full_width = column.is_full_width;
                let id = self.tree.insert_container(container);

                for &handle in &column.window_ids {
                    let mut window = WindowNode::new(handle);
                    if let Some(saved) = world.windows.get(&handle) {
                        window.width = saved.width;
                        window.height = saved.height;
                        window.sizing_mode = saved.sizing_mode;
                        window.constraints = saved.constraints;
                    }
                    self.tree.push_window(id, window)?;
                }
                self.tree.set_active_tile_idx(id, column.active_tile_idx);
                ws.columns.push(id);
            }

            ws.viewport = frozen.viewport_state.to_viewport_state();
            // Saved indices count skipped columns; map onto the survivors
            let saved = ws.viewport.active_column_index;
            ws.viewport.active_column_index = kept.iter().rposition(|&i| i <= saved).unwrap_or(0);
            ws.selected = frozen
                .selected
                .and_then(|h| self.tree.node_for_handle(h))
                .filter(|&n| self.tree.column_of(n).is_some_and(|c| ws.columns.contains(&c)))
                .or_else(|| {
                    let column = self.tree.container(ws.active_column()?)?;
                    column.children().get(column.active_tile_idx()).copied()
                });
            self.workspaces.insert(ws.id, ws);
        }

        info!(
            "Restored {} workspaces with {} windows",
            world.workspaces.len(),
            seen.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Insertion, ViewContext, WindowHints};
    use crate::layout::LayoutParams;
    use crate::options::{Gaps, LayoutOptions};
    use crate::Rect;

    const WS: WorkspaceId = WorkspaceId(3);

    fn ctx(clock: &AnimationClock) -> ViewContext<'_> {
        ViewContext::new(Rect::new(0.0, 0.0, 1200.0, 800.0), Gaps::uniform(10.0), clock, 0.0)
    }

    fn populated(clock: &AnimationClock) -> LayoutEngine {
        let ctx = ctx(clock);
        let mut engine = LayoutEngine::new(LayoutOptions::default());
        engine.add_workspace(WS);
        for handle in 1..=3 {
            engine
                .add_window(WS, handle, WindowHints::default(), Insertion::NewColumn, &ctx)
                .unwrap();
        }
        let hints = WindowHints {
            height: WindowSize::Fixed(200.0),
            ..Default::default()
        };
        engine.add_window(WS, 4, hints, Insertion::IntoColumn(0), &ctx).unwrap();
        engine.set_column_display(WS, 0, ColumnDisplay::Tabbed).unwrap();
        engine.set_column_width(WS, 2, ColumnSize::Fixed(640.0)).unwrap();
        engine
    }

    #[test]
    fn test_viewport_round_trip() {
        let clock = AnimationClock::starting_at(0.0);
        let mut engine = populated(&clock);
        engine.focus_window(3, &ctx(&clock)).unwrap();
        let state = &engine.workspace(WS).unwrap().viewport;
        assert!(state.is_animating(&clock, 0.05));

        let frozen = FrozenViewportState::capture(state, &clock, 0.05);
        let restored = frozen.to_viewport_state();
        assert_eq!(restored.active_column_index, state.active_column_index);
        assert_eq!(restored.selection_progress, state.selection_progress);
        assert_eq!(restored.view_offset_pixels, AnimatedValue::Static(state.current_offset(&clock, 0.05)));
        assert!(!restored.is_animating(&clock, 0.05));
    }

    #[test]
    fn test_freeze_captures_structure() {
        let clock = AnimationClock::starting_at(0.0);
        let world = populated(&clock).freeze(&clock, 1.0);

        assert_eq!(world.window_ids(), HashSet::from([1, 2, 3, 4]));
        assert_eq!(world.timestamp, 1.0);
        let ws = &world.workspaces[0];
        assert_eq!(ws.columns.len(), 3);
        assert_eq!(ws.columns[0].window_ids, vec![1, 4]);
        assert_eq!(ws.columns[0].display, ColumnDisplay::Tabbed);
        assert_eq!(ws.columns[0].active_tile_idx, 1);
        assert_eq!(ws.columns[2].width, ColumnSize::Fixed(640.0));
        assert_eq!(world.windows[&4].height, WindowSize::Fixed(200.0));
        assert_eq!(world.windows[&4].window_index_in_column, 1);
        assert_eq!(ws.selected, Some(4));
    }

    #[test]
    fn test_restore_through_json() {
        let clock = AnimationClock::starting_at(0.0);
        let original = populated(&clock);
        let world = original.freeze(&clock, 5.0);
        let json = serde_json::to_string(&world).unwrap();
        let parsed: FrozenWorld = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, world);

        let mut restored = LayoutEngine::new(LayoutOptions::default());
        restored.restore(&parsed).unwrap();
        assert_eq!(restored.freeze(&clock, 5.0), world);

        let params = LayoutParams::new(Rect::new(0.0, 0.0, 1200.0, 800.0), &clock, 5.0).with_gaps(Gaps::uniform(10.0));
        assert_eq!(restored.calculate_layout(WS, &params), original.calculate_layout(WS, &params));
        assert!(!restored.is_animating(&clock, 5.0));
    }

    #[test]
    fn test_restore_rejects_duplicates() {
        let clock = AnimationClock::starting_at(0.0);
        let mut world = populated(&clock).freeze(&clock, 0.0);
        world.workspaces[0].columns[1].window_ids.push(1);

        let mut engine = LayoutEngine::new(LayoutOptions::default());
        assert_eq!(engine.restore(&world), Err(LayoutError::DuplicateWindow(1)));
        assert!(engine.workspace(WS).is_none());
        assert_eq!(engine.tree().window_count(), 0);
    }

    #[test]
    fn test_restore_skips_empty_columns_and_clamps_active() {
        let world = FrozenWorld {
            workspaces: vec![FrozenWorkspace {
                workspace_id: WS,
                columns: vec![
                    FrozenColumn {
                        index: 0,
                        width: ColumnSize::default(),
                        height: ColumnSize::default(),
                        display: ColumnDisplay::Normal,
                        active_tile_idx: 0,
                        is_full_width: false,
                        window_ids: vec![],
                    },
                    FrozenColumn {
                        index: 1,
                        width: ColumnSize::default(),
                        height: ColumnSize::default(),
                        display: ColumnDisplay::Normal,
                        active_tile_idx: 0,
                        is_full_width: false,
                        window_ids: vec![9],
                    },
                ],
                viewport_state: FrozenViewportState {
                    active_column_index: 4,
                    view_offset_pixels: -10.0,
                    selection_progress: 0.0,
                },
                selected: None,
            }],
            ..Default::default()
        };

        let mut engine = LayoutEngine::new(LayoutOptions::default());
        engine.restore(&world).unwrap();
        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.column_count(), 1);
        assert_eq!(ws.viewport.active_column_index, 0);
        assert_eq!(engine.handle_of(ws.selected().unwrap()), Some(9));
    }

    fn frozen_column(index: usize, window_ids: Vec<WindowId>) -> FrozenColumn {
        FrozenColumn {
            index,
            width: ColumnSize::default(),
            height: ColumnSize::default(),
            display: ColumnDisplay::Normal,
            active_tile_idx: 0,
            is_full_width: false,
            window_ids,
        }
    }

    fn frozen_workspace(id: WorkspaceId, columns: Vec<FrozenColumn>, active: usize, selected: Option<WindowId>) -> FrozenWorkspace {
        FrozenWorkspace {
            workspace_id: id,
            columns,
            viewport_state: FrozenViewportState {
                active_column_index: active,
                view_offset_pixels: 0.0,
                selection_progress: 0.0,
            },
            selected,
        }
    }

    #[test]
    fn test_restore_rebases_active_past_empty_columns() {
        // Column 1 is empty, so saved index 2 is the second surviving column
        let world = FrozenWorld {
            workspaces: vec![frozen_workspace(
                WS,
                vec![frozen_column(0, vec![1]), frozen_column(1, vec![]), frozen_column(2, vec![2])],
                2,
                Some(2),
            )],
            ..Default::default()
        };

        let mut engine = LayoutEngine::new(LayoutOptions::default());
        engine.restore(&world).unwrap();
        let ws = engine.workspace(WS).unwrap();
        assert_eq!(ws.column_count(), 2);
        assert_eq!(ws.viewport.active_column_index, 1);
        assert_eq!(engine.handle_of(ws.selected().unwrap()), Some(2));
    }

    #[test]
    fn test_restore_ignores_selection_from_other_workspace() {
        let other = WorkspaceId(8);
        let world = FrozenWorld {
            workspaces: vec![
                frozen_workspace(other, vec![frozen_column(0, vec![5])], 0, Some(5)),
                frozen_workspace(WS, vec![frozen_column(0, vec![1])], 0, Some(5)),
            ],
            ..Default::default()
        };

        let mut engine = LayoutEngine::new(LayoutOptions::default());
        engine.restore(&world).unwrap();
        let ws = engine.workspace(WS).unwrap();
        assert_eq!(engine.handle_of(ws.selected().unwrap()), Some(1));
        let ws = engine.workspace(other).unwrap();
        assert_eq!(engine.handle_of(ws.selected().unwrap()), Some(5));
    }
}
