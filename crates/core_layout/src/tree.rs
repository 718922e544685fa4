//! Arena of containers and windows.
//!
//! Containers (columns on horizontal monitors, rows on vertical ones) hold
//! windows directly; there is no deeper nesting. Nodes are addressed by
//! [`NodeId`] keys and parents are tracked in a separate index, so the tree
//! has no back-pointers.
//!
//! Resolved sizes and frames are memoized in `Cell`s. The layout pass fills
//! them through `&self`; every structural mutation resets them.

use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::animation::{AnimationClock, RenderOffset};
use crate::{LayoutError, Orientation, Rect, WindowId};

new_key_type! {
    /// Stable key of a node in the [`NodeTree`].
    pub struct NodeId;
}

/// How a window asks to be sized along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSize {
    /// Share of the remaining space, relative to siblings.
    Auto { weight: f64 },
    /// Exact size in logical pixels.
    Fixed(f64),
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize::Auto { weight: 1.0 }
    }
}

impl WindowSize {
    pub fn weight(&self) -> f64 {
        match self {
            WindowSize::Auto { weight } => *weight,
            WindowSize::Fixed(_) => 1.0,
        }
    }

    pub fn fixed(&self) -> Option<f64> {
        match self {
            WindowSize::Fixed(size) => Some(*size),
            WindowSize::Auto { .. } => None,
        }
    }
}

/// Size limits reported by the application. Zero max means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConstraints {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
}

impl SizeConstraints {
    pub fn min_along(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.min_width,
            Orientation::Vertical => self.min_height,
        }
    }

    pub fn max_along(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.max_width,
            Orientation::Vertical => self.max_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    #[default]
    Normal,
    /// Fills its container's content rect.
    Maximized,
    /// Covers the whole view.
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDisplay {
    #[default]
    Normal,
    Tabbed,
}

/// How a container asks to be sized along the scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSize {
    /// Fraction of the working span; `1.0 / n` columns tile the view exactly.
    Proportion(f64),
    Fixed(f64),
}

impl Default for ColumnSize {
    fn default() -> Self {
        ColumnSize::Proportion(0.5)
    }
}

impl ColumnSize {
    /// Resolve against the working span with `gap` between neighbours.
    pub fn resolve(&self, span: f64, gap: f64) -> f64 {
        match *self {
            ColumnSize::Proportion(p) => (span + gap) * p - gap,
            ColumnSize::Fixed(px) => px,
        }
    }
}

/// A window leaf.
#[derive(Debug, Clone)]
pub struct WindowNode {
    pub handle: WindowId,
    pub width: WindowSize,
    pub height: WindowSize,
    pub constraints: SizeConstraints,
    pub sizing_mode: SizingMode,
    pub(crate) last_focused: u64,
    pub(crate) hidden_in_tab: bool,
    pub(crate) render_offset: RenderOffset,
    frame: Cell<Option<Rect>>,
    resolved_width: Cell<f64>,
    resolved_height: Cell<f64>,
    width_fixed_by_constraint: Cell<bool>,
    height_fixed_by_constraint: Cell<bool>,
}

impl WindowNode {
    pub fn new(handle: WindowId) -> Self {
        Self {
            handle,
            width: WindowSize::default(),
            height: WindowSize::default(),
            constraints: SizeConstraints::default(),
            sizing_mode: SizingMode::Normal,
            last_focused: 0,
            hidden_in_tab: false,
            render_offset: RenderOffset::default(),
            frame: Cell::new(None),
            resolved_width: Cell::new(0.0),
            resolved_height: Cell::new(0.0),
            width_fixed_by_constraint: Cell::new(false),
            height_fixed_by_constraint: Cell::new(false),
        }
    }

    /// Frame from the last layout pass, without render offsets.
    pub fn frame(&self) -> Option<Rect> {
        self.frame.get()
    }

    pub fn resolved_size(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.resolved_width.get(),
            Orientation::Vertical => self.resolved_height.get(),
        }
    }

    /// Whether the solver pinned this window to a bound on `axis`.
    pub fn fixed_by_constraint(&self, axis: Orientation) -> bool {
        match axis {
            Orientation::Horizontal => self.width_fixed_by_constraint.get(),
            Orientation::Vertical => self.height_fixed_by_constraint.get(),
        }
    }

    pub fn size_along(&self, axis: Orientation) -> WindowSize {
        match axis {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    pub fn is_hidden_in_tab(&self) -> bool {
        self.hidden_in_tab
    }

    /// Focus sequence number; zero if never focused.
    pub fn last_focused(&self) -> u64 {
        self.last_focused
    }

    pub fn render_offset(&self) -> &RenderOffset {
        &self.render_offset
    }

    pub(crate) fn record_placement(&self, frame: Rect, axis: Orientation, size: f64, constrained: bool) {
        self.frame.set(Some(frame));
        match axis {
            Orientation::Horizontal => {
                self.resolved_width.set(size);
                self.width_fixed_by_constraint.set(constrained);
            }
            Orientation::Vertical => {
                self.resolved_height.set(size);
                self.height_fixed_by_constraint.set(constrained);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SpanCache {
    value: f64,
    basis: f64,
    gap: f64,
}

/// A column (or row) of windows.
#[derive(Debug, Clone)]
pub struct Container {
    pub width: ColumnSize,
    pub height: ColumnSize,
    pub is_full_width: bool,
    pub display: ColumnDisplay,
    pub(crate) children: Vec<NodeId>,
    pub(crate) active_tile_idx: usize,
    pub(crate) render_offset: RenderOffset,
    cached_width: Cell<SpanCache>,
    cached_height: Cell<SpanCache>,
    frame: Cell<Option<Rect>>,
}

impl Container {
    pub fn new(size: ColumnSize) -> Self {
        Self {
            width: size,
            height: size,
            is_full_width: false,
            display: ColumnDisplay::Normal,
            children: Vec::new(),
            active_tile_idx: 0,
            render_offset: RenderOffset::default(),
            cached_width: Cell::new(SpanCache::default()),
            cached_height: Cell::new(SpanCache::default()),
            frame: Cell::new(None),
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_tabbed(&self) -> bool {
        self.display == ColumnDisplay::Tabbed
    }

    pub fn active_tile_idx(&self) -> usize {
        self.active_tile_idx
    }

    /// Memoized width; zero or less means stale.
    pub fn cached_width(&self) -> f64 {
        self.cached_width.get().value
    }

    pub fn cached_height(&self) -> f64 {
        self.cached_height.get().value
    }

    pub fn cached_span(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.cached_width(),
            Orientation::Vertical => self.cached_height(),
        }
    }

    pub fn size_along(&self, axis: Orientation) -> ColumnSize {
        match axis {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    pub fn frame(&self) -> Option<Rect> {
        self.frame.get()
    }

    pub fn render_offset(&self) -> &RenderOffset {
        &self.render_offset
    }

    /// Reset the memoized spans to the stale sentinel.
    pub fn invalidate(&self) {
        self.cached_width.set(SpanCache::default());
        self.cached_height.set(SpanCache::default());
    }

    pub(crate) fn set_frame(&self, frame: Rect) {
        self.frame.set(Some(frame));
    }

    fn cache_cell(&self, axis: Orientation) -> &Cell<SpanCache> {
        match axis {
            Orientation::Horizontal => &self.cached_width,
            Orientation::Vertical => &self.cached_height,
        }
    }
}

/// A node of the arena.
#[derive(Debug, Clone)]
pub enum Node {
    Window(WindowNode),
    Container(Container),
}

impl Node {
    pub fn as_window(&self) -> Option<&WindowNode> {
        match self {
            Node::Window(w) => Some(w),
            Node::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Node::Container(c) => Some(c),
            Node::Window(_) => None,
        }
    }
}

/// Owner of every container and window.
#[derive(Debug, Default)]
pub struct NodeTree {
    nodes: SlotMap<NodeId, Node>,
    parents: SecondaryMap<NodeId, NodeId>,
    handles: HashMap<WindowId, NodeId>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn window(&self, id: NodeId) -> Option<&WindowNode> {
        self.nodes.get(id).and_then(Node::as_window)
    }

    pub fn window_mut(&mut self, id: NodeId) -> Option<&mut WindowNode> {
        match self.nodes.get_mut(id) {
            Some(Node::Window(w)) => Some(w),
            _ => None,
        }
    }

    pub fn container(&self, id: NodeId) -> Option<&Container> {
        self.nodes.get(id).and_then(Node::as_container)
    }

    pub fn container_mut(&mut self, id: NodeId) -> Option<&mut Container> {
        match self.nodes.get_mut(id) {
            Some(Node::Container(c)) => Some(c),
            _ => None,
        }
    }

    /// Node of the window with the given external handle.
    pub fn node_for_handle(&self, handle: WindowId) -> Option<NodeId> {
        self.handles.get(&handle).copied()
    }

    pub fn windows(&self) -> impl Iterator<Item = (NodeId, &WindowNode)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| node.as_window().map(|w| (id, w)))
    }

    pub fn window_count(&self) -> usize {
        self.handles.len()
    }

    /// The container owning `node`; a container is its own column.
    pub fn column_of(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes.get(node)? {
            Node::Container(_) => Some(node),
            Node::Window(_) => self.parents.get(node).copied(),
        }
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parents.get(node)?;
        self.container(*parent)?.children.iter().position(|&c| c == node)
    }

    pub fn first_child(&self, container: NodeId) -> Option<NodeId> {
        self.container(container)?.children.first().copied()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parents.get(node)?;
        let children = &self.container(*parent)?.children;
        let idx = children.iter().position(|&c| c == node)?;
        children.get(idx + 1).copied()
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parents.get(node)?;
        let children = &self.container(*parent)?.children;
        let idx = children.iter().position(|&c| c == node)?;
        idx.checked_sub(1).and_then(|i| children.get(i).copied())
    }

    pub fn insert_container(&mut self, container: Container) -> NodeId {
        self.nodes.insert(Node::Container(container))
    }

    /// Append a window to the end of a container.
    pub fn push_window(&mut self, container: NodeId, window: WindowNode) -> Result<NodeId, LayoutError> {
        let len = self
            .container(container)
            .ok_or(LayoutError::NotAContainer)?
            .children
            .len();
        self.insert_window_at(container, len, window)
    }

    /// Insert a window at `index` (clamped) in a container.
    pub fn insert_window_at(
        &mut self,
        container: NodeId,
        index: usize,
        window: WindowNode,
    ) -> Result<NodeId, LayoutError> {
        if self.container(container).is_none() {
            return Err(LayoutError::NotAContainer);
        }
        let handle = window.handle;
        if self.handles.contains_key(&handle) {
            return Err(LayoutError::DuplicateWindow(handle));
        }

        let id = self.nodes.insert(Node::Window(window));
        self.parents.insert(id, container);
        self.handles.insert(handle, id);
        if let Some(c) = self.container_mut(container) {
            let index = index.min(c.children.len());
            c.children.insert(index, id);
            c.invalidate();
        }
        self.update_tabbed_visibility(container);
        Ok(id)
    }

    /// Remove a window from the arena, returning its former container.
    pub fn detach_window(&mut self, node: NodeId) -> Option<(NodeId, WindowNode)> {
        if self.window(node).is_none() {
            return None;
        }
        let parent = self.parents.remove(node)?;
        let Some(Node::Window(window)) = self.nodes.remove(node) else {
            return None;
        };
        self.handles.remove(&window.handle);

        if let Some(c) = self.container_mut(parent) {
            if let Some(pos) = c.children.iter().position(|&child| child == node) {
                c.children.remove(pos);
                if pos < c.active_tile_idx {
                    c.active_tile_idx -= 1;
                }
            }
            let last = c.children.len().saturating_sub(1);
            c.active_tile_idx = c.active_tile_idx.min(last);
            c.invalidate();
        }
        self.update_tabbed_visibility(parent);
        Some((parent, window))
    }

    /// Remove a container together with any windows still inside it.
    pub fn remove_container(&mut self, container: NodeId) -> Option<Container> {
        let children = self.container(container)?.children.clone();
        for child in children {
            self.detach_window(child);
        }
        match self.nodes.remove(container) {
            Some(Node::Container(c)) => Some(c),
            _ => None,
        }
    }

    /// Select the visible tile of a container, clamped to its children.
    pub fn set_active_tile_idx(&mut self, container: NodeId, idx: usize) -> bool {
        let Some(c) = self.container_mut(container) else {
            return false;
        };
        c.active_tile_idx = idx.min(c.children.len().saturating_sub(1));
        self.update_tabbed_visibility(container);
        true
    }

    /// Recompute which windows of a tabbed container are hidden behind the active tile.
    pub fn update_tabbed_visibility(&mut self, container: NodeId) {
        let Some(c) = self.container(container) else {
            return;
        };
        let tabbed = c.is_tabbed();
        let active = c.active_tile_idx;
        let children = c.children.clone();
        for (i, child) in children.into_iter().enumerate() {
            if let Some(w) = self.window_mut(child) {
                w.hidden_in_tab = tabbed && i != active;
            }
        }
    }

    pub fn invalidate(&self, container: NodeId) {
        if let Some(c) = self.container(container) {
            c.invalidate();
        }
    }

    /// Whether any container or window is still sliding to its slot.
    pub fn is_animating(&self, clock: &AnimationClock, time: f64) -> bool {
        self.nodes.values().any(|node| match node {
            Node::Window(w) => w.render_offset.is_animating(clock, time),
            Node::Container(c) => c.render_offset.is_animating(clock, time),
        })
    }

    /// Collapse finished render offsets. Returns `true` while any still moves.
    pub fn settle(&mut self, clock: &AnimationClock, time: f64) -> bool {
        let mut moving = false;
        for node in self.nodes.values_mut() {
            moving |= match node {
                Node::Window(w) => w.render_offset.settle(clock, time),
                Node::Container(c) => c.render_offset.settle(clock, time),
            };
        }
        moving
    }

    /// Resolve a container's size along `axis`, reusing the memo when it is
    /// still valid for this working span and gap.
    ///
    /// The size never goes below the largest minimum of its windows, nor
    /// above the smallest maximum unless a minimum forces it.
    pub fn resolve_and_cache_span(
        &self,
        container: NodeId,
        axis: Orientation,
        working_span: f64,
        gap: f64,
    ) -> f64 {
        let Some(c) = self.container(container) else {
            return 0.0;
        };
        let cell = c.cache_cell(axis);
        let cached = cell.get();
        if cached.value > 0.0 && cached.basis == working_span && cached.gap == gap {
            return cached.value;
        }

        let base = if c.is_full_width {
            working_span
        } else {
            c.size_along(axis).resolve(working_span, gap)
        };

        let mut min: f64 = 0.0;
        let mut max = f64::INFINITY;
        for window in c.children.iter().filter_map(|&id| self.window(id)) {
            min = min.max(window.constraints.min_along(axis));
            let window_max = window.constraints.max_along(axis);
            if window_max > 0.0 {
                max = max.min(window_max);
            }
        }

        let value = base.min(max).max(min).max(1.0);
        cell.set(SpanCache {
            value,
            basis: working_span,
            gap,
        });
        value
    }

    pub fn resolve_and_cache_width(&self, container: NodeId, working_width: f64, gap: f64) -> f64 {
        self.resolve_and_cache_span(container, Orientation::Horizontal, working_width, gap)
    }

    pub fn resolve_and_cache_height(&self, container: NodeId, working_height: f64, gap: f64) -> f64 {
        self.resolve_and_cache_span(container, Orientation::Vertical, working_height, gap)
    }
}
