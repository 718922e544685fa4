//! scrollwm Core Layout Engine
//!
//! Platform-agnostic scrollable tiling layout engine in the style of Niri.
//!
//! This crate implements the "infinite strip" paradigm where:
//! - Windows are arranged in containers (columns, or rows on vertical monitors)
//!   on a virtually infinite strip
//! - The monitor acts as a viewport sliding over this strip
//! - Every transition of the viewport or of a container is an animation that is
//!   *sampled* at an explicit timestamp, never pushed by a timer
//!
//! The engine is single-threaded and synchronous. Callers mutate the tree and
//! the viewports through [`LayoutEngine`] and sample frames with
//! [`LayoutEngine::calculate_layout`], which never changes structure.

pub mod animation;
mod engine;
pub mod frozen;
mod layout;
mod navigation;
mod options;
pub mod solver;
pub mod tree;
mod viewport;
mod workspace;
mod workspace_switch;

pub use animation::{
    AnimatedValue, Animate, Animation, AnimationClock, AnimationConfig, CubicAnimation,
    CubicConfig, DecelerationAnimation, EasingAnimation, EasingCurve, RenderOffset,
    SpringAnimation, SpringConfig, MAX_DECELERATION_RATE, MIN_DECELERATION_RATE,
};
pub use engine::{Insertion, LayoutEngine, ViewContext, WindowHints};
pub use frozen::{FrozenColumn, FrozenViewportState, FrozenWindow, FrozenWorkspace, FrozenWorld};
pub use layout::{LayoutParams, LayoutResult, WorkingArea};
pub use options::{AnimationOptions, Gaps, LayoutOptions};
pub use tree::{
    ColumnDisplay, ColumnSize, Container, Node, NodeId, NodeTree, SizeConstraints, SizingMode,
    WindowNode, WindowSize,
};
pub use viewport::{CenteringMode, Motion, RevealEdge, Strip, ViewGesture, ViewportState};
pub use workspace::{Monitor, MonitorId, Workspace, WorkspaceId};
pub use workspace_switch::{WorkspaceStack, WorkspaceSwitch, WorkspaceSwitchGesture};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a window.
/// This is the opaque handle handed out by the window-discovery layer.
pub type WindowId = u64;

/// Errors that can occur during structural layout operations.
///
/// Navigation, layout and animation never fail; they answer with `Option`
/// or clamp their inputs instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Column index {0} is out of bounds (max: {1})")]
    ColumnOutOfBounds(usize, usize),

    #[error("Window {0} not found in any workspace")]
    WindowNotFound(WindowId),

    #[error("Window {0} is already managed")]
    DuplicateWindow(WindowId),

    #[error("Workspace {0:?} not found")]
    WorkspaceNotFound(WorkspaceId),

    #[error("Node is not a container")]
    NotAContainer,
}

/// Scroll orientation of a monitor.
///
/// Horizontal monitors scroll a strip of columns left/right; vertical
/// monitors scroll a strip of rows up/down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other axis.
    pub fn perpendicular(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// A navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Which side of the viewport a hidden window fell off.
///
/// On vertical monitors `Left` means above the viewport and `Right` below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideSide {
    Left,
    Right,
}

/// Round a logical coordinate to the nearest physical pixel.
pub fn round_to_physical(value: f64, scale: f64) -> f64 {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    (value * scale).round() / scale
}

/// A point in logical screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component along the given axis.
    pub fn along(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

/// A rectangle in logical screen coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a rectangle from its extent along `axis` and across it.
    pub fn from_axes(
        axis: Orientation,
        along_origin: f64,
        along_len: f64,
        across_origin: f64,
        across_len: f64,
    ) -> Self {
        match axis {
            Orientation::Horizontal => Self::new(along_origin, across_origin, along_len, across_len),
            Orientation::Vertical => Self::new(across_origin, along_origin, across_len, along_len),
        }
    }

    /// Check if this rectangle intersects with another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Origin along `axis`.
    pub fn origin_along(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    /// Length along `axis`.
    pub fn span_along(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Translate by a point.
    pub fn offset_by(&self, delta: Point) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Snap origin and size to the physical pixel grid.
    pub fn round_to_physical(&self, scale: f64) -> Rect {
        Rect::new(
            round_to_physical(self.x, scale),
            round_to_physical(self.y, scale),
            round_to_physical(self.width, scale),
            round_to_physical(self.height, scale),
        )
    }
}
