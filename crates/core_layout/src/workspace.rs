use serde::{Deserialize, Serialize};

use crate::tree::NodeId;
use crate::viewport::ViewportState;
use crate::{Orientation, Rect};

/// Stable workspace identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkspaceId(pub u32);

/// A workspace: an ordered strip of containers and the viewport over it.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub(crate) columns: Vec<NodeId>,
    pub viewport: ViewportState,
    pub(crate) selected: Option<NodeId>,
}

impl Workspace {
    pub fn new(id: WorkspaceId) -> Self {
        Self {
            id,
            columns: Vec::new(),
            viewport: ViewportState::default(),
            selected: None,
        }
    }

    /// Containers in strip order.
    pub fn columns(&self) -> &[NodeId] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, container: NodeId) -> Option<usize> {
        self.columns.iter().position(|&c| c == container)
    }

    /// The active container, if any.
    pub fn active_column(&self) -> Option<NodeId> {
        if self.columns.is_empty() {
            return None;
        }
        let idx = self.viewport.active_column_index.min(self.columns.len() - 1);
        self.columns.get(idx).copied()
    }

    /// The selected window.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }
}

/// Stable monitor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonitorId(pub u32);

/// A physical display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    pub name: String,
    pub frame: Rect,
    pub orientation: Orientation,
    pub scale: f64,
}

impl Monitor {
    pub fn new(id: MonitorId, name: impl Into<String>, frame: Rect) -> Self {
        Self {
            id,
            name: name.into(),
            frame,
            orientation: Orientation::Horizontal,
            scale: 1.0,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}
