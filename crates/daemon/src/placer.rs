//! Output side of the daemon: handing computed frames to whatever moves windows.

use anyhow::Result;
use scrollwm_core_layout::{LayoutResult, Monitor, MonitorId};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Applies a layout pass to real windows.
///
/// Called once per monitor for every render tick and after every command
/// that changed the layout.
pub trait WindowPlacer: Send {
    fn place(&mut self, monitor: &Monitor, layout: &LayoutResult) -> Result<()>;
}

/// Placer that only logs what it would do.
///
/// Identical consecutive passes for a monitor are skipped.
#[derive(Debug, Default)]
pub struct LoggingPlacer {
    last: HashMap<MonitorId, LayoutResult>,
}

impl LoggingPlacer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowPlacer for LoggingPlacer {
    fn place(&mut self, monitor: &Monitor, layout: &LayoutResult) -> Result<()> {
        if self.last.get(&monitor.id) == Some(layout) {
            return Ok(());
        }

        debug!(
            "Monitor '{}': {} visible, {} hidden",
            monitor.name,
            layout.frames.len(),
            layout.hidden_handles.len()
        );
        let mut visible: Vec<_> = layout.frames.iter().collect();
        visible.sort_by_key(|(id, _)| **id);
        for (id, rect) in visible {
            let tab = if layout.inactive_tiles.contains(id) { " (inactive tab)" } else { "" };
            trace!(
                "  window {} -> {}x{} at {},{}{}",
                id, rect.width, rect.height, rect.x, rect.y, tab
            );
        }
        for (id, side) in &layout.hidden_handles {
            if let Some(rect) = layout.parked_frames.get(id) {
                trace!("  window {} parked {:?} at {},{}", id, side, rect.x, rect.y);
            }
        }

        self.last.insert(monitor.id, layout.clone());
        Ok(())
    }
}
