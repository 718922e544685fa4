//! scrollwm IPC Protocol
//!
//! Shared types for daemon-CLI communication over a Unix domain socket.
//! Every request and every response is a single line of JSON.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the daemon socket.
pub const SOCKET_NAME: &str = "scrollwm.sock";

/// Upper bound on a single request line, in bytes.
pub const MAX_IPC_MESSAGE_SIZE: usize = 64 * 1024;

/// Location of the daemon socket.
///
/// `$XDG_RUNTIME_DIR/scrollwm.sock` when the runtime dir is set, otherwise
/// the same name inside the system temp dir.
pub fn socket_path() -> PathBuf {
    match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(SOCKET_NAME),
        _ => std::env::temp_dir().join(SOCKET_NAME),
    }
}

/// Serialize a message as one protocol line (JSON followed by `\n`).
pub fn to_json_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    serde_json::to_string(message).map(|json| json + "\n")
}

/// Commands that can be sent from the CLI (or a discovery process) to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcCommand {
    /// Focus the container to the left (or the row above on vertical monitors).
    FocusLeft,
    /// Focus the container to the right.
    FocusRight,
    /// Focus the window above.
    FocusUp,
    /// Focus the window below.
    FocusDown,
    /// Focus down, or the container to the left when already at the bottom.
    FocusDownOrLeft,
    /// Focus up, or the container to the right when already at the top.
    FocusUpOrRight,
    FocusColumnFirst,
    FocusColumnLast,
    /// Focus the container at `index` (0-based).
    FocusColumn { index: usize },
    /// Focus the window at `index` inside the active container.
    FocusWindowInColumn { index: usize },
    /// Return to the most recently focused window.
    FocusPrevious,

    /// Move the active container one slot left.
    MoveColumnLeft,
    /// Move the active container one slot right.
    MoveColumnRight,
    /// Switch the active container between stacked and tabbed display.
    ToggleTabbed,
    ToggleFullWidth,
    /// Resize the active container.
    Resize {
        /// Delta in pixels (positive to grow, negative to shrink).
        delta: f64,
    },
    /// Scroll the viewport.
    Scroll {
        /// Scroll delta (positive = right/down, negative = left/up).
        delta: f64,
    },

    /// A new window appeared.
    WindowCreated {
        window_id: u64,
        #[serde(default)]
        min_width: Option<f64>,
        #[serde(default)]
        min_height: Option<f64>,
        #[serde(default)]
        max_width: Option<f64>,
        #[serde(default)]
        max_height: Option<f64>,
    },
    /// A window went away.
    WindowDestroyed { window_id: u64 },
    /// The platform focused a window on its own (click, app activation).
    WindowFocused { window_id: u64 },

    /// A touchpad swipe started.
    GestureBegin,
    /// A touchpad swipe moved by `delta` pixels.
    GestureUpdate { delta: f64 },
    /// The swipe was released.
    GestureEnd,

    /// Speed up or slow down every animation (1.0 is normal speed).
    SetAnimationRate { rate: f64 },
    /// Query the focused workspace state.
    QueryWorkspace,
    /// Query the focused window.
    QueryFocused,
    /// Query the current frames of the focused workspace.
    QueryLayout,
    /// Reload configuration from file.
    Reload,
    /// Stop the daemon.
    Stop,
}

/// Rectangle in logical screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IpcRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Side of the screen a hidden window was parked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenSide {
    Left,
    Right,
}

/// Placement of one window in a layout response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFrame {
    pub window_id: u64,
    pub rect: IpcRect,
}

/// A window outside the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenWindow {
    pub window_id: u64,
    pub side: ScreenSide,
}

/// Responses from the daemon to the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Command executed successfully.
    Ok,
    /// Command failed with an error.
    Error {
        /// Error message describing what went wrong.
        message: String,
    },
    /// Workspace state query response.
    WorkspaceState {
        workspace_id: u32,
        /// Number of containers on the strip.
        columns: usize,
        /// Total number of windows.
        windows: usize,
        /// Index of the active container.
        active_column: usize,
        /// Selected window, if any.
        selected_window: Option<u64>,
        /// Current view offset relative to the active container.
        view_offset: f64,
        /// Whether the viewport or any window is mid-transition.
        animating: bool,
    },
    /// Focused window query response.
    FocusedWindow {
        /// Window ID of the focused window, if any.
        window_id: Option<u64>,
        workspace_id: Option<u32>,
        /// Container index of the focused window.
        column_index: Option<usize>,
        /// Window index within the container.
        window_index: Option<usize>,
    },
    /// Layout query response.
    Layout {
        frames: Vec<WindowFrame>,
        hidden: Vec<HiddenWindow>,
    },
}

impl IpcResponse {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
