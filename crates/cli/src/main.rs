//! scrollwm CLI
//!
//! Command-line interface for controlling the scrollwm daemon.
//!
//! Each invocation sends one command over the daemon socket and prints the
//! response as pretty JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scrollwm_ipc::{socket_path, to_json_line, IpcCommand, IpcResponse, MAX_IPC_MESSAGE_SIZE};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Parser)]
#[command(name = "scrollwm-cli")]
#[command(author, version, about = "Control the scrollwm layout daemon")]
struct Cli {
    /// Socket to connect to (defaults to $XDG_RUNTIME_DIR/scrollwm.sock)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus commands
    Focus {
        #[command(subcommand)]
        target: FocusTarget,
    },
    /// Move the active column
    Move {
        #[command(subcommand)]
        direction: MoveDirection,
    },
    /// Scroll the viewport
    Scroll {
        #[command(subcommand)]
        direction: ScrollDirection,
    },
    /// Resize the active column
    Resize {
        /// Delta in pixels (positive to grow, negative to shrink)
        #[arg(short, long, allow_hyphen_values = true)]
        delta: f64,
    },
    /// Toggle the active column between stacked and tabbed
    Tabbed,
    /// Toggle the active column between its width and the full view
    FullWidth,
    /// Query daemon state
    Query {
        #[command(subcommand)]
        what: QueryType,
    },
    /// Set the animation speed multiplier (1.0 is normal)
    Rate { rate: f64 },
    /// Reload configuration
    Reload,
    /// Stop the daemon
    Stop,
}

#[derive(Subcommand)]
enum FocusTarget {
    /// Focus the column to the left
    Left,
    /// Focus the column to the right
    Right,
    /// Focus the window above
    Up,
    /// Focus the window below
    Down,
    /// Focus down, or the column to the left at the bottom
    DownOrLeft,
    /// Focus up, or the column to the right at the top
    UpOrRight,
    /// Focus the first column
    First,
    /// Focus the last column
    Last,
    /// Focus the column at INDEX (0-based)
    Column { index: usize },
    /// Focus the window at INDEX in the active column (0-based)
    Window { index: usize },
    /// Focus the previously focused window
    Previous,
}

#[derive(Subcommand)]
enum MoveDirection {
    /// Move active column left
    Left,
    /// Move active column right
    Right,
}

#[derive(Subcommand)]
enum ScrollDirection {
    /// Scroll viewport left
    Left {
        /// Pixels to scroll (default: 100)
        #[arg(short, long, default_value = "100")]
        pixels: f64,
    },
    /// Scroll viewport right
    Right {
        /// Pixels to scroll (default: 100)
        #[arg(short, long, default_value = "100")]
        pixels: f64,
    },
}

#[derive(Subcommand)]
enum QueryType {
    /// Get current workspace state
    Workspace,
    /// Get focused window info
    Focused,
    /// Get window frames of the focused workspace
    Layout,
}

impl Commands {
    fn into_ipc(self) -> IpcCommand {
        match self {
            Commands::Focus { target } => match target {
                FocusTarget::Left => IpcCommand::FocusLeft,
                FocusTarget::Right => IpcCommand::FocusRight,
                FocusTarget::Up => IpcCommand::FocusUp,
                FocusTarget::Down => IpcCommand::FocusDown,
                FocusTarget::DownOrLeft => IpcCommand::FocusDownOrLeft,
                FocusTarget::UpOrRight => IpcCommand::FocusUpOrRight,
                FocusTarget::First => IpcCommand::FocusColumnFirst,
                FocusTarget::Last => IpcCommand::FocusColumnLast,
                FocusTarget::Column { index } => IpcCommand::FocusColumn { index },
                FocusTarget::Window { index } => IpcCommand::FocusWindowInColumn { index },
                FocusTarget::Previous => IpcCommand::FocusPrevious,
            },
            Commands::Move { direction } => match direction {
                MoveDirection::Left => IpcCommand::MoveColumnLeft,
                MoveDirection::Right => IpcCommand::MoveColumnRight,
            },
            Commands::Scroll { direction } => match direction {
                ScrollDirection::Left { pixels } => IpcCommand::Scroll { delta: -pixels },
                ScrollDirection::Right { pixels } => IpcCommand::Scroll { delta: pixels },
            },
            Commands::Resize { delta } => IpcCommand::Resize { delta },
            Commands::Tabbed => IpcCommand::ToggleTabbed,
            Commands::FullWidth => IpcCommand::ToggleFullWidth,
            Commands::Query { what } => match what {
                QueryType::Workspace => IpcCommand::QueryWorkspace,
                QueryType::Focused => IpcCommand::QueryFocused,
                QueryType::Layout => IpcCommand::QueryLayout,
            },
            Commands::Rate { rate } => IpcCommand::SetAnimationRate { rate },
            Commands::Reload => IpcCommand::Reload,
            Commands::Stop => IpcCommand::Stop,
        }
    }
}

/// Send one command and wait for the single-line response.
async fn send_command(path: &Path, cmd: &IpcCommand) -> Result<IpcResponse> {
    let stream = UnixStream::connect(path).await.with_context(|| {
        format!(
            "Failed to connect to scrollwm daemon at {}. Is it running?",
            path.display()
        )
    })?;
    let (reader, mut writer) = stream.into_split();

    writer.write_all(to_json_line(cmd)?.as_bytes()).await?;

    let mut reader = BufReader::new(reader.take(MAX_IPC_MESSAGE_SIZE as u64 * 16));
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        bail!("Daemon closed the connection without responding");
    }

    serde_json::from_str(line.trim()).context("Failed to parse daemon response")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli.socket.unwrap_or_else(socket_path);
    let cmd = cli.command.into_ipc();

    let response = send_command(&path, &cmd).await?;
    if let IpcResponse::Error { message } = response {
        bail!("Daemon error: {}", message);
    }
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
