//! scrollwm Daemon
//!
//! Main daemon process for the scrollwm layout engine.
//!
//! Responsibilities:
//! - Own the layout engine and the animation clock
//! - Handle IPC commands from the CLI and from window discovery
//! - Drive the render tick while anything is animating
//! - Hand computed frames to the window placer
//! - Persist the frozen layout across restarts

mod config;
mod placer;

use anyhow::{Context, Result};
use config::Config;
use placer::{LoggingPlacer, WindowPlacer};
use scrollwm_core_layout::{
    AnimationClock, ColumnDisplay, Direction, FrozenWorld, HideSide, Insertion, LayoutEngine,
    LayoutParams, LayoutResult, Monitor, MonitorId, NodeId, SizeConstraints, ViewContext,
    WindowHints, WorkspaceId,
};
use scrollwm_ipc::{
    socket_path, to_json_line, HiddenWindow, IpcCommand, IpcRect, IpcResponse, ScreenSide,
    WindowFrame, MAX_IPC_MESSAGE_SIZE,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Events that the daemon event loop processes.
enum DaemonEvent {
    /// An IPC command from a client.
    IpcCommand {
        cmd: IpcCommand,
        responder: oneshot::Sender<IpcResponse>,
    },
    /// Animation tick (16ms intervals during animation).
    AnimationTick,
    /// Shutdown signal.
    Shutdown,
}

/// Animation tick interval in milliseconds (~60 FPS).
const ANIMATION_TICK_MS: u64 = 16;

/// IPC read timeout - clients must send within this period.
const IPC_READ_TIMEOUT: Duration = Duration::from_secs(5);

const STATE_FILE_NAME: &str = "workspace-state.json";

/// Daemon state. Owned by the event loop; nothing else touches the engine.
struct AppState {
    engine: LayoutEngine,
    clock: AnimationClock,
    /// Monitors, each showing the workspace with the same numeric id.
    monitors: Vec<Monitor>,
    /// Monitor receiving focus and structure commands.
    focused_monitor: MonitorId,
    config: Config,
    placer: Box<dyn WindowPlacer>,
}

fn workspace_for(monitor: &Monitor) -> WorkspaceId {
    WorkspaceId(monitor.id.0)
}

fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // default fallback for invalid values
    }
}

impl AppState {
    /// Create new state from config, with one empty workspace per monitor.
    fn new_with_config(config: Config, placer: Box<dyn WindowPlacer>) -> Self {
        let mut engine = LayoutEngine::new(config.layout_options());
        let monitors = config.monitor_list();
        for monitor in &monitors {
            engine.add_workspace(workspace_for(monitor));
        }
        let focused_monitor = monitors.first().map_or(MonitorId(1), |m| m.id);

        let mut clock = AnimationClock::new();
        clock.set_rate(config.animations.clock_rate);
        clock.set_complete_instantly(config.animations.complete_instantly);

        Self {
            engine,
            clock,
            monitors,
            focused_monitor,
            config,
            placer,
        }
    }

    fn focused_monitor(&self) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.id == self.focused_monitor)
    }

    fn monitor_for_workspace(&self, workspace: WorkspaceId) -> Option<&Monitor> {
        self.monitors.iter().find(|m| workspace_for(m) == workspace)
    }

    /// Monitor showing the workspace that holds `window_id`.
    fn monitor_for_window(&self, window_id: u64) -> Option<Monitor> {
        let node = self.engine.node_for_handle(window_id)?;
        let workspace = self.engine.workspace_of(node)?;
        self.monitor_for_workspace(workspace).cloned()
    }

    /// Apply a reloaded configuration.
    ///
    /// Monitor geometry is re-read; monitors that are new get an empty
    /// workspace. Workspaces of monitors that went away are kept until the
    /// monitor comes back.
    fn apply_config(&mut self, config: Config) {
        self.engine.options = config.layout_options();
        self.clock.set_rate(config.animations.clock_rate);
        self.clock.set_complete_instantly(config.animations.complete_instantly);

        self.monitors = config.monitor_list();
        for monitor in &self.monitors {
            let id = workspace_for(monitor);
            if self.engine.workspace(id).is_none() {
                self.engine.add_workspace(id);
            }
        }
        if self.focused_monitor().is_none() {
            self.focused_monitor = self.monitors.first().map_or(MonitorId(1), |m| m.id);
        }

        self.config = config;
        info!("Configuration applied to {} monitors", self.monitors.len());
    }

    /// Get the path for the state file.
    fn state_file_path() -> PathBuf {
        directories::ProjectDirs::from("org", "scrollwm", "scrollwm")
            .map(|dirs| dirs.data_dir().join(STATE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(STATE_FILE_NAME))
    }

    /// Freeze the engine and write it to the state file.
    fn save_state(&mut self) -> Result<()> {
        let time = self.clock.now();
        let world = self.engine.freeze(&self.clock, time);

        let state_path = Self::state_file_path();
        if let Some(parent) = state_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&world)?;
        std::fs::write(&state_path, json)
            .with_context(|| format!("Failed to write {}", state_path.display()))?;
        info!(
            "Workspace state saved to {:?} ({} windows)",
            state_path,
            world.windows.len()
        );
        Ok(())
    }

    fn load_state() -> Option<FrozenWorld> {
        let state_path = Self::state_file_path();
        match std::fs::read_to_string(&state_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(world) => Some(world),
                Err(e) => {
                    warn!("Failed to parse saved state: {}", e);
                    None
                }
            },
            Err(_) => None,
        }
    }

    /// Restore a frozen layout.
    ///
    /// Workspaces whose monitor is no longer configured are dropped.
    fn restore_state(&mut self, world: &FrozenWorld) -> Result<()> {
        let known: HashSet<WorkspaceId> = self.monitors.iter().map(workspace_for).collect();
        let mut world = world.clone();
        world.workspaces.retain(|ws| {
            let keep = known.contains(&ws.workspace_id);
            if !keep {
                debug!("Skipping saved workspace {:?} without a monitor", ws.workspace_id);
            }
            keep
        });
        self.engine.restore(&world)?;
        Ok(())
    }

    fn is_animating(&self) -> bool {
        self.engine.is_animating(&self.clock, self.clock.current_time())
    }

    /// Render one frame and drop finished animations.
    /// Returns true if any animation is still running.
    fn tick_animations(&mut self) -> bool {
        if let Err(e) = self.apply_layout() {
            warn!("Animation layout failed: {}", e);
        }
        let time = self.clock.current_time();
        self.engine.settle(&self.clock, time)
    }

    fn layout_for(&self, monitor: &Monitor, time: f64) -> LayoutResult {
        let params = LayoutParams::for_monitor(monitor, &self.clock, time).with_gaps(self.config.gaps());
        self.engine.calculate_layout(workspace_for(monitor), &params)
    }

    /// Recalculate layout at the current time and hand it to the placer.
    fn apply_layout(&mut self) -> Result<()> {
        let time = self.clock.now();
        let passes: Vec<(Monitor, LayoutResult)> = self
            .monitors
            .iter()
            .map(|m| (m.clone(), self.layout_for(m, time)))
            .collect();
        for (monitor, layout) in &passes {
            self.placer.place(monitor, layout)?;
        }
        Ok(())
    }

    fn handle_command(&mut self, cmd: IpcCommand) -> IpcResponse {
        let response = self.dispatch(cmd);
        if response == IpcResponse::Ok {
            if let Err(e) = self.apply_layout() {
                return IpcResponse::error(format!("Failed to apply layout: {}", e));
            }
        }
        response
    }

    fn dispatch(&mut self, cmd: IpcCommand) -> IpcResponse {
        // Commands that reconfigure the clock run before it is sampled.
        match cmd {
            IpcCommand::SetAnimationRate { rate } => {
                self.clock.set_rate(rate);
                info!("Animation rate -> {}", self.clock.rate());
                return IpcResponse::Ok;
            }
            IpcCommand::Reload => {
                return match Config::load() {
                    Ok(mut config) => {
                        for w in config.validate() {
                            warn!("Config: {} - {}", w.field, w.message);
                        }
                        self.apply_config(config);
                        IpcResponse::Ok
                    }
                    Err(e) => IpcResponse::error(format!("Failed to reload config: {}", e)),
                };
            }
            IpcCommand::WindowDestroyed { window_id } => return self.window_destroyed(window_id),
            IpcCommand::WindowFocused { window_id } => return self.window_focused(window_id),
            _ => {}
        }

        let Some(monitor) = self.focused_monitor().cloned() else {
            return IpcResponse::error("No monitor configured");
        };
        let ws = workspace_for(&monitor);
        let time = self.clock.now();
        let ctx = ViewContext::for_monitor(&monitor, self.config.gaps(), &self.clock, time);
        let current = self.engine.selected_window(ws);

        match cmd {
            IpcCommand::FocusLeft => focus_with(&mut self.engine, current, |e, c| e.focus_target(Direction::Left, c, ws, &ctx)),
            IpcCommand::FocusRight => focus_with(&mut self.engine, current, |e, c| e.focus_target(Direction::Right, c, ws, &ctx)),
            IpcCommand::FocusUp => focus_with(&mut self.engine, current, |e, c| e.focus_target(Direction::Up, c, ws, &ctx)),
            IpcCommand::FocusDown => focus_with(&mut self.engine, current, |e, c| e.focus_target(Direction::Down, c, ws, &ctx)),
            IpcCommand::FocusDownOrLeft => focus_with(&mut self.engine, current, |e, c| e.focus_down_or_left(c, ws, &ctx)),
            IpcCommand::FocusUpOrRight => focus_with(&mut self.engine, current, |e, c| e.focus_up_or_right(c, ws, &ctx)),
            IpcCommand::FocusColumnFirst => focus_with(&mut self.engine, current, |e, c| e.focus_column_first(c, ws, &ctx)),
            IpcCommand::FocusColumnLast => focus_with(&mut self.engine, current, |e, c| e.focus_column_last(c, ws, &ctx)),
            IpcCommand::FocusColumn { index } => {
                focus_with(&mut self.engine, current, |e, c| e.focus_column(index, c, ws, &ctx))
            }
            IpcCommand::FocusWindowInColumn { index } => {
                focus_with(&mut self.engine, current, |e, c| e.focus_window_in_column(index, c, ws, &ctx))
            }
            IpcCommand::FocusPrevious => {
                let target = self.engine.focus_previous(current, ws, &ctx, true);
                info!("Focus previous -> window {:?}", target.and_then(|n| self.engine.handle_of(n)));
                IpcResponse::Ok
            }
            IpcCommand::MoveColumnLeft => move_column(&mut self.engine, ws, Direction::Left, &ctx),
            IpcCommand::MoveColumnRight => move_column(&mut self.engine, ws, Direction::Right, &ctx),
            IpcCommand::ToggleTabbed => {
                let Some(index) = self.active_column_index(ws) else {
                    return IpcResponse::Ok;
                };
                let display = self
                    .engine
                    .workspace(ws)
                    .and_then(|w| w.active_column())
                    .and_then(|c| self.engine.tree().container(c))
                    .map(|c| c.display)
                    .unwrap_or_default();
                let toggled = match display {
                    ColumnDisplay::Normal => ColumnDisplay::Tabbed,
                    ColumnDisplay::Tabbed => ColumnDisplay::Normal,
                };
                match self.engine.set_column_display(ws, index, toggled) {
                    Ok(()) => IpcResponse::Ok,
                    Err(e) => IpcResponse::error(e.to_string()),
                }
            }
            IpcCommand::ToggleFullWidth => {
                let Some(index) = self.active_column_index(ws) else {
                    return IpcResponse::Ok;
                };
                match self.engine.toggle_full_width(ws, index) {
                    Ok(full) => {
                        self.engine.ensure_active_visible(ws, &ctx);
                        info!("Column {} full width: {}", index, full);
                        IpcResponse::Ok
                    }
                    Err(e) => IpcResponse::error(e.to_string()),
                }
            }
            IpcCommand::Resize { delta } => {
                if self.engine.resize_column_by(ws, delta, &ctx) {
                    info!("Resized active column by {}", delta);
                }
                IpcResponse::Ok
            }
            IpcCommand::Scroll { delta } => {
                self.engine.scroll_by(ws, delta, &ctx);
                IpcResponse::Ok
            }
            IpcCommand::WindowCreated {
                window_id,
                min_width,
                min_height,
                max_width,
                max_height,
            } => {
                let hints = WindowHints {
                    constraints: SizeConstraints {
                        min_width: min_width.unwrap_or(0.0),
                        min_height: min_height.unwrap_or(0.0),
                        max_width: max_width.unwrap_or(0.0),
                        max_height: max_height.unwrap_or(0.0),
                    },
                    focus: self.config.behavior.focus_new_windows,
                    ..WindowHints::default()
                };
                match self.engine.add_window(ws, window_id, hints, Insertion::NewColumn, &ctx) {
                    Ok(_) => {
                        info!("Managing window {} on monitor '{}'", window_id, monitor.name);
                        IpcResponse::Ok
                    }
                    Err(e) => IpcResponse::error(e.to_string()),
                }
            }
            IpcCommand::GestureBegin => {
                self.engine.begin_gesture(ws, &ctx);
                IpcResponse::Ok
            }
            IpcCommand::GestureUpdate { delta } => {
                if self.engine.update_gesture(ws, delta, &ctx) {
                    IpcResponse::Ok
                } else {
                    IpcResponse::error("No gesture in progress")
                }
            }
            IpcCommand::GestureEnd => {
                let landed = self.engine.end_gesture(ws, &ctx);
                debug!("Gesture ended on window {:?}", landed.and_then(|n| self.engine.handle_of(n)));
                IpcResponse::Ok
            }
            IpcCommand::QueryWorkspace => self.query_workspace(ws, time),
            IpcCommand::QueryFocused => self.query_focused(ws),
            IpcCommand::QueryLayout => layout_response(&self.layout_for(&monitor, time)),
            IpcCommand::Stop => IpcResponse::Ok,
            IpcCommand::SetAnimationRate { .. }
            | IpcCommand::Reload
            | IpcCommand::WindowDestroyed { .. }
            | IpcCommand::WindowFocused { .. } => IpcResponse::Ok,
        }
    }

    fn active_column_index(&self, ws: WorkspaceId) -> Option<usize> {
        let workspace = self.engine.workspace(ws)?;
        let column = workspace.active_column()?;
        workspace.column_index(column)
    }

    fn window_destroyed(&mut self, window_id: u64) -> IpcResponse {
        let Some(monitor) = self.monitor_for_window(window_id) else {
            return IpcResponse::error(format!("Window {} is not managed", window_id));
        };
        let time = self.clock.now();
        let ctx = ViewContext::for_monitor(&monitor, self.config.gaps(), &self.clock, time);
        match self.engine.remove_window(window_id, &ctx) {
            Ok(()) => {
                info!("Window {} destroyed", window_id);
                IpcResponse::Ok
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Follow a focus change made outside the daemon.
    fn window_focused(&mut self, window_id: u64) -> IpcResponse {
        let Some(monitor) = self.monitor_for_window(window_id) else {
            return IpcResponse::error(format!("Window {} is not managed", window_id));
        };
        let time = self.clock.now();
        let ctx = ViewContext::for_monitor(&monitor, self.config.gaps(), &self.clock, time);
        match self.engine.focus_window(window_id, &ctx) {
            Ok(_) => {
                if self.focused_monitor != monitor.id {
                    info!("Focused monitor -> '{}'", monitor.name);
                    self.focused_monitor = monitor.id;
                }
                IpcResponse::Ok
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn query_workspace(&self, ws: WorkspaceId, time: f64) -> IpcResponse {
        let Some(workspace) = self.engine.workspace(ws) else {
            return IpcResponse::error(format!("Workspace {:?} not found", ws));
        };
        let tree = self.engine.tree();
        let windows = workspace
            .columns()
            .iter()
            .filter_map(|&c| tree.container(c))
            .map(|c| c.children().len())
            .sum();
        IpcResponse::WorkspaceState {
            workspace_id: ws.0,
            columns: workspace.column_count(),
            windows,
            active_column: workspace.viewport.active_column_index,
            selected_window: workspace.selected().and_then(|n| self.engine.handle_of(n)),
            view_offset: workspace.viewport.current_offset(&self.clock, time),
            animating: self.engine.is_animating(&self.clock, time),
        }
    }

    fn query_focused(&self, ws: WorkspaceId) -> IpcResponse {
        let selected = self.engine.selected_window(ws);
        IpcResponse::FocusedWindow {
            window_id: selected.and_then(|n| self.engine.handle_of(n)),
            workspace_id: selected.map(|_| ws.0),
            column_index: selected.and_then(|n| self.engine.column_index_of(n, ws)),
            window_index: selected.and_then(|n| self.engine.tree().index_in_parent(n)),
        }
    }
}

/// Run a navigation op from the selected window, if there is one.
fn focus_with(
    engine: &mut LayoutEngine,
    current: Option<NodeId>,
    op: impl FnOnce(&mut LayoutEngine, NodeId) -> Option<NodeId>,
) -> IpcResponse {
    if let Some(current) = current {
        let target = op(engine, current);
        info!("Focus -> window {:?}", target.and_then(|n| engine.handle_of(n)));
    }
    IpcResponse::Ok
}

fn move_column(engine: &mut LayoutEngine, ws: WorkspaceId, direction: Direction, ctx: &ViewContext<'_>) -> IpcResponse {
    if engine.move_column(ws, direction, ctx) {
        info!("Moved column {:?}", direction);
    }
    IpcResponse::Ok
}

fn layout_response(layout: &LayoutResult) -> IpcResponse {
    let mut frames: Vec<WindowFrame> = layout
        .frames
        .iter()
        .map(|(&window_id, r)| WindowFrame {
            window_id,
            rect: IpcRect {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            },
        })
        .collect();
    frames.sort_by_key(|f| f.window_id);

    let mut hidden: Vec<HiddenWindow> = layout
        .hidden_handles
        .iter()
        .map(|(&window_id, side)| HiddenWindow {
            window_id,
            side: match side {
                HideSide::Left => ScreenSide::Left,
                HideSide::Right => ScreenSide::Right,
            },
        })
        .collect();
    hidden.sort_by_key(|h| h.window_id);

    IpcResponse::Layout { frames, hidden }
}

/// Run the IPC server, accepting connections and dispatching commands.
async fn run_ipc_server(listener: UnixListener, event_tx: mpsc::Sender<DaemonEvent>) {
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                error!("Failed to accept client connection: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        debug!("Client connected");

        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, event_tx).await {
                warn!("Client handler error: {}", e);
            }
        });
    }
}

fn response_line(response: &IpcResponse) -> String {
    to_json_line(response).unwrap_or_else(|e| {
        warn!("Failed to serialize IPC response: {}", e);
        "{\"status\":\"error\",\"message\":\"Internal serialization error\"}\n".to_string()
    })
}

/// Handle a single client connection.
async fn handle_client(stream: UnixStream, event_tx: mpsc::Sender<DaemonEvent>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let limited_reader = reader.take(MAX_IPC_MESSAGE_SIZE as u64);
    let mut reader = BufReader::new(limited_reader);
    let mut line = String::new();

    // Read command (single line of JSON) with timeout and size bound
    let read_result = tokio::time::timeout(IPC_READ_TIMEOUT, reader.read_line(&mut line)).await;
    let bytes_read = match read_result {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            // Timeout: client did not send in time, silently close
            return Ok(());
        }
    };
    if bytes_read == 0 {
        return Ok(()); // Client disconnected
    }

    let line = line.trim();
    debug!("Received command: {}", line);

    let cmd: IpcCommand = match serde_json::from_str(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            let response = IpcResponse::error(format!("Invalid command: {}", e));
            writer.write_all(response_line(&response).as_bytes()).await?;
            return Ok(());
        }
    };

    let is_stop = matches!(cmd, IpcCommand::Stop);
    let (resp_tx, resp_rx) = oneshot::channel();

    if event_tx
        .send(DaemonEvent::IpcCommand {
            cmd,
            responder: resp_tx,
        })
        .await
        .is_err()
    {
        let response = IpcResponse::error("Daemon is shutting down");
        writer.write_all(response_line(&response).as_bytes()).await?;
        return Ok(());
    }

    let response = match resp_rx.await {
        Ok(resp) => resp,
        Err(_) => IpcResponse::error("Failed to get response from daemon"),
    };
    writer.write_all(response_line(&response).as_bytes()).await?;

    // If this was a stop command, signal shutdown
    if is_stop {
        let _ = event_tx.send(DaemonEvent::Shutdown).await;
    }

    Ok(())
}

/// Check if another daemon instance is already running by probing the socket.
async fn check_already_running(path: &std::path::Path) -> bool {
    UnixStream::connect(path).await.is_ok()
}

fn start_animation_timer(
    animation_tx: mpsc::Sender<DaemonEvent>,
    animation_running: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    animation_running.store(true, Ordering::SeqCst);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(ANIMATION_TICK_MS));
        loop {
            interval.tick().await;
            if !animation_running.load(Ordering::SeqCst) {
                break;
            }
            if animation_tx.send(DaemonEvent::AnimationTick).await.is_err() {
                break; // Channel closed
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (needed for log level)
    let mut config = Config::load().unwrap_or_else(|e| {
        // Can't use tracing yet, fall back to eprintln
        eprintln!("Failed to load configuration: {}. Using defaults.", e);
        Config::default()
    });

    let log_level = parse_log_level(&config.behavior.log_level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(log_level).into()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Validate and clamp config values
    for w in config.validate() {
        warn!("Config: {} - {}", w.field, w.message);
    }

    info!("scrollwm daemon starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = socket_path();
    if check_already_running(&path).await {
        error!("Another scrollwm daemon is already running (socket {} is active)", path.display());
        return Ok(());
    }
    if path.exists() {
        debug!("Removing stale socket {}", path.display());
        std::fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    let listener = UnixListener::bind(&path).with_context(|| format!("Failed to bind {}", path.display()))?;

    info!(
        "Configuration loaded: gaps={}x{}, centering={:?}, monitors={}, log_level={}",
        config.layout.gap_horizontal,
        config.layout.gap_vertical,
        config.layout.centering_mode,
        config.monitors.len(),
        config.behavior.log_level
    );

    let mut state = AppState::new_with_config(config, Box::new(LoggingPlacer::new()));
    if let Some(world) = AppState::load_state() {
        match state.restore_state(&world) {
            Ok(()) => info!("Restored workspace state from previous session"),
            Err(e) => warn!("Failed to restore workspace state: {}", e),
        }
    }
    if let Err(e) = state.apply_layout() {
        warn!("Initial layout failed: {}", e);
    }

    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(100);

    let ipc_handle = tokio::spawn(run_ipc_server(listener, event_tx.clone()));

    let ctrl_c_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = ctrl_c_tx.send(DaemonEvent::Shutdown).await;
        }
    });

    info!("Ready. Listening on {}", path.display());

    let mut animation_timer_handle: Option<tokio::task::JoinHandle<()>> = None;
    let animation_running = Arc::new(AtomicBool::new(false));

    // Main event loop
    while let Some(event) = event_rx.recv().await {
        match event {
            DaemonEvent::IpcCommand { cmd, responder } => {
                let response = state.handle_command(cmd);
                let should_animate = state.is_animating();

                if responder.send(response).is_err() {
                    debug!("Client disconnected before receiving IPC response");
                }

                if should_animate && !animation_running.load(Ordering::SeqCst) {
                    animation_timer_handle = Some(start_animation_timer(
                        event_tx.clone(),
                        animation_running.clone(),
                    ));
                }
            }
            DaemonEvent::AnimationTick => {
                if !state.tick_animations() {
                    animation_running.store(false, Ordering::SeqCst);
                    if let Some(handle) = animation_timer_handle.take() {
                        handle.abort();
                    }
                    debug!("All animations complete");
                }
            }
            DaemonEvent::Shutdown => {
                info!("Shutdown signal received");
                if state.config.behavior.save_state_on_exit {
                    if let Err(e) = state.save_state() {
                        warn!("Failed to save workspace state: {}", e);
                    }
                }
                break;
            }
        }
    }

    if let Some(handle) = animation_timer_handle {
        handle.abort();
    }
    ipc_handle.abort();
    if let Err(e) = std::fs::remove_file(&path) {
        debug!("Failed to remove socket {}: {}", path.display(), e);
    }

    info!("scrollwm daemon shutting down.");
    Ok(())
}
