//! Configuration management for the scrollwm daemon.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. the platform config dir (`$XDG_CONFIG_HOME/scrollwm/config.toml` on Linux)
//! 2. `~/.config/scrollwm/config.toml`
//! 3. `./config.toml` (current directory, for development)

use anyhow::{Context, Result};
use directories::ProjectDirs;
use scrollwm_core_layout::{
    AnimationConfig, AnimationOptions, CenteringMode, ColumnSize, EasingCurve, Gaps,
    LayoutOptions, Monitor, MonitorId, Orientation, Rect, SpringConfig, MAX_DECELERATION_RATE,
    MIN_DECELERATION_RATE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound accepted for `animations.clock_rate`.
const MAX_CLOCK_RATE: f64 = 1000.0;

/// Main configuration structure for scrollwm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout configuration.
    pub layout: LayoutConfig,
    /// Animation configuration.
    pub animations: AnimationsConfig,
    /// Monitors, in the order they are assigned workspaces.
    #[serde(default = "default_monitors")]
    pub monitors: Vec<MonitorConfig>,
    /// Behavior configuration.
    pub behavior: BehaviorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            animations: AnimationsConfig::default(),
            monitors: default_monitors(),
            behavior: BehaviorConfig::default(),
        }
    }
}

/// Layout-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between containers and around the strip, horizontally.
    #[serde(default = "default_gap")]
    pub gap_horizontal: f64,

    /// Gap between stacked windows and around the strip, vertically.
    #[serde(default = "default_gap")]
    pub gap_vertical: f64,

    /// How the view follows the active container.
    #[serde(default)]
    pub centering_mode: CenteringMode,

    /// Wrap focus around the ends of the strip.
    #[serde(default)]
    pub infinite_loop: bool,

    /// Width of new containers as a fraction of the working area.
    #[serde(default = "default_column_proportion")]
    pub default_column_proportion: f64,

    /// Stripe reserved for tab indicators in tabbed containers.
    #[serde(default = "default_tab_indicator_width")]
    pub tab_indicator_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap_horizontal: default_gap(),
            gap_vertical: default_gap(),
            centering_mode: CenteringMode::default(),
            infinite_loop: false,
            default_column_proportion: default_column_proportion(),
            tab_indicator_width: default_tab_indicator_width(),
        }
    }
}

/// Animation configuration.
///
/// ```toml
/// [animations]
/// clock_rate = 1.0
///
/// [animations.focus_change]
/// type = "spring"
/// preset = "smooth"
///
/// [animations.column_reveal]
/// type = "easing"
/// curve = { cubic_bezier = { x1 = 0.25, y1 = 0.1, x2 = 0.25, y2 = 1.0 } }
/// duration = 0.2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationsConfig {
    /// When false every viewport transition snaps.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Speed multiplier of the animation clock.
    #[serde(default = "default_clock_rate")]
    pub clock_rate: f64,

    /// Per-millisecond velocity decay used to project swipe releases.
    #[serde(default = "default_deceleration_rate")]
    pub deceleration_rate: f64,

    /// Finish every animation the moment it starts.
    #[serde(default)]
    pub complete_instantly: bool,

    #[serde(default)]
    pub focus_change: AnimationKindConfig,

    #[serde(default)]
    pub gesture: AnimationKindConfig,

    #[serde(default)]
    pub column_reveal: AnimationKindConfig,
}

impl Default for AnimationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clock_rate: default_clock_rate(),
            deceleration_rate: default_deceleration_rate(),
            complete_instantly: false,
            focus_change: AnimationKindConfig::default(),
            gesture: AnimationKindConfig::default(),
            column_reveal: AnimationKindConfig::default(),
        }
    }
}

/// Animation used by one transition context.
///
/// A spring is either a named preset or explicit parameters; explicit
/// parameters override the preset they are combined with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationKindConfig {
    Spring {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stiffness: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        damping_ratio: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        epsilon: Option<f64>,
    },
    Easing {
        #[serde(default)]
        curve: EasingCurve,
        /// Duration in seconds.
        #[serde(default = "default_easing_duration")]
        duration: f64,
    },
}

impl Default for AnimationKindConfig {
    fn default() -> Self {
        AnimationKindConfig::Spring {
            preset: Some("snappy".to_string()),
            stiffness: None,
            damping_ratio: None,
            epsilon: None,
        }
    }
}

impl AnimationKindConfig {
    /// Convert to the engine's animation config.
    ///
    /// Unknown presets fall back to the snappy spring.
    pub fn to_animation_config(&self) -> AnimationConfig {
        match self {
            AnimationKindConfig::Spring {
                preset,
                stiffness,
                damping_ratio,
                epsilon,
            } => {
                let base = preset
                    .as_deref()
                    .and_then(SpringConfig::preset)
                    .unwrap_or(SpringConfig::SNAPPY);
                AnimationConfig::Spring(SpringConfig::new(
                    stiffness.unwrap_or(base.stiffness),
                    damping_ratio.unwrap_or(base.damping_ratio),
                    epsilon.unwrap_or(base.epsilon),
                ))
            }
            AnimationKindConfig::Easing { curve, duration } => AnimationConfig::Easing {
                curve: *curve,
                duration: duration.max(0.0),
            },
        }
    }
}

/// One display the daemon lays out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub orientation: Orientation,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            x: 0.0,
            y: 0.0,
            width: 1920.0,
            height: 1080.0,
            scale: 1.0,
            orientation: Orientation::Horizontal,
        }
    }
}

impl MonitorConfig {
    pub fn to_monitor(&self, id: MonitorId) -> Monitor {
        Monitor::new(
            id,
            self.name.clone(),
            Rect::new(self.x, self.y, self.width, self.height),
        )
        .with_orientation(self.orientation)
        .with_scale(self.scale)
    }
}

/// Behavior-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to focus new windows automatically.
    #[serde(default = "default_true")]
    pub focus_new_windows: bool,

    /// Write the frozen layout to disk on shutdown.
    #[serde(default = "default_true")]
    pub save_state_on_exit: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            focus_new_windows: true,
            save_state_on_exit: true,
        }
    }
}

// Default value functions for serde
fn default_gap() -> f64 {
    10.0
}

fn default_column_proportion() -> f64 {
    0.5
}

fn default_tab_indicator_width() -> f64 {
    12.0
}

fn default_clock_rate() -> f64 {
    1.0
}

fn default_deceleration_rate() -> f64 {
    0.997
}

fn default_easing_duration() -> f64 {
    0.25
}

fn default_monitors() -> Vec<MonitorConfig> {
    vec![MonitorConfig::default()]
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A problem found (and corrected) while validating the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl ConfigWarning {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Load configuration from standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        for path in config_paths() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(&path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Clamp out-of-range values in place and report what was changed.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (field, gap) in [
            ("layout.gap_horizontal", &mut self.layout.gap_horizontal),
            ("layout.gap_vertical", &mut self.layout.gap_vertical),
        ] {
            if !gap.is_finite() || *gap < 0.0 {
                warnings.push(ConfigWarning::new(field, format!("{} is not a valid gap, using 0", gap)));
                *gap = 0.0;
            }
        }

        let proportion = self.layout.default_column_proportion;
        if !(proportion > 0.0 && proportion <= 1.0) {
            let clamped = if proportion.is_finite() {
                proportion.clamp(0.1, 1.0)
            } else {
                default_column_proportion()
            };
            warnings.push(ConfigWarning::new(
                "layout.default_column_proportion",
                format!("{} is outside (0, 1], using {}", proportion, clamped),
            ));
            self.layout.default_column_proportion = clamped;
        }

        if !self.layout.tab_indicator_width.is_finite() || self.layout.tab_indicator_width < 0.0 {
            warnings.push(ConfigWarning::new(
                "layout.tab_indicator_width",
                "must be a non-negative number, using 0",
            ));
            self.layout.tab_indicator_width = 0.0;
        }

        let rate = self.animations.clock_rate;
        if rate.is_nan() {
            warnings.push(ConfigWarning::new("animations.clock_rate", "NaN, using 1.0"));
            self.animations.clock_rate = 1.0;
        } else if !(0.0..=MAX_CLOCK_RATE).contains(&rate) {
            let clamped = rate.clamp(0.0, MAX_CLOCK_RATE);
            warnings.push(ConfigWarning::new(
                "animations.clock_rate",
                format!("{} is outside [0, {}], using {}", rate, MAX_CLOCK_RATE, clamped),
            ));
            self.animations.clock_rate = clamped;
        }

        let decel = self.animations.deceleration_rate;
        if !(MIN_DECELERATION_RATE..=MAX_DECELERATION_RATE).contains(&decel) {
            warnings.push(ConfigWarning::new(
                "animations.deceleration_rate",
                format!(
                    "{} is outside [{}, {}], using {}",
                    decel,
                    MIN_DECELERATION_RATE,
                    MAX_DECELERATION_RATE,
                    default_deceleration_rate()
                ),
            ));
            self.animations.deceleration_rate = default_deceleration_rate();
        }

        for (field, kind) in [
            ("animations.focus_change", &mut self.animations.focus_change),
            ("animations.gesture", &mut self.animations.gesture),
            ("animations.column_reveal", &mut self.animations.column_reveal),
        ] {
            validate_animation_kind(field, kind, &mut warnings);
        }

        if self.monitors.is_empty() {
            warnings.push(ConfigWarning::new("monitors", "no monitors configured, using 1920x1080"));
            self.monitors = default_monitors();
        }
        for (i, monitor) in self.monitors.iter_mut().enumerate() {
            let field = format!("monitors[{}]", i);
            if !(monitor.width > 0.0 && monitor.height > 0.0) {
                warnings.push(ConfigWarning::new(
                    format!("{}.size", field),
                    format!("{}x{} is not a valid size, using 1920x1080", monitor.width, monitor.height),
                ));
                monitor.width = 1920.0;
                monitor.height = 1080.0;
            }
            if !(monitor.scale.is_finite() && monitor.scale > 0.0) {
                warnings.push(ConfigWarning::new(format!("{}.scale", field), "must be positive, using 1.0"));
                monitor.scale = 1.0;
            }
        }

        let level = self.behavior.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            warnings.push(ConfigWarning::new(
                "behavior.log_level",
                format!("unknown level '{}', using info", self.behavior.log_level),
            ));
            self.behavior.log_level = default_log_level();
        }

        warnings
    }

    /// Engine options described by this config.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            centering_mode: self.layout.centering_mode,
            infinite_loop: self.layout.infinite_loop,
            default_column_width: ColumnSize::Proportion(self.layout.default_column_proportion),
            tab_indicator_width: self.layout.tab_indicator_width,
            animations: AnimationOptions {
                enabled: self.animations.enabled,
                focus_change: self.animations.focus_change.to_animation_config(),
                gesture: self.animations.gesture.to_animation_config(),
                column_reveal: self.animations.column_reveal.to_animation_config(),
                deceleration_rate: self.animations.deceleration_rate,
                ..AnimationOptions::default()
            },
        }
    }

    pub fn gaps(&self) -> Gaps {
        Gaps {
            horizontal: self.layout.gap_horizontal,
            vertical: self.layout.gap_vertical,
        }
    }

    /// Configured monitors with ids assigned in file order, starting at 1.
    pub fn monitor_list(&self) -> Vec<Monitor> {
        self.monitors
            .iter()
            .enumerate()
            .map(|(i, m)| m.to_monitor(MonitorId(i as u32 + 1)))
            .collect()
    }
}

fn validate_animation_kind(field: &str, kind: &mut AnimationKindConfig, warnings: &mut Vec<ConfigWarning>) {
    match kind {
        AnimationKindConfig::Spring {
            preset,
            stiffness,
            damping_ratio,
            ..
        } => {
            let unknown = preset
                .as_deref()
                .filter(|name| SpringConfig::preset(name).is_none())
                .map(str::to_string);
            if let Some(name) = unknown {
                warnings.push(ConfigWarning::new(
                    format!("{}.preset", field),
                    format!("unknown spring preset '{}', using snappy", name),
                ));
                *preset = Some("snappy".to_string());
            }
            for (name, value) in [("stiffness", stiffness), ("damping_ratio", damping_ratio)] {
                if let Some(v) = value {
                    if !v.is_finite() || *v < 0.0 {
                        warnings.push(ConfigWarning::new(
                            format!("{}.{}", field, name),
                            format!("{} must be non-negative, using 0", v),
                        ));
                        *v = 0.0;
                    }
                }
            }
        }
        AnimationKindConfig::Easing { duration, .. } => {
            if !duration.is_finite() || *duration < 0.0 {
                warnings.push(ConfigWarning::new(
                    format!("{}.duration", field),
                    format!("{} must be non-negative, using {}", duration, default_easing_duration()),
                ));
                *duration = default_easing_duration();
            }
        }
    }
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(proj_dirs) = ProjectDirs::from("org", "scrollwm", "scrollwm") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }

    if let Some(home) = dirs_home() {
        let unix_style = home.join(".config").join("scrollwm").join("config.toml");
        if !paths.contains(&unix_style) {
            paths.push(unix_style);
        }
    }

    paths.push(PathBuf::from("config.toml"));

    paths
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
