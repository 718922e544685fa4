use serde::{Deserialize, Serialize};

use crate::animation::{AnimationConfig, CubicConfig, DEFAULT_DECELERATION_RATE};
use crate::tree::ColumnSize;
use crate::viewport::CenteringMode;
use crate::Orientation;

/// Gaps between tiles, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaps {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for Gaps {
    fn default() -> Self {
        Self {
            horizontal: 10.0,
            vertical: 10.0,
        }
    }
}

impl Gaps {
    pub fn uniform(gap: f64) -> Self {
        Self {
            horizontal: gap,
            vertical: gap,
        }
    }

    /// Gap between neighbours stacked along `axis`.
    pub fn along(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Horizontal => self.horizontal,
            Orientation::Vertical => self.vertical,
        }
    }
}

/// Per-context animation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationOptions {
    /// When false every viewport transition snaps.
    pub enabled: bool,
    pub focus_change: AnimationConfig,
    pub gesture: AnimationConfig,
    pub column_reveal: AnimationConfig,
    /// Slide of containers swapped by `move_column`.
    pub window_movement: CubicConfig,
    pub deceleration_rate: f64,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            focus_change: AnimationConfig::default(),
            gesture: AnimationConfig::default(),
            column_reveal: AnimationConfig::default(),
            window_movement: CubicConfig::default(),
            deceleration_rate: DEFAULT_DECELERATION_RATE,
        }
    }
}

/// Layout behaviour knobs consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub centering_mode: CenteringMode,
    /// Wrap around when navigating past the first or last container.
    pub infinite_loop: bool,
    pub default_column_width: ColumnSize,
    /// Stripe reserved on the leading edge of tabbed containers.
    pub tab_indicator_width: f64,
    pub animations: AnimationOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            centering_mode: CenteringMode::default(),
            infinite_loop: false,
            default_column_width: ColumnSize::default(),
            tab_indicator_width: 12.0,
            animations: AnimationOptions::default(),
        }
    }
}
