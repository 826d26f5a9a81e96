// Centralized configuration for ingestion and rendering parameters

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VizError};

// ====================
// Input Defaults
// ====================
/// Position log written by the Barnes-Hut test driver.
pub const DEFAULT_POSITION_LOG: &str = "particle_positions.txt";
/// Total energy per timestep, `# Timestep N` headers.
pub const DEFAULT_ENERGY_LOG: &str = "energy_evolution.txt";
/// Entropy log written alongside the position log.
pub const DEFAULT_ENTROPY_LOG: &str = "entropy_log.txt";
/// Optional TOML file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "viz_config.toml";

// ====================
// Viewport Parameters
// ====================
/// Fraction of each axis range added on both ends of the viewport.
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.05;
/// Span given to an axis whose data range is zero (single point, frozen coordinate).
pub const DEGENERATE_SPAN: f64 = 1.0;
/// Lower bound on that span relative to the value's magnitude, so it survives rounding far from zero.
pub const DEGENERATE_RELATIVE_SPAN: f64 = 1e-9;

// ====================
// Animation Parameters
// ====================
pub const DEFAULT_CANVAS_PX: u32 = 1000;
/// 20 frames per second.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 50;
pub const DEFAULT_TRAIL_OPACITY: f64 = 0.6;
pub const DEFAULT_MARKER_PX: u32 = 6;

// ====================
// Static Plot Parameters
// ====================
pub const DEFAULT_PLOT_WIDTH_PX: u32 = 1200;
pub const DEFAULT_PLOT_HEIGHT_PX: u32 = 600;
/// Number of leading series points echoed to the log after aggregation.
pub const SERIES_PREVIEW_POINTS: usize = 5;

/// Top level configuration, loaded from a TOML file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VizConfig {
    pub viewport: ViewportConfig,
    pub animation: AnimationConfig,
    pub plot: PlotConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub margin_fraction: f64,
    /// Width:height ratio the viewport is widened to, if any.
    pub target_aspect: Option<f64>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            target_aspect: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub width_px: u32,
    pub height_px: u32,
    pub frame_delay_ms: u32,
    pub trail_opacity: f64,
    pub marker_px: u32,
    pub dark_background: bool,
    pub draw_labels: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_CANVAS_PX,
            height_px: DEFAULT_CANVAS_PX,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
            trail_opacity: DEFAULT_TRAIL_OPACITY,
            marker_px: DEFAULT_MARKER_PX,
            dark_background: true,
            draw_labels: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width_px: u32,
    pub height_px: u32,
    pub draw_labels: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_PLOT_WIDTH_PX,
            height_px: DEFAULT_PLOT_HEIGHT_PX,
            draw_labels: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Suffix appended to every artifact name, e.g. `openmp` for the threaded solver's logs.
    pub variant: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            variant: None,
        }
    }
}

impl VizConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: VizConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `viz_config.toml` from the working directory, falling back to defaults when absent.
    pub fn load_default() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::load_from_file(DEFAULT_CONFIG_FILE)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let margin = self.viewport.margin_fraction;
        if !margin.is_finite() || margin < 0.0 {
            return Err(VizError::InvalidConfig(format!(
                "margin_fraction must be a finite value >= 0, got {margin}"
            )));
        }
        if let Some(aspect) = self.viewport.target_aspect {
            if !aspect.is_finite() || aspect <= 0.0 {
                return Err(VizError::InvalidConfig(format!(
                    "target_aspect must be a finite value > 0, got {aspect}"
                )));
            }
        }
        let anim = &self.animation;
        if anim.width_px == 0 || anim.height_px == 0 || self.plot.width_px == 0 || self.plot.height_px == 0 {
            return Err(VizError::InvalidConfig("canvas sizes must be non-zero".to_string()));
        }
        if !(0.0..=1.0).contains(&anim.trail_opacity) {
            return Err(VizError::InvalidConfig(format!(
                "trail_opacity must lie in [0, 1], got {}",
                anim.trail_opacity
            )));
        }
        Ok(())
    }
}
