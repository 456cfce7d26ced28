//! Configuration management for techradar.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::status::Period;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "techradar";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "radar.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TECHRADAR_`)
/// 2. TOML config file at `~/.config/techradar/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Status classification configuration.
    pub radar: RadarConfig,
    /// Layout configuration.
    pub layout: LayoutConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/techradar/radar.db`
    pub database_path: Option<PathBuf>,
}

/// Status classification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Lookback window used when none is given.
    pub default_period_days: u32,
    /// Lookback windows offered to users. Empty allows any positive value.
    pub period_choices: Vec<u32>,
}

/// Geometry of the full radar and the half-arc quadrant view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Side length of the square full-radar canvas.
    pub canvas_size: f64,
    /// Gap between the outer ring and the canvas edge.
    pub margin: f64,
    /// Angle kept clear on each side of a quadrant boundary, in degrees.
    pub edge_margin_deg: f64,
    /// Number of radial lanes blips in a shared sector cycle through.
    pub lanes: usize,
    /// Maximum lane displacement as a fraction of the ring width.
    /// Must stay below 0.5 so blips never leave their ring.
    pub lane_fraction: f64,
    /// Absolute cap on lane displacement.
    pub max_lane_offset: f64,
    /// Width of the half-arc canvas.
    pub half_arc_width: f64,
    /// Height of the half-arc canvas.
    pub half_arc_height: f64,
    /// Distance of the half-arc origin from the left edge.
    pub half_arc_origin_x: f64,
    /// Space kept between the outer ring and the half-arc canvas edges.
    pub half_arc_padding: f64,
    /// Half-arc angle either side of the horizontal axis, in degrees.
    pub half_arc_span_deg: f64,
    /// Lane fraction for the half-arc view.
    pub half_arc_lane_fraction: f64,
    /// Lane displacement cap for the half-arc view.
    pub half_arc_max_lane_offset: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            default_period_days: 90,
            period_choices: vec![30, 60, 90, 180],
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_size: 700.0,
            margin: 36.0,
            edge_margin_deg: 6.0,
            lanes: 3,
            lane_fraction: 0.35,
            max_lane_offset: 18.0,
            half_arc_width: 560.0,
            half_arc_height: 520.0,
            half_arc_origin_x: 50.0,
            half_arc_padding: 24.0,
            half_arc_span_deg: 80.0,
            half_arc_lane_fraction: 0.3,
            half_arc_max_lane_offset: 14.0,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `TECHRADAR_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("TECHRADAR_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.radar.default_period_days == 0 {
            return Err(Error::ConfigValidation {
                message: "default_period_days must be greater than 0".to_string(),
            });
        }

        if self.radar.period_choices.contains(&0) {
            return Err(Error::ConfigValidation {
                message: "period_choices must not contain 0".to_string(),
            });
        }

        if !self.radar.period_choices.is_empty()
            && !self
                .radar
                .period_choices
                .contains(&self.radar.default_period_days)
        {
            return Err(Error::ConfigValidation {
                message: format!(
                    "default_period_days ({}) must be one of period_choices ({:?})",
                    self.radar.default_period_days, self.radar.period_choices
                ),
            });
        }

        let layout = &self.layout;
        for (name, value) in [
            ("canvas_size", layout.canvas_size),
            ("margin", layout.margin),
            ("max_lane_offset", layout.max_lane_offset),
            ("half_arc_width", layout.half_arc_width),
            ("half_arc_height", layout.half_arc_height),
            ("half_arc_origin_x", layout.half_arc_origin_x),
            ("half_arc_padding", layout.half_arc_padding),
            ("half_arc_max_lane_offset", layout.half_arc_max_lane_offset),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigValidation {
                    message: format!("{name} ({value}) must be a non-negative number"),
                });
            }
        }

        if layout.lanes == 0 {
            return Err(Error::ConfigValidation {
                message: "lanes must be greater than 0".to_string(),
            });
        }

        if layout.canvas_size <= 2.0 * layout.margin {
            return Err(Error::ConfigValidation {
                message: format!(
                    "canvas_size ({}) must be larger than twice the margin ({})",
                    layout.canvas_size, layout.margin
                ),
            });
        }

        for (name, fraction) in [
            ("lane_fraction", layout.lane_fraction),
            ("half_arc_lane_fraction", layout.half_arc_lane_fraction),
        ] {
            if !(0.0..0.5).contains(&fraction) {
                return Err(Error::ConfigValidation {
                    message: format!("{name} ({fraction}) must be in [0, 0.5)"),
                });
            }
        }

        if !(0.0..45.0).contains(&layout.edge_margin_deg) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "edge_margin_deg ({}) must be in [0, 45)",
                    layout.edge_margin_deg
                ),
            });
        }

        if !(layout.half_arc_span_deg > 0.0 && layout.half_arc_span_deg <= 90.0) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "half_arc_span_deg ({}) must be in (0, 90]",
                    layout.half_arc_span_deg
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Resolve a requested lookback window, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `days` is zero or not one of the
    /// configured choices.
    pub fn period(&self, days: Option<u32>) -> Result<Period> {
        let days = days.unwrap_or(self.radar.default_period_days);
        if !self.radar.period_choices.is_empty() && !self.radar.period_choices.contains(&days) {
            return Err(Error::validation(
                "period",
                format!(
                    "{days} days is not one of {:?}",
                    self.radar.period_choices
                ),
            ));
        }
        Period::days(days)
    }
}
