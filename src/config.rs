//! Configuration loading and validation for glyphscramble.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.glyphscramble/config.toml`
//! - Per-variant option tables with defaults for every key
//! - Validation that turns a raw [`Config`] into an immutable [`EffectConfig`]
//!
//! # Configuration File
//!
//! ```toml
//! # Variant: spot-pulse, global-fuzz, linear-scan, radial-spread
//! effect = "radial-spread"
//! seed = 42
//!
//! [common]
//! update_interval = 50
//! colors = ["#0b3d2e", "#13693f", "#1fa35a", "#5ee38d", "#c8ffd9"]
//! char_set = "01<>[]{}#$%&*+=?"
//!
//! [spot_pulse]
//! min_active_chars = 2
//! max_active_chars = 6
//!
//! [radial_spread]
//! spread_radius = 4
//! ```
//!
//! Unknown keys are ignored. Out-of-range values are corrected, never
//! rejected; every correction is logged.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::color::Rgb;
use crate::effect::EffectKind;

/// Default pulse/fade palette, dim to bright
pub const DEFAULT_COLORS: [&str; 5] = ["#0b3d2e", "#13693f", "#1fa35a", "#5ee38d", "#c8ffd9"];

/// Shortest tick period
const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

/// Default substitution glyphs
pub const DEFAULT_CHAR_SET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+-=[]{}|;:,.<>?";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown effect: {0}")]
    UnknownEffect(String),
}

/// The four animation variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    SpotPulse,
    GlobalFuzz,
    LinearScan,
    RadialSpread,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::SpotPulse,
        Variant::GlobalFuzz,
        Variant::LinearScan,
        Variant::RadialSpread,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::SpotPulse => "spot-pulse",
            Variant::GlobalFuzz => "global-fuzz",
            Variant::LinearScan => "linear-scan",
            Variant::RadialSpread => "radial-spread",
        }
    }

    /// Next variant in cycling order
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spot-pulse" | "spot_pulse" | "spot" | "pulse" => Ok(Variant::SpotPulse),
            "global-fuzz" | "global_fuzz" | "fuzz" => Ok(Variant::GlobalFuzz),
            "linear-scan" | "linear_scan" | "scan" => Ok(Variant::LinearScan),
            "radial-spread" | "radial_spread" | "radial" | "spread" => Ok(Variant::RadialSpread),
            _ => Err(ConfigError::UnknownEffect(s.to_string())),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Variant name
    pub effect: String,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    pub common: CommonConfig,
    pub grid: GridConfig,
    pub spot_pulse: SpotPulseConfig,
    pub global_fuzz: GlobalFuzzConfig,
    pub linear_scan: LinearScanConfig,
    pub radial_spread: RadialSpreadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            effect: Variant::SpotPulse.name().to_string(),
            seed: None,
            common: CommonConfig::default(),
            grid: GridConfig::default(),
            spot_pulse: SpotPulseConfig::default(),
            global_fuzz: GlobalFuzzConfig::default(),
            linear_scan: LinearScanConfig::default(),
            radial_spread: RadialSpreadConfig::default(),
        }
    }
}

/// Options shared by every variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    /// Tick period in milliseconds
    pub update_interval: u64,
    /// Ordered hex palette
    pub colors: Vec<String>,
    /// Substitution glyphs
    pub char_set: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            update_interval: 50,
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            char_set: DEFAULT_CHAR_SET.to_string(),
        }
    }
}

/// Grid sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub char_width_px: u32,
    pub min_columns: usize,
    pub min_row_height_px: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            char_width_px: crate::core::grid::DEFAULT_CHAR_WIDTH_PX,
            min_columns: crate::core::grid::DEFAULT_MIN_COLUMNS,
            min_row_height_px: crate::core::grid::MIN_ROW_HEIGHT_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotPulseConfig {
    pub min_active_chars: usize,
    pub max_active_chars: usize,
    /// Respawn pause bounds in milliseconds
    pub min_pause_duration: u64,
    pub max_pause_duration: u64,
    /// Active lifetime bounds in ticks
    pub min_change_count: u32,
    pub max_change_count: u32,
    pub fade_steps: u32,
    /// Preferred Manhattan distance between units
    pub min_separation: usize,
}

impl Default for SpotPulseConfig {
    fn default() -> Self {
        Self {
            min_active_chars: 3,
            max_active_chars: 8,
            min_pause_duration: 200,
            max_pause_duration: 1200,
            min_change_count: 8,
            max_change_count: 20,
            fade_steps: 6,
            min_separation: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalFuzzConfig {
    /// Cell count; 0 follows the source text length
    pub char_count: usize,
    /// Fraction of cells rewritten per tick
    pub change_rate: f64,
    pub preserve_line_breaks: bool,
}

impl Default for GlobalFuzzConfig {
    fn default() -> Self {
        Self {
            char_count: 0,
            change_rate: 0.05,
            preserve_line_breaks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearScanConfig {
    pub tail_length: usize,
    /// Cells moved per tick
    pub travel_speed: usize,
    pub bidirectional: bool,
    pub preserve_layout: bool,
}

impl Default for LinearScanConfig {
    fn default() -> Self {
        Self {
            tail_length: 8,
            travel_speed: 1,
            bidirectional: true,
            preserve_layout: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialSpreadConfig {
    pub spread_radius: usize,
    pub min_pause_duration: u64,
    pub max_pause_duration: u64,
    pub fade_steps: u32,
    pub max_active_points: usize,
}

impl Default for RadialSpreadConfig {
    fn default() -> Self {
        Self {
            spread_radius: 3,
            min_pause_duration: 300,
            max_pause_duration: 1500,
            fade_steps: 8,
            max_active_points: 3,
        }
    }
}

/// Validated, immutable configuration of one effect instance
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    pub update_interval: Duration,
    pub palette: Vec<String>,
    pub char_set: Vec<char>,
    pub grid: GridConfig,
    pub kind: EffectKind,
}

impl EffectConfig {
    pub fn variant(&self) -> Variant {
        self.kind.variant()
    }

    /// Correct every out-of-range option, falling back to defaults for
    /// empty palettes and charsets
    pub fn validated(mut self) -> Self {
        self.kind = self.kind.validated();

        if self.palette.is_empty() {
            warn!("Empty palette, using defaults");
            self.palette = DEFAULT_COLORS.iter().map(|c| c.to_string()).collect();
        }
        for color in &self.palette {
            if let Err(e) = Rgb::parse_hex(color) {
                warn!("Palette entry will render uncolored while fading: {}", e);
            }
        }

        if self.char_set.is_empty() {
            warn!("Empty char_set, using defaults");
            self.char_set = DEFAULT_CHAR_SET.chars().collect();
        }

        if self.update_interval < MIN_UPDATE_INTERVAL {
            warn!("update_interval {:?} too short", self.update_interval);
            self.update_interval = MIN_UPDATE_INTERVAL;
        }

        self.grid.char_width_px = at_least_one("char_width_px", self.grid.char_width_px);
        self.grid.min_columns = at_least_one("min_columns", self.grid.min_columns);
        self.grid.min_row_height_px = at_least_one("min_row_height_px", self.grid.min_row_height_px);
        self
    }
}

/// Put a `(min, max)` pair in order
fn ordered<T: PartialOrd + Copy + fmt::Debug>(name: &str, min: T, max: T) -> (T, T) {
    if min > max {
        warn!("{}: min {:?} above max {:?}, swapping", name, min, max);
        (max, min)
    } else {
        (min, max)
    }
}

/// Raise zero to one
fn at_least_one<T: PartialOrd + From<u8> + Copy>(name: &str, value: T) -> T {
    if value < T::from(1) {
        warn!("{} must be at least 1", name);
        T::from(1)
    } else {
        value
    }
}

impl SpotPulseConfig {
    pub fn validated(mut self) -> Self {
        (self.min_active_chars, self.max_active_chars) =
            ordered("min/max_active_chars", self.min_active_chars, self.max_active_chars);
        (self.min_pause_duration, self.max_pause_duration) =
            ordered("min/max_pause_duration", self.min_pause_duration, self.max_pause_duration);
        self.min_change_count = at_least_one("min_change_count", self.min_change_count);
        self.max_change_count = at_least_one("max_change_count", self.max_change_count);
        (self.min_change_count, self.max_change_count) =
            ordered("min/max_change_count", self.min_change_count, self.max_change_count);
        self.fade_steps = at_least_one("fade_steps", self.fade_steps);
        self
    }
}

impl GlobalFuzzConfig {
    pub fn validated(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.change_rate) {
            warn!("change_rate {} outside 0..=1, clamping", self.change_rate);
            self.change_rate = if self.change_rate.is_nan() { 0.0 } else { self.change_rate.clamp(0.0, 1.0) };
        }
        self
    }
}

impl LinearScanConfig {
    pub fn validated(mut self) -> Self {
        self.tail_length = at_least_one("tail_length", self.tail_length);
        self.travel_speed = at_least_one("travel_speed", self.travel_speed);
        self
    }
}

impl RadialSpreadConfig {
    pub fn validated(mut self) -> Self {
        (self.min_pause_duration, self.max_pause_duration) =
            ordered("min/max_pause_duration", self.min_pause_duration, self.max_pause_duration);
        self.fade_steps = at_least_one("fade_steps", self.fade_steps);
        self.max_active_points = at_least_one("max_active_points", self.max_active_points);
        self
    }
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// `~/.glyphscramble`, created on demand
    pub fn config_dir() -> Option<PathBuf> {
        let dir = home_dir()?.join(".glyphscramble");
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Variant selected by the `effect` key
    pub fn variant(&self) -> Result<Variant, ConfigError> {
        self.effect.parse()
    }

    /// Validate the options of `variant` into an [`EffectConfig`]
    pub fn effect_config(&self, variant: Variant) -> EffectConfig {
        let kind = match variant {
            Variant::SpotPulse => EffectKind::SpotPulse(self.spot_pulse.clone()),
            Variant::GlobalFuzz => EffectKind::GlobalFuzz(self.global_fuzz.clone()),
            Variant::LinearScan => EffectKind::LinearScan(self.linear_scan.clone()),
            Variant::RadialSpread => EffectKind::RadialSpread(self.radial_spread.clone()),
        };
        let char_set = self
            .common
            .char_set
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        EffectConfig {
            update_interval: Duration::from_millis(self.common.update_interval),
            palette: self.common.colors.clone(),
            char_set,
            grid: self.grid,
            kind,
        }
        .validated()
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
