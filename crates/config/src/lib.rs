//! Configuration loading and validation for LiveProof.
//!
//! Loads editor tunables from a TOML file with serde defaults for every
//! knob, so an empty file (or no file) yields the reference behavior.
//! All settings are validated before use.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure for the editor core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Gesture classification
    #[serde(default)]
    pub gesture: GestureConfig,

    /// Masked-image crop behavior
    #[serde(default)]
    pub mask: MaskConfig,

    /// Zoom bounds applied to host zoom requests
    #[serde(default)]
    pub zoom: ZoomConfig,

    /// Arrow-key nudge scaling
    #[serde(default)]
    pub nudge: NudgeConfig,

    /// Layering defaults
    #[serde(default)]
    pub layers: LayerConfig,

    /// Message channel sizing
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            mask: MaskConfig::default(),
            zoom: ZoomConfig::default(),
            nudge: NudgeConfig::default(),
            layers: LayerConfig::default(),
            channel: ChannelConfig::default(),
        }
    }
}

/// Pointer gesture classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Pointer travel (either axis, px) beyond which a click is a drag
    #[serde(default = "default_drag_threshold_px")]
    pub drag_threshold_px: f64,

    /// Press duration (ms) beyond which a click is a drag
    #[serde(default = "default_text_click_max_ms")]
    pub text_click_max_ms: u64,

    /// Smallest width/height (px) a resize gesture may produce
    #[serde(default = "default_min_element_size_px")]
    pub min_element_size_px: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: default_drag_threshold_px(),
            text_click_max_ms: default_text_click_max_ms(),
            min_element_size_px: default_min_element_size_px(),
        }
    }
}

/// Masked-image behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskConfig {
    /// Delay (ms) after a page's first interaction before mask containers
    /// accept crop toggles. Ensures the first click on a freshly activated
    /// masked image selects the image, not its container.
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
        }
    }
}

/// Zoom limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    #[serde(default = "default_zoom_min")]
    pub min: f64,

    #[serde(default = "default_zoom_max")]
    pub max: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: default_zoom_min(),
            max: default_zoom_max(),
        }
    }
}

/// Arrow-key nudge stepping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgeConfig {
    /// Unscaled step (px)
    #[serde(default = "default_nudge_step")]
    pub step_px: f64,

    /// Multiplier with the secondary modifier (shift)
    #[serde(default = "default_nudge_shift_scale")]
    pub shift_scale: f64,

    /// Multiplier with the tertiary modifier (alt)
    #[serde(default = "default_nudge_alt_scale")]
    pub alt_scale: f64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            step_px: default_nudge_step(),
            shift_scale: default_nudge_shift_scale(),
            alt_scale: default_nudge_alt_scale(),
        }
    }
}

/// Layering defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Starting value for both z-index extrema on a fresh page
    #[serde(default = "default_z_extremum")]
    pub default_z_extremum: i32,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            default_z_extremum: default_z_extremum(),
        }
    }
}

/// Message channel sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Capacity of each per-frame ordered pipe
    #[serde(default = "default_channel_capacity")]
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: default_channel_capacity(),
        }
    }
}

fn default_drag_threshold_px() -> f64 {
    5.0
}
fn default_text_click_max_ms() -> u64 {
    500
}
fn default_min_element_size_px() -> f64 {
    6.0
}
fn default_warmup_ms() -> u64 {
    1000
}
fn default_zoom_min() -> f64 {
    0.25
}
fn default_zoom_max() -> f64 {
    1.5
}
fn default_nudge_step() -> f64 {
    1.0
}
fn default_nudge_shift_scale() -> f64 {
    5.0
}
fn default_nudge_alt_scale() -> f64 {
    10.0
}
fn default_z_extremum() -> i32 {
    10
}
fn default_channel_capacity() -> usize {
    256
}

impl EditorConfig {
    /// Load from a TOML file, falling back to defaults if it is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gesture.drag_threshold_px < 0.0 {
            return Err(ConfigError::Invalid(
                "gesture.drag_threshold_px must be non-negative".into(),
            ));
        }
        if self.gesture.min_element_size_px <= 0.0 {
            return Err(ConfigError::Invalid(
                "gesture.min_element_size_px must be positive".into(),
            ));
        }
        if self.zoom.min <= 0.0 || self.zoom.max < self.zoom.min {
            return Err(ConfigError::Invalid(format!(
                "zoom bounds must satisfy 0 < min <= max (got {}..{})",
                self.zoom.min, self.zoom.max
            )));
        }
        if self.nudge.step_px <= 0.0 {
            return Err(ConfigError::Invalid(
                "nudge.step_px must be positive".into(),
            ));
        }
        if self.channel.capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel.capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = EditorConfig::default();
        assert_eq!(config.gesture.drag_threshold_px, 5.0);
        assert_eq!(config.gesture.text_click_max_ms, 500);
        assert_eq!(config.mask.warmup_ms, 1000);
        assert_eq!(config.zoom.min, 0.25);
        assert_eq!(config.zoom.max, 1.5);
        assert_eq!(config.layers.default_z_extremum, 10);
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = EditorConfig::load(Path::new("/nonexistent/liveproof.toml")).unwrap();
        assert_eq!(config.channel.capacity, 256);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gesture]\ndrag_threshold_px = 8.0").unwrap();
        let config = EditorConfig::load(file.path()).unwrap();
        assert_eq!(config.gesture.drag_threshold_px, 8.0);
        assert_eq!(config.gesture.text_click_max_ms, 500);
    }

    #[test]
    fn invalid_zoom_bounds_rejected() {
        let mut config = EditorConfig::default();
        config.zoom.max = 0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_toml_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[zoom]\nmin = \"wide\"").unwrap();
        assert!(EditorConfig::load(file.path()).is_err());
    }
}
