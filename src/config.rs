use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::{Palette, Rgb};
use crate::error::{Result, SunburstError};

/// Chart constants. Every field has a default so a config file only needs
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Side of the square logical viewport
    pub width: f64,
    /// Radius of the center disk
    pub center_radius: f64,
    /// Number of rings shown below the focus
    pub visible_depth: usize,
    /// Arcs narrower than this (degrees) are squashed
    pub angle_threshold_deg: f64,
    /// Gap between neighbouring arcs (radians, at the center radius)
    pub pad_angle: f64,
    pub transition_ms: u64,
    pub squash_fade_ms: u64,
    /// Replay a (no-op) transition when the center is clicked at the root
    pub replay_root_zoom_out: bool,
    pub palette: Vec<String>,
    pub leaf_color: String,
    pub squash_color: String,
    pub squash_label: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 500.0,
            center_radius: 65.0,
            visible_depth: 5,
            angle_threshold_deg: 2.0,
            pad_angle: 0.01,
            transition_ms: 750,
            squash_fade_ms: 250,
            replay_root_zoom_out: false,
            palette: [
                "#FF0000", "#FF8000", "#FFFF00", "#80FF00", "#00FF00", "#00FF80",
                "#00FFFF", "#0080FF", "#0000FF", "#8000FF", "#FF00FF", "#FF0080",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            leaf_color: "#C6C6C6".to_string(),
            squash_color: "#5F5F5F".to_string(),
            squash_label: "Small items".to_string(),
        }
    }
}

impl ChartConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SunburstError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.visible_depth == 0 {
            return Err(SunburstError::InvalidConfig("visible_depth must be at least 1".into()));
        }
        if !(self.center_radius > 0.0) || self.width <= self.center_radius * 2.0 {
            return Err(SunburstError::InvalidConfig(format!(
                "width {} leaves no room for rings around a center radius of {}",
                self.width, self.center_radius
            )));
        }
        if !(self.angle_threshold_deg >= 0.0) || !(self.pad_angle >= 0.0) {
            return Err(SunburstError::InvalidConfig(
                "angle_threshold_deg and pad_angle must be non-negative".into(),
            ));
        }
        self.palette()?;
        Ok(())
    }

    pub fn angle_threshold(&self) -> f64 {
        self.angle_threshold_deg.to_radians()
    }

    /// Radial thickness of one ring.
    pub fn arc_height(&self) -> f64 {
        (self.width - self.center_radius * 2.0) / (self.visible_depth as f64 * 2.0)
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn squash_fade_duration(&self) -> Duration {
        Duration::from_millis(self.squash_fade_ms)
    }

    pub fn palette(&self) -> Result<Palette> {
        let wheel = self
            .palette
            .iter()
            .map(|hex| Rgb::from_hex(hex))
            .collect::<Result<Vec<_>>>()?;
        Ok(Palette::new(
            wheel,
            Rgb::from_hex(&self.leaf_color)?,
            Rgb::from_hex(&self.squash_color)?,
            self.visible_depth,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ChartConfig::default();
        config.validate().unwrap();
        assert_eq!(config.arc_height(), 37.0);
        assert!((config.angle_threshold() - 2.0_f64.to_radians()).abs() < 1e-12);
        assert_eq!(config.transition_duration(), Duration::from_millis(750));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ChartConfig =
            serde_json::from_str(r#"{"visible_depth": 3, "replay_root_zoom_out": true}"#).unwrap();
        assert_eq!(config.visible_depth, 3);
        assert!(config.replay_root_zoom_out);
        assert_eq!(config.width, 500.0);
        assert_eq!(config.palette.len(), 12);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ChartConfig {
            visible_depth: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SunburstError::InvalidConfig(_))));

        config.visible_depth = 5;
        config.width = 100.0;
        assert!(config.validate().is_err());

        config.width = 500.0;
        config.leaf_color = "grey".into();
        assert!(matches!(config.validate(), Err(SunburstError::InvalidColor(_))));
    }
}
