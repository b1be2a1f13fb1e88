//! Runtime configuration.
//!
//! Every tunable the scene and camera use lives here with a compiled-in
//! default. A TOML file may override any subset of fields; sections left out
//! keep their defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::orbit::SpeedMultiplier;
use crate::texture::TextureSpec;

const SECTIONS: [&str; 4] = ["camera", "simulation", "textures", "scene"];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_distance: f64,
    pub max_distance: f64,
    /// Distance the camera starts at and falls back to after a numeric fault.
    pub default_distance: f64,
    pub fov_deg: f64,
    /// Polar angle is kept inside `[epsilon, π - epsilon]`.
    pub polar_epsilon: f64,
    /// Radians per dragged pixel.
    pub rotate_sensitivity: f64,
    pub zoom_speed: f64,
    pub max_zoom_speed: f64,
    /// Fraction of the remaining fly-to distance covered per frame. The
    /// look-at point eases at the same rate.
    pub fly_damping: f64,
    pub arrive_epsilon: f64,
    /// Fly-to stand-off, in multiples of the selected body's radius.
    pub focus_factor: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_distance: 10.0,
            max_distance: 250.0,
            default_distance: 140.0,
            fov_deg: 45.0,
            polar_epsilon: 0.05,
            rotate_sensitivity: 0.005,
            zoom_speed: 0.0015,
            max_zoom_speed: 0.004,
            fly_damping: 0.03,
            arrive_epsilon: 0.01,
            focus_factor: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub dt_scale: f64,
    pub cloud_speed: f64,
    /// One of the discrete playback speeds.
    pub speed: f64,
    pub paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { dt_scale: 1.0, cloud_speed: 0.024, speed: 1.0, paused: false }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
}

impl Default for TextureConfig {
    fn default() -> Self {
        let spec = TextureSpec::default();
        Self { width: spec.width, height: spec.height, seed: spec.seed }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub star_count: usize,
    pub star_radius: f64,
    pub asteroid_count: usize,
    pub belt_inner: f64,
    pub belt_outer: f64,
    pub belt_jitter: f64,
    pub orbit_segments: usize,
    pub ring_segments: usize,
    pub show_orbits: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            star_count: 6000,
            star_radius: 600.0,
            asteroid_count: 1500,
            belt_inner: 42.0,
            belt_outer: 48.0,
            belt_jitter: 0.6,
            orbit_segments: 128,
            ring_segments: 128,
            show_orbits: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub camera: CameraConfig,
    pub simulation: SimulationConfig,
    pub textures: TextureConfig,
    pub scene: SceneConfig,
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSetting { key, reason: reason.into() }
}

impl VizConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| ConfigurationError::Parse(e.to_string()))?;
        for key in table.keys().filter(|k| !SECTIONS.contains(&k.as_str())) {
            tracing::warn!(section = %key, "ignoring unknown config section");
        }
        let config: VizConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn texture_spec(&self) -> Result<TextureSpec, ConfigurationError> {
        TextureSpec::new(self.textures.width, self.textures.height, self.textures.seed)
    }

    pub fn speed(&self) -> Result<SpeedMultiplier, ConfigurationError> {
        SpeedMultiplier::from_factor(self.simulation.speed).ok_or_else(|| {
            invalid("simulation.speed", format!("{} is not one of 0.25, 0.5, 1, 2, 5, 10", self.simulation.speed))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let c = &self.camera;
        let positive = |key: &'static str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(invalid(key, format!("must be finite and positive, got {v}")))
            }
        };
        positive("camera.min_distance", c.min_distance)?;
        positive("camera.max_distance", c.max_distance)?;
        if c.min_distance >= c.max_distance {
            return Err(invalid("camera.max_distance", "must exceed camera.min_distance"));
        }
        if !(c.min_distance..=c.max_distance).contains(&c.default_distance) {
            return Err(invalid("camera.default_distance", "must lie within the zoom range"));
        }
        if !(c.fov_deg > 1.0 && c.fov_deg < 179.0) {
            return Err(invalid("camera.fov_deg", format!("{} is outside (1, 179)", c.fov_deg)));
        }
        if !(c.polar_epsilon > 0.0 && c.polar_epsilon < std::f64::consts::FRAC_PI_4) {
            return Err(invalid("camera.polar_epsilon", "must lie in (0, π/4)"));
        }
        positive("camera.rotate_sensitivity", c.rotate_sensitivity)?;
        positive("camera.zoom_speed", c.zoom_speed)?;
        positive("camera.max_zoom_speed", c.max_zoom_speed)?;
        if !(c.fly_damping > 0.0 && c.fly_damping <= 1.0) {
            return Err(invalid("camera.fly_damping", format!("{} is outside (0, 1]", c.fly_damping)));
        }
        positive("camera.arrive_epsilon", c.arrive_epsilon)?;
        positive("camera.focus_factor", c.focus_factor)?;

        positive("simulation.dt_scale", self.simulation.dt_scale)?;
        if !self.simulation.cloud_speed.is_finite() {
            return Err(invalid("simulation.cloud_speed", "must be finite"));
        }
        self.speed()?;

        self.texture_spec()?;

        let s = &self.scene;
        positive("scene.star_radius", s.star_radius)?;
        if s.star_radius <= c.max_distance {
            return Err(invalid("scene.star_radius", "must lie beyond camera.max_distance"));
        }
        positive("scene.belt_inner", s.belt_inner)?;
        if !(s.belt_outer.is_finite() && s.belt_outer > s.belt_inner) {
            return Err(invalid("scene.belt_outer", "must exceed scene.belt_inner"));
        }
        if !(s.belt_jitter.is_finite() && s.belt_jitter >= 0.0) {
            return Err(invalid("scene.belt_jitter", "must be finite and non-negative"));
        }
        if s.orbit_segments < 8 {
            return Err(invalid("scene.orbit_segments", "need at least 8 segments"));
        }
        if s.ring_segments < 8 {
            return Err(invalid("scene.ring_segments", "need at least 8 segments"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        VizConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = VizConfig::from_toml_str(
            "[camera]\nmin_distance = 20.0\n\n[textures]\nseed = 99\n",
        )
        .unwrap();
        assert_eq!(config.camera.min_distance, 20.0);
        assert_eq!(config.camera.max_distance, 250.0);
        assert_eq!(config.textures.seed, 99);
        assert_eq!(config.scene, SceneConfig::default());
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let config = VizConfig::from_toml_str("[portal]\nurl = \"x\"\n").unwrap();
        assert_eq!(config, VizConfig::default());
    }

    #[test]
    fn inverted_zoom_range_is_rejected() {
        let err = VizConfig::from_toml_str("[camera]\nmin_distance = 300.0\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSetting { key: "camera.max_distance", .. }));
    }

    #[test]
    fn off_step_speed_is_rejected() {
        let err = VizConfig::from_toml_str("[simulation]\nspeed = 3.0\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSetting { key: "simulation.speed", .. }));
    }

    #[test]
    fn small_textures_are_rejected() {
        let err = VizConfig::from_toml_str("[textures]\nwidth = 256\nheight = 128\n").unwrap_err();
        assert_eq!(err, ConfigurationError::ResolutionTooSmall { width: 256, height: 128 });
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            VizConfig::from_toml_str("[camera\n"),
            Err(ConfigurationError::Parse(_))
        ));
    }
}
