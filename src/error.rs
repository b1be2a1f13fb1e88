//! Error taxonomy for scene construction.
//!
//! Runtime numeric faults are not represented here: the camera recovers
//! them locally and only logs.

use crate::celestial::CelestialBody;
use crate::generators::TextureKey;

/// An unknown or malformed piece of authored configuration. Fatal at build time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown texture key `{0}`")]
    UnknownTextureKey(String),
    #[error("{body:?}: field `{field}` must be finite and positive, got {value}")]
    InvalidField {
        body: CelestialBody,
        field: &'static str,
        value: f64,
    },
    #[error("{body:?}: ring inner radius {inner} must be smaller than outer radius {outer}")]
    InvalidRing {
        body: CelestialBody,
        inner: f32,
        outer: f32,
    },
    #[error("{body:?}: descriptor has an empty name")]
    MissingName { body: CelestialBody },
    #[error("texture resolution {width}x{height} is below the 512x256 minimum")]
    ResolutionTooSmall { width: u32, height: u32 },
    #[error("texture resolution {width}x{height} exceeds the 8192x4096 maximum")]
    ResolutionTooLarge { width: u32, height: u32 },
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// The rendering surface could not provide a resource the scene needs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneInitError {
    #[error("no generated texture for `{0}`")]
    MissingTexture(TextureKey),
    #[error("GPU allocation failed for {what}: {reason}")]
    Gpu { what: &'static str, reason: String },
    #[error("shader build failed: {0}")]
    Shader(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    SceneInit(#[from] SceneInitError),
}
