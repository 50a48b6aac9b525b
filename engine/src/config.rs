//! Engine configuration (marionette.toml)
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::asset::Placement;
use crate::error::ConfigError;
use crate::skin::JointMatrixFormula;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Buffer resolution settings
    #[serde(default)]
    pub import: ImportConfig,
    /// Clock and skinning settings
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Initial placement of every loaded asset
    #[serde(default)]
    pub placement: PlacementConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ImportConfig {
    /// Directory external buffer URIs resolve against (default: the
    /// document's directory)
    #[serde(default)]
    pub resource_root: Option<PathBuf>,
    /// Allow absolute buffer paths and `..` components (default: false)
    #[serde(default)]
    pub allow_external_paths: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Joint matrix composition (default: world)
    #[serde(default)]
    pub joint_matrix_formula: JointMatrixFormula,
    /// Multiplier applied to frame deltas (default: 1.0)
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
    /// Start animating as soon as the asset is ready (default: true)
    #[serde(default = "default_true")]
    pub autoplay: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    #[serde(default)]
    pub location: [f32; 3],
    /// Rotation axis (default: +Y)
    #[serde(default = "default_axis")]
    pub axis: [f32; 3],
    #[serde(default)]
    pub angle_degrees: f32,
    /// Uniform scale (default: 1.0)
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_time_scale() -> f32 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_axis() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}
fn default_scale() -> f32 {
    1.0
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            joint_matrix_formula: JointMatrixFormula::default(),
            time_scale: default_time_scale(),
            autoplay: default_true(),
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            axis: default_axis(),
            angle_degrees: 0.0,
            scale: default_scale(),
        }
    }
}

impl From<&PlacementConfig> for Placement {
    fn from(config: &PlacementConfig) -> Self {
        Placement {
            location: Vec3::from_array(config.location),
            axis: Vec3::from_array(config.axis),
            angle_degrees: config.angle_degrees,
            scale: config.scale,
        }
    }
}

impl Config {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
