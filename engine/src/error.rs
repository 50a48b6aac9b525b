//! Error types
//!
//! Import failures abort the import for one asset. Frame failures stop that
//! asset's animation but leave propagation and rendering running.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for import operations
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Errors raised while turning a glTF document into an asset.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Malformed base64, JSON or GLB container
    #[error("decode error: {0}")]
    Decode(String),

    /// A referenced resource could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Byte range beyond a buffer, or an index beyond a document array
    #[error("range error: {0}")]
    Range(String),

    /// Required field absent or unsupported construct
    #[error("schema error: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Decode(format!("invalid glTF JSON: {err}"))
    }
}

/// Errors raised while sampling animation channels for one frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error(
        "animation {animation} channel {channel} uses sampler {sampler}, but only {available} samplers exist"
    )]
    MissingSampler {
        animation: usize,
        channel: usize,
        sampler: usize,
        available: usize,
    },

    #[error(
        "animation {animation} sampler {sampler} has {len} output values, keyframe {keyframe} needs {needed}"
    )]
    OutputTooShort {
        animation: usize,
        sampler: usize,
        keyframe: usize,
        len: usize,
        needed: usize,
    },
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
