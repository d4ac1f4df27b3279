//! Errors raised while reading and checking a scene description.

use thiserror::Error;

/// Errors that can occur while loading a scene configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid camera: {0}")]
    InvalidCamera(String),

    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Mesh '{mesh}': index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("Mesh '{mesh}': {message}")]
    InvalidMesh { mesh: String, message: String },

    #[error("Mesh '{mesh}' references unknown material '{material}'")]
    UnknownMaterial { mesh: String, material: String },

    #[error("Invalid light: {0}")]
    InvalidLight(String),

    #[error("Scene contains {0} sky lights, at most one is allowed")]
    MultipleSkyLights(usize),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
