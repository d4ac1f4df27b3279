use tern_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while assembling a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mesh '{mesh}' references unknown material '{material}'")]
    MissingMaterial { mesh: String, material: String },
}
