//! Tern Core - Renderer-agnostic scene description.
//!
//! This crate provides:
//!
//! - **Geometry storage**: `Mesh`
//! - **Scene configuration**: `SceneConfig` and the camera, mesh, light and
//!   material blocks it is made of, parsed from JSON or an already parsed
//!   `serde_json::Value` and checked by `SceneConfig::validate`
//!
//! # Example
//!
//! ```ignore
//! use tern_core::SceneConfig;
//!
//! let config = SceneConfig::from_path("cornell.json")?;
//! println!("{}: {} meshes, {} lights",
//!     config.name,
//!     config.meshes.len(),
//!     config.lights.len());
//! ```

pub mod config;
pub mod error;
pub mod mesh;

// Re-export commonly used types
pub use config::{
    AcceleratorKind, AspectFit, CameraConfig, LightConfig, MaterialConfig, MeshConfig,
    SceneConfig, TransformConfig,
};
pub use error::ConfigError;
pub use mesh::Mesh;
