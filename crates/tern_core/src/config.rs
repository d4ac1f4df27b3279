//! Scene configuration.
//!
//! A scene is described by plain structs deserialized with serde. Every field
//! is named and most have defaults, so a minimal document only needs the
//! geometry. `SceneConfig::validate` runs once after parsing and rejects
//! values the renderer cannot work with.

use std::path::Path;

use glam::{EulerRot, Quat, Vec3};
use serde::Deserialize;
use tern_math::Transform;

use crate::error::{ConfigError, ConfigResult};

/// Which field of view is preserved when a physical sensor size is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectFit {
    /// Horizontal when the image is wider than tall, vertical otherwise.
    #[default]
    Auto,
    Horizontal,
    Vertical,
}

/// Spatial index built over the scene's primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorKind {
    #[default]
    Bvh,
    /// Brute force over every primitive.
    None,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Full field of view in degrees, vertical unless a sensor size says otherwise.
    pub fov_degrees: f32,
    /// Thin lens radius in world units. Zero gives a pinhole camera.
    pub lens_radius: f32,
    /// Physical sensor width and height. Enables `aspect_fit`.
    pub sensor_size: Option<[f32; 2]>,
    pub aspect_fit: AspectFit,
    /// Pixel width and height ratio, `[1, 1]` for square pixels.
    pub pixel_aspect: [f32; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 45.0,
            lens_radius: 0.0,
            sensor_size: None,
            aspect_fit: AspectFit::Auto,
            pixel_aspect: [1.0, 1.0],
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::InvalidCamera(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov_degrees
            )));
        }
        if !(self.lens_radius >= 0.0) {
            return Err(ConfigError::InvalidCamera(format!(
                "lens radius must be non-negative, got {}",
                self.lens_radius
            )));
        }

        let view = self.target - self.eye;
        if view.length_squared() == 0.0 {
            return Err(ConfigError::InvalidCamera(
                "eye and target are the same point".to_string(),
            ));
        }
        if view.normalize().cross(self.up).length_squared() < 1e-12 {
            return Err(ConfigError::InvalidCamera(
                "up vector is parallel to the view direction".to_string(),
            ));
        }

        if let Some([w, h]) = self.sensor_size {
            if !(w > 0.0 && h > 0.0) {
                return Err(ConfigError::InvalidCamera(format!(
                    "sensor size must be positive, got {}x{}",
                    w, h
                )));
            }
        }
        let [pw, ph] = self.pixel_aspect;
        if !(pw > 0.0 && ph > 0.0) {
            return Err(ConfigError::InvalidCamera(format!(
                "pixel aspect must be positive, got {}:{}",
                pw, ph
            )));
        }

        Ok(())
    }
}

/// Placement of a mesh: scale, then XYZ euler rotation, then translation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub translation: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl TransformConfig {
    pub fn to_transform(&self) -> Transform {
        let r = self.rotation_degrees;
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            r.x.to_radians(),
            r.y.to_radians(),
            r.z.to_radians(),
        );
        Transform::from_trs(self.translation, rotation, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeshConfig {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    #[serde(default)]
    pub normals: Option<Vec<Vec3>>,
    /// Name of an entry in `SceneConfig::materials`.
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub transform: TransformConfig,
}

/// Diffuse material.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaterialConfig {
    pub name: String,
    #[serde(default = "default_base_color")]
    pub base_color: Vec3,
}

fn default_base_color() -> Vec3 {
    Vec3::splat(0.8)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LightConfig {
    Point {
        position: Vec3,
        intensity: Vec3,
    },
    Spot {
        position: Vec3,
        target: Vec3,
        intensity: Vec3,
        /// Half angle of the full cone.
        #[serde(default = "default_cone_degrees")]
        cone_degrees: f32,
        /// Half angle where the falloff towards the cone edge starts.
        #[serde(default = "default_falloff_degrees")]
        falloff_degrees: f32,
    },
    Distant {
        /// Direction the light travels in.
        direction: Vec3,
        radiance: Vec3,
    },
    Sky {
        radiance: Vec3,
    },
}

fn default_cone_degrees() -> f32 {
    30.0
}

fn default_falloff_degrees() -> f32 {
    25.0
}

impl LightConfig {
    pub fn is_sky(&self) -> bool {
        matches!(self, LightConfig::Sky { .. })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let emission = match self {
            LightConfig::Point { intensity, .. } => *intensity,
            LightConfig::Spot {
                position,
                target,
                intensity,
                cone_degrees,
                falloff_degrees,
            } => {
                if (*target - *position).length_squared() == 0.0 {
                    return Err(ConfigError::InvalidLight(
                        "spot light position and target are the same point".to_string(),
                    ));
                }
                if !(*cone_degrees > 0.0 && *cone_degrees <= 90.0) {
                    return Err(ConfigError::InvalidLight(format!(
                        "spot cone must be in (0, 90] degrees, got {}",
                        cone_degrees
                    )));
                }
                if !(*falloff_degrees >= 0.0 && falloff_degrees <= cone_degrees) {
                    return Err(ConfigError::InvalidLight(format!(
                        "spot falloff {} must be between 0 and the cone angle {}",
                        falloff_degrees, cone_degrees
                    )));
                }
                *intensity
            }
            LightConfig::Distant {
                direction,
                radiance,
            } => {
                if direction.length_squared() == 0.0 {
                    return Err(ConfigError::InvalidLight(
                        "distant light direction is zero".to_string(),
                    ));
                }
                *radiance
            }
            LightConfig::Sky { radiance } => *radiance,
        };

        if emission.min_element() < 0.0 || !emission.is_finite() {
            return Err(ConfigError::InvalidLight(format!(
                "emission must be finite and non-negative, got {}",
                emission
            )));
        }
        Ok(())
    }
}

fn default_resolution() -> [u32; 2] {
    [640, 480]
}

fn default_scene_name() -> String {
    "untitled".to_string()
}

/// Complete description of a renderable scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_scene_name")]
    pub name: String,
    #[serde(default)]
    pub accelerator: AcceleratorKind,
    #[serde(default = "default_resolution")]
    pub resolution: [u32; 2],
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub materials: Vec<MaterialConfig>,
    #[serde(default)]
    pub meshes: Vec<MeshConfig>,
    #[serde(default)]
    pub lights: Vec<LightConfig>,
}

impl SceneConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from an already parsed property tree.
    pub fn from_value(value: serde_json::Value) -> ConfigResult<Self> {
        let config: SceneConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON scene file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        if config.name == default_scene_name() {
            if let Some(stem) = path.file_stem() {
                config.name = stem.to_string_lossy().into_owned();
            }
        }
        log::info!("Loaded scene description '{}' from {}", config.name, path.display());
        Ok(config)
    }

    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let [width, height] = self.resolution;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidResolution { width, height });
        }

        self.camera.validate()?;

        for mesh in &self.meshes {
            if mesh.indices.len() % 3 != 0 {
                return Err(ConfigError::InvalidMesh {
                    mesh: mesh.name.clone(),
                    message: format!("index count {} is not a multiple of 3", mesh.indices.len()),
                });
            }
            if let Some(&index) = mesh
                .indices
                .iter()
                .find(|&&i| i as usize >= mesh.positions.len())
            {
                return Err(ConfigError::IndexOutOfRange {
                    mesh: mesh.name.clone(),
                    index,
                    vertex_count: mesh.positions.len(),
                });
            }
            if let Some(material) = &mesh.material {
                if self.material_index(material).is_none() {
                    return Err(ConfigError::UnknownMaterial {
                        mesh: mesh.name.clone(),
                        material: material.clone(),
                    });
                }
            }
        }

        for light in &self.lights {
            light.validate()?;
        }
        let skies = self.lights.iter().filter(|l| l.is_sky()).count();
        if skies > 1 {
            return Err(ConfigError::MultipleSkyLights(skies));
        }

        Ok(())
    }
}
