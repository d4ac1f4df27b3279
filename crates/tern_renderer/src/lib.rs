//! Tern Renderer - camera, scene intersection and light sampling.
//!
//! The pieces an integrator needs to turn pixel samples into radiance
//! estimates:
//!
//! - **Camera**: pixel sample to world ray, world point to pixel, thin lens
//! - **Scene**: owns primitives, lights and materials, answers nearest-hit
//!   and occlusion queries, picks lights by emitted power
//! - **Accelerator**: BVH over the primitive buffer, or brute force
//! - **Light** and **Bxdf**: sampling contracts used while shading
//!
//! # Example
//!
//! ```ignore
//! use tern_core::SceneConfig;
//! use tern_renderer::{Camera, PixelSample, Resolution, Scene, Intersection};
//!
//! let config = SceneConfig::from_path("scene.json")?;
//! let mut scene = Scene::new();
//! scene.load_scene(&config)?;
//! scene.preprocess();
//!
//! let mut camera = Camera::from_config(&config.camera);
//! camera.preprocess(&Resolution::new(config.resolution[0], config.resolution[1]));
//!
//! let ray = camera.generate_ray(0, 10, 20, &PixelSample::center());
//! let mut rec = Intersection::default();
//! if scene.get_intersect(&ray, &mut rec) {
//!     let (light, pdf) = scene.sample_light(0.5).expect("scene has lights");
//! }
//! ```

pub mod accelerator;
mod bsdf;
mod bvh;
mod camera;
mod error;
pub mod light;
mod intersection;
mod primitive;
mod scene;
mod sensor;
mod spectrum;
mod visibility;

pub use accelerator::{create_accelerator, Accelerator};
pub use bsdf::{Bxdf, BxdfSample, Lambert, Material, ShadingFrame};
pub use bvh::Bvh;
pub use camera::{Camera, PixelSample, ScreenCoord};
pub use error::SceneError;
pub use intersection::Intersection;
pub use light::{DistantLight, Light, LightSample, PointLight, SkyLight, SpotLight};
pub use primitive::Primitive;
pub use scene::Scene;
pub use sensor::{ImageSensor, Resolution};
pub use spectrum::{Spectrum, SpectrumExt};
pub use visibility::{Visibility, SHADOW_EPSILON};

/// Re-export common math types from tern_math
pub use tern_math::{Aabb, Distribution1D, Interval, Ray, Transform, Vec2, Vec3};
