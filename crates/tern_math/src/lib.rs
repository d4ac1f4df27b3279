// Re-export glam for convenience
pub use glam::*;

// Tern math types
mod aabb;
mod distribution;
mod interval;
mod ray;
pub mod sampling;
mod transform;

pub use aabb::Aabb;
pub use distribution::Distribution1D;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Transform;

/// Tolerance used when comparing transformed quantities.
pub const EPSILON: f32 = 1e-4;
