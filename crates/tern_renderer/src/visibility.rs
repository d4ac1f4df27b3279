//! Deferred occlusion queries between two points.

use tern_math::{Ray, Vec3};

use crate::Scene;

/// Offset applied at both ends of a shadow ray so it cannot hit the surfaces
/// it connects.
pub const SHADOW_EPSILON: f32 = 1e-3;

/// A segment that is unoccluded when nothing in the scene crosses it.
///
/// Produced by light sampling and by the camera's world to screen mapping.
/// Testing is left to the caller so the cost is only paid when the
/// contribution is non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    pub ray: Ray,
}

impl Visibility {
    pub fn new(ray: Ray) -> Self {
        Self { ray }
    }

    /// Segment from `from` to `to`, shortened by [`SHADOW_EPSILON`] at each end.
    pub fn between(from: Vec3, to: Vec3) -> Self {
        let delta = to - from;
        let length = delta.length();
        if length <= 2.0 * SHADOW_EPSILON {
            // Nothing can fit between the two points
            return Self::new(Ray::with_range(from, Vec3::Z, 0.0, 0.0));
        }
        Self::new(Ray::with_range(
            from,
            delta / length,
            SHADOW_EPSILON,
            length - SHADOW_EPSILON,
        ))
    }

    /// Unbounded segment leaving `from` along `direction`, for lights at infinity.
    pub fn toward(from: Vec3, direction: Vec3) -> Self {
        Self::new(Ray::with_range(
            from,
            direction.normalize(),
            SHADOW_EPSILON,
            f32::INFINITY,
        ))
    }

    pub fn is_unoccluded(&self, scene: &Scene) -> bool {
        if self.ray.t_max <= self.ray.t_min {
            return true;
        }
        !scene.intersect_p(&self.ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_is_clipped_at_both_ends() {
        let vis = Visibility::between(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0));

        assert_eq!(vis.ray.direction, Vec3::Z);
        assert!((vis.ray.t_min - SHADOW_EPSILON).abs() < 1e-7);
        assert!((vis.ray.t_max - (2.0 - SHADOW_EPSILON)).abs() < 1e-6);
    }

    #[test]
    fn test_toward_is_unbounded() {
        let vis = Visibility::toward(Vec3::ONE, Vec3::new(0.0, 3.0, 0.0));

        assert_eq!(vis.ray.direction, Vec3::Y);
        assert_eq!(vis.ray.t_max, f32::INFINITY);
    }

    #[test]
    fn test_coincident_points_are_always_visible() {
        let vis = Visibility::between(Vec3::ONE, Vec3::ONE);
        assert!(vis.is_unoccluded(&Scene::new()));
    }
}
