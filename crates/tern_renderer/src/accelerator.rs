//! Spatial index contract over the scene's primitive buffer.

use tern_core::AcceleratorKind;
use tern_math::{Aabb, Ray};

use crate::{Bvh, Intersection, Primitive};

/// Nearest-hit oracle over a primitive buffer.
///
/// The accelerator stores indices into the buffer it was built over. Queries
/// must pass that same buffer back in.
pub trait Accelerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Build over `primitives`. Calling again discards the previous build.
    fn build(&mut self, primitives: &[Primitive]);

    /// Nearest hit within the ray's `[t_min, t_max]`, filling `rec`.
    fn intersect(&self, primitives: &[Primitive], ray: &Ray, rec: &mut Intersection) -> bool;

    /// True if anything is hit within the ray's range.
    fn intersect_p(&self, primitives: &[Primitive], ray: &Ray) -> bool;

    fn bounding_box(&self) -> Aabb;
}

/// Accelerator for `kind`, `None` for brute force.
pub fn create_accelerator(kind: AcceleratorKind) -> Option<Box<dyn Accelerator>> {
    match kind {
        AcceleratorKind::Bvh => Some(Box::new(Bvh::new())),
        AcceleratorKind::None => None,
    }
}

/// Test every primitive, keeping the closest hit.
pub fn brute_force_intersect(primitives: &[Primitive], ray: &Ray, rec: &mut Intersection) -> bool {
    let mut ray_t = ray.interval();
    let mut hit_anything = false;

    for (index, prim) in primitives.iter().enumerate() {
        if prim.intersect(ray, ray_t, rec) {
            hit_anything = true;
            rec.primitive = Some(index);
            // Only accept closer hits from here on
            ray_t = ray_t.with_max(rec.t);
        }
    }

    hit_anything
}

pub fn brute_force_intersect_p(primitives: &[Primitive], ray: &Ray) -> bool {
    let ray_t = ray.interval();
    primitives.iter().any(|prim| prim.intersect_p(ray, ray_t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_math::Vec3;

    fn wall(z: f32) -> Primitive {
        Primitive::new(
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec3::new(0.0, 1.0, z),
        )
    }

    #[test]
    fn test_brute_force_keeps_nearest() {
        let prims = vec![wall(-5.0), wall(-2.0), wall(-8.0)];
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let mut rec = Intersection::default();

        assert!(brute_force_intersect(&prims, &ray, &mut rec));
        assert_eq!(rec.primitive, Some(1));
        assert!((rec.t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_brute_force_honours_ray_range() {
        let prims = vec![wall(-5.0), wall(-2.0)];
        let ray = Ray::with_range(Vec3::ZERO, -Vec3::Z, 3.0, 10.0);
        let mut rec = Intersection::default();

        assert!(brute_force_intersect(&prims, &ray, &mut rec));
        assert_eq!(rec.primitive, Some(0));
        assert!(!brute_force_intersect_p(&prims, &Ray::with_range(Vec3::ZERO, -Vec3::Z, 0.0, 1.0)));
    }

    #[test]
    fn test_create_accelerator() {
        assert_eq!(create_accelerator(AcceleratorKind::Bvh).map(|a| a.name()), Some("bvh"));
        assert!(create_accelerator(AcceleratorKind::None).is_none());
    }
}
