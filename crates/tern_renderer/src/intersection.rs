//! Surface hit record.

use tern_math::{Ray, Vec3};

use crate::visibility::SHADOW_EPSILON;

/// Record of the nearest ray-surface intersection found so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub point: Vec3,
    /// Geometric normal, always facing against the ray
    pub normal: Vec3,
    /// Interpolated vertex normal on the same side as `normal`
    pub shading_normal: Vec3,
    /// Barycentric coordinates of the hit inside its triangle
    pub u: f32,
    pub v: f32,
    /// Whether the ray hit the side the geometric normal points to
    pub front_face: bool,
    /// Index into the scene's primitive buffer
    pub primitive: Option<usize>,
    /// Index into the scene's material table
    pub material: Option<usize>,
}

impl Default for Intersection {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            shading_normal: Vec3::ZERO,
            u: 0.0,
            v: 0.0,
            front_face: false,
            primitive: None,
            material: None,
        }
    }
}

impl Intersection {
    /// Set the face normal based on ray direction and outward normal.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    pub fn is_hit(&self) -> bool {
        self.primitive.is_some()
    }

    /// Ray leaving the surface along `direction`, offset to avoid self hits.
    pub fn spawn_ray(&self, direction: Vec3) -> Ray {
        Ray::with_range(self.point, direction, SHADOW_EPSILON, f32::INFINITY)
    }
}
