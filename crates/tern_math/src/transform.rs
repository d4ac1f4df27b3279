// Projective transforms with an explicit inverse.
//
// glam::Mat4 does the arithmetic; Transform pairs each matrix with its
// inverse so that inverting is a swap and normals can use the
// inverse-transpose without recomputing anything.

use std::ops::Mul;

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::{Aabb, Ray};

/// Near and far planes used by [`Transform::perspective`].
const PERSPECTIVE_NEAR: f32 = 1e-2;
const PERSPECTIVE_FAR: f32 = 1e3;

/// An immutable 4x4 transform and its inverse.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Mat4,
    inverse: Mat4,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
    };

    /// Wrap a matrix, computing its inverse.
    pub fn new(matrix: Mat4) -> Self {
        Self {
            matrix,
            inverse: matrix.inverse(),
        }
    }

    /// Wrap a matrix whose inverse is already known.
    pub fn from_pair(matrix: Mat4, inverse: Mat4) -> Self {
        Self { matrix, inverse }
    }

    pub fn translate(offset: Vec3) -> Self {
        Self::from_pair(
            Mat4::from_translation(offset),
            Mat4::from_translation(-offset),
        )
    }

    pub fn scale(factors: Vec3) -> Self {
        Self::from_pair(Mat4::from_scale(factors), Mat4::from_scale(factors.recip()))
    }

    pub fn rotate_x(radians: f32) -> Self {
        Self::from_pair(Mat4::from_rotation_x(radians), Mat4::from_rotation_x(-radians))
    }

    pub fn rotate_y(radians: f32) -> Self {
        Self::from_pair(Mat4::from_rotation_y(radians), Mat4::from_rotation_y(-radians))
    }

    pub fn rotate_z(radians: f32) -> Self {
        Self::from_pair(Mat4::from_rotation_z(radians), Mat4::from_rotation_z(-radians))
    }

    /// Scale, then rotate, then translate.
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self::new(Mat4::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ))
    }

    /// Camera space to clip space.
    ///
    /// Camera space looks down +z. A camera point `(x, y, z)` lands at
    /// `(x_scale * x / z, y_scale * y / z)` in clip space, depth is remapped so
    /// the near plane maps to 0 and the far plane to 1.
    pub fn perspective(x_scale: f32, y_scale: f32) -> Self {
        let (n, f) = (PERSPECTIVE_NEAR, PERSPECTIVE_FAR);
        let matrix = Mat4::from_cols(
            Vec4::new(x_scale, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y_scale, 0.0, 0.0),
            Vec4::new(0.0, 0.0, f / (f - n), 1.0),
            Vec4::new(0.0, 0.0, -f * n / (f - n), 0.0),
        );
        Self::new(matrix)
    }

    /// World space to camera space for an eye looking along `forward`.
    ///
    /// In camera space the eye sits at the origin, +z is `forward`, +y is the
    /// component of `up` orthogonal to it and +x points to the right of the
    /// view. `forward` must be unit length and not parallel to `up`.
    pub fn view_look_at(eye: Vec3, forward: Vec3, up: Vec3) -> Self {
        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward);
        let camera_to_world = Mat4::from_cols(
            right.extend(0.0),
            new_up.extend(0.0),
            forward.extend(0.0),
            eye.extend(1.0),
        );
        Self::from_pair(camera_to_world.inverse(), camera_to_world)
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn inverse_matrix(&self) -> Mat4 {
        self.inverse
    }

    /// The inverse transform. Swaps the stored pair.
    pub fn inverse(&self) -> Transform {
        Transform::from_pair(self.inverse, self.matrix)
    }

    /// Transform a point, dividing by the homogeneous coordinate.
    pub fn point(&self, p: Vec3) -> Vec3 {
        self.matrix.project_point3(p)
    }

    /// Transform a direction. Translation is ignored.
    pub fn vector(&self, v: Vec3) -> Vec3 {
        self.matrix.transform_vector3(v)
    }

    /// Transform a surface normal by the inverse-transpose. The result is not
    /// renormalized.
    pub fn normal(&self, n: Vec3) -> Vec3 {
        self.inverse.transpose().transform_vector3(n)
    }

    /// Transform a ray: origin as a point, direction as a vector. The
    /// parametric range and pdf are carried over unchanged.
    pub fn ray(&self, r: &Ray) -> Ray {
        Ray {
            origin: self.point(r.origin),
            direction: self.vector(r.direction),
            ..*r
        }
    }

    /// Bounding box of the eight transformed corners.
    pub fn aabb(&self, b: &Aabb) -> Aabb {
        if b.is_empty() {
            return Aabb::EMPTY;
        }
        let corners = b.corners().map(|c| self.point(c));
        Aabb::from_point_cloud(&corners)
    }

    pub fn inv_point(&self, p: Vec3) -> Vec3 {
        self.inverse.project_point3(p)
    }

    pub fn inv_vector(&self, v: Vec3) -> Vec3 {
        self.inverse.transform_vector3(v)
    }

    pub fn inv_ray(&self, r: &Ray) -> Ray {
        self.inverse().ray(r)
    }

    /// Compare both matrices elementwise within `eps`.
    pub fn abs_diff_eq(&self, other: &Transform, eps: f32) -> bool {
        self.matrix.abs_diff_eq(other.matrix, eps) && self.inverse.abs_diff_eq(other.inverse, eps)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Mul for Transform {
    type Output = Transform;

    /// `a * b` applies `b` first, then `a`.
    fn mul(self, rhs: Transform) -> Transform {
        Transform::from_pair(self.matrix * rhs.matrix, rhs.inverse * self.inverse)
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        *self * *rhs
    }
}
