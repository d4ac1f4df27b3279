//! Triangle primitives.
//!
//! A scene flattens its meshes into one buffer of world-space triangles.
//! Intersection uses the Möller-Trumbore algorithm.

use tern_core::Mesh;
use tern_math::{Aabb, Interval, Ray, Vec3};

use crate::Intersection;

/// Determinant below which a ray counts as parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A world-space triangle with a back reference to the mesh it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Unit geometric normal, `(v1 - v0) x (v2 - v0)`
    normal: Vec3,
    vertex_normals: Option<[Vec3; 3]>,
    mesh: usize,
    material: Option<usize>,
    bbox: Aabb,
}

impl Primitive {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        let bbox = Aabb::from_point_cloud(&[v0, v1, v2]);

        Self {
            v0,
            v1,
            v2,
            normal,
            vertex_normals: None,
            mesh: 0,
            material: None,
            bbox,
        }
    }

    /// Add per-vertex normals for smooth shading.
    pub fn with_vertex_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.vertex_normals = Some(normals);
        self
    }

    pub fn with_material(mut self, material: Option<usize>) -> Self {
        self.material = material;
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = mesh;
        self
    }

    /// One primitive per valid triangle of `mesh`, tagged with `mesh_index`.
    pub fn from_mesh(mesh: &Mesh, mesh_index: usize) -> Vec<Primitive> {
        mesh.triangles()
            .into_iter()
            .map(|[a, b, c]| {
                let mut prim = Primitive::new(mesh.positions[a], mesh.positions[b], mesh.positions[c])
                    .with_mesh(mesh_index)
                    .with_material(mesh.material);
                if let Some(normals) = &mesh.normals {
                    if let (Some(na), Some(nb), Some(nc)) = (normals.get(a), normals.get(b), normals.get(c)) {
                        prim = prim.with_vertex_normals([*na, *nb, *nc]);
                    }
                }
                prim
            })
            .collect()
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn mesh_index(&self) -> usize {
        self.mesh
    }

    pub fn material(&self) -> Option<usize> {
        self.material
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    pub fn area(&self) -> f32 {
        0.5 * (self.v1 - self.v0).cross(self.v2 - self.v0).length()
    }

    /// Möller-Trumbore. Returns `(t, u, v)` for a hit inside `ray_t`.
    fn hit_distance(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, f32, f32)> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        ray_t.contains(t).then_some((t, u, v))
    }

    /// Test if a ray hits this triangle within `ray_t`, filling `rec` on a hit.
    ///
    /// `rec.primitive` is left for the caller, who knows the buffer index.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval, rec: &mut Intersection) -> bool {
        let Some((t, u, v)) = self.hit_distance(ray, ray_t) else {
            return false;
        };

        rec.t = t;
        rec.point = ray.at(t);
        rec.set_face_normal(ray, self.normal);
        rec.u = u;
        rec.v = v;
        rec.material = self.material;
        rec.shading_normal = match self.vertex_normals {
            Some([n0, n1, n2]) => {
                let n = ((1.0 - u - v) * n0 + u * n1 + v * n2).normalize_or_zero();
                if n == Vec3::ZERO {
                    rec.normal
                } else if n.dot(rec.normal) < 0.0 {
                    -n
                } else {
                    n
                }
            }
            None => rec.normal,
        };

        true
    }

    /// Any-hit test within `ray_t`.
    pub fn intersect_p(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.hit_distance(ray, ray_t).is_some()
    }
}
