//! Triangle mesh storage for Tern scenes.
//!
//! Meshes hold shared vertex data and an index buffer. The renderer flattens
//! them into per-triangle primitives when a scene is loaded.

use tern_math::{Aabb, Transform, Vec3};

/// A mesh consisting of vertex positions, optional normals, and triangle indices.
///
/// Triangles wind counter-clockwise when seen from the side their geometric
/// normal points to.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Identifier used to look the mesh up after loading.
    pub name: String,

    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional, one per vertex)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Index into the scene's material table.
    pub material: Option<usize>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// Normals are NOT computed when absent. Call `compute_normals()` or
    /// `ensure_normals()` if you need them.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
    ) -> Self {
        let bounds = Aabb::from_point_cloud(&positions);
        Self {
            name: name.into(),
            positions,
            normals,
            indices,
            material: None,
            bounds,
        }
    }

    /// Axis-aligned rectangle of two triangles centred at `center`, spanning
    /// `u_edge` and `v_edge`. The normal is `u_edge x v_edge`.
    pub fn quad(name: impl Into<String>, center: Vec3, u_edge: Vec3, v_edge: Vec3) -> Self {
        let (hu, hv) = (u_edge * 0.5, v_edge * 0.5);
        let positions = vec![
            center - hu - hv,
            center + hu - hv,
            center + hu + hv,
            center - hu + hv,
        ];
        Self::new(name, positions, vec![0, 1, 2, 0, 2, 3], None)
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    /// Copy of this mesh with positions and normals moved by `transform`.
    pub fn transformed(&self, transform: &Transform) -> Mesh {
        let positions: Vec<Vec3> = self.positions.iter().map(|p| transform.point(*p)).collect();
        let normals = self.normals.as_ref().map(|normals| {
            normals
                .iter()
                .map(|n| transform.normal(*n).normalize_or_zero())
                .collect()
        });

        Mesh {
            bounds: Aabb::from_point_cloud(&positions),
            name: self.name.clone(),
            positions,
            normals,
            indices: self.indices.clone(),
            material: self.material,
        }
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Replaces existing normals. Vertices not referenced by any valid
    /// triangle get +Y.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let edge1 = self.positions[i1] - self.positions[i0];
            let edge2 = self.positions[i2] - self.positions[i0];
            // Area weighted
            let face_normal = edge1.cross(edge2);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Ensure the mesh has normals, computing them if necessary.
    /// Also recomputes if existing normals don't match vertex count.
    pub fn ensure_normals(&mut self) {
        let provided = self.normals.as_ref().map(Vec::len);
        match provided {
            Some(len) if len == self.positions.len() => {}
            Some(len) => {
                log::debug!(
                    "Mesh '{}': normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    self.name,
                    len,
                    self.positions.len()
                );
                self.compute_normals();
            }
            None => self.compute_normals(),
        }
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Index triplets of every triangle whose indices are all in range.
    ///
    /// Out of range triangles are skipped with a warning.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let vertex_count = self.positions.len();
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let tri = [chunk[0] as usize, chunk[1] as usize, chunk[2] as usize];
            if tri.iter().any(|&i| i >= vertex_count) {
                log::warn!(
                    "Mesh '{}': invalid triangle indices {:?}, vertex count: {}",
                    self.name,
                    tri,
                    vertex_count
                );
                continue;
            }
            triangles.push(tri);
        }

        triangles
    }

    /// Extract triangle vertices as `[v0, v1, v2]` triplets.
    pub fn extract_triangle_vertices(&self) -> Vec<[Vec3; 3]> {
        self.triangles()
            .into_iter()
            .map(|[a, b, c]| [self.positions[a], self.positions[b], self.positions[c]])
            .collect()
    }
}
