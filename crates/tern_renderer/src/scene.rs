//! Scene: primitives, lights, materials and the accelerator over them.
//!
//! The scene is filled by [`Scene::load_scene`] or the `add_*` builders,
//! finalized once by [`Scene::preprocess`], and then only queried. Queries
//! borrow from the scene and never mutate it, so a preprocessed scene can be
//! shared across render threads as `&Scene`.

use std::sync::OnceLock;

use rayon::prelude::*;
use tern_core::{Mesh, SceneConfig};
use tern_math::{Aabb, Distribution1D, Ray};

use crate::accelerator::{brute_force_intersect, brute_force_intersect_p, create_accelerator};
use crate::light::light_from_config;
use crate::{Accelerator, Intersection, Light, Material, Primitive, SceneError, Spectrum, SpectrumExt};

pub struct Scene {
    file_name: String,
    meshes: Vec<Mesh>,
    primitives: Vec<Primitive>,
    lights: Vec<Box<dyn Light>>,
    sky_light: Option<usize>,
    materials: Vec<Material>,
    accelerator: Option<Box<dyn Accelerator>>,
    light_distribution: Distribution1D,
    bbox: OnceLock<Aabb>,
    preprocessed: bool,
}

impl Scene {
    /// Empty scene with a BVH accelerator.
    pub fn new() -> Self {
        Self {
            file_name: String::new(),
            meshes: Vec::new(),
            primitives: Vec::new(),
            lights: Vec::new(),
            sky_light: None,
            materials: Vec::new(),
            accelerator: create_accelerator(Default::default()),
            light_distribution: Distribution1D::new(&[]),
            bbox: OnceLock::new(),
            preprocessed: false,
        }
    }

    /// Replace the scene contents with `config`.
    ///
    /// The configuration is validated first. The scene still needs
    /// [`Scene::preprocess`] before it can be queried.
    pub fn load_scene(&mut self, config: &SceneConfig) -> Result<(), SceneError> {
        config.validate()?;

        // Resolve every fallible lookup before the current contents are dropped
        let mut meshes = Vec::with_capacity(config.meshes.len());
        for mesh_config in &config.meshes {
            let material = match &mesh_config.material {
                Some(name) => Some(config.material_index(name).ok_or_else(|| {
                    SceneError::MissingMaterial {
                        mesh: mesh_config.name.clone(),
                        material: name.clone(),
                    }
                })?),
                None => None,
            };

            let mut mesh = Mesh::new(
                mesh_config.name.clone(),
                mesh_config.positions.clone(),
                mesh_config.indices.clone(),
                mesh_config.normals.clone(),
            );
            mesh.material = material;
            if mesh.has_normals() {
                mesh.ensure_normals();
            }
            meshes.push(mesh.transformed(&mesh_config.transform.to_transform()));
        }

        self.release();
        self.file_name = config.name.clone();

        for material in &config.materials {
            self.add_material(Material::lambert(material.name.clone(), material.base_color));
        }
        for mesh in meshes {
            self.add_mesh(mesh);
        }

        for light in &config.lights {
            self.add_light(light_from_config(light));
        }

        self.set_accelerator(create_accelerator(config.accelerator));

        log::info!(
            "Loaded scene '{}': {} meshes, {} primitives, {} lights, {} materials",
            self.file_name,
            self.meshes.len(),
            self.primitives.len(),
            self.lights.len(),
            self.materials.len()
        );
        Ok(())
    }

    /// Add a world-space mesh, flattening it into primitives.
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        let index = self.meshes.len();
        self.primitives.extend(Primitive::from_mesh(&mesh, index));
        self.meshes.push(mesh);
        self.bbox = OnceLock::new();
        self.preprocessed = false;
        index
    }

    /// Register a light. An environment light also becomes the sky light.
    pub fn add_light(&mut self, light: Box<dyn Light>) -> usize {
        let index = self.lights.len();
        if light.is_environment() {
            if let Some(previous) = self.sky_light {
                log::warn!("Sky light {} replaces sky light {}", index, previous);
            }
            self.sky_light = Some(index);
        }
        self.lights.push(light);
        self.preprocessed = false;
        index
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// `None` falls back to brute-force intersection.
    pub fn set_accelerator(&mut self, accelerator: Option<Box<dyn Accelerator>>) {
        self.accelerator = accelerator;
        self.preprocessed = false;
    }

    /// Build the accelerator and the light distribution.
    ///
    /// Must run once after loading and before any query.
    pub fn preprocess(&mut self) {
        let bbox = self.get_bbox();
        for light in &mut self.lights {
            light.preprocess(&bbox);
        }

        if let Some(accelerator) = self.accelerator.as_mut() {
            accelerator.build(&self.primitives);
        }

        self.gen_light_distribution();
        self.preprocessed = true;

        log::debug!(
            "Scene '{}' preprocessed: accelerator {}, bounds {:?} to {:?}",
            self.file_name,
            self.accelerator.as_ref().map_or("none", |a| a.name()),
            bbox.min(),
            bbox.max()
        );
    }

    /// Selection weights proportional to each light's emitted power.
    fn gen_light_distribution(&mut self) {
        let powers: Vec<f32> = self.lights.iter().map(|l| l.power().intensity()).collect();
        self.light_distribution = Distribution1D::new(&powers);

        if !self.lights.is_empty() && self.light_distribution.integral() <= 0.0 {
            log::warn!(
                "Total light power is zero over {} lights, choosing lights uniformly",
                self.lights.len()
            );
        }
    }

    /// Drop everything the scene owns.
    pub fn release(&mut self) {
        self.file_name.clear();
        self.meshes.clear();
        self.primitives.clear();
        self.lights.clear();
        self.sky_light = None;
        self.materials.clear();
        self.accelerator = create_accelerator(Default::default());
        self.light_distribution = Distribution1D::new(&[]);
        self.bbox = OnceLock::new();
        self.preprocessed = false;
    }

    pub fn is_preprocessed(&self) -> bool {
        self.preprocessed
    }

    /// Nearest hit within the ray's range, filling `rec`.
    pub fn get_intersect(&self, ray: &Ray, rec: &mut Intersection) -> bool {
        debug_assert!(self.preprocessed, "Scene::get_intersect called before preprocess");
        match &self.accelerator {
            Some(accelerator) => accelerator.intersect(&self.primitives, ray, rec),
            None => brute_force_intersect(&self.primitives, ray, rec),
        }
    }

    /// Nearest hits for a batch of rays, queried in parallel.
    pub fn get_intersect_batch(&self, rays: &[Ray]) -> Vec<Option<Intersection>> {
        rays.par_iter()
            .map(|ray| {
                let mut rec = Intersection::default();
                self.get_intersect(ray, &mut rec).then_some(rec)
            })
            .collect()
    }

    /// True if anything is hit within the ray's range.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        debug_assert!(self.preprocessed, "Scene::intersect_p called before preprocess");
        match &self.accelerator {
            Some(accelerator) => accelerator.intersect_p(&self.primitives, ray),
            None => brute_force_intersect_p(&self.primitives, ray),
        }
    }

    /// Pick a light with probability proportional to its power.
    ///
    /// Returns the light and its selection probability, `None` without lights.
    pub fn sample_light(&self, u: f32) -> Option<(&dyn Light, f32)> {
        debug_assert!(self.preprocessed, "Scene::sample_light called before preprocess");
        let (index, pdf) = self.light_distribution.sample(u)?;
        self.lights.get(index).map(|light| (light.as_ref(), pdf))
    }

    /// Probability of [`Scene::sample_light`] choosing light `index`.
    pub fn light_probability(&self, index: usize) -> f32 {
        if index >= self.light_distribution.count() {
            return 0.0;
        }
        self.light_distribution.pdf(index)
    }

    pub fn light_num(&self) -> usize {
        self.lights.len()
    }

    pub fn get_light(&self, index: usize) -> Option<&dyn Light> {
        self.lights.get(index).map(|light| light.as_ref())
    }

    pub fn get_lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    pub fn get_sky_light(&self) -> Option<&dyn Light> {
        self.sky_light.and_then(|index| self.get_light(index))
    }

    /// Radiance reaching a ray that leaves the scene.
    pub fn le(&self, ray: &Ray) -> Spectrum {
        self.get_sky_light().map_or(Spectrum::ZERO, |sky| sky.le(ray))
    }

    /// Union of all primitive bounds, computed on first use.
    pub fn get_bbox(&self) -> Aabb {
        *self.bbox.get_or_init(|| {
            self.primitives
                .iter()
                .fold(Aabb::EMPTY, |acc, prim| Aabb::surrounding(&acc, &prim.bounding_box()))
        })
    }

    pub fn get_tri_mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn get_material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Material of the surface in `rec`, if it has one.
    pub fn material_at(&self, rec: &Intersection) -> Option<&Material> {
        rec.material.and_then(|index| self.get_material(index))
    }

    pub fn get_primitive(&self, index: usize) -> Option<&Primitive> {
        self.primitives.get(index)
    }

    pub fn get_file_name(&self) -> &str {
        &self.file_name
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
