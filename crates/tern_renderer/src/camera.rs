//! Perspective camera with an optional thin lens.
//!
//! Camera space has the eye at the origin looking down +z, with +x to the
//! right and +y up. Raster space has its origin at the top-left pixel corner
//! with y pointing down.
//!
//! The camera is configured first, then [`Camera::preprocess`] derives every
//! transform from the configuration and the sensor resolution. After that it
//! is read-only and can be shared between render threads.

use rand::{Rng, RngCore};
use tern_core::{AspectFit, CameraConfig};
use tern_math::sampling::uniform_sample_disk;
use tern_math::{IVec2, Ray, Transform, Vec2, Vec3};

use crate::{ImageSensor, Visibility};

/// Distance kept from the lens and from the target on screen-space
/// visibility rays.
const LENS_EPSILON: f32 = 1e-3;

/// Jitter for one camera sample, every component in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    /// Offset inside the pixel.
    pub img_u: f32,
    pub img_v: f32,
    /// Position on the lens, only used with a non-zero lens radius.
    pub dof_u: f32,
    pub dof_v: f32,
}

impl PixelSample {
    pub fn new(img_u: f32, img_v: f32, dof_u: f32, dof_v: f32) -> Self {
        Self {
            img_u,
            img_v,
            dof_u,
            dof_v,
        }
    }

    /// Pixel centre, lens centre.
    pub fn center() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5)
    }

    pub fn random(rng: &mut dyn RngCore) -> Self {
        Self::new(rng.gen(), rng.gen(), rng.gen(), rng.gen())
    }
}

/// Where a world point lands on the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenCoord {
    /// Pixel containing the point. Not checked against the sensor size.
    pub pixel: IVec2,
    /// Continuous raster position `pixel` was truncated from.
    pub raster: Vec2,
    /// Solid-angle density of the camera sampling the direction to the point.
    pub pdf: f32,
    /// Segment from the sampled lens point to the query point.
    pub visibility: Visibility,
}

/// Which field of view the projection preserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    /// Full field of view in radians.
    fov: f32,
    lens_radius: f32,
    sensor_size: Option<Vec2>,
    aspect_fit: AspectFit,
    pixel_aspect: Vec2,

    // Derived by preprocess
    forward: Vec3,
    focal_distance: f32,
    image_plane_dist: f32,
    width: u32,
    height: u32,
    world_to_camera: Transform,
    camera_to_clip: Transform,
    clip_to_raster: Transform,
    camera_to_raster: Transform,
    world_to_raster: Transform,
    preprocessed: bool,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45f32.to_radians(),
            lens_radius: 0.0,
            sensor_size: None,
            aspect_fit: AspectFit::Auto,
            pixel_aspect: Vec2::ONE,
            forward: -Vec3::Z,
            focal_distance: 5.0,
            image_plane_dist: 0.0,
            width: 0,
            height: 0,
            world_to_camera: Transform::IDENTITY,
            camera_to_clip: Transform::IDENTITY,
            clip_to_raster: Transform::IDENTITY,
            camera_to_raster: Transform::IDENTITY,
            world_to_raster: Transform::IDENTITY,
            preprocessed: false,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new()
            .with_position(config.eye, config.target, config.up)
            .with_fov(config.fov_degrees)
            .with_lens_radius(config.lens_radius)
            .with_pixel_aspect(config.pixel_aspect[0], config.pixel_aspect[1]);
        camera.aspect_fit = config.aspect_fit;
        if let Some([w, h]) = config.sensor_size {
            camera = camera.with_sensor_size(w, h, config.aspect_fit);
        }
        camera
    }

    pub fn with_position(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.eye = eye;
        self.target = target;
        self.up = up;
        self.preprocessed = false;
        self
    }

    /// Field of view in degrees.
    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.fov = degrees.to_radians();
        self.preprocessed = false;
        self
    }

    /// Zero gives a pinhole camera. Focus is at the target distance.
    pub fn with_lens_radius(mut self, radius: f32) -> Self {
        self.lens_radius = radius.max(0.0);
        self.preprocessed = false;
        self
    }

    pub fn with_sensor_size(mut self, width: f32, height: f32, fit: AspectFit) -> Self {
        self.sensor_size = Some(Vec2::new(width, height));
        self.aspect_fit = fit;
        self.preprocessed = false;
        self
    }

    pub fn with_pixel_aspect(mut self, width: f32, height: f32) -> Self {
        self.pixel_aspect = Vec2::new(width, height);
        self.preprocessed = false;
        self
    }

    /// Derive the projection and the four chained transforms.
    ///
    /// Must run again after any position, lens, sensor or resolution change.
    pub fn preprocess(&mut self, sensor: &dyn ImageSensor) {
        self.width = sensor.width();
        self.height = sensor.height();
        let (w, h) = (self.width as f32, self.height as f32);
        let aspect = w / h * self.pixel_aspect.x / self.pixel_aspect.y;

        let fit = match (self.sensor_size, self.aspect_fit) {
            (None, _) => Fit::Vertical,
            (Some(_), AspectFit::Horizontal) => Fit::Horizontal,
            (Some(_), AspectFit::Vertical) => Fit::Vertical,
            (Some(_), AspectFit::Auto) if aspect > 1.0 => Fit::Horizontal,
            (Some(_), AspectFit::Auto) => Fit::Vertical,
        };

        let inv_tan = 1.0 / (self.fov * 0.5).tan();
        let (x_scale, y_scale) = match fit {
            Fit::Horizontal => {
                self.image_plane_dist = inv_tan * w * 0.5;
                (inv_tan, inv_tan * aspect)
            }
            Fit::Vertical => {
                self.image_plane_dist = inv_tan * h * 0.5;
                (inv_tan / aspect, inv_tan)
            }
        };

        let view = self.target - self.eye;
        self.focal_distance = view.length();
        if self.focal_distance > 0.0 {
            self.forward = view / self.focal_distance;
        } else {
            log::warn!("Camera eye and target coincide at {}, looking down -Z", self.eye);
            self.forward = -Vec3::Z;
            self.focal_distance = 1.0;
        }

        self.world_to_camera = Transform::view_look_at(self.eye, self.forward, self.up);
        self.camera_to_clip = Transform::perspective(x_scale, y_scale);
        self.clip_to_raster = Transform::scale(Vec3::new(w, h, 1.0))
            * Transform::scale(Vec3::new(0.5, -0.5, 1.0))
            * Transform::translate(Vec3::new(1.0, -1.0, 0.0));
        self.camera_to_raster = self.clip_to_raster * self.camera_to_clip;
        self.world_to_raster = self.camera_to_raster * self.world_to_camera;
        self.preprocessed = true;

        log::debug!(
            "Camera preprocessed for {}x{}: {:?} fit, focal distance {:.3}, image plane {:.3}",
            self.width,
            self.height,
            fit,
            self.focal_distance,
            self.image_plane_dist
        );
    }

    /// Solid-angle density of the camera producing a ray along `dir`.
    ///
    /// Negative or infinite when `dir` does not face the image plane.
    fn direction_pdf(&self, dir: Vec3) -> f32 {
        let cos_at_camera = self.forward.dot(dir);
        let image_point_to_camera_dist = self.image_plane_dist / cos_at_camera;
        image_point_to_camera_dist * image_point_to_camera_dist / cos_at_camera
    }

    /// World-space ray through pixel `(x, y)`.
    ///
    /// `pass_id` identifies the render pass the sample belongs to. The
    /// returned ray carries its solid-angle density in `pdf`.
    pub fn generate_ray(&self, _pass_id: u32, x: u32, y: u32, sample: &PixelSample) -> Ray {
        debug_assert!(self.preprocessed, "Camera::generate_ray called before preprocess");

        let raster = Vec3::new(x as f32 + sample.img_u, y as f32 + sample.img_v, 0.0);
        let view_dir = self.camera_to_raster.inv_point(raster).normalize();

        let mut origin = Vec3::ZERO;
        let mut dir = view_dir;
        if self.lens_radius > 0.0 {
            let focal_point = view_dir * (self.focal_distance / view_dir.z);
            let lens = uniform_sample_disk(Vec2::new(sample.dof_u, sample.dof_v)) * self.lens_radius;
            origin = lens.extend(0.0);
            dir = (focal_point - origin).normalize();
        }

        let mut ray = self.world_to_camera.inv_ray(&Ray::new(origin, dir));
        ray.pdf = self.direction_pdf(ray.direction);
        ray
    }

    /// Project a world point onto the image.
    ///
    /// With a thin lens a lens point is drawn from `rng`; the result is then
    /// where that lens point images `point`. No bounds check is made against
    /// the sensor.
    pub fn get_screen_coord(&self, point: Vec3, rng: &mut dyn RngCore) -> ScreenCoord {
        debug_assert!(self.preprocessed, "Camera::get_screen_coord called before preprocess");

        let (raster, visibility) = if self.lens_radius > 0.0 {
            let u = Vec2::new(rng.gen(), rng.gen());
            let lens = (uniform_sample_disk(u) * self.lens_radius).extend(0.0);
            let target = self.world_to_camera.point(point);

            let to_target = target - lens;
            let length = to_target.length();
            let dir = to_target / length;
            let ray = Ray::with_range(lens, dir, LENS_EPSILON, length - LENS_EPSILON);

            let focal_point = ray.at(self.focal_distance / dir.z);
            let raster = self.camera_to_raster.point(focal_point);
            (raster, Visibility::new(self.world_to_camera.inv_ray(&ray)))
        } else {
            (self.world_to_raster.point(point), Visibility::between(self.eye, point))
        };

        ScreenCoord {
            pixel: IVec2::new(raster.x as i32, raster.y as i32),
            raster: raster.truncate(),
            pdf: self.direction_pdf((point - self.eye).normalize()),
            visibility,
        }
    }

    pub fn is_preprocessed(&self) -> bool {
        self.preprocessed
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn focal_distance(&self) -> f32 {
        self.focal_distance
    }

    /// Eye to image plane distance, in pixels.
    pub fn image_plane_dist(&self) -> f32 {
        self.image_plane_dist
    }

    pub fn lens_radius(&self) -> f32 {
        self.lens_radius
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn world_to_camera(&self) -> &Transform {
        &self.world_to_camera
    }

    pub fn camera_to_clip(&self) -> &Transform {
        &self.camera_to_clip
    }

    pub fn clip_to_raster(&self) -> &Transform {
        &self.clip_to_raster
    }

    pub fn camera_to_raster(&self) -> &Transform {
        &self.camera_to_raster
    }

    pub fn world_to_raster(&self) -> &Transform {
        &self.world_to_raster
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
