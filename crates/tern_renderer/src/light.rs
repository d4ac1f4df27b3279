//! Light sources.
//!
//! Lights report their total emitted power, which the scene uses to choose
//! between them, and sample incident illumination at a shading point.

use std::f32::consts::PI;

use tern_core::LightConfig;
use tern_math::sampling::{uniform_sample_sphere, uniform_sphere_pdf};
use tern_math::{Aabb, Ray, Vec2, Vec3};

use crate::{Spectrum, Visibility};

/// Incident illumination arriving at a point from one light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub radiance: Spectrum,
    /// Unit direction from the shading point towards the light.
    pub wi: Vec3,
    pub pdf: f32,
    /// Segment that must be unoccluded for the sample to contribute.
    pub visibility: Visibility,
}

pub trait Light: Send + Sync {
    /// Total emitted power.
    fn power(&self) -> Spectrum;

    /// Radiance carried back along a ray that escapes the scene.
    fn le(&self, _ray: &Ray) -> Spectrum {
        Spectrum::ZERO
    }

    /// Sample a direction towards the light from `point`.
    ///
    /// `None` when the light cannot illuminate `point` at all.
    fn sample_li(&self, point: Vec3, u: Vec2) -> Option<LightSample>;

    /// Solid-angle density of `sample_li` choosing `wi`. Zero for delta lights.
    fn pdf_li(&self, point: Vec3, wi: Vec3) -> f32;

    /// Light is a point or a single direction and cannot be hit by chance.
    fn is_delta(&self) -> bool;

    /// Light sits at infinity.
    fn is_infinite(&self) -> bool {
        false
    }

    /// Light is the environment seen by escaping rays.
    fn is_environment(&self) -> bool {
        false
    }

    /// Called once the scene bounds are known.
    fn preprocess(&mut self, _world_bound: &Aabb) {}
}

/// Build a light from its scene description.
pub fn light_from_config(config: &LightConfig) -> Box<dyn Light> {
    match config {
        LightConfig::Point {
            position,
            intensity,
        } => Box::new(PointLight::new(*position, *intensity)),
        LightConfig::Spot {
            position,
            target,
            intensity,
            cone_degrees,
            falloff_degrees,
        } => Box::new(SpotLight::new(
            *position,
            *target,
            *intensity,
            cone_degrees.to_radians(),
            falloff_degrees.to_radians(),
        )),
        LightConfig::Distant {
            direction,
            radiance,
        } => Box::new(DistantLight::new(*direction, *radiance)),
        LightConfig::Sky { radiance } => Box::new(SkyLight::new(*radiance)),
    }
}

/// Isotropic point emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    position: Vec3,
    intensity: Spectrum,
}

impl PointLight {
    pub fn new(position: Vec3, intensity: Spectrum) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

impl Light for PointLight {
    fn power(&self) -> Spectrum {
        4.0 * PI * self.intensity
    }

    fn sample_li(&self, point: Vec3, _u: Vec2) -> Option<LightSample> {
        let to_light = self.position - point;
        let dist2 = to_light.length_squared();
        if dist2 == 0.0 {
            return None;
        }

        Some(LightSample {
            radiance: self.intensity / dist2,
            wi: to_light / dist2.sqrt(),
            pdf: 1.0,
            visibility: Visibility::between(point, self.position),
        })
    }

    fn pdf_li(&self, _point: Vec3, _wi: Vec3) -> f32 {
        0.0
    }

    fn is_delta(&self) -> bool {
        true
    }
}

/// Point emitter restricted to a cone, with a smooth edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    position: Vec3,
    /// Unit axis of the cone.
    direction: Vec3,
    intensity: Spectrum,
    cos_total_width: f32,
    cos_falloff_start: f32,
}

impl SpotLight {
    /// Angles are cone half angles in radians.
    pub fn new(position: Vec3, target: Vec3, intensity: Spectrum, total_width: f32, falloff_start: f32) -> Self {
        Self {
            position,
            direction: (target - position).normalize_or_zero(),
            intensity,
            cos_total_width: total_width.cos(),
            cos_falloff_start: falloff_start.min(total_width).cos(),
        }
    }

    /// Attenuation for a direction leaving the light.
    fn falloff(&self, w: Vec3) -> f32 {
        let cos_theta = w.dot(self.direction);
        if cos_theta < self.cos_total_width {
            return 0.0;
        }
        if cos_theta >= self.cos_falloff_start {
            return 1.0;
        }
        let delta = (cos_theta - self.cos_total_width) / (self.cos_falloff_start - self.cos_total_width);
        delta * delta * delta * delta
    }
}

impl Light for SpotLight {
    fn power(&self) -> Spectrum {
        self.intensity * 2.0 * PI * (1.0 - 0.5 * (self.cos_falloff_start + self.cos_total_width))
    }

    fn sample_li(&self, point: Vec3, _u: Vec2) -> Option<LightSample> {
        let to_light = self.position - point;
        let dist2 = to_light.length_squared();
        if dist2 == 0.0 {
            return None;
        }
        let wi = to_light / dist2.sqrt();

        let falloff = self.falloff(-wi);
        if falloff == 0.0 {
            return None;
        }

        Some(LightSample {
            radiance: self.intensity * falloff / dist2,
            wi,
            pdf: 1.0,
            visibility: Visibility::between(point, self.position),
        })
    }

    fn pdf_li(&self, _point: Vec3, _wi: Vec3) -> f32 {
        0.0
    }

    fn is_delta(&self) -> bool {
        true
    }
}

/// Visibility segment for a light at infinity, ending just outside the scene.
fn visibility_to_infinity(point: Vec3, wi: Vec3, world_radius: f32) -> Visibility {
    if world_radius > 0.0 {
        Visibility::between(point, point + wi * (2.0 * world_radius))
    } else {
        Visibility::toward(point, wi)
    }
}

/// Parallel light arriving from a single direction.
#[derive(Debug, Clone, PartialEq)]
pub struct DistantLight {
    /// Unit direction the light travels in.
    direction: Vec3,
    radiance: Spectrum,
    world_radius: f32,
}

impl DistantLight {
    pub fn new(direction: Vec3, radiance: Spectrum) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            radiance,
            world_radius: 0.0,
        }
    }
}

impl Light for DistantLight {
    fn power(&self) -> Spectrum {
        self.radiance * PI * self.world_radius * self.world_radius
    }

    fn sample_li(&self, point: Vec3, _u: Vec2) -> Option<LightSample> {
        let wi = -self.direction;
        Some(LightSample {
            radiance: self.radiance,
            wi,
            pdf: 1.0,
            visibility: visibility_to_infinity(point, wi, self.world_radius),
        })
    }

    fn pdf_li(&self, _point: Vec3, _wi: Vec3) -> f32 {
        0.0
    }

    fn is_delta(&self) -> bool {
        true
    }

    fn is_infinite(&self) -> bool {
        true
    }

    fn preprocess(&mut self, world_bound: &Aabb) {
        self.world_radius = world_bound.bounding_sphere().1;
    }
}

/// Constant radiance from every direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyLight {
    radiance: Spectrum,
    world_radius: f32,
}

impl SkyLight {
    pub fn new(radiance: Spectrum) -> Self {
        Self {
            radiance,
            world_radius: 0.0,
        }
    }
}

impl Light for SkyLight {
    fn power(&self) -> Spectrum {
        self.radiance * PI * self.world_radius * self.world_radius
    }

    fn le(&self, _ray: &Ray) -> Spectrum {
        self.radiance
    }

    fn sample_li(&self, point: Vec3, u: Vec2) -> Option<LightSample> {
        let wi = uniform_sample_sphere(u);
        Some(LightSample {
            radiance: self.radiance,
            wi,
            pdf: uniform_sphere_pdf(),
            visibility: visibility_to_infinity(point, wi, self.world_radius),
        })
    }

    fn pdf_li(&self, _point: Vec3, _wi: Vec3) -> f32 {
        uniform_sphere_pdf()
    }

    fn is_delta(&self) -> bool {
        false
    }

    fn is_infinite(&self) -> bool {
        true
    }

    fn is_environment(&self) -> bool {
        true
    }

    fn preprocess(&mut self, world_bound: &Aabb) {
        self.world_radius = world_bound.bounding_sphere().1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_inverse_square() {
        let light = PointLight::new(Vec3::new(0.0, 2.0, 0.0), Spectrum::splat(8.0));
        let sample = light.sample_li(Vec3::ZERO, Vec2::ZERO).unwrap();

        assert_eq!(sample.wi, Vec3::Y);
        assert!((sample.radiance.x - 2.0).abs() < 1e-5);
        assert_eq!(sample.pdf, 1.0);
        assert!(light.is_delta());
        assert!((light.power().x - 32.0 * PI).abs() < 1e-3);
    }

    #[test]
    fn test_point_light_visibility_stops_short() {
        let light = PointLight::new(Vec3::new(0.0, 2.0, 0.0), Spectrum::ONE);
        let vis = light.sample_li(Vec3::ZERO, Vec2::ZERO).unwrap().visibility;

        assert!(vis.ray.t_max < 2.0);
        assert!(vis.ray.t_min > 0.0);
    }

    #[test]
    fn test_spot_light_cone() {
        let light = SpotLight::new(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::ZERO,
            Spectrum::ONE,
            30f32.to_radians(),
            20f32.to_radians(),
        );

        // Straight below is fully lit
        let below = light.sample_li(Vec3::ZERO, Vec2::ZERO).unwrap();
        assert!((below.radiance.x - 1.0 / 25.0).abs() < 1e-6);

        // 45 degrees off axis is outside the cone
        assert!(light.sample_li(Vec3::new(5.0, 0.0, 0.0), Vec2::ZERO).is_none());

        // Inside the falloff band is dimmer than the centre
        let edge = Vec3::new(5.0 * 25f32.to_radians().tan(), 0.0, 0.0);
        let dimmed = light.sample_li(edge, Vec2::ZERO).unwrap();
        let dist2 = (Vec3::new(0.0, 5.0, 0.0) - edge).length_squared();
        assert!(dimmed.radiance.x * dist2 < 1.0);
        assert!(dimmed.radiance.x > 0.0);
    }

    #[test]
    fn test_spot_light_power() {
        let light = SpotLight::new(Vec3::ZERO, -Vec3::Y, Spectrum::ONE, 0.5, 0.5);
        let expected = 2.0 * PI * (1.0 - 0.5f32.cos());

        assert!((light.power().x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_distant_light_power_needs_bounds() {
        let mut light = DistantLight::new(-Vec3::Y, Spectrum::ONE);
        assert_eq!(light.power(), Spectrum::ZERO);

        light.preprocess(&Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0)));
        assert!((light.power().x - PI * 3.0).abs() < 1e-4);

        let sample = light.sample_li(Vec3::ZERO, Vec2::ZERO).unwrap();
        assert_eq!(sample.wi, Vec3::Y);
        assert!(sample.visibility.ray.t_max.is_finite());
    }

    #[test]
    fn test_sky_light_is_environment() {
        let mut sky = SkyLight::new(Spectrum::new(0.1, 0.2, 0.3));
        sky.preprocess(&Aabb::from_points(Vec3::ZERO, Vec3::ONE));

        assert!(sky.is_environment());
        assert!(sky.is_infinite());
        assert!(!sky.is_delta());
        assert_eq!(sky.le(&Ray::default()), Spectrum::new(0.1, 0.2, 0.3));

        let sample = sky.sample_li(Vec3::ZERO, Vec2::new(0.3, 0.8)).unwrap();
        assert!((sample.wi.length() - 1.0).abs() < 1e-5);
        assert!((sample.pdf - 1.0 / (4.0 * PI)).abs() < 1e-6);
        assert_eq!(sample.pdf, sky.pdf_li(Vec3::ZERO, sample.wi));
    }

    #[test]
    fn test_light_from_config() {
        let spot = LightConfig::Spot {
            position: Vec3::Y,
            target: Vec3::ZERO,
            intensity: Vec3::ONE,
            cone_degrees: 30.0,
            falloff_degrees: 25.0,
        };
        assert!(light_from_config(&spot).is_delta());

        let sky = LightConfig::Sky { radiance: Vec3::ONE };
        assert!(light_from_config(&sky).is_environment());
    }
}
