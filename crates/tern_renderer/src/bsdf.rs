//! BSDF sampling contract.
//!
//! BxDFs work in a local shading frame where the shading normal is +z.
//! `ShadingFrame` moves directions between that frame and world space.

use std::f32::consts::FRAC_1_PI;

use tern_math::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere};
use tern_math::{Vec2, Vec3};

use crate::Spectrum;

/// Result of importance sampling a BxDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BxdfSample {
    pub f: Spectrum,
    /// Incident direction in the local frame.
    pub wi: Vec3,
    pub pdf: f32,
}

/// Reflectance model evaluated in the local shading frame.
pub trait Bxdf: Send + Sync {
    /// Reflectance for the pair of local directions.
    fn f(&self, wo: Vec3, wi: Vec3) -> Spectrum;

    /// Sample an incident direction for `wo` from `u` in `[0, 1)^2`.
    fn sample_f(&self, wo: Vec3, u: Vec2) -> Option<BxdfSample>;

    /// Solid-angle density `sample_f` would use for `wi`.
    fn pdf(&self, wo: Vec3, wi: Vec3) -> f32;
}

#[inline]
fn same_hemisphere(a: Vec3, b: Vec3) -> bool {
    a.z * b.z > 0.0
}

/// Ideal diffuse reflector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lambert {
    reflectance: Spectrum,
}

impl Lambert {
    pub fn new(reflectance: Spectrum) -> Self {
        Self { reflectance }
    }

    pub fn reflectance(&self) -> Spectrum {
        self.reflectance
    }
}

impl Bxdf for Lambert {
    fn f(&self, wo: Vec3, wi: Vec3) -> Spectrum {
        if same_hemisphere(wo, wi) {
            self.reflectance * FRAC_1_PI
        } else {
            Spectrum::ZERO
        }
    }

    fn sample_f(&self, wo: Vec3, u: Vec2) -> Option<BxdfSample> {
        let mut wi = cosine_sample_hemisphere(u);
        // Reflect into the hemisphere wo leaves from
        if wo.z < 0.0 {
            wi.z = -wi.z;
        }

        let pdf = self.pdf(wo, wi);
        (pdf > 0.0).then(|| BxdfSample {
            f: self.f(wo, wi),
            wi,
            pdf,
        })
    }

    fn pdf(&self, wo: Vec3, wi: Vec3) -> f32 {
        if same_hemisphere(wo, wi) {
            cosine_hemisphere_pdf(wi.z.abs())
        } else {
            0.0
        }
    }
}

/// Orthonormal basis around a shading normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingFrame {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl ShadingFrame {
    /// Frame with `normal` as local +z. `normal` must be unit length.
    pub fn from_normal(normal: Vec3) -> Self {
        let (tangent, bitangent) = normal.any_orthonormal_pair();
        Self {
            tangent,
            bitangent,
            normal,
        }
    }

    pub fn to_local(&self, w: Vec3) -> Vec3 {
        Vec3::new(w.dot(self.tangent), w.dot(self.bitangent), w.dot(self.normal))
    }

    pub fn to_world(&self, w: Vec3) -> Vec3 {
        self.tangent * w.x + self.bitangent * w.y + self.normal * w.z
    }
}

/// Named surface appearance stored in the scene's material table.
pub struct Material {
    pub name: String,
    pub bxdf: Box<dyn Bxdf>,
}

impl Material {
    pub fn new(name: impl Into<String>, bxdf: impl Bxdf + 'static) -> Self {
        Self {
            name: name.into(),
            bxdf: Box::new(bxdf),
        }
    }

    pub fn lambert(name: impl Into<String>, reflectance: Spectrum) -> Self {
        Self::new(name, Lambert::new(reflectance))
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_lambert_f_is_albedo_over_pi() {
        let lambert = Lambert::new(Spectrum::splat(0.5));
        let f = lambert.f(Vec3::Z, Vec3::new(0.0, 0.6, 0.8));

        assert!((f.x - 0.5 * FRAC_1_PI).abs() < 1e-6);
        assert_eq!(lambert.f(Vec3::Z, -Vec3::Z), Spectrum::ZERO);
    }

    #[test]
    fn test_lambert_sample_matches_pdf() {
        let lambert = Lambert::new(Spectrum::ONE);
        let wo = Vec3::new(0.3, 0.0, 0.95).normalize();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..500 {
            let u = Vec2::new(rng.gen(), rng.gen());
            let Some(sample) = lambert.sample_f(wo, u) else {
                continue;
            };
            assert!(sample.wi.z > 0.0);
            assert!((sample.pdf - lambert.pdf(wo, sample.wi)).abs() < 1e-5);
            assert_eq!(sample.f, lambert.f(wo, sample.wi));
        }
    }

    #[test]
    fn test_lambert_samples_below_for_wo_below() {
        let lambert = Lambert::new(Spectrum::ONE);
        let sample = lambert.sample_f(-Vec3::Z, Vec2::new(0.3, 0.7)).unwrap();

        assert!(sample.wi.z < 0.0);
    }

    #[test]
    fn test_lambert_energy_estimate() {
        // Monte Carlo estimate of the directional albedo equals the reflectance
        let lambert = Lambert::new(Spectrum::splat(0.7));
        let mut rng = StdRng::seed_from_u64(5);
        let mut sum = 0.0;
        let n = 10_000;
        for _ in 0..n {
            if let Some(s) = lambert.sample_f(Vec3::Z, Vec2::new(rng.gen(), rng.gen())) {
                sum += s.f.x * s.wi.z / s.pdf;
            }
        }

        assert!((sum / n as f32 - 0.7).abs() < 0.01);
    }

    #[test]
    fn test_shading_frame_round_trip() {
        let n = Vec3::new(1.0, 2.0, -0.5).normalize();
        let frame = ShadingFrame::from_normal(n);
        let w = Vec3::new(-0.2, 0.4, 0.9).normalize();

        assert!((frame.to_local(n) - Vec3::Z).length() < 1e-5);
        assert!((frame.to_world(frame.to_local(w)) - w).length() < 1e-5);
    }
}
