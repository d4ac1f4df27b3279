//! RGB spectrum helpers.

use tern_math::Vec3;

/// Linear RGB radiometric quantity.
pub type Spectrum = Vec3;

/// Spectrum queries glam does not have.
pub trait SpectrumExt {
    /// Luminance-weighted scalar, used to compare emitted powers.
    fn intensity(&self) -> f32;

    fn is_black(&self) -> bool;
}

impl SpectrumExt for Spectrum {
    fn intensity(&self) -> f32 {
        0.212671 * self.x + 0.715160 * self.y + 0.072169 * self.z
    }

    fn is_black(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}
