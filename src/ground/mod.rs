//! Large-scale path loss: free space, flat-ground two-ray interference and
//! terrain-aware N-ray ground reflection.

mod free_space;
mod n_ray;
mod street_width;
mod terrain;
mod two_ray;

pub use free_space::{FreeSpacePathLoss, DEFAULT_PATH_LOSS_EXPONENT};
pub use n_ray::{NRayGroundInterference, ProfilePoint};
pub use street_width::{
    street_width_scaling, StreetWidthMemo, DEFAULT_STREET_WIDTH, FULL_REFLECTION_WIDTH,
    NO_REFLECTION_WIDTH,
};
pub use terrain::{ElevationSource, FlatTerrain, GeoProjection, PlanarProjection, RasterTerrain};
pub use two_ray::TwoRayInterference;

use std::f64::consts::PI;

use num_complex::Complex64;

/// Speed of light in vacuum, in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Wavelength in meters of a carrier at `frequency` Hz.
#[must_use]
pub fn wavelength(frequency: f64) -> f64 {
    SPEED_OF_LIGHT / frequency
}

/// Relative permittivity of the ground after street-width scaling.
fn scaled_permittivity(epsilon_r: f64, scaling: f64) -> f64 {
    1.0 + (epsilon_r - 1.0) * scaling
}

/// Phasor of a ground-reflected ray relative to the direct ray.
///
/// `along` is the distance covered parallel to the reflecting surface and
/// `across` the summed heights above it.
fn reflected_ray(d_los: f64, along: f64, across: f64, epsilon: f64, lambda: f64) -> Complex64 {
    let d_ref = along.hypot(across);
    let delta_phi = 2.0 * PI * (d_ref - d_los) / lambda;
    let sin_theta = across / d_ref;
    let cos_theta = along / d_ref;
    let root = (epsilon - cos_theta * cos_theta).sqrt();
    let gamma = (sin_theta - root) / (sin_theta + root);
    Complex64::from_polar(gamma / d_ref, delta_phi)
}

/// Power gain of a sum of ray phasors.
fn phasor_gain(sum: Complex64, lambda: f64) -> f64 {
    (lambda / (4.0 * PI)).powi(2) * sum.norm_sqr()
}
