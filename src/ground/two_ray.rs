use num_complex::Complex64;

use super::{phasor_gain, reflected_ray, scaled_permittivity, wavelength};
use crate::math::{distance_2d, Point3, TOLERANCE};

/// Direct ray plus one reflection off flat ground at height zero.
#[derive(Debug, Clone, Copy)]
pub struct TwoRayInterference {
    carrier_frequency: f64,
    epsilon_r: f64,
}

impl TwoRayInterference {
    #[must_use]
    pub fn new(carrier_frequency: f64, epsilon_r: f64) -> Self {
        Self {
            carrier_frequency,
            epsilon_r,
        }
    }

    /// Linear gain between the two positions.
    ///
    /// `scaling` in `[0, 1]` blends the ground permittivity between that of
    /// air and `epsilon_r`.
    #[must_use]
    pub fn attenuation(&self, sender: &Point3, receiver: &Point3, scaling: f64) -> f64 {
        let d_hor = distance_2d(sender, receiver);
        let d_los = d_hor.hypot(sender.z - receiver.z);
        if d_los < TOLERANCE {
            return 1.0;
        }
        let lambda = wavelength(self.carrier_frequency);
        let mut sum = Complex64::new(1.0 / d_los, 0.0);
        let across = sender.z + receiver.z;
        if across > TOLERANCE {
            let epsilon = scaled_permittivity(self.epsilon_r, scaling);
            sum += reflected_ray(d_los, d_hor, across, epsilon, lambda);
        }
        phasor_gain(sum, lambda)
    }
}
