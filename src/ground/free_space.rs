use std::f64::consts::PI;

use super::wavelength;
use crate::math::{Point3, TOLERANCE};

/// Exponent of the distance in free space.
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 2.0;

/// Distance-only path loss `λ² / (16π² d^α)`.
#[derive(Debug, Clone, Copy)]
pub struct FreeSpacePathLoss {
    carrier_frequency: f64,
    exponent: f64,
}

impl FreeSpacePathLoss {
    #[must_use]
    pub fn new(carrier_frequency: f64) -> Self {
        Self::with_exponent(carrier_frequency, DEFAULT_PATH_LOSS_EXPONENT)
    }

    #[must_use]
    pub fn with_exponent(carrier_frequency: f64, exponent: f64) -> Self {
        Self {
            carrier_frequency,
            exponent,
        }
    }

    #[must_use]
    pub fn carrier_frequency(&self) -> f64 {
        self.carrier_frequency
    }

    /// Linear gain between the two positions; `1.0` when they coincide.
    #[must_use]
    pub fn attenuation(&self, sender: &Point3, receiver: &Point3) -> f64 {
        let d = (receiver - sender).norm();
        if d < TOLERANCE {
            return 1.0;
        }
        let lambda = wavelength(self.carrier_frequency);
        (lambda / (4.0 * PI)).powi(2) / d.powf(self.exponent)
    }
}
