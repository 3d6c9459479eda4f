//! Small-scale Rice/Rayleigh fading as a Doppler-shifted sum of sinusoids.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;
use crate::ground::SPEED_OF_LIGHT;
use crate::math::Vector3;

/// K factor used in garages when a wall or vehicle blocks the direct path.
pub const REDUCED_K_FACTOR: f64 = 1.74;

/// A sensible number of sinusoids.
pub const RECOMMENDED_NUM_PATHS: usize = 8;

/// Rice fading process; a K factor of zero gives Rayleigh fading.
///
/// The arrival angles and phases are drawn once at construction, so one
/// instance is one realization of the channel.
#[derive(Debug, Clone)]
pub struct RiceRayleighFading {
    carrier_frequency: f64,
    k_factor: f64,
    interval: f64,
    aoa: Vec<f64>,
    phase_real: Vec<f64>,
    phase_imag: Vec<f64>,
}

impl RiceRayleighFading {
    /// Draws a new realization from `rng`.
    ///
    /// `interval` is the spacing in seconds of the samples taken over a
    /// reception by [`samples`](Self::samples).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero paths, a negative K
    /// factor or a non-positive interval.
    pub fn new<R: Rng + ?Sized>(
        carrier_frequency: f64,
        num_paths: usize,
        k_factor: f64,
        interval: f64,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        if num_paths == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "num_paths",
                value: 0.0,
                reason: "at least one path is needed",
            });
        }
        if !k_factor.is_finite() || k_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "k_factor",
                value: k_factor,
                reason: "must be a finite, non-negative linear ratio",
            });
        }
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "interval",
                value: interval,
                reason: "must be a positive duration",
            });
        }

        let theta = rng.gen_range(-PI..PI);
        #[allow(clippy::cast_precision_loss)]
        let n = num_paths as f64;
        let mut aoa = Vec::with_capacity(num_paths);
        let mut phase_real = Vec::with_capacity(num_paths);
        let mut phase_imag = Vec::with_capacity(num_paths);
        for i in 0..num_paths {
            #[allow(clippy::cast_precision_loss)]
            let i = i as f64;
            aoa.push((2.0 * PI * i - PI + theta) / (4.0 * n));
            phase_real.push(rng.gen_range(-PI..PI));
            phase_imag.push(rng.gen_range(-PI..PI));
        }
        Ok(Self {
            carrier_frequency,
            k_factor,
            interval,
            aoa,
            phase_real,
            phase_imag,
        })
    }

    /// Draws a realization from a generator seeded with `seed`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_seed(
        carrier_frequency: f64,
        num_paths: usize,
        k_factor: f64,
        interval: f64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::new(
            carrier_frequency,
            num_paths,
            k_factor,
            interval,
            &mut StdRng::seed_from_u64(seed),
        )
    }

    #[must_use]
    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    #[must_use]
    pub fn num_paths(&self) -> usize {
        self.aoa.len()
    }

    #[must_use]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Power attenuation at time `t` for the given relative speed in m/s.
    #[must_use]
    pub fn value(&self, relative_speed: f64, k_factor: f64, t: f64) -> f64 {
        let doppler = relative_speed * self.carrier_frequency / SPEED_OF_LIGHT;
        let (mut real, mut imag) = (0.0, 0.0);
        for ((aoa, phase_real), phase_imag) in self.aoa.iter().zip(&self.phase_real).zip(&self.phase_imag) {
            real += (2.0 * PI * doppler * t * aoa.cos() + phase_real).cos();
            imag += (2.0 * PI * doppler * t * aoa.sin() + phase_imag).cos();
        }
        #[allow(clippy::cast_precision_loss)]
        let norm = (2.0 / self.aoa.len() as f64).sqrt();
        real *= norm;
        imag *= norm;
        let los = (2.0 * k_factor).sqrt();
        ((real + los).powi(2) + imag * imag) / (2.0 * (k_factor + 1.0))
    }

    /// [`value`](Self::value) with the configured K factor.
    #[must_use]
    pub fn sample(&self, relative_speed: f64, t: f64) -> f64 {
        self.value(relative_speed, self.k_factor, t)
    }

    /// Attenuation over a reception from `start` to `end`, sampled every
    /// `interval` seconds plus once at `end`. Returns `(time, value)` pairs.
    #[must_use]
    pub fn samples(&self, relative_speed: f64, k_factor: f64, start: f64, end: f64) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        let mut t = start;
        while t < end {
            out.push((t, self.value(relative_speed, k_factor, t)));
            t += self.interval;
        }
        out.push((end, self.value(relative_speed, k_factor, end)));
        out
    }
}

/// Magnitude of the difference of two velocity vectors.
#[must_use]
pub fn relative_speed(sender_velocity: &Vector3, receiver_velocity: &Vector3) -> f64 {
    (sender_velocity - receiver_velocity).norm()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const F: f64 = 5.9e9;

    fn fading(seed: u64) -> RiceRayleighFading {
        RiceRayleighFading::from_seed(F, RECOMMENDED_NUM_PATHS, 10.0, 0.001, seed).unwrap()
    }

    #[test]
    fn arrival_angles_are_evenly_spaced() {
        let f = fading(1);
        assert_eq!(f.num_paths(), RECOMMENDED_NUM_PATHS);
        let step = 2.0 * PI / (4.0 * 8.0);
        for pair in f.aoa.windows(2) {
            assert!((pair[1] - pair[0] - step).abs() < 1e-12);
        }
    }

    #[test]
    fn huge_k_factor_is_unity() {
        let f = fading(3);
        for t in [0.0, 0.01, 0.5] {
            assert!((f.value(30.0, 1e12, t) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn standing_still_is_time_invariant() {
        let f = fading(5);
        let v0 = f.sample(0.0, 0.0);
        for t in [0.1, 1.0, 10.0] {
            assert!((f.sample(0.0, t) - v0).abs() < 1e-12);
        }
    }

    #[test]
    fn moving_varies_over_time() {
        let f = fading(5);
        let values: Vec<f64> = (0..50).map(|i| f.value(30.0, 0.0, f64::from(i) * 0.002)).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(0.0, f64::max);
        assert!(max - min > 1e-3);
    }

    #[test]
    fn rayleigh_has_unit_mean_power() {
        let mean: f64 = (0..2000).map(|seed| fading(seed).value(0.0, 0.0, 0.0)).sum::<f64>() / 2000.0;
        assert!((mean - 1.0).abs() < 0.1, "mean {mean}");
    }

    #[test]
    fn same_seed_same_realization() {
        assert!((fading(9).sample(20.0, 0.3) - fading(9).sample(20.0, 0.3)).abs() < f64::EPSILON);
    }

    #[test]
    fn reception_samples() {
        let f = RiceRayleighFading::from_seed(F, 8, 0.0, 0.25, 1).unwrap();
        let times: Vec<f64> = f.samples(10.0, 0.0, 1.0, 1.6).iter().map(|s| s.0).collect();
        assert_eq!(times, vec![1.0, 1.25, 1.5, 1.6]);
    }

    #[test]
    fn invalid_parameters() {
        assert!(RiceRayleighFading::from_seed(F, 0, 1.0, 0.1, 0).is_err());
        assert!(RiceRayleighFading::from_seed(F, 8, -1.0, 0.1, 0).is_err());
        assert!(RiceRayleighFading::from_seed(F, 8, 1.0, 0.0, 0).is_err());
    }

    #[test]
    fn relative_speed_of_oncoming_cars() {
        let v = relative_speed(&Vector3::new(15.0, 0.0, 0.0), &Vector3::new(-15.0, 0.0, 0.0));
        assert!((v - 30.0).abs() < f64::EPSILON);
    }
}
