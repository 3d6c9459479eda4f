use num_complex::Complex64;
use tracing::trace;

use super::terrain::{ElevationSource, GeoProjection};
use super::{phasor_gain, reflected_ray, scaled_permittivity, wavelength};
use crate::error::{ConfigError, ModelError, Result};
use crate::math::{distance_2d, Point3, TOLERANCE};

type Vector2 = nalgebra::Vector2<f64>;

/// Reflection points closer than this along the profile are one reflection.
const REFLECTION_MERGE_DISTANCE: f64 = 1e-6;

/// A terrain sample along the plan-view path from sender to receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    /// Horizontal distance from the sender.
    pub distance: f64,
    /// Terrain elevation.
    pub elevation: f64,
}

impl ProfilePoint {
    fn as_vector(self) -> Vector2 {
        Vector2::new(self.distance, self.elevation)
    }
}

/// Ground reflection over real terrain.
///
/// The terrain between sender and receiver is sampled into a profile. Every
/// profile segment that can specularly reflect the signal without the
/// reflected ray being blocked by the terrain adds one ray to the direct one.
#[derive(Debug)]
pub struct NRayGroundInterference {
    carrier_frequency: f64,
    epsilon_r: f64,
    spacing: f64,
    terrain: Box<dyn ElevationSource>,
    projection: Box<dyn GeoProjection>,
}

impl NRayGroundInterference {
    /// Creates the model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingDependency`] without an elevation source
    /// and [`ConfigError::InvalidValue`] for a sample spacing that is not
    /// positive.
    pub fn new(
        carrier_frequency: f64,
        epsilon_r: f64,
        spacing: f64,
        terrain: Option<Box<dyn ElevationSource>>,
        projection: Box<dyn GeoProjection>,
    ) -> Result<Self> {
        let terrain = terrain.ok_or(ModelError::MissingDependency {
            model: "NRayGroundInterference",
            dependency: "an elevation source",
        })?;
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "spacing",
                value: spacing,
                reason: "must be a positive distance",
            }
            .into());
        }
        Ok(Self {
            carrier_frequency,
            epsilon_r,
            spacing,
            terrain,
            projection,
        })
    }

    fn elevation_at(&self, point: &Point3) -> f64 {
        let (lon, lat) = self.projection.to_geo(point);
        self.terrain.elevation(lon, lat)
    }

    /// Samples the terrain every `spacing` meters from sender to receiver,
    /// both ends included.
    #[must_use]
    pub fn profile(&self, sender: &Point3, receiver: &Point3) -> Vec<ProfilePoint> {
        let d_hor = distance_2d(sender, receiver);
        let mut profile = vec![ProfilePoint {
            distance: 0.0,
            elevation: self.elevation_at(sender),
        }];
        if d_hor < TOLERANCE {
            return profile;
        }
        let dir = (receiver - sender).xy() / d_hor;
        let mut d = self.spacing;
        while d < d_hor {
            let at = Point3::new(sender.x + dir.x * d, sender.y + dir.y * d, 0.0);
            profile.push(ProfilePoint {
                distance: d,
                elevation: self.elevation_at(&at),
            });
            d += self.spacing;
        }
        profile.push(ProfilePoint {
            distance: d_hor,
            elevation: self.elevation_at(receiver),
        });
        profile
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
        if d_hor < TOLERANCE {
            return phasor_gain(sum, lambda);
        }

        let epsilon = scaled_permittivity(self.epsilon_r, scaling);
        let profile = self.profile(sender, receiver);
        let snd = Vector2::new(0.0, sender.z);
        let rcv = Vector2::new(d_hor, receiver.z);
        let interior = &profile[1..profile.len() - 1];
        let mut reflections: Vec<f64> = Vec::new();

        for pair in profile.windows(2) {
            let (p1, p2) = (pair[0].as_vector(), pair[1].as_vector());
            let seg = p2 - p1;
            let len_sq = seg.norm_squared();
            if len_sq < TOLERANCE {
                continue;
            }
            let project = |q: &Vector2| p1 + seg * ((q - p1).dot(&seg) / len_sq);
            let snd_on = project(&snd);
            let rcv_on = project(&rcv);
            let along = rcv_on - snd_on;
            let h_t = (snd - snd_on).norm();
            let h_r = (rcv - rcv_on).norm();
            if h_t + h_r < TOLERANCE {
                continue;
            }

            let refl = snd_on + along * (h_t / (h_t + h_r));
            let u = (refl - p1).dot(&seg) / len_sq;
            if !(-TOLERANCE..=1.0 + TOLERANCE).contains(&u) {
                continue;
            }
            if reflections
                .iter()
                .any(|x| (x - refl.x).abs() < REFLECTION_MERGE_DISTANCE)
            {
                continue;
            }
            if is_occluded(interior, &snd, &rcv, &refl) {
                continue;
            }

            reflections.push(refl.x);
            sum += reflected_ray(d_los, along.norm(), h_t + h_r, epsilon, lambda);
        }

        trace!(reflections = reflections.len(), "n-ray ground interference");
        phasor_gain(sum, lambda)
    }
}

/// Returns `true` if the terrain reaches the ray from `snd` to `refl` or the
/// ray from `refl` to `rcv`.
fn is_occluded(interior: &[ProfilePoint], snd: &Vector2, rcv: &Vector2, refl: &Vector2) -> bool {
    interior.iter().any(|q| {
        if (q.distance - refl.x).abs() < REFLECTION_MERGE_DISTANCE {
            return false;
        }
        let ray_height = if q.distance < refl.x {
            snd.y + (q.distance - snd.x) / (refl.x - snd.x) * (refl.y - snd.y)
        } else {
            refl.y + (q.distance - refl.x) / (rcv.x - refl.x) * (rcv.y - refl.y)
        };
        ray_height <= q.elevation
    })
}
