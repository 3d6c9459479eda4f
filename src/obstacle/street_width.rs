use super::store::ObstacleStore;
use crate::geometry::Aabb;
use crate::math::intersect_2d::{lerp, point_segment_distance_2d};
use crate::math::{distance_2d, Point3, TOLERANCE};

/// Distances beyond this are not considered when looking for the
/// nearest building.
pub const MAX_BUILDING_DISTANCE: f64 = 60.0;

impl ObstacleStore {
    /// Estimates the width of the street running along `centerline`.
    ///
    /// The centerline is cut into pieces no longer than `max_piece_length`.
    /// For each piece the distance to the closest obstacle vertex is taken,
    /// capped at [`MAX_BUILDING_DISTANCE`]. The width is twice the mean of
    /// those distances. Returns `None` for a centerline without length.
    #[must_use]
    pub fn estimate_street_width(&self, centerline: &[Point3], max_piece_length: f64) -> Option<f64> {
        let mut distances = Vec::new();
        for pair in centerline.windows(2) {
            let (start, end) = (&pair[0], &pair[1]);
            let length = distance_2d(start, end);
            if length < TOLERANCE {
                continue;
            }
            let pieces = pieces_for(length, max_piece_length);
            for k in 0..pieces {
                #[allow(clippy::cast_precision_loss)]
                let (t0, t1) = (k as f64 / pieces as f64, (k + 1) as f64 / pieces as f64);
                distances.push(self.nearest_obstacle_distance(&lerp(start, end, t0), &lerp(start, end, t1)));
            }
        }
        if distances.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = distances.iter().sum::<f64>() / distances.len() as f64;
        Some(mean * 2.0)
    }

    fn nearest_obstacle_distance(&self, a: &Point3, b: &Point3) -> f64 {
        let reach = nalgebra::Vector3::new(MAX_BUILDING_DISTANCE, MAX_BUILDING_DISTANCE, 0.0);
        let piece = Aabb::from_corners(a, b);
        let search = Aabb {
            min: piece.min - reach,
            max: piece.max + reach,
        };
        self.candidates(&search)
            .filter(|o| !o.is_inner_wall())
            .flat_map(|o| o.shape().iter())
            .map(|corner| point_segment_distance_2d(corner, a, b))
            .fold(MAX_BUILDING_DISTANCE, f64::min)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pieces_for(length: f64, max_piece_length: f64) -> usize {
    if max_piece_length <= 0.0 || length <= max_piece_length {
        1
    } else {
        (length / max_piece_length).ceil() as usize
    }
}
