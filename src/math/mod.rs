pub mod intersect_2d;
pub mod intersect_3d;
pub mod polygon_2d;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Absolute per-component tolerance used by [`close`].
pub const CLOSE_EPSILON: f64 = 1e-3;

/// Returns `true` if two scalars differ by less than [`CLOSE_EPSILON`].
#[must_use]
pub fn close_f64(a: f64, b: f64) -> bool {
    (a - b).abs() < CLOSE_EPSILON
}

/// Tolerance equality for coordinates.
///
/// Each component is compared with [`close_f64`]. The relation is not
/// transitive: `a ~ b` and `b ~ c` do not imply `a ~ c`.
#[must_use]
pub fn close(a: &Point3, b: &Point3) -> bool {
    close_f64(a.x, b.x) && close_f64(a.y, b.y) && close_f64(a.z, b.z)
}

/// Horizontal (XY) distance between two points.
#[must_use]
pub fn distance_2d(a: &Point3, b: &Point3) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}
