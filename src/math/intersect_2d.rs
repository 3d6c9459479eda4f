use super::{Point3, Vector3, TOLERANCE};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point3,
    d1: &Vector3,
    p2: &Point3,
    d2: &Vector3,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < TOLERANCE {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in the XY plane.
///
/// Returns `(t, u)`, the parameters along `a0 -> a1` and `b0 -> b1`, both in
/// `[0, 1]`. Parallel and collinear segments never intersect.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
) -> Option<(f64, f64)> {
    let da = Vector3::new(a1.x - a0.x, a1.y - a0.y, 0.0);
    let db = Vector3::new(b1.x - b0.x, b1.y - b0.y, 0.0);
    let (t, u) = line_line_intersect_2d(a0, &da, b0, &db)?;

    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Linear interpolation between two points: `a + (b - a) * t`.
#[must_use]
pub fn lerp(a: &Point3, b: &Point3, t: f64) -> Point3 {
    a + (b - a) * t
}

/// Shortest XY distance from `point` to the segment `a -> b`.
#[must_use]
pub fn point_segment_distance_2d(point: &Point3, a: &Point3, b: &Point3) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq < TOLERANCE {
        0.0
    } else {
        (((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let cx = a.x + dx * t;
    let cy = a.y + dy * t;
    ((point.x - cx).powi(2) + (point.y - cy).powi(2)).sqrt()
}
