use super::{Point3, Vector3, TOLERANCE};

/// Epsilon used by the segment-triangle test for parallel rays and
/// barycentric bounds.
const TRIANGLE_EPSILON: f64 = 1e-5;

/// Intersection of the segment `start -> end` with an infinite plane.
///
/// The plane passes through `origin` with normal `normal` (not necessarily
/// unit length). Returns the parameter `t` in `[0, 1]` along the segment, or
/// `None` when the segment is parallel to the plane or does not reach it.
#[must_use]
pub fn segment_plane_intersect(
    start: &Point3,
    end: &Point3,
    origin: &Point3,
    normal: &Vector3,
) -> Option<f64> {
    let dir = end - start;
    let denom = dir.dot(normal);
    if denom.abs() < TOLERANCE {
        return None;
    }
    let t = (origin - start).dot(normal) / denom;
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Möller–Trumbore segment-triangle intersection.
///
/// Returns the parameter `t` along `start -> end` when the segment pierces
/// the triangle strictly between its endpoints.
#[must_use]
pub fn segment_triangle_intersect(
    start: &Point3,
    end: &Point3,
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
) -> Option<f64> {
    let dir = end - start;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < TRIANGLE_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = start - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > TRIANGLE_EPSILON && t < 1.0 - TRIANGLE_EPSILON).then_some(t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    // ── segment / plane ──

    #[test]
    fn segment_crosses_horizontal_plane() {
        let t = segment_plane_intersect(
            &p(0.0, 0.0, 0.0),
            &p(0.0, 0.0, 10.0),
            &p(5.0, 5.0, 2.5),
            &Vector3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert!((t - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn segment_parallel_to_plane() {
        assert!(segment_plane_intersect(
            &p(0.0, 0.0, 1.0),
            &p(10.0, 0.0, 1.0),
            &p(0.0, 0.0, 0.0),
            &Vector3::new(0.0, 0.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn segment_stops_short_of_plane() {
        assert!(segment_plane_intersect(
            &p(0.0, 0.0, 0.0),
            &p(0.0, 0.0, 1.0),
            &p(0.0, 0.0, 2.0),
            &Vector3::new(0.0, 0.0, -3.0),
        )
        .is_none());
    }

    // ── segment / triangle ──

    #[test]
    fn segment_pierces_triangle() {
        let t = segment_triangle_intersect(
            &p(0.2, 0.2, -1.0),
            &p(0.2, 0.2, 3.0),
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!((t - 0.25).abs() < 1e-9);
    }

    #[test]
    fn segment_misses_triangle() {
        assert!(segment_triangle_intersect(
            &p(0.8, 0.8, -1.0),
            &p(0.8, 0.8, 1.0),
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
        )
        .is_none());
    }

    #[test]
    fn segment_ending_on_triangle_is_not_a_hit() {
        assert!(segment_triangle_intersect(
            &p(0.2, 0.2, -1.0),
            &p(0.2, 0.2, 0.0),
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
        )
        .is_none());
    }
}
