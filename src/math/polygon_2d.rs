use super::{Point3, Vector3, TOLERANCE};

/// Plan-view area enclosed by a footprint outline.
///
/// The sign gives the winding: counter-clockwise outlines come out positive.
/// Outlines with fewer than three vertices enclose nothing.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let next = points.iter().cycle().skip(1);
    let twice: f64 = points.iter().zip(next).map(|(a, b)| a.x * b.y - b.x * a.y).sum();
    twice / 2.0
}

/// 2D orientation of the triple `(o, a, b)`.
///
/// Positive for a left (counter-clockwise) turn, negative for a right turn,
/// zero when collinear.
#[must_use]
pub fn orient_2d(o: &Point3, a: &Point3, b: &Point3) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Unsigned area of a triangle projected to the XY plane.
#[must_use]
pub fn triangle_area_2d(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    orient_2d(a, b, c).abs() * 0.5
}

/// Removes consecutive duplicate vertices, including a closing vertex that
/// repeats the first one.
#[must_use]
pub fn dedup_polygon(points: &[Point3]) -> Vec<Point3> {
    let mut out: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_some_and(|q| same_xy(p, q)) {
            continue;
        }
        out.push(*p);
    }
    while out.len() > 1 && out.first().zip(out.last()).is_some_and(|(a, b)| same_xy(a, b)) {
        out.pop();
    }
    out
}

/// Returns the polygon in counter-clockwise order.
#[must_use]
pub fn to_ccw(points: &[Point3]) -> Vec<Point3> {
    if signed_area_2d(points) < 0.0 {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    }
}

fn same_xy(a: &Point3, b: &Point3) -> bool {
    (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE
}

/// Ray-casting point-in-polygon test in the XY plane.
///
/// Casts a ray towards +x and counts edge crossings. Points exactly on the
/// boundary may land on either side.
#[must_use]
pub fn point_in_polygon_2d(point: &Point3, polygon: &[Point3]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&polygon[i], &polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = pj.x + (point.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Containment test for a convex polygon in the XY plane.
///
/// The point is inside if it lies on the same side of every edge. Points on
/// an edge count as inside. Only valid for convex polygons.
#[must_use]
pub fn convex_contains_2d(point: &Point3, polygon: &[Point3]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut positive = false;
    let mut negative = false;
    for i in 0..n {
        let side = orient_2d(&polygon[i], &polygon[(i + 1) % n], point);
        if side > TOLERANCE {
            positive = true;
        } else if side < -TOLERANCE {
            negative = true;
        }
        if positive && negative {
            return false;
        }
    }
    true
}

/// Normalized XY direction from `a` to `b`, or `None` for a zero-length step.
#[must_use]
pub fn segment_direction(a: &Point3, b: &Point3) -> Option<Vector3> {
    let d = b - a;
    let len = (d.x * d.x + d.y * d.y).sqrt();
    if len < TOLERANCE {
        return None;
    }
    Some(Vector3::new(d.x / len, d.y / len, 0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn l_shape() -> Vec<Point3> {
        vec![
            p(0.0, 0.0),
            p(4.0, 0.0),
            p(4.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 3.0),
            p(0.0, 3.0),
        ]
    }

    // ── area / orientation ──

    #[test]
    fn signed_area_ccw_square() {
        let sq = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        assert!((signed_area_2d(&sq) - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn to_ccw_reverses_clockwise_input() {
        let cw = [p(0.0, 0.0), p(0.0, 2.0), p(2.0, 2.0), p(2.0, 0.0)];
        assert!(signed_area_2d(&cw) < 0.0);
        assert!(signed_area_2d(&to_ccw(&cw)) > 0.0);
    }

    #[test]
    fn dedup_drops_repeats_and_closing_vertex() {
        let pts = [p(0.0, 0.0), p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)];
        let out = dedup_polygon(&pts);
        assert_eq!(out.len(), 3);
    }

    // ── containment ──

    #[test]
    fn ray_cast_non_convex() {
        let poly = l_shape();
        assert!(point_in_polygon_2d(&p(0.5, 2.0), &poly));
        assert!(point_in_polygon_2d(&p(3.0, 0.5), &poly));
        assert!(!point_in_polygon_2d(&p(3.0, 2.0), &poly));
        assert!(!point_in_polygon_2d(&p(-1.0, 0.5), &poly));
    }

    #[test]
    fn convex_contains_either_winding() {
        let ccw = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        let cw: Vec<Point3> = ccw.iter().rev().copied().collect();
        assert!(convex_contains_2d(&p(1.0, 1.0), &ccw));
        assert!(convex_contains_2d(&p(1.0, 1.0), &cw));
        assert!(convex_contains_2d(&p(2.0, 1.0), &ccw));
        assert!(!convex_contains_2d(&p(3.0, 1.0), &cw));
    }

    #[test]
    fn segment_direction_zero_length() {
        assert!(segment_direction(&p(1.0, 1.0), &p(1.0, 1.0)).is_none());
        let d = segment_direction(&p(0.0, 0.0), &p(0.0, 5.0)).unwrap();
        assert!((d.y - 1.0).abs() < TOLERANCE);
    }
}
