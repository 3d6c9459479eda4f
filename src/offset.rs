//! Mitered offsetting of a centerline into a strip of convex quads.
//!
//! Every quad is ordered `[right start, right end, left end, left start]`
//! relative to the travel direction, which is counter-clockwise in plan view.
//! Consecutive steps with the same direction share a quad; a change of
//! direction (including slope) starts a new one at the mitered corner.

use crate::math::intersect_2d::line_line_intersect_2d;
use crate::math::polygon_2d::segment_direction;
use crate::math::{distance_2d, Point3, Vector3, TOLERANCE};

/// Offsets `centerline` by `width / 2` to each side.
///
/// Zero-length steps are ignored. Returns no quads for a centerline with
/// fewer than two distinct points.
#[must_use]
pub fn lane_quads(centerline: &[Point3], width: f64) -> Vec<[Point3; 4]> {
    let half = width / 2.0;
    let points = distinct_points(centerline);
    if points.len() < 2 {
        return Vec::new();
    }

    let steps: Vec<Step> = points
        .windows(2)
        .filter_map(|w| {
            Some(Step {
                plan: segment_direction(&w[0], &w[1])?,
                space: (w[1] - w[0]).normalize(),
            })
        })
        .collect();

    let mut quads = Vec::new();
    let (mut right_start, mut left_start) = side_points(&points[0], &steps[0].plan, half);
    for (i, pair) in steps.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if (next.space - prev.space).norm() < TOLERANCE {
            continue;
        }
        let (right, left) = miter_corners(&points[i + 1], &prev.plan, &next.plan, half);
        quads.push([right_start, right, left, left_start]);
        right_start = right;
        left_start = left;
    }

    let last = points.len() - 1;
    let (right_end, left_end) = side_points(&points[last], &steps[last - 1].plan, half);
    quads.push([right_start, right_end, left_end, left_start]);
    quads
}

struct Step {
    plan: Vector3,
    space: Vector3,
}

fn distinct_points(centerline: &[Point3]) -> Vec<Point3> {
    let mut out: Vec<Point3> = Vec::with_capacity(centerline.len());
    for p in centerline {
        if out.last().is_some_and(|q| distance_2d(p, q) < TOLERANCE) {
            continue;
        }
        out.push(*p);
    }
    out
}

fn right_normal(dir: &Vector3) -> Vector3 {
    Vector3::new(dir.y, -dir.x, 0.0)
}

/// Points at `half` to the right and to the left of `at`.
fn side_points(at: &Point3, dir: &Vector3, half: f64) -> (Point3, Point3) {
    let n = right_normal(dir) * half;
    (at + n, at - n)
}

/// Corners where the offset lines of two consecutive steps meet.
fn miter_corners(at: &Point3, prev: &Vector3, next: &Vector3, half: f64) -> (Point3, Point3) {
    if (next - prev).norm() < TOLERANCE {
        return side_points(at, next, half);
    }
    let meet = |offset: f64| {
        let a = at + right_normal(prev) * offset;
        let b = at + right_normal(next) * offset;
        line_line_intersect_2d(&a, prev, &b, next).map(|(t, _)| {
            let p = a + prev * t;
            Point3::new(p.x, p.y, at.z)
        })
    };
    match (meet(half), meet(-half)) {
        (Some(right), Some(left)) => (right, left),
        _ => side_points(at, next, half),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::close;
    use crate::math::polygon_2d::{convex_contains_2d, signed_area_2d};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn straight_road_is_one_quad() {
        let quads = lane_quads(&[p(0.0, 0.0), p(10.0, 0.0)], 4.0);
        assert_eq!(quads.len(), 1);
        let q = &quads[0];
        assert!(close(&q[0], &p(0.0, -2.0)));
        assert!(close(&q[1], &p(10.0, -2.0)));
        assert!(close(&q[2], &p(10.0, 2.0)));
        assert!(close(&q[3], &p(0.0, 2.0)));
        assert!(signed_area_2d(q) > 0.0);
    }

    #[test]
    fn collinear_steps_merge() {
        let quads = lane_quads(&[p(0.0, 0.0), p(5.0, 0.0), p(10.0, 0.0)], 2.0);
        assert_eq!(quads.len(), 1);
        assert!(close(&quads[0][1], &p(10.0, -1.0)));
    }

    #[test]
    fn left_turn_is_mitered() {
        let quads = lane_quads(&[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)], 2.0);
        assert_eq!(quads.len(), 2);
        assert!(close(&quads[0][1], &p(11.0, -1.0)));
        assert!(close(&quads[0][2], &p(9.0, 1.0)));
        assert!(close(&quads[1][0], &quads[0][1]));
        assert!(close(&quads[1][3], &quads[0][2]));
        assert!(close(&quads[1][1], &p(11.0, 10.0)));
        assert!(close(&quads[1][2], &p(9.0, 10.0)));
        for q in &quads {
            assert!(signed_area_2d(q) > 0.0);
        }
        assert!(convex_contains_2d(&p(5.0, 0.0), &quads[0]));
        assert!(convex_contains_2d(&p(10.0, 5.0), &quads[1]));
    }

    #[test]
    fn slope_change_starts_new_quad() {
        let quads = lane_quads(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(20.0, 0.0, 2.0),
            ],
            2.0,
        );
        assert_eq!(quads.len(), 2);
        assert!(close(&quads[0][1], &p(10.0, -1.0)));
        assert!((quads[1][1].z - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_length_steps_are_skipped() {
        let quads = lane_quads(&[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 0.0)], 2.0);
        assert_eq!(quads.len(), 1);
        assert!(close(&quads[0][2], &p(10.0, 1.0)));
        assert!(lane_quads(&[p(1.0, 1.0), p(1.0, 1.0)], 2.0).is_empty());
        assert!(lane_quads(&[], 2.0).is_empty());
    }
}
