use std::cmp::Ordering;

use crate::math::polygon_2d::orient_2d;
use crate::math::Point3;

/// Role of a polygon vertex with respect to a left-to-right sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Both neighbors lie to the right, interior angle below π.
    Start,
    /// Both neighbors lie to the left, interior angle below π.
    End,
    /// Both neighbors lie to the right, reflex interior angle.
    Split,
    /// Both neighbors lie to the left, reflex interior angle.
    Merge,
    /// On the upper boundary chain; interior lies below.
    RegularUpper,
    /// On the lower boundary chain; interior lies above.
    RegularLower,
}

/// Sweep order: by x, ties broken by y.
#[must_use]
pub fn sweep_cmp(a: &Point3, b: &Point3) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Classifies vertex `i` of a counter-clockwise polygon.
#[must_use]
pub fn classify(points: &[Point3], i: usize) -> VertexKind {
    let n = points.len();
    let prev = &points[(i + n - 1) % n];
    let v = &points[i];
    let next = &points[(i + 1) % n];

    let prev_later = sweep_cmp(prev, v) == Ordering::Greater;
    let next_later = sweep_cmp(next, v) == Ordering::Greater;
    let convex = orient_2d(prev, v, next) > 0.0;

    match (prev_later, next_later) {
        (true, true) if convex => VertexKind::Start,
        (true, true) => VertexKind::Split,
        (false, false) if convex => VertexKind::End,
        (false, false) => VertexKind::Merge,
        (false, true) => VertexKind::RegularLower,
        (true, false) => VertexKind::RegularUpper,
    }
}
