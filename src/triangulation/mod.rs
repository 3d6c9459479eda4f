//! Sweep-line triangulation of simple polygons.
//!
//! The polygon is first cut into x-monotone pieces by a left-to-right sweep
//! that resolves split and merge vertices with diagonals. Each piece is then
//! triangulated with the classic two-chain stack walk.

mod monotone_partition;
mod monotone_triangulate;
mod vertex_kind;

pub use monotone_partition::{monotone_diagonals, split_pieces};
pub use monotone_triangulate::monotone_triangles;
pub use vertex_kind::{classify, sweep_cmp, VertexKind};

use crate::geometry::Triangle;
use crate::math::polygon_2d::{dedup_polygon, orient_2d, signed_area_2d, to_ccw};
use crate::math::{Point3, TOLERANCE};

/// Triangulates a simple polygon in the XY plane.
///
/// Vertex z values are carried through to the output triangles unchanged.
pub struct TriangulatePolygon {
    points: Vec<Point3>,
}

impl TriangulatePolygon {
    /// Creates a new `TriangulatePolygon` operation.
    #[must_use]
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Executes the triangulation.
    ///
    /// Degenerate input (fewer than three distinct vertices or zero area)
    /// yields no triangles. Duplicate and collinear vertices are dropped
    /// before the sweep, so a simple polygon with `n` remaining vertices
    /// yields `n - 2` triangles.
    #[must_use]
    pub fn execute(&self) -> Vec<Triangle> {
        let points = normalize_polygon(&self.points);
        if points.len() < 3 {
            return Vec::new();
        }

        let diagonals = monotone_diagonals(&points);
        let mut triangles = Vec::with_capacity(points.len() - 2);
        for piece in split_pieces(&points, &diagonals) {
            let local: Vec<Point3> = piece.iter().map(|&i| points[i]).collect();
            triangles.extend(
                monotone_triangles(&local)
                    .into_iter()
                    .map(|[a, b, c]| Triangle::new(local[a], local[b], local[c])),
            );
        }
        triangles
    }
}

/// Splits a simple polygon into x-monotone pieces.
///
/// The pieces are counter-clockwise and share the normalized vertices of the
/// input.
#[must_use]
pub fn partition_monotone(points: &[Point3]) -> Vec<Vec<Point3>> {
    let points = normalize_polygon(points);
    if points.len() < 3 {
        return Vec::new();
    }
    let diagonals = monotone_diagonals(&points);
    split_pieces(&points, &diagonals)
        .into_iter()
        .map(|piece| piece.into_iter().map(|i| points[i]).collect())
        .collect()
}

/// Triangulates a polygon that is already x-monotone.
#[must_use]
pub fn triangulate_monotone(points: &[Point3]) -> Vec<Triangle> {
    let points = normalize_polygon(points);
    monotone_triangles(&points)
        .into_iter()
        .map(|[a, b, c]| Triangle::new(points[a], points[b], points[c]))
        .collect()
}

/// Drops duplicate and collinear vertices and orients the polygon
/// counter-clockwise. Returns an empty list for zero-area input.
fn normalize_polygon(points: &[Point3]) -> Vec<Point3> {
    let mut pts = dedup_polygon(points);
    while pts.len() >= 3 {
        let n = pts.len();
        let collinear = (0..n).find(|&i| {
            orient_2d(&pts[(i + n - 1) % n], &pts[i], &pts[(i + 1) % n]).abs() < TOLERANCE
        });
        match collinear {
            Some(i) => {
                pts.remove(i);
            }
            None => break,
        }
    }
    if pts.len() < 3 || signed_area_2d(&pts).abs() < TOLERANCE {
        return Vec::new();
    }
    to_ccw(&pts)
}
