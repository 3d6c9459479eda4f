use tracing::{debug, warn};

use super::vertex_kind::{classify, sweep_cmp, VertexKind};
use crate::math::polygon_2d::orient_2d;
use crate::math::{Point3, TOLERANCE};

/// A lower-chain edge `v[edge] -> v[edge + 1]` currently cut by the sweep line.
#[derive(Debug, Clone, Copy)]
struct ActiveEdge {
    edge: usize,
    helper: usize,
}

/// Sweeps a counter-clockwise polygon from left to right and returns the
/// diagonals that split it into x-monotone pieces.
#[must_use]
pub fn monotone_diagonals(points: &[Point3]) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 4 {
        return Vec::new();
    }

    let kinds: Vec<VertexKind> = (0..n).map(|i| classify(points, i)).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| sweep_cmp(&points[a], &points[b]));

    let mut status: Vec<ActiveEdge> = Vec::new();
    let mut diagonals = Vec::new();

    for &i in &order {
        let prev_edge = (i + n - 1) % n;
        match kinds[i] {
            VertexKind::Start => status.push(ActiveEdge { edge: i, helper: i }),
            VertexKind::End => {
                finish_edge(&mut status, &kinds, &mut diagonals, prev_edge, i);
            }
            VertexKind::Split => {
                if let Some(below) = edge_below(&status, points, i) {
                    diagonals.push((i, status[below].helper));
                    status[below].helper = i;
                } else {
                    warn!(vertex = i, "split vertex has no edge below it");
                }
                status.push(ActiveEdge { edge: i, helper: i });
            }
            VertexKind::Merge => {
                finish_edge(&mut status, &kinds, &mut diagonals, prev_edge, i);
                retarget_below(&mut status, points, &kinds, &mut diagonals, i);
            }
            VertexKind::RegularLower => {
                finish_edge(&mut status, &kinds, &mut diagonals, prev_edge, i);
                status.push(ActiveEdge { edge: i, helper: i });
            }
            VertexKind::RegularUpper => {
                retarget_below(&mut status, points, &kinds, &mut diagonals, i);
            }
        }
    }

    diagonals
}

/// Removes `edge` from the sweep status, connecting `vertex` to its helper if
/// the helper is a merge vertex.
fn finish_edge(
    status: &mut Vec<ActiveEdge>,
    kinds: &[VertexKind],
    diagonals: &mut Vec<(usize, usize)>,
    edge: usize,
    vertex: usize,
) {
    let Some(pos) = status.iter().position(|a| a.edge == edge) else {
        debug!(edge, vertex, "edge already left the sweep status");
        return;
    };
    let active = status.swap_remove(pos);
    if kinds[active.helper] == VertexKind::Merge {
        diagonals.push((vertex, active.helper));
    }
}

/// Makes `vertex` the helper of the edge directly below it.
fn retarget_below(
    status: &mut [ActiveEdge],
    points: &[Point3],
    kinds: &[VertexKind],
    diagonals: &mut Vec<(usize, usize)>,
    vertex: usize,
) {
    let Some(below) = edge_below(status, points, vertex) else {
        warn!(vertex, "no edge below vertex during monotone sweep");
        return;
    };
    let helper = status[below].helper;
    if kinds[helper] == VertexKind::Merge {
        diagonals.push((vertex, helper));
    }
    status[below].helper = vertex;
}

/// Index in `status` of the active edge with the highest crossing at or
/// below `vertex` on the vertical line through it.
fn edge_below(status: &[ActiveEdge], points: &[Point3], vertex: usize) -> Option<usize> {
    let n = points.len();
    let v = &points[vertex];
    let mut best: Option<(usize, f64)> = None;
    for (idx, active) in status.iter().enumerate() {
        let a = &points[active.edge];
        let b = &points[(active.edge + 1) % n];
        let dx = b.x - a.x;
        let y = if dx.abs() < TOLERANCE {
            a.y.min(b.y)
        } else {
            let t = ((v.x - a.x) / dx).clamp(0.0, 1.0);
            a.y + (b.y - a.y) * t
        };
        if y <= v.y + TOLERANCE && best.is_none_or(|(_, best_y)| y > best_y) {
            best = Some((idx, y));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Splits the polygon along `diagonals` into vertex-index cycles.
#[must_use]
pub fn split_pieces(points: &[Point3], diagonals: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut pieces: Vec<Vec<usize>> = vec![(0..points.len()).collect()];

    for &(a, b) in diagonals {
        let found = pieces.iter().enumerate().find_map(|(pi, piece)| {
            let ia = piece.iter().position(|&v| v == a)?;
            let ib = piece.iter().position(|&v| v == b)?;
            let m = piece.len();
            if (ia + 1) % m == ib || (ib + 1) % m == ia {
                return None;
            }
            (in_cone(points, piece, ia, b) && in_cone(points, piece, ib, a)).then_some((pi, ia, ib))
        });
        let Some((pi, ia, ib)) = found else {
            debug!(a, b, "diagonal does not split any piece");
            continue;
        };
        let piece = pieces.swap_remove(pi);
        pieces.push(cycle_between(&piece, ia, ib));
        pieces.push(cycle_between(&piece, ib, ia));
    }

    pieces
}

/// Vertices of `piece` from position `from` to position `to` inclusive,
/// wrapping around.
fn cycle_between(piece: &[usize], from: usize, to: usize) -> Vec<usize> {
    let m = piece.len();
    let mut out = Vec::new();
    let mut k = from;
    loop {
        out.push(piece[k]);
        if k == to {
            break;
        }
        k = (k + 1) % m;
    }
    out
}

/// Whether the segment from `piece[at]` to `target` leaves the vertex into
/// the interior of the counter-clockwise piece.
fn in_cone(points: &[Point3], piece: &[usize], at: usize, target: usize) -> bool {
    let m = piece.len();
    let a = &points[piece[at]];
    let prev = &points[piece[(at + m - 1) % m]];
    let next = &points[piece[(at + 1) % m]];
    let b = &points[target];

    if orient_2d(a, next, prev) >= 0.0 {
        orient_2d(a, b, prev) > 0.0 && orient_2d(b, a, next) > 0.0
    } else {
        !(orient_2d(a, b, next) >= 0.0 && orient_2d(b, a, prev) >= 0.0)
    }
}
