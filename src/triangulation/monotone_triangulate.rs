use super::vertex_kind::sweep_cmp;
use crate::math::polygon_2d::orient_2d;
use crate::math::Point3;

/// Triangulates a counter-clockwise, x-monotone polygon.
///
/// Returns index triples into `points`. A polygon with `m` vertices yields
/// `m - 2` triangles.
#[must_use]
pub fn monotone_triangles(points: &[Point3]) -> Vec<[usize; 3]> {
    let m = points.len();
    if m < 3 {
        return Vec::new();
    }

    let mut sorted: Vec<usize> = (0..m).collect();
    sorted.sort_by(|&a, &b| sweep_cmp(&points[a], &points[b]));
    let first = sorted[0];
    let last = sorted[m - 1];

    // Walking counter-clockwise from the leftmost vertex follows the lower
    // chain until the rightmost vertex.
    let mut on_lower = vec![false; m];
    let mut k = first;
    while k != last {
        on_lower[k] = true;
        k = (k + 1) % m;
    }

    let mut triangles = Vec::with_capacity(m - 2);
    let mut stack = vec![sorted[0], sorted[1]];

    for j in 2..m - 1 {
        let u = sorted[j];
        let Some(&top) = stack.last() else {
            stack.push(u);
            continue;
        };

        if on_lower[u] == on_lower[top] {
            let Some(mut popped) = stack.pop() else {
                continue;
            };
            while let Some(&t) = stack.last() {
                let turn = orient_2d(&points[t], &points[popped], &points[u]);
                let visible = if on_lower[u] { turn > 0.0 } else { turn < 0.0 };
                if !visible {
                    break;
                }
                triangles.push([u, popped, t]);
                popped = t;
                stack.pop();
            }
            stack.push(popped);
            stack.push(u);
        } else {
            fan_and_drain(&mut stack, u, &mut triangles);
            stack.push(sorted[j - 1]);
            stack.push(u);
        }
    }

    fan_and_drain(&mut stack, sorted[m - 1], &mut triangles);
    triangles
}

/// Connects `u` to every consecutive pair on the stack and empties it.
fn fan_and_drain(stack: &mut Vec<usize>, u: usize, triangles: &mut Vec<[usize; 3]>) {
    while stack.len() > 1 {
        let Some(a) = stack.pop() else { break };
        let Some(&b) = stack.last() else { break };
        triangles.push([u, a, b]);
    }
    stack.clear();
}
