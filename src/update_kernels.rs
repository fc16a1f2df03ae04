// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::mesh::{distance, Edge, Point};

/// Projection parameters within this distance of 0 or 1 snap to the endpoint,
/// so round-off never decides between edge and cell slowness.
pub const PROJECTION_EPS: f64 = 1e-12;

/// Slowness governing travel along an edge.
///
/// On the boundary this is the attribute of the only adjacent cell; inside
/// the mesh it is the smaller attribute of the two cells sharing the edge,
/// i.e. the front always uses the faster side.
#[inline]
pub fn edge_slowness(edge: &Edge, slowness: &[f64]) -> f64 {
    match edge.right_cell {
        None => slowness[edge.left_cell],
        Some(right) => slowness[edge.left_cell].min(slowness[right]),
    }
}

/// Dijkstra update along a single edge from an accepted node with time `t_up`.
#[inline]
pub fn solve_edge(t_up: f64, edge: &Edge, slowness: &[f64]) -> f64 {
    t_up + edge_slowness(edge, slowness) * edge.length
}

/// Parameter of the orthogonal projection of `p` onto segment `a`–`b`,
/// clamped to `[0, 1]` and snapped to the endpoints within [`PROJECTION_EPS`].
pub fn project_onto_segment(a: Point, b: Point, p: Point) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    if len_sq <= 0.0 {
        return 0.0;
    }
    let t = ((p[0] - a[0]) * ab[0] + (p[1] - a[1]) * ab[1]) / len_sq;
    if t <= PROJECTION_EPS {
        0.0
    } else if t >= 1.0 - PROJECTION_EPS {
        1.0
    } else {
        t
    }
}

/// An accepted node of a cell, as seen from the node being updated.
#[derive(Debug, Clone, Copy)]
pub struct Upwind {
    /// Node position.
    pub pos: Point,
    /// Accepted travel time.
    pub time: f64,
    /// Slowness of the edge joining this node to the updated node.
    pub edge_slowness: f64,
}

/// Triangle update of node `v` from two accepted nodes `a`, `b` of one cell.
///
/// The front is refracted through the cell: the candidate is the smallest of
/// arriving from `a`, from `b`, or from the projection `q` of `v` onto `a`–`b`
/// with the time at `q` interpolated linearly between `a` and `b`. The
/// slowness is the edge slowness when `q` collapses onto an endpoint and the
/// cell's own slowness otherwise.
pub fn solve_triangle(a: &Upwind, b: &Upwind, v: Point, cell_slowness: f64) -> f64 {
    let t = project_onto_segment(a.pos, b.pos, v);
    let s = if t == 0.0 {
        a.edge_slowness
    } else if t == 1.0 {
        b.edge_slowness
    } else {
        cell_slowness
    };

    let q = [
        a.pos[0] + t * (b.pos[0] - a.pos[0]),
        a.pos[1] + t * (b.pos[1] - a.pos[1]),
    ];
    let via_a = a.time + s * distance(a.pos, v);
    let via_q = a.time + t * (b.time - a.time) + s * distance(q, v);
    let via_b = b.time + s * distance(b.pos, v);
    via_a.min(via_q).min(via_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(left: usize, right: Option<usize>, length: f64) -> Edge {
        Edge {
            nodes: [0, 1],
            left_cell: left,
            right_cell: right,
            length,
        }
    }

    #[test]
    fn edge_slowness_boundary_uses_single_cell() {
        let slowness = [2.0, 0.5];
        assert_eq!(edge_slowness(&edge(0, None, 1.0), &slowness), 2.0);
    }

    #[test]
    fn edge_slowness_interior_takes_faster_cell() {
        let slowness = [2.0, 0.5];
        assert_eq!(edge_slowness(&edge(0, Some(1), 1.0), &slowness), 0.5);
        assert_eq!(edge_slowness(&edge(1, Some(0), 1.0), &slowness), 0.5);
    }

    #[test]
    fn solve_edge_known_case() {
        let slowness = [2.0, 3.0];
        let u = solve_edge(1.5, &edge(0, Some(1), 2.0), &slowness);
        assert!((u - 5.5).abs() < 1e-12);
    }

    #[test]
    fn projection_interior_and_clamped() {
        let t = project_onto_segment([0.0, 0.0], [2.0, 0.0], [0.5, 1.0]);
        assert!((t - 0.25).abs() < 1e-12);
        assert_eq!(project_onto_segment([0.0, 0.0], [2.0, 0.0], [-1.0, 1.0]), 0.0);
        assert_eq!(project_onto_segment([0.0, 0.0], [2.0, 0.0], [3.0, 1.0]), 1.0);
    }

    #[test]
    fn projection_snaps_round_off() {
        let t = project_onto_segment([0.0, 0.0], [1.0, 0.0], [1e-14, 1.0]);
        assert_eq!(t, 0.0);
        let t = project_onto_segment([0.0, 0.0], [1.0, 0.0], [1.0 - 1e-14, 1.0]);
        assert_eq!(t, 1.0);
        assert_eq!(project_onto_segment([1.0, 1.0], [1.0, 1.0], [0.0, 0.0]), 0.0);
    }

    #[test]
    fn triangle_plane_wave_through_base() {
        // plane wave travelling in +y: a and b on the wavefront y = 0
        let a = Upwind {
            pos: [0.0, 0.0],
            time: 0.0,
            edge_slowness: 1.0,
        };
        let b = Upwind {
            pos: [2.0, 0.0],
            time: 0.0,
            edge_slowness: 1.0,
        };
        let u = solve_triangle(&a, &b, [1.0, 1.0], 1.0);
        assert!((u - 1.0).abs() < 1e-12);
    }

    #[test]
    fn triangle_falls_back_to_vertex() {
        // v projects beyond b: clamped to b with b's edge slowness
        let a = Upwind {
            pos: [0.0, 0.0],
            time: 0.0,
            edge_slowness: 1.0,
        };
        let b = Upwind {
            pos: [1.0, 0.0],
            time: 1.0,
            edge_slowness: 0.5,
        };
        let u = solve_triangle(&a, &b, [2.0, 0.0], 3.0);
        // via_a = 0 + 0.5 * 2, via_b = 1 + 0.5 * 1
        assert!((u - 1.0).abs() < 1e-12);
    }

    #[test]
    fn triangle_uses_cell_slowness_inside() {
        let a = Upwind {
            pos: [0.0, 0.0],
            time: 2.0,
            edge_slowness: 10.0,
        };
        let b = Upwind {
            pos: [2.0, 0.0],
            time: 2.0,
            edge_slowness: 10.0,
        };
        // q = (1, 0), t_q = 2, cell slowness 0.5 over distance 1
        let u = solve_triangle(&a, &b, [1.0, 1.0], 0.5);
        assert!((u - 2.5).abs() < 1e-12);
    }

    #[test]
    fn triangle_never_below_upwind_minimum() {
        let a = Upwind {
            pos: [0.0, 0.0],
            time: 3.0,
            edge_slowness: 1.0,
        };
        let b = Upwind {
            pos: [1.0, 0.0],
            time: 2.0,
            edge_slowness: 1.0,
        };
        for v in [[0.5, 0.1], [0.1, 2.0], [0.9, 0.5]] {
            let u = solve_triangle(&a, &b, v, 1.0);
            assert!(u > 2.0 && !u.is_nan());
        }
    }
}
