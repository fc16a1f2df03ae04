// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::error::{Result, TravelTimeError};

/// A position in the 2D plane.
pub type Point = [f64; 2];

/// Barycentric tolerance for point location. Points this close outside a
/// cell (in barycentric units) still count as inside, so sensors placed
/// exactly on the mesh boundary are found.
pub const LOCATE_EPS: f64 = 1e-10;

/// Cells with an absolute area at or below this value are rejected.
pub const DEGENERATE_AREA_EPS: f64 = 1e-14;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Twice the signed area of triangle (a, b, c); positive for counter-clockwise order.
#[inline]
fn doubled_area(a: Point, b: Point, c: Point) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])
}

/// Shared facet of at most two cells.
///
/// `left_cell` is the cell that first created the edge; `right_cell` is the
/// neighbour across it and is `None` on the mesh boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// End nodes, in the orientation of the left cell.
    pub nodes: [usize; 2],
    /// Cell on the left side of the edge.
    pub left_cell: usize,
    /// Cell on the right side, absent on the boundary.
    pub right_cell: Option<usize>,
    /// Edge length.
    pub length: f64,
}

impl Edge {
    /// Whether the edge lies on the mesh boundary.
    pub fn is_boundary(&self) -> bool {
        self.right_cell.is_none()
    }

    /// The end of the edge opposite to `node`.
    #[inline]
    pub fn other(&self, node: usize) -> usize {
        if self.nodes[0] == node {
            self.nodes[1]
        } else {
            self.nodes[0]
        }
    }
}

/// Axis-aligned bounding box of one cell, padded by the location slack.
#[derive(Debug, Clone)]
struct CellEnvelope {
    cell: usize,
    min: Point,
    max: Point,
}

impl CellEnvelope {
    fn new(cell: usize, corners: [Point; 3]) -> Self {
        let [pa, pb, pc] = corners;
        let slack = LOCATE_EPS * (1.0 + distance(pa, pb).max(distance(pb, pc)));
        CellEnvelope {
            cell,
            min: [
                pa[0].min(pb[0]).min(pc[0]) - slack,
                pa[1].min(pb[1]).min(pc[1]) - slack,
            ],
            max: [
                pa[0].max(pb[0]).max(pc[0]) + slack,
                pa[1].max(pb[1]).max(pc[1]) + slack,
            ],
        }
    }
}

impl RTreeObject for CellEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

impl PointDistance for CellEnvelope {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = (self.min[0] - point[0]).max(point[0] - self.max[0]).max(0.0);
        let dy = (self.min[1] - point[1]).max(point[1] - self.max[1]).max(0.0);
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        point[0] >= self.min[0]
            && point[0] <= self.max[0]
            && point[1] >= self.min[1]
            && point[1] <= self.max[1]
    }
}

/// An unstructured 2D triangle mesh with precomputed neighbour information.
///
/// Nodes, cells and edges live in flat arenas addressed by integer index.
/// Edge adjacency (left/right cell), node-to-edge and node-to-cell lists,
/// cell areas and centers are built once at construction and never change;
/// the mesh is therefore freely shareable between worker threads.
#[derive(Debug, Clone)]
pub struct TriMesh {
    positions: Vec<Point>,
    cells: Vec<[usize; 3]>,
    markers: Vec<i32>,
    edges: Vec<Edge>,
    edge_lookup: HashMap<(usize, usize), usize>,
    node_edges: Vec<Vec<usize>>,
    node_cells: Vec<Vec<usize>>,
    cell_sizes: Vec<f64>,
    cell_centers: Vec<Point>,
    locator: RTree<CellEnvelope>,
}

impl TriMesh {
    /// Create a mesh from node positions and triangle connectivity.
    ///
    /// Cells are reordered counter-clockwise where needed. All markers start at 0.
    ///
    /// # Errors
    /// Returns an error if the mesh is empty, a cell references a missing node,
    /// a cell is degenerate, or an edge is shared by more than two cells.
    pub fn new(positions: Vec<Point>, cells: Vec<[usize; 3]>) -> Result<Self> {
        if positions.is_empty() || cells.is_empty() {
            return Err(TravelTimeError::EmptyMesh);
        }
        let node_count = positions.len();

        let mut oriented = Vec::with_capacity(cells.len());
        let mut cell_sizes = Vec::with_capacity(cells.len());
        let mut cell_centers = Vec::with_capacity(cells.len());
        for (cell, &nodes) in cells.iter().enumerate() {
            if let Some(&node) = nodes.iter().find(|&&n| n >= node_count) {
                return Err(TravelTimeError::InvalidNodeIndex {
                    cell,
                    node,
                    node_count,
                });
            }
            let [a, b, c] = nodes;
            let (pa, pb, pc) = (positions[a], positions[b], positions[c]);
            let area2 = doubled_area(pa, pb, pc);
            if !area2.is_finite() || area2.abs() * 0.5 <= DEGENERATE_AREA_EPS {
                return Err(TravelTimeError::DegenerateCell {
                    cell,
                    area: area2 * 0.5,
                });
            }
            oriented.push(if area2 > 0.0 { [a, b, c] } else { [a, c, b] });
            cell_sizes.push(area2.abs() * 0.5);
            cell_centers.push([
                (pa[0] + pb[0] + pc[0]) / 3.0,
                (pa[1] + pb[1] + pc[1]) / 3.0,
            ]);
        }

        let mut mesh = TriMesh {
            markers: vec![0; oriented.len()],
            positions,
            cells: oriented,
            edges: Vec::new(),
            edge_lookup: HashMap::new(),
            node_edges: vec![Vec::new(); node_count],
            node_cells: vec![Vec::new(); node_count],
            cell_sizes,
            cell_centers,
            locator: RTree::new(),
        };
        mesh.create_neighbour_infos()?;
        mesh.build_locator();
        Ok(mesh)
    }

    /// Create a structured mesh on the tensor grid `xs` × `ys`.
    ///
    /// Every rectangle is split into two triangles along the diagonal from its
    /// lower-left to its upper-right corner. Node `j * xs.len() + i` sits at
    /// `(xs[i], ys[j])`.
    ///
    /// # Errors
    /// Returns an error if an axis has fewer than two coordinates or is not
    /// strictly increasing.
    pub fn from_grid(xs: &[f64], ys: &[f64]) -> Result<Self> {
        for (axis, coords) in [xs, ys].into_iter().enumerate() {
            if coords.len() < 2 {
                return Err(TravelTimeError::InvalidGridAxis {
                    axis,
                    reason: format!("{} coordinates (need at least 2)", coords.len()),
                });
            }
            if coords.iter().any(|c| !c.is_finite()) {
                return Err(TravelTimeError::InvalidGridAxis {
                    axis,
                    reason: "coordinates must be finite".to_string(),
                });
            }
            if coords.windows(2).any(|w| w[1] <= w[0]) {
                return Err(TravelTimeError::InvalidGridAxis {
                    axis,
                    reason: "coordinates must be strictly increasing".to_string(),
                });
            }
        }

        let nx = xs.len();
        let positions: Vec<Point> = ys
            .iter()
            .flat_map(|&y| xs.iter().map(move |&x| [x, y]))
            .collect();

        let mut cells = Vec::with_capacity(2 * (nx - 1) * (ys.len() - 1));
        for j in 0..ys.len() - 1 {
            for i in 0..nx - 1 {
                let n00 = j * nx + i;
                let n10 = n00 + 1;
                let n01 = n00 + nx;
                let n11 = n01 + 1;
                cells.push([n00, n10, n11]);
                cells.push([n00, n11, n01]);
            }
        }
        TriMesh::new(positions, cells)
    }

    /// Assign region markers to the cells (builder method).
    ///
    /// # Errors
    /// Returns an error if the marker count differs from the cell count.
    pub fn with_markers(mut self, markers: Vec<i32>) -> Result<Self> {
        if markers.len() != self.cells.len() {
            return Err(TravelTimeError::MarkerCountMismatch {
                expected: self.cells.len(),
                got: markers.len(),
            });
        }
        self.markers = markers;
        Ok(self)
    }

    fn create_neighbour_infos(&mut self) -> Result<()> {
        for (cell, nodes) in self.cells.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (nodes[k], nodes[(k + 1) % 3]);
                let key = (a.min(b), a.max(b));
                match self.edge_lookup.get(&key) {
                    Some(&edge) => {
                        let e = &mut self.edges[edge];
                        if e.right_cell.is_some() {
                            return Err(TravelTimeError::NonManifoldEdge { a: key.0, b: key.1 });
                        }
                        e.right_cell = Some(cell);
                    }
                    None => {
                        let id = self.edges.len();
                        self.edges.push(Edge {
                            nodes: [a, b],
                            left_cell: cell,
                            right_cell: None,
                            length: distance(self.positions[a], self.positions[b]),
                        });
                        self.edge_lookup.insert(key, id);
                        self.node_edges[a].push(id);
                        self.node_edges[b].push(id);
                    }
                }
                self.node_cells[nodes[k]].push(cell);
            }
        }
        Ok(())
    }

    fn build_locator(&mut self) {
        let envelopes = self
            .cells
            .iter()
            .enumerate()
            .map(|(cell, &[a, b, c])| {
                CellEnvelope::new(
                    cell,
                    [self.positions[a], self.positions[b], self.positions[c]],
                )
            })
            .collect();
        self.locator = RTree::bulk_load(envelopes);
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Position of a node.
    #[inline]
    pub fn position(&self, node: usize) -> Point {
        self.positions[node]
    }

    /// All node positions.
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// The three nodes of a cell, counter-clockwise.
    #[inline]
    pub fn cell_nodes(&self, cell: usize) -> [usize; 3] {
        self.cells[cell]
    }

    /// Region marker of a cell.
    pub fn cell_marker(&self, cell: usize) -> i32 {
        self.markers[cell]
    }

    /// Region markers of all cells.
    pub fn cell_markers(&self) -> &[i32] {
        &self.markers
    }

    /// Sorted distinct region markers.
    pub fn region_markers(&self) -> Vec<i32> {
        let mut markers = self.markers.clone();
        markers.sort_unstable();
        markers.dedup();
        markers
    }

    /// Cell areas.
    pub fn cell_sizes(&self) -> &[f64] {
        &self.cell_sizes
    }

    /// Cell centroids.
    pub fn cell_centers(&self) -> &[Point] {
        &self.cell_centers
    }

    /// All edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// A single edge.
    #[inline]
    pub fn edge(&self, edge: usize) -> &Edge {
        &self.edges[edge]
    }

    /// Index of the edge joining `a` and `b`, if they are connected.
    #[inline]
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&(a.min(b), a.max(b))).copied()
    }

    /// Edges incident to a node.
    #[inline]
    pub fn node_edges(&self, node: usize) -> &[usize] {
        &self.node_edges[node]
    }

    /// Cells incident to a node.
    #[inline]
    pub fn node_cells(&self, node: usize) -> &[usize] {
        &self.node_cells[node]
    }

    /// Nodes sharing an edge with `node`.
    pub fn node_neighbours(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.node_edges[node]
            .iter()
            .map(move |&e| self.edges[e].other(node))
    }

    /// Barycentric coordinates of `p` with respect to `cell`.
    pub fn barycentric(&self, cell: usize, p: Point) -> [f64; 3] {
        let [a, b, c] = self.cells[cell];
        let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
        let det = doubled_area(pa, pb, pc);
        let l1 = doubled_area(pa, p, pc) / det;
        let l2 = doubled_area(pa, pb, p) / det;
        [1.0 - l1 - l2, l1, l2]
    }

    /// Find the cell containing `p`.
    ///
    /// Candidate cells come from an R-tree of padded bounding boxes and are
    /// confirmed with barycentric coordinates. Points on a shared edge or node
    /// resolve to the lowest cell index, so the result is deterministic.
    /// Returns `None` if `p` lies outside the mesh.
    pub fn find_cell(&self, p: Point) -> Option<usize> {
        if !p[0].is_finite() || !p[1].is_finite() {
            return None;
        }
        self.locator
            .locate_all_at_point(&p)
            .map(|env| env.cell)
            .filter(|&cell| self.barycentric(cell, p).iter().all(|&l| l >= -LOCATE_EPS))
            .min()
    }
}
