// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};

use crate::error::{Result, TravelTimeError};
use crate::mesh::{distance, Point, TriMesh};
use crate::update_kernels::{edge_slowness, solve_edge, solve_triangle, Upwind};

/// Classification of a node during marching. Transitions only go forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Not yet reached by the front.
    Far,
    /// Adjacent to the front; time is tentative.
    Trial,
    /// Behind the front; time is final.
    Accepted,
}

/// A tentative arrival time for a trial node.
///
/// Ordered by time, then by node index, so ties pop deterministically.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    /// Tentative arrival time.
    pub time: f64,
    /// Node index.
    pub node: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Front-tracking state for one source.
///
/// Owns the time and classification buffers of a single marching run and
/// borrows the mesh and per-cell slowness read-only, so independent fronts
/// can march on different threads over the same mesh.
pub struct Front<'m> {
    mesh: &'m TriMesh,
    slowness: &'m [f64],
    times: Vec<f64>,
    states: Vec<NodeState>,
    trial: BTreeSet<usize>,
    steps: usize,
}

impl<'m> Front<'m> {
    /// Create an empty front: every node `Far` with infinite time.
    ///
    /// # Errors
    /// Returns an error if `slowness` does not hold one value per cell.
    pub fn new(mesh: &'m TriMesh, slowness: &'m [f64]) -> Result<Self> {
        if slowness.len() != mesh.cell_count() {
            return Err(TravelTimeError::InvalidParameterization {
                cells: mesh.cell_count(),
                regions: mesh.region_markers().len(),
                got: slowness.len(),
            });
        }
        Ok(Front {
            mesh,
            slowness,
            times: vec![f64::INFINITY; mesh.node_count()],
            states: vec![NodeState::Far; mesh.node_count()],
            trial: BTreeSet::new(),
            steps: 0,
        })
    }

    /// Accept `node` with `time` and move its `Far` neighbours to `Trial`.
    ///
    /// Accepting an already accepted node is ignored.
    pub fn accept(&mut self, node: usize, time: f64) {
        if self.states[node] == NodeState::Accepted {
            return;
        }
        self.times[node] = time;
        self.states[node] = NodeState::Accepted;
        self.trial.remove(&node);
        let mesh = self.mesh;
        for w in mesh.node_neighbours(node) {
            if self.states[w] == NodeState::Far {
                self.states[w] = NodeState::Trial;
                self.trial.insert(w);
            }
        }
    }

    /// Seed a point source at `source` lying in `cell`.
    ///
    /// The three nodes of the cell are accepted with the straight-line time
    /// through the cell's slowness.
    pub fn seed_point_source(&mut self, cell: usize, source: Point) {
        let s = self.slowness[cell];
        for node in self.mesh.cell_nodes(cell) {
            let t = s * distance(self.mesh.position(node), source);
            self.accept(node, t);
        }
    }

    /// Advance the front by exactly one node.
    ///
    /// Every trial node is evaluated against its accepted neighbourhood, the
    /// smallest candidate is accepted and returned. Returns `Ok(None)` once
    /// the trial set is empty.
    ///
    /// # Errors
    /// Returns [`TravelTimeError::FrontStalled`] if trial nodes remain but
    /// none of them produces a candidate.
    pub fn advance(&mut self) -> Result<Option<Candidate>> {
        if self.trial.is_empty() {
            return Ok(None);
        }

        let mut heap = BinaryHeap::with_capacity(self.trial.len());
        for &v in &self.trial {
            self.push_candidates(v, &mut heap);
        }

        let Some(Reverse(best)) = heap.pop() else {
            return Err(TravelTimeError::FrontStalled {
                trial: self.trial.len(),
            });
        };
        self.accept(best.node, best.time);
        self.steps += 1;
        Ok(Some(best))
    }

    /// Advance until the trial set is empty. Returns the number of advances made.
    ///
    /// # Errors
    /// Propagates [`TravelTimeError::FrontStalled`] from [`Front::advance`].
    pub fn march(&mut self) -> Result<usize> {
        let start = self.steps;
        while self.advance()?.is_some() {}
        Ok(self.steps - start)
    }

    fn push_candidates(&self, v: usize, heap: &mut BinaryHeap<Reverse<Candidate>>) {
        let mesh = self.mesh;
        let mut upwind = mesh
            .node_edges(v)
            .iter()
            .filter(|&&e| self.states[mesh.edge(e).other(v)] == NodeState::Accepted);

        let Some(&first) = upwind.next() else {
            return;
        };
        if upwind.next().is_none() {
            let u = mesh.edge(first).other(v);
            let time = solve_edge(self.times[u], mesh.edge(first), self.slowness);
            heap.push(Reverse(Candidate { time, node: v }));
            return;
        }

        let pv = mesh.position(v);
        for &cell in mesh.node_cells(v) {
            let mut pair = [0usize; 2];
            let mut count = 0;
            for node in mesh.cell_nodes(cell) {
                if node != v && self.states[node] == NodeState::Accepted {
                    if count < 2 {
                        pair[count] = node;
                    }
                    count += 1;
                }
            }
            if count != 2 {
                continue;
            }
            let (Some(ea), Some(eb)) = (mesh.find_edge(pair[0], v), mesh.find_edge(pair[1], v))
            else {
                continue;
            };
            let a = Upwind {
                pos: mesh.position(pair[0]),
                time: self.times[pair[0]],
                edge_slowness: edge_slowness(mesh.edge(ea), self.slowness),
            };
            let b = Upwind {
                pos: mesh.position(pair[1]),
                time: self.times[pair[1]],
                edge_slowness: edge_slowness(mesh.edge(eb), self.slowness),
            };
            let time = solve_triangle(&a, &b, pv, self.slowness[cell]);
            heap.push(Reverse(Candidate { time, node: v }));
        }
    }

    /// Travel times of all nodes; `+∞` for nodes never reached.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Classification of a node.
    pub fn state(&self, node: usize) -> NodeState {
        self.states[node]
    }

    /// Number of advances performed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of nodes currently in the trial set.
    pub fn trial_len(&self) -> usize {
        self.trial.len()
    }

    /// Consume the front and return the node times.
    pub fn into_times(self) -> Vec<f64> {
        self.times
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize, length: f64) -> TriMesh {
        let xs: Vec<f64> = (0..n).map(|i| length * i as f64 / (n - 1) as f64).collect();
        TriMesh::from_grid(&xs, &xs).unwrap()
    }

    #[test]
    fn candidate_order_breaks_ties_by_node() {
        let a = Candidate { time: 1.0, node: 4 };
        let b = Candidate { time: 1.0, node: 2 };
        let c = Candidate { time: 0.5, node: 9 };
        let mut heap: BinaryHeap<Reverse<Candidate>> =
            [a, b, c].into_iter().map(Reverse).collect();
        assert_eq!(heap.pop().unwrap().0.node, 9);
        assert_eq!(heap.pop().unwrap().0.node, 2);
        assert_eq!(heap.pop().unwrap().0.node, 4);
    }

    #[test]
    fn single_triangle_from_vertex() {
        let mesh = TriMesh::new(vec![[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]], vec![[0, 1, 2]]).unwrap();
        let slowness = [1.0];
        let mut front = Front::new(&mesh, &slowness).unwrap();
        front.accept(0, 0.0);
        assert_eq!(front.trial_len(), 2);

        // both trial nodes have one accepted neighbour: edge updates
        let first = front.advance().unwrap().unwrap();
        assert_eq!(first.node, 1);
        assert!((first.time - 3.0).abs() < 1e-12);
        // node 2 now sees two accepted nodes of the same cell
        let second = front.advance().unwrap().unwrap();
        assert_eq!(second.node, 2);
        assert!((second.time - 4.0).abs() < 1e-12);
        assert!(front.advance().unwrap().is_none());
        assert_eq!(front.steps(), 2);
    }

    #[test]
    fn seeded_source_cell_is_exact() {
        let mesh = grid(3, 2.0);
        let slowness = vec![2.0; mesh.cell_count()];
        let mut front = Front::new(&mesh, &slowness).unwrap();
        let src = [0.25, 0.1];
        let cell = mesh.find_cell(src).unwrap();
        front.seed_point_source(cell, src);
        for node in mesh.cell_nodes(cell) {
            assert_eq!(front.state(node), NodeState::Accepted);
            let d = distance(mesh.position(node), src);
            assert!((front.times()[node] - 2.0 * d).abs() < 1e-12);
        }
    }

    #[test]
    fn march_accepts_every_node() {
        let mesh = grid(9, 8.0);
        let slowness = vec![1.0; mesh.cell_count()];
        let mut front = Front::new(&mesh, &slowness).unwrap();
        let src = [4.1, 3.9];
        front.seed_point_source(mesh.find_cell(src).unwrap(), src);
        let steps = front.march().unwrap();
        assert_eq!(steps, mesh.node_count() - 3);
        assert_eq!(front.trial_len(), 0);
        for (node, &t) in front.times().iter().enumerate() {
            assert_eq!(front.state(node), NodeState::Accepted);
            let d = distance(mesh.position(node), src);
            assert!(t >= d - 1e-9, "node {} below straight-line time", node);
        }
    }

    #[test]
    fn monotone_along_bottom_row() {
        let mesh = grid(11, 10.0);
        let slowness = vec![1.0; mesh.cell_count()];
        let mut front = Front::new(&mesh, &slowness).unwrap();
        front.seed_point_source(0, [0.0, 0.0]);
        front.march().unwrap();
        let t = front.times();
        for i in 1..11 {
            assert!(t[i] > t[i - 1]);
            assert!((t[i] - i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn marching_is_deterministic() {
        let mesh = grid(7, 6.0);
        let slowness: Vec<f64> = (0..mesh.cell_count())
            .map(|c| 1.0 + (c % 5) as f64 * 0.1)
            .collect();
        let run = || {
            let mut front = Front::new(&mesh, &slowness).unwrap();
            front.seed_point_source(mesh.find_cell([2.2, 3.3]).unwrap(), [2.2, 3.3]);
            front.march().unwrap();
            front.into_times()
        };
        let a = run();
        let b = run();
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn node_without_upwind_cell_is_deferred() {
        // bottom row 0-1-2, top row 3-4-5
        let mesh = TriMesh::from_grid(&[0.0, 1.0, 2.0], &[0.0, 1.0]).unwrap();
        let slowness = vec![1.0; mesh.cell_count()];
        let mut front = Front::new(&mesh, &slowness).unwrap();
        front.accept(0, 0.0);
        front.accept(2, 0.0);

        // node 1 sees nodes 0 and 2, but no cell holds both
        let first = front.advance().unwrap().unwrap();
        assert_eq!(first.node, 3);
        assert!((first.time - 1.0).abs() < 1e-12);
        assert_eq!(front.state(1), NodeState::Trial);

        assert_eq!(front.march().unwrap(), 3);
        let expected = [0.0, 1.0, 0.0, 1.0, 2.0_f64.sqrt(), 1.0];
        for (node, (&t, &e)) in front.times().iter().zip(&expected).enumerate() {
            assert!((t - e).abs() < 1e-12, "node {}: {} vs {}", node, t, e);
        }
    }

    #[test]
    fn front_without_candidates_stalls() {
        // nodes 1 and 2 sit on opposite sides of the diagonal 0-3
        let mesh = TriMesh::from_grid(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        let slowness = vec![1.0; mesh.cell_count()];
        let mut front = Front::new(&mesh, &slowness).unwrap();
        front.accept(1, 1.0);
        front.accept(2, 1.0);
        assert_eq!(front.trial_len(), 2);

        assert!(matches!(
            front.advance(),
            Err(TravelTimeError::FrontStalled { trial: 2 })
        ));
        assert!(matches!(
            front.march(),
            Err(TravelTimeError::FrontStalled { trial: 2 })
        ));
        assert_eq!(front.steps(), 0);
    }

    #[test]
    fn wrong_slowness_length_rejected() {
        let mesh = grid(3, 2.0);
        assert!(matches!(
            Front::new(&mesh, &[1.0, 1.0]),
            Err(TravelTimeError::InvalidParameterization { got: 2, .. })
        ));
    }

    #[test]
    fn empty_trial_returns_none() {
        let mesh = grid(2, 1.0);
        let slowness = vec![1.0; mesh.cell_count()];
        let mut front = Front::new(&mesh, &slowness).unwrap();
        assert!(front.advance().unwrap().is_none());
        assert_eq!(front.times()[0], f64::INFINITY);
    }
}
