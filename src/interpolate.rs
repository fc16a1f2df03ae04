// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Result, TravelTimeError};
use crate::mesh::{Point, TriMesh};

/// Samples a node-based field at arbitrary positions of a mesh.
pub trait NodeInterpolator: Send + Sync {
    /// Interpolator name, used in log output.
    fn name(&self) -> &str;

    /// Values of `field` (one per node) at `positions`.
    ///
    /// # Errors
    /// Returns an error if the field length differs from the node count or a
    /// position lies outside the mesh.
    fn interpolate(&self, mesh: &TriMesh, field: &[f64], positions: &[Point]) -> Result<Vec<f64>>;

    /// Values of `field` at the cell centers.
    fn interpolate_cell_centers(&self, mesh: &TriMesh, field: &[f64]) -> Result<Vec<f64>> {
        self.interpolate(mesh, field, mesh.cell_centers())
    }
}

/// Piecewise-linear interpolation inside the containing triangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

fn check_field(mesh: &TriMesh, field: &[f64]) -> Result<()> {
    if field.len() != mesh.node_count() {
        return Err(TravelTimeError::FieldLengthMismatch {
            expected: mesh.node_count(),
            got: field.len(),
        });
    }
    Ok(())
}

impl NodeInterpolator for LinearInterpolator {
    fn name(&self) -> &str {
        "linear"
    }

    fn interpolate(&self, mesh: &TriMesh, field: &[f64], positions: &[Point]) -> Result<Vec<f64>> {
        check_field(mesh, field)?;
        positions
            .iter()
            .map(|&p| -> Result<f64> {
                let cell = mesh
                    .find_cell(p)
                    .ok_or(TravelTimeError::InterpolationOutsideMesh { position: p })?;
                let weights = mesh.barycentric(cell, p);
                Ok(mesh
                    .cell_nodes(cell)
                    .iter()
                    .zip(weights)
                    // a zero weight must not touch an unreached (infinite) node
                    .filter(|&(_, w)| w != 0.0)
                    .map(|(&n, w)| w * field[n])
                    .sum())
            })
            .collect()
    }

    // The centroid has equal barycentric weights, no point location needed.
    fn interpolate_cell_centers(&self, mesh: &TriMesh, field: &[f64]) -> Result<Vec<f64>> {
        check_field(mesh, field)?;
        Ok((0..mesh.cell_count())
            .map(|c| {
                let [a, b, d] = mesh.cell_nodes(c);
                (field[a] + field[b] + field[d]) / 3.0
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> TriMesh {
        TriMesh::from_grid(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn reproduces_linear_field() {
        let mesh = mesh();
        let field: Vec<f64> = mesh
            .positions()
            .iter()
            .map(|p| 2.0 * p[0] - p[1] + 0.5)
            .collect();
        let pts = [[0.3, 0.7], [1.9, 1.1], [2.0, 2.0], [1.0, 0.0]];
        let vals = LinearInterpolator.interpolate(&mesh, &field, &pts).unwrap();
        for (p, v) in pts.iter().zip(&vals) {
            assert!((v - (2.0 * p[0] - p[1] + 0.5)).abs() < 1e-12);
        }
    }

    #[test]
    fn cell_centers_match_point_interpolation() {
        let mesh = mesh();
        let field: Vec<f64> = (0..mesh.node_count()).map(|i| (i * i) as f64).collect();
        let fast = LinearInterpolator
            .interpolate_cell_centers(&mesh, &field)
            .unwrap();
        let slow = LinearInterpolator
            .interpolate(&mesh, &field, mesh.cell_centers())
            .unwrap();
        assert_eq!(fast.len(), mesh.cell_count());
        for (a, b) in fast.iter().zip(&slow) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn unreached_corner_ignored_on_opposite_edge() {
        let mesh = mesh();
        let mut field: Vec<f64> = (0..mesh.node_count()).map(|i| i as f64).collect();
        // cell 0 is [0, 1, 4]; node 4 was never reached
        field[4] = f64::INFINITY;
        let values = LinearInterpolator
            .interpolate(&mesh, &field, &[[1.0, 0.0], [0.5, 0.0], [1.0, 0.5]])
            .unwrap();
        assert_eq!(values[0], 1.0);
        assert!((values[1] - 0.5).abs() < 1e-12);
        assert_eq!(values[2], f64::INFINITY);
        assert!(values.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn outside_mesh_is_an_error() {
        let mesh = mesh();
        let field = vec![0.0; mesh.node_count()];
        assert!(matches!(
            LinearInterpolator.interpolate(&mesh, &field, &[[3.0, 1.0]]),
            Err(TravelTimeError::InterpolationOutsideMesh { .. })
        ));
    }

    #[test]
    fn field_length_checked() {
        let mesh = mesh();
        assert!(matches!(
            LinearInterpolator.interpolate_cell_centers(&mesh, &[1.0]),
            Err(TravelTimeError::FieldLengthMismatch { expected: 9, got: 1 })
        ));
    }
}
