// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Result, TravelTimeError};
use crate::mesh::TriMesh;

/// Mapping from cells to region parameters.
///
/// Distinct cell markers are sorted ascending; parameter `i` belongs to the
/// `i`-th smallest marker.
#[derive(Debug, Clone)]
pub struct RegionMap {
    markers: Vec<i32>,
    cell_region: Vec<usize>,
    region_sizes: Vec<f64>,
}

impl RegionMap {
    /// Build the map from the mesh's cell markers.
    pub fn new(mesh: &TriMesh) -> Self {
        let markers = mesh.region_markers();
        let mut region_sizes = vec![0.0; markers.len()];
        let cell_region: Vec<usize> = mesh
            .cell_markers()
            .iter()
            .zip(mesh.cell_sizes())
            .map(|(m, &size)| {
                // markers come from the same list, so the search always hits
                let r = markers.binary_search(m).unwrap_or_default();
                region_sizes[r] += size;
                r
            })
            .collect();
        RegionMap {
            markers,
            cell_region,
            region_sizes,
        }
    }

    /// Number of regions.
    pub fn region_count(&self) -> usize {
        self.markers.len()
    }

    /// Sorted distinct markers.
    pub fn markers(&self) -> &[i32] {
        &self.markers
    }

    /// Region parameter index of every cell.
    pub fn cell_regions(&self) -> &[usize] {
        &self.cell_region
    }

    /// Total area of every region.
    pub fn region_sizes(&self) -> &[f64] {
        &self.region_sizes
    }
}

/// How a model vector maps onto cells.
#[derive(Debug, Clone)]
pub enum Parameterization {
    /// One value per cell.
    ByCell {
        /// Number of cells.
        cells: usize,
        /// Number of distinct markers, kept for error reports.
        regions: usize,
    },
    /// One value per region, broadcast to the region's cells.
    ByRegion(RegionMap),
}

impl Parameterization {
    /// Pick the parameterization matching a model of length `len`.
    ///
    /// The cell count is tried first, so a mesh with one region per cell is
    /// treated as a per-cell model.
    ///
    /// # Errors
    /// Returns [`TravelTimeError::InvalidParameterization`] if `len` matches
    /// neither the cell count nor the number of regions.
    pub fn resolve(mesh: &TriMesh, len: usize) -> Result<Self> {
        if len == mesh.cell_count() {
            return Ok(Parameterization::ByCell {
                cells: mesh.cell_count(),
                regions: mesh.region_markers().len(),
            });
        }
        let regions = RegionMap::new(mesh);
        if len == regions.region_count() {
            return Ok(Parameterization::ByRegion(regions));
        }
        Err(TravelTimeError::InvalidParameterization {
            cells: mesh.cell_count(),
            regions: regions.region_count(),
            got: len,
        })
    }

    /// Number of model parameters.
    pub fn parameter_count(&self) -> usize {
        match self {
            Parameterization::ByCell { cells, .. } => *cells,
            Parameterization::ByRegion(map) => map.region_count(),
        }
    }

    /// Per-cell slowness for `model`.
    ///
    /// # Errors
    /// Returns an error if the length is wrong or a value is not positive and
    /// finite.
    pub fn expand(&self, model: &[f64]) -> Result<Vec<f64>> {
        if model.len() != self.parameter_count() {
            let (cells, regions) = match self {
                Parameterization::ByCell { cells, regions } => (*cells, *regions),
                Parameterization::ByRegion(map) => (map.cell_regions().len(), map.region_count()),
            };
            return Err(TravelTimeError::InvalidParameterization {
                cells,
                regions,
                got: model.len(),
            });
        }
        if let Some((index, &value)) = model
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(TravelTimeError::InvalidSlowness { index, value });
        }
        Ok(match self {
            Parameterization::ByCell { .. } => model.to_vec(),
            Parameterization::ByRegion(map) => {
                map.cell_regions().iter().map(|&r| model[r]).collect()
            }
        })
    }

    /// Sum per-cell values into per-parameter values.
    pub fn aggregate(&self, per_cell: &[f64]) -> Vec<f64> {
        match self {
            Parameterization::ByCell { .. } => per_cell.to_vec(),
            Parameterization::ByRegion(map) => {
                let mut out = vec![0.0; map.region_count()];
                for (&r, &v) in map.cell_regions().iter().zip(per_cell) {
                    out[r] += v;
                }
                out
            }
        }
    }

    /// Size of every parameter: cell areas, or summed region areas.
    pub fn parameter_sizes(&self, mesh: &TriMesh) -> Vec<f64> {
        match self {
            Parameterization::ByCell { .. } => mesh.cell_sizes().to_vec(),
            Parameterization::ByRegion(map) => map.region_sizes().to_vec(),
        }
    }
}
