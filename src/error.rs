// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur during mesh setup, model mapping, or travel-time modelling.
#[derive(Debug)]
pub enum TravelTimeError {
    /// Mesh has no nodes or no cells.
    EmptyMesh,
    /// A cell references a node index that does not exist.
    InvalidNodeIndex {
        /// The cell holding the reference.
        cell: usize,
        /// The out-of-range node index.
        node: usize,
        /// Number of nodes in the mesh.
        node_count: usize,
    },
    /// A cell has (near) zero area or repeats a node.
    DegenerateCell {
        /// The cell index.
        cell: usize,
        /// The signed area computed for the cell.
        area: f64,
    },
    /// An edge is shared by more than two cells.
    NonManifoldEdge {
        /// First node of the edge.
        a: usize,
        /// Second node of the edge.
        b: usize,
    },
    /// Grid axis coordinates are too short or not strictly increasing.
    InvalidGridAxis {
        /// The axis index (0 = x, 1 = y).
        axis: usize,
        /// Explanation of why it's invalid.
        reason: String,
    },
    /// Marker vector length does not match the cell count.
    MarkerCountMismatch {
        /// Number of cells in the mesh.
        expected: usize,
        /// Number of markers supplied.
        got: usize,
    },
    /// Model length matches neither the cell count nor the region count.
    InvalidParameterization {
        /// Number of cells in the mesh.
        cells: usize,
        /// Number of distinct region markers.
        regions: usize,
        /// Number of model values supplied.
        got: usize,
    },
    /// Slowness value is not positive and finite.
    InvalidSlowness {
        /// The model index of the invalid value.
        index: usize,
        /// The invalid value.
        value: f64,
    },
    /// Sensor position is not finite.
    InvalidSensorPosition {
        /// The sensor index.
        sensor: usize,
    },
    /// An observation references a sensor that does not exist.
    InvalidSensorIndex {
        /// The observation index.
        observation: usize,
        /// The out-of-range sensor index.
        sensor: usize,
        /// Number of sensors in the survey.
        sensor_count: usize,
    },
    /// A source position lies outside every mesh cell.
    SourceOutsideMesh {
        /// The sensor used as source.
        sensor: usize,
        /// The source position.
        position: [f64; 2],
    },
    /// The interpolation service was asked for a position outside the mesh.
    InterpolationOutsideMesh {
        /// The query position.
        position: [f64; 2],
    },
    /// Node field length does not match the mesh node count.
    FieldLengthMismatch {
        /// Number of mesh nodes.
        expected: usize,
        /// Length of the supplied field.
        got: usize,
    },
    /// No trial node could be updated although the trial set is not empty.
    FrontStalled {
        /// Number of trial nodes left.
        trial: usize,
    },
    /// Fat-ray frequency is not positive and finite.
    InvalidFrequency(f64),
    /// Worker thread count is zero.
    InvalidThreadCount(usize),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for TravelTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelTimeError::EmptyMesh => write!(f, "mesh has no nodes or no cells"),
            TravelTimeError::InvalidNodeIndex {
                cell,
                node,
                node_count,
            } => {
                write!(
                    f,
                    "cell {} references node {} but the mesh has {} nodes",
                    cell, node, node_count
                )
            }
            TravelTimeError::DegenerateCell { cell, area } => {
                write!(f, "degenerate cell {}: area {}", cell, area)
            }
            TravelTimeError::NonManifoldEdge { a, b } => {
                write!(f, "edge ({}, {}) is shared by more than two cells", a, b)
            }
            TravelTimeError::InvalidGridAxis { axis, reason } => {
                write!(f, "invalid grid axis {}: {}", axis, reason)
            }
            TravelTimeError::MarkerCountMismatch { expected, got } => {
                write!(
                    f,
                    "marker count mismatch: expected {} cell markers, got {}",
                    expected, got
                )
            }
            TravelTimeError::InvalidParameterization {
                cells,
                regions,
                got,
            } => {
                write!(
                    f,
                    "wrong number of parameters: mesh has {} cells and {} regions, got {} slowness values",
                    cells, regions, got
                )
            }
            TravelTimeError::InvalidSlowness { index, value } => {
                write!(
                    f,
                    "invalid slowness at index {}: {} (must be positive and finite)",
                    index, value
                )
            }
            TravelTimeError::InvalidSensorPosition { sensor } => {
                write!(f, "sensor {} has a non-finite position", sensor)
            }
            TravelTimeError::InvalidSensorIndex {
                observation,
                sensor,
                sensor_count,
            } => {
                write!(
                    f,
                    "observation {} references sensor {} but the survey has {} sensors",
                    observation, sensor, sensor_count
                )
            }
            TravelTimeError::SourceOutsideMesh { sensor, position } => {
                write!(
                    f,
                    "source sensor {} at {:?} lies outside the mesh",
                    sensor, position
                )
            }
            TravelTimeError::InterpolationOutsideMesh { position } => {
                write!(f, "cannot interpolate at {:?}: outside the mesh", position)
            }
            TravelTimeError::FieldLengthMismatch { expected, got } => {
                write!(
                    f,
                    "node field length mismatch: expected {}, got {}",
                    expected, got
                )
            }
            TravelTimeError::FrontStalled { trial } => {
                write!(
                    f,
                    "front stalled: none of the {} trial nodes has a valid update",
                    trial
                )
            }
            TravelTimeError::InvalidFrequency(freq) => {
                write!(
                    f,
                    "invalid frequency: {} (must be positive and finite)",
                    freq
                )
            }
            TravelTimeError::InvalidThreadCount(n) => {
                write!(f, "invalid thread count: {} (must be >= 1)", n)
            }
            TravelTimeError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TravelTimeError {}

/// Convenience type alias for Results with TravelTimeError.
pub type Result<T> = std::result::Result<T, TravelTimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_parameterization() {
        let e = TravelTimeError::InvalidParameterization {
            cells: 50,
            regions: 3,
            got: 7,
        };
        assert_eq!(
            e.to_string(),
            "wrong number of parameters: mesh has 50 cells and 3 regions, got 7 slowness values"
        );
    }

    #[test]
    fn display_invalid_slowness() {
        let e = TravelTimeError::InvalidSlowness {
            index: 5,
            value: -0.5,
        };
        assert_eq!(
            e.to_string(),
            "invalid slowness at index 5: -0.5 (must be positive and finite)"
        );
    }

    #[test]
    fn display_source_outside_mesh() {
        let e = TravelTimeError::SourceOutsideMesh {
            sensor: 2,
            position: [10.0, -1.0],
        };
        assert_eq!(
            e.to_string(),
            "source sensor 2 at [10.0, -1.0] lies outside the mesh"
        );
    }

    #[test]
    fn display_front_stalled() {
        let e = TravelTimeError::FrontStalled { trial: 4 };
        assert_eq!(
            e.to_string(),
            "front stalled: none of the 4 trial nodes has a valid update"
        );
    }

    #[test]
    fn display_degenerate_cell() {
        let e = TravelTimeError::DegenerateCell { cell: 3, area: 0.0 };
        assert_eq!(e.to_string(), "degenerate cell 3: area 0");
    }

    #[test]
    fn display_invalid_frequency() {
        let e = TravelTimeError::InvalidFrequency(-1.0);
        assert_eq!(
            e.to_string(),
            "invalid frequency: -1 (must be positive and finite)"
        );
    }

    #[test]
    fn display_invalid_sensor_index() {
        let e = TravelTimeError::InvalidSensorIndex {
            observation: 1,
            sensor: 9,
            sensor_count: 4,
        };
        assert!(e.to_string().contains("sensor 9"));
        assert!(e.to_string().contains("4 sensors"));
    }
}
