// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use tracing::{debug, warn};

use crate::error::{Result, TravelTimeError};
use crate::interpolate::NodeInterpolator;
use crate::march::Front;
use crate::mesh::{Point, TriMesh};

/// A sensor acting as point source.
#[derive(Debug, Clone, Copy)]
pub struct Source {
    /// Sensor index in the survey.
    pub sensor: usize,
    /// Source position.
    pub position: Point,
}

/// Output of one single-source run.
#[derive(Debug, Clone)]
pub struct SourceRows {
    /// Travel time at every sensor.
    pub sensor_times: Vec<f64>,
    /// Travel time at every cell center.
    pub cell_times: Vec<f64>,
    /// Number of front advances performed.
    pub steps: usize,
}

/// March the full node field for `source`.
///
/// Returns the node times (`+∞` where the front never arrived) and the
/// number of advances.
///
/// # Errors
/// Returns [`TravelTimeError::SourceOutsideMesh`] if no cell contains the
/// source, or propagates a stalled front.
pub fn travel_time_field(
    mesh: &TriMesh,
    slowness: &[f64],
    source: Source,
) -> Result<(Vec<f64>, usize)> {
    let cell = mesh
        .find_cell(source.position)
        .ok_or(TravelTimeError::SourceOutsideMesh {
            sensor: source.sensor,
            position: source.position,
        })?;

    let mut front = Front::new(mesh, slowness)?;
    front.seed_point_source(cell, source.position);
    let steps = front.march()?;

    let times = front.into_times();
    let unreached = times.iter().filter(|t| t.is_infinite()).count();
    if unreached > 0 {
        warn!(
            sensor = source.sensor,
            unreached, "front did not reach every node"
        );
    }
    debug!(sensor = source.sensor, cell, steps, "source marched");
    Ok((times, steps))
}

/// Run one source and sample its field at the sensors and cell centers.
///
/// # Errors
/// Propagates marching and interpolation errors unchanged.
pub fn run_source(
    mesh: &TriMesh,
    slowness: &[f64],
    sensors: &[Point],
    interpolator: &dyn NodeInterpolator,
    source: Source,
) -> Result<SourceRows> {
    let (times, steps) = travel_time_field(mesh, slowness, source)?;
    let sensor_times = interpolator.interpolate(mesh, &times, sensors)?;
    let cell_times = interpolator.interpolate_cell_centers(mesh, &times)?;
    Ok(SourceRows {
        sensor_times,
        cell_times,
        steps,
    })
}
