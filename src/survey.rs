// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Result, TravelTimeError};
use crate::mesh::Point;

/// Sensor layout and the `(shot, geophone)` pairs that were observed.
///
/// Every sensor can act as a source; the observations index into the sensor
/// list.
#[derive(Debug, Clone)]
pub struct Survey {
    sensors: Vec<Point>,
    observations: Vec<(usize, usize)>,
}

impl Survey {
    /// Create a survey.
    ///
    /// # Errors
    /// Returns an error if a sensor position is not finite or an observation
    /// references a missing sensor.
    pub fn new(sensors: Vec<Point>, observations: Vec<(usize, usize)>) -> Result<Self> {
        if let Some(sensor) = sensors
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(TravelTimeError::InvalidSensorPosition { sensor });
        }
        let sensor_count = sensors.len();
        for (observation, &(s, g)) in observations.iter().enumerate() {
            for sensor in [s, g] {
                if sensor >= sensor_count {
                    return Err(TravelTimeError::InvalidSensorIndex {
                        observation,
                        sensor,
                        sensor_count,
                    });
                }
            }
        }
        Ok(Survey {
            sensors,
            observations,
        })
    }

    /// Number of sensors.
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Number of observations.
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// Position of one sensor.
    pub fn sensor_position(&self, sensor: usize) -> Point {
        self.sensors[sensor]
    }

    /// All sensor positions.
    pub fn sensor_positions(&self) -> &[Point] {
        &self.sensors
    }

    /// Observed `(shot, geophone)` pairs.
    pub fn observations(&self) -> &[(usize, usize)] {
        &self.observations
    }

    /// Distinct shot sensors, ascending.
    pub fn shot_indices(&self) -> Vec<usize> {
        let mut shots: Vec<usize> = self.observations.iter().map(|&(s, _)| s).collect();
        shots.sort_unstable();
        shots.dedup();
        shots
    }

    /// Sensors never used as a shot, ascending.
    pub fn others(&self) -> Vec<usize> {
        let mut is_shot = vec![false; self.sensors.len()];
        for &(s, _) in &self.observations {
            is_shot[s] = true;
        }
        (0..self.sensors.len()).filter(|&i| !is_shot[i]).collect()
    }
}
