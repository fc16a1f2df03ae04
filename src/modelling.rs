// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::engine::{run_source, Source, SourceRows};
use crate::error::{Result, TravelTimeError};
use crate::interpolate::{LinearInterpolator, NodeInterpolator};
use crate::jacobian::fat_ray_kernel;
use crate::mesh::TriMesh;
use crate::parameter::{Parameterization, RegionMap};
use crate::survey::Survey;

/// Default fat-ray centre frequency in Hz.
pub const DEFAULT_FREQUENCY: f64 = 200.0;

/// Slowness of the default starting model (1000 m/s).
pub const DEFAULT_START_SLOWNESS: f64 = 0.001;

/// Progress information passed to the optional callback.
pub struct ProgressInfo {
    /// Number of sources finished so far in the current pass.
    pub sources_completed: usize,
    /// Number of sources in the current pass.
    pub sources_total: usize,
    /// Elapsed time since the pass started.
    pub elapsed: Duration,
}

/// Which sensors act as sources in a travel-time pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceSelection {
    /// Every sensor used as a shot in the observations.
    #[default]
    Shots,
    /// Every sensor never used as a shot (reciprocal pass).
    Others,
    /// Shots followed by others: every sensor gets a row.
    All,
}

/// Forward travel-time modelling and fat-ray Jacobian on a triangle mesh.
///
/// Each pass maps a slowness model onto the cells, runs one Fast Marching
/// front per selected source on a rayon pool, and writes the sampled fields
/// into the data matrix (`sensors × sensors`) and the time matrix
/// (`sensors × cells`). A row is owned by the source that produced it, so
/// results are identical for any thread count.
pub struct TravelTimeFmm {
    mesh: TriMesh,
    survey: Survey,
    frequency: f64,
    num_threads: Option<usize>,
    interpolator: Box<dyn NodeInterpolator>,
    progress_callback: Option<Box<dyn Fn(ProgressInfo) + Send + Sync>>,
    slowness: Vec<f64>,
    data_matrix: Array2<f64>,
    time_matrix: Array2<f64>,
}

impl TravelTimeFmm {
    /// Create a modeller for `survey` on `mesh` with linear interpolation and
    /// the default frequency.
    pub fn new(mesh: TriMesh, survey: Survey) -> Self {
        let sensors = survey.sensor_count();
        let cells = mesh.cell_count();
        TravelTimeFmm {
            mesh,
            survey,
            frequency: DEFAULT_FREQUENCY,
            num_threads: None,
            interpolator: Box::new(LinearInterpolator),
            progress_callback: None,
            slowness: Vec::new(),
            data_matrix: Array2::zeros((sensors, sensors)),
            time_matrix: Array2::zeros((sensors, cells)),
        }
    }

    /// Set the fat-ray centre frequency in Hz (builder method). Default is 200.
    ///
    /// # Errors
    /// Returns an error if the frequency is not positive and finite.
    pub fn with_frequency(mut self, frequency: f64) -> Result<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(TravelTimeError::InvalidFrequency(frequency));
        }
        self.frequency = frequency;
        Ok(self)
    }

    /// Set the number of worker threads (builder method).
    /// If not specified, defaults to the number of available CPU cores.
    ///
    /// # Errors
    /// Returns an error if `threads` is zero.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(TravelTimeError::InvalidThreadCount(threads));
        }
        self.num_threads = Some(threads);
        Ok(self)
    }

    /// Replace the node field interpolator (builder method).
    pub fn with_interpolator(mut self, interpolator: Box<dyn NodeInterpolator>) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Set a progress callback invoked after every finished source (builder method).
    /// The callback runs on worker threads.
    pub fn with_progress(mut self, callback: Box<dyn Fn(ProgressInfo) + Send + Sync>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The mesh.
    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    /// The survey.
    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    /// Fat-ray centre frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Per-cell slowness of the last pass; empty before the first one.
    pub fn slowness(&self) -> &[f64] {
        &self.slowness
    }

    /// Travel time from source sensor (row) to sensor (column).
    pub fn data_matrix(&self) -> &Array2<f64> {
        &self.data_matrix
    }

    /// Travel time from source sensor (row) to every cell center (column).
    pub fn time_matrix(&self) -> &Array2<f64> {
        &self.time_matrix
    }

    /// Replace the survey and reset both matrices.
    pub fn set_survey(&mut self, survey: Survey) {
        self.survey = survey;
        self.prepare_matrices();
    }

    /// Replace the mesh, reset both matrices and forget the last slowness.
    pub fn set_mesh(&mut self, mesh: TriMesh) {
        self.mesh = mesh;
        self.slowness.clear();
        self.prepare_matrices();
    }

    fn prepare_matrices(&mut self) {
        let sensors = self.survey.sensor_count();
        self.data_matrix = Array2::zeros((sensors, sensors));
        self.time_matrix = Array2::zeros((sensors, self.mesh.cell_count()));
    }

    fn get_num_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    fn sources(&self, selection: SourceSelection) -> Vec<usize> {
        match selection {
            SourceSelection::Shots => self.survey.shot_indices(),
            SourceSelection::Others => self.survey.others(),
            SourceSelection::All => {
                let mut all = self.survey.shot_indices();
                all.extend(self.survey.others());
                all
            }
        }
    }

    /// Compute travel times for every selected source under `model`.
    ///
    /// `model` holds either one slowness per cell or one per region marker
    /// (markers in ascending order). Rows of the data and time matrices that
    /// belong to sources outside the selection keep their previous values.
    ///
    /// # Errors
    /// Returns an error if the model length fits neither parameterization, a
    /// slowness is not positive and finite, a source lies outside the mesh,
    /// or interpolation fails.
    pub fn compute_travel_times(&mut self, model: &[f64], selection: SourceSelection) -> Result<()> {
        self.run_pass(model, selection).map(|_| ())
    }

    fn run_pass(&mut self, model: &[f64], selection: SourceSelection) -> Result<Parameterization> {
        let param = Parameterization::resolve(&self.mesh, model.len())?;
        self.slowness = param.expand(model)?;

        let sources = self.sources(selection);
        let num_threads = self.get_num_threads();
        info!(
            sources = sources.len(),
            ?selection,
            threads = num_threads,
            parameters = param.parameter_count(),
            "computing travel times"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| TravelTimeError::Other(e.to_string()))?;

        let start_time = Instant::now();
        let completed = AtomicUsize::new(0);
        let sources_total = sources.len();
        let mesh = &self.mesh;
        let slowness = self.slowness.as_slice();
        let sensors = self.survey.sensor_positions();
        let interpolator = &*self.interpolator;
        let progress = self.progress_callback.as_deref();

        let rows: Vec<(usize, SourceRows)> = pool.install(|| {
            sources
                .par_iter()
                .map(|&sensor| -> Result<(usize, SourceRows)> {
                    let source = Source {
                        sensor,
                        position: sensors[sensor],
                    };
                    let rows = run_source(mesh, slowness, sensors, interpolator, source)?;
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(cb) = progress {
                        cb(ProgressInfo {
                            sources_completed: done,
                            sources_total,
                            elapsed: start_time.elapsed(),
                        });
                    }
                    Ok((sensor, rows))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut steps = 0;
        for (sensor, r) in rows {
            self.data_matrix
                .row_mut(sensor)
                .assign(&Array1::from(r.sensor_times));
            self.time_matrix
                .row_mut(sensor)
                .assign(&Array1::from(r.cell_times));
            steps += r.steps;
        }
        info!(
            sources = sources_total,
            steps,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "travel times done"
        );
        Ok(param)
    }

    /// Forward response: one travel time per observation.
    ///
    /// Runs the shot pass and reads `data_matrix[shot][geophone]`.
    ///
    /// # Errors
    /// Propagates the errors of [`TravelTimeFmm::compute_travel_times`].
    pub fn response(&mut self, model: &[f64]) -> Result<Array1<f64>> {
        self.run_pass(model, SourceSelection::Shots)?;
        Ok(self
            .survey
            .observations()
            .iter()
            .map(|&(s, g)| self.data_matrix[[s, g]])
            .collect())
    }

    /// Fat-ray Jacobian: one row per observation, one column per model parameter.
    ///
    /// Every sensor is used as a source so both ends of each ray have a time
    /// row. Rows without any weighted cell are left at zero.
    ///
    /// # Errors
    /// Propagates the errors of [`TravelTimeFmm::compute_travel_times`].
    pub fn create_jacobian(&mut self, model: &[f64]) -> Result<Array2<f64>> {
        let param = self.run_pass(model, SourceSelection::All)?;

        let observations = self.survey.observations();
        let sizes = Array1::from(self.mesh.cell_sizes().to_vec());
        let slowness = Array1::from(self.slowness.clone());
        let mut jacobian = Array2::zeros((observations.len(), param.parameter_count()));
        let mut empty_rows = 0;

        for (i, &(s, g)) in observations.iter().enumerate() {
            let tsr = self.data_matrix[[s, g]];
            match fat_ray_kernel(
                self.frequency,
                tsr,
                self.time_matrix.row(s),
                self.time_matrix.row(g),
                sizes.view(),
                slowness.view(),
            ) {
                Some(kernel) => {
                    let row = param.aggregate(&kernel.to_vec());
                    jacobian.row_mut(i).assign(&Array1::from(row));
                }
                None => {
                    empty_rows += 1;
                    warn!(
                        observation = i,
                        shot = s,
                        geophone = g,
                        tsr,
                        "no cell inside the fat ray, sensitivity row set to zero"
                    );
                }
            }
        }
        debug!(
            rows = observations.len(),
            columns = param.parameter_count(),
            empty_rows,
            frequency = self.frequency,
            "jacobian assembled"
        );
        Ok(jacobian)
    }

    /// Uniform starting model of [`DEFAULT_START_SLOWNESS`], one value per region.
    pub fn create_default_start_model(&self) -> Vec<f64> {
        vec![DEFAULT_START_SLOWNESS; RegionMap::new(&self.mesh).region_count()]
    }

    /// Ray coverage: column sums of `jacobian` divided by the parameter sizes.
    ///
    /// # Errors
    /// Returns an error if the column count fits neither parameterization.
    pub fn coverage(&self, jacobian: &Array2<f64>) -> Result<Array1<f64>> {
        let param = Parameterization::resolve(&self.mesh, jacobian.ncols())?;
        let sizes = Array1::from(param.parameter_sizes(&self.mesh));
        Ok(jacobian.sum_axis(Axis(0)) / sizes)
    }
}
