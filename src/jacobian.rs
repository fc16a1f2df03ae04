// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! For a shot `s` and geophone `g` with travel time `tsr`, the detour time of
//! a cell is `dt = T_s(cell) + T_g(cell) - tsr`. Cells within the first
//! Fresnel volume of frequency `f` get weight `max(1 - 2 f dt, 0)`, scaled by
//! the cell area and normalised so the kernel integrates to `tsr` against the
//! slowness.

use ndarray::{Array1, ArrayView1, Zip};

/// Area-weighted Fresnel weights `max(1 - 2 f dt, 0) * size` of every cell.
///
/// Cells with a non-finite detour time get zero weight.
pub fn fresnel_weights(
    frequency: f64,
    tsr: f64,
    shot_times: ArrayView1<f64>,
    geophone_times: ArrayView1<f64>,
    cell_sizes: ArrayView1<f64>,
) -> Array1<f64> {
    Zip::from(&shot_times)
        .and(&geophone_times)
        .and(&cell_sizes)
        .map_collect(|&ts, &tg, &size| {
            let dt = ts + tg - tsr;
            let w = 1.0 - 2.0 * frequency * dt;
            if w.is_finite() && w > 0.0 {
                w * size
            } else {
                0.0
            }
        })
}

/// Per-cell fat-ray kernel `wa / Σwa * tsr / slowness`.
///
/// Returns `None` when no cell carries weight, so callers never divide by zero.
pub fn fat_ray_kernel(
    frequency: f64,
    tsr: f64,
    shot_times: ArrayView1<f64>,
    geophone_times: ArrayView1<f64>,
    cell_sizes: ArrayView1<f64>,
    slowness: ArrayView1<f64>,
) -> Option<Array1<f64>> {
    let wa = fresnel_weights(frequency, tsr, shot_times, geophone_times, cell_sizes);
    let total = wa.sum();
    if total <= 0.0 || !total.is_finite() || !tsr.is_finite() {
        return None;
    }
    let scale = tsr / total;
    Some(Zip::from(&wa).and(&slowness).map_collect(|&w, &s| w * scale / s))
}
