// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! First-arrival travel times on unstructured triangle meshes using the Fast
//! Marching Method (FMM).
//!
//! A front is marched outward from a point source through a 2D medium whose
//! slowness is constant per triangle. Accepted nodes update their neighbours
//! either along a single edge or through a triangle whose two other corners
//! are already known. The resulting fields give the forward response of a
//! seismic refraction survey and a fat-ray sensitivity matrix for inversion.
//! Sources are independent and run in parallel on a rayon pool.

#![warn(missing_docs)]

/// Single-source travel-time engine.
pub mod engine;
/// Error types for the library.
pub mod error;
/// Node field evaluation at sensors and cell centers.
pub mod interpolate;
/// Fat-ray sensitivity kernels.
pub mod jacobian;
/// Front-tracking solver: one node accepted per advance.
pub mod march;
/// Triangle mesh with precomputed neighbour information.
pub mod mesh;
/// Forward response and Jacobian assembly over many sources.
pub mod modelling;
/// Mapping of model vectors to per-cell slowness.
pub mod parameter;
/// Sensors and observed shot/geophone pairs.
pub mod survey;
/// Edge and triangle update kernels.
pub mod update_kernels;

pub use crate::error::{Result, TravelTimeError};
pub use crate::interpolate::{LinearInterpolator, NodeInterpolator};
pub use crate::march::Front;
pub use crate::mesh::{Point, TriMesh};
pub use crate::modelling::{ProgressInfo, SourceSelection, TravelTimeFmm};
pub use crate::parameter::{Parameterization, RegionMap};
pub use crate::survey::Survey;
