// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `mosaic_transforms`: box-Voronoi layout over Mosaic datasets.
//!
//! This crate provides:
//! - a keyed binner grouping records by exact numeric key ([`bin_by_key`])
//! - a one-dimensional midpoint-rule interval layout ([`spans`]/[`layout`])
//! - the box-Voronoi transform orchestrating both axes ([`BoxVoronoi`])
//!
//! A box-Voronoi layout is the axis-aligned approximation of a Voronoi diagram:
//! each axis is partitioned independently, with neighboring distinct keys meeting
//! at their midpoint, so every record receives a rectangle instead of a polygon.
//! Because every rectangle edge depends on the record's neighbors, the transform
//! recomputes over the entire dataset on any upstream change; it plugs into a
//! dataflow engine through [`mosaic_core::BatchTransform`].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod binning;
pub mod interval;
pub mod voronoi;

pub use binning::{Bins, bin_by_key};
pub use interval::{Extent, Span, layout, spans};
pub use voronoi::{Axis, BoxVoronoi, BoxVoronoiParams, OutputFields, VoronoiError};

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("mosaic_transforms requires either the `std` or `libm` feature for floating-point math");

pub(crate) fn abs_f64(x: f64) -> f64 {
    #[cfg(feature = "std")]
    {
        x.abs()
    }
    #[cfg(all(not(feature = "std"), feature = "libm"))]
    {
        libm::fabs(x)
    }
    #[cfg(all(not(feature = "std"), not(feature = "libm")))]
    {
        let _ = x;
        unreachable!("compile_error should have prevented this configuration")
    }
}
