// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box-Voronoi transform: two-pass axis-aligned Voronoi approximation.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;
use mosaic_core::{BatchTransform, Dataset, FieldSet, Tuple, TupleId};

use crate::interval::{Extent, layout};

/// Errors returned when a box-Voronoi configuration cannot be executed.
///
/// These are configuration errors; degenerate geometry (zero-width extents, a
/// single distinct key) is handled as valid output, not as an error. All
/// errors are raised before any tuple is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoronoiError {
    /// The bin axis cannot be resolved: no accessor is configured for it
    /// (neither `x` nor `y` is set, or the explicitly chosen axis has none).
    MissingAxis,
    /// A configured accessor referenced a missing or non-numeric field.
    FieldNotNumeric {
        /// The field the accessor referenced.
        field: String,
        /// The first tuple the accessor failed on.
        tuple: TupleId,
    },
}

/// One of the two layout axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The horizontal axis.
    X,
    /// The vertical axis.
    Y,
}

impl Axis {
    /// Return the orthogonal axis.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Output field names for the four produced values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFields {
    /// Location field on the x axis.
    pub x: String,
    /// Location field on the y axis.
    pub y: String,
    /// Size field on the x axis.
    pub width: String,
    /// Size field on the y axis.
    pub height: String,
}

impl Default for OutputFields {
    fn default() -> Self {
        Self {
            x: String::from("layout_x"),
            y: String::from("layout_y"),
            width: String::from("layout_width"),
            height: String::from("layout_height"),
        }
    }
}

/// Configuration for a [`BoxVoronoi`] transform, resolved once per recomputation.
///
/// At least one of `x`/`y` must name an accessor field for the transform to be
/// executable. `bin` picks which axis is partitioned first; when unset it
/// defaults to `x` if an `x` accessor is configured, else `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxVoronoiParams {
    /// Field holding each record's x coordinate, if any.
    pub x: Option<String>,
    /// Field holding each record's y coordinate, if any.
    pub y: Option<String>,
    /// Explicit choice of primary (bin) axis.
    pub bin: Option<Axis>,
    /// Clip rectangle bounding both axes; keys outside are excluded from output.
    pub clip_extent: Rect,
    /// Names of the four produced fields.
    pub output: OutputFields,
}

impl Default for BoxVoronoiParams {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            bin: None,
            clip_extent: Rect::new(-1.0e5, -1.0e5, 1.0e5, 1.0e5),
            output: OutputFields::default(),
        }
    }
}

impl BoxVoronoiParams {
    fn accessor(&self, axis: Axis) -> Option<&str> {
        match axis {
            Axis::X => self.x.as_deref(),
            Axis::Y => self.y.as_deref(),
        }
    }

    fn channels(&self, axis: Axis) -> AxisChannels<'_> {
        match axis {
            Axis::X => AxisChannels {
                location: &self.output.x,
                size: &self.output.width,
                extent: Extent::new(self.clip_extent.x0, self.clip_extent.x1),
            },
            Axis::Y => AxisChannels {
                location: &self.output.y,
                size: &self.output.height,
                extent: Extent::new(self.clip_extent.y0, self.clip_extent.y1),
            },
        }
    }
}

/// Output fields and extent slice for one axis.
#[derive(Debug, Copy, Clone)]
struct AxisChannels<'a> {
    location: &'a str,
    size: &'a str,
    extent: Extent,
}

/// The box-Voronoi transform.
///
/// Assigns every in-extent record a rectangle: the bin axis is partitioned over
/// the whole dataset by the midpoint rule, then the orthogonal (split) axis is
/// partitioned independently within each bin, or spans the bin's full extent
/// when no split accessor is configured. Because partition boundaries depend on
/// every record's neighbors, the transform recomputes globally; it participates
/// in changeset propagation through its [`BatchTransform`] impl.
#[derive(Debug, Clone)]
pub struct BoxVoronoi {
    params: BoxVoronoiParams,
}

impl BoxVoronoi {
    /// Create a transform from its configuration.
    pub fn new(params: BoxVoronoiParams) -> Self {
        Self { params }
    }

    /// Return the transform's configuration.
    pub fn params(&self) -> &BoxVoronoiParams {
        &self.params
    }

    /// Recompute the layout over the full dataset.
    ///
    /// On success every in-extent tuple carries the four output fields and every
    /// out-of-extent tuple has them explicitly unset; the returned set names the
    /// four (remapped) output fields, reported conservatively whether or not any
    /// individual value changed. On error nothing has been mutated.
    pub fn execute(&self, data: &mut Dataset) -> Result<FieldSet, VoronoiError> {
        let p = &self.params;
        let bin_axis = match p.bin {
            Some(axis) => axis,
            None if p.x.is_some() => Axis::X,
            None => Axis::Y,
        };
        let bin_field = p.accessor(bin_axis).ok_or(VoronoiError::MissingAxis)?;
        let split_field = p.accessor(bin_axis.other());
        let bin = p.channels(bin_axis);
        let split = p.channels(bin_axis.other());

        // Fail before mutating: the bin accessor is invoked on every tuple; the
        // split accessor only on tuples a per-bin pass will visit, so a
        // bin-excluded tuple may lack the split field entirely.
        for tuple in data.tuples() {
            let Some(key) = tuple.f64(bin_field) else {
                return Err(VoronoiError::FieldNotNumeric {
                    field: String::from(bin_field),
                    tuple: tuple.id(),
                });
            };
            if bin.extent.contains(key) {
                if let Some(field) = split_field {
                    require_numeric(tuple, field)?;
                }
            }
        }

        let all: Vec<usize> = (0..data.len()).collect();
        let bins = layout(data, &all, bin_field, bin.extent, bin.location, bin.size)?;

        for group in &bins.groups {
            match split_field {
                Some(field) => {
                    layout(data, group, field, split.extent, split.location, split.size)?;
                }
                None => {
                    // Nothing to partition further: every member spans the bin's
                    // full orthogonal extent.
                    let start = split.extent.min();
                    let span = split.extent.span();
                    let tuples = data.tuples_mut();
                    for &i in group {
                        tuples[i].set(split.location, start);
                        tuples[i].set(split.size, span);
                    }
                }
            }
        }

        // Bin-excluded tuples never reach a split pass; unset their split-axis
        // fields too so all four outputs are cleared, not stale.
        let tuples = data.tuples_mut();
        for &i in &bins.excluded {
            tuples[i].clear(split.location);
            tuples[i].clear(split.size);
        }

        Ok([
            p.output.x.as_str(),
            &p.output.y,
            &p.output.width,
            &p.output.height,
        ]
        .into_iter()
        .collect())
    }
}

impl BatchTransform for BoxVoronoi {
    type Error = VoronoiError;

    fn batch(&self, data: &mut Dataset) -> Result<FieldSet, VoronoiError> {
        self.execute(data)
    }
}

fn require_numeric(tuple: &Tuple, field: &str) -> Result<(), VoronoiError> {
    if tuple.f64(field).is_some() {
        Ok(())
    } else {
        Err(VoronoiError::FieldNotNumeric {
            field: String::from(field),
            tuple: tuple.id(),
        })
    }
}
