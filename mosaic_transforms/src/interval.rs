// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interval layout engine: one-dimensional midpoint-rule partitioning.

use alloc::vec::Vec;

use mosaic_core::Dataset;

use crate::abs_f64;
use crate::binning::{Bins, bin_by_key};
use crate::voronoi::VoronoiError;

/// A closed numeric interval bounding one axis.
///
/// Endpoints keep the order they were configured with; a reversed extent
/// (`lo > hi`) is valid and lays out intervals in decreasing order. Containment
/// is order-insensitive.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extent {
    /// The endpoint the first interval starts at.
    pub lo: f64,
    /// The endpoint the last interval ends at.
    pub hi: f64,
}

impl Extent {
    /// Create an extent from its endpoints, in configured order.
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Return whether `v` lies within the closed interval spanned by the
    /// endpoints, regardless of their order. NaN is never contained.
    pub fn contains(self, v: f64) -> bool {
        v >= self.min() && v <= self.max()
    }

    /// Return the numerically smaller endpoint.
    pub fn min(self) -> f64 {
        self.lo.min(self.hi)
    }

    /// Return the numerically larger endpoint.
    pub fn max(self) -> f64 {
        self.lo.max(self.hi)
    }

    /// Return the non-negative width of the extent.
    pub fn span(self) -> f64 {
        abs_f64(self.hi - self.lo)
    }
}

/// One computed interval: a start location and a non-negative size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Span {
    /// Where the interval starts (the `lo`-side boundary).
    pub start: f64,
    /// The interval's width, always non-negative.
    pub size: f64,
}

/// Compute the midpoint-rule partition of `extent` for sorted distinct `keys`.
///
/// The i-th interval runs from the midpoint with the previous key to the midpoint
/// with the next key; the first and last intervals are pinned to the extent
/// endpoints. This is the one-dimensional analogue of a Voronoi diagram: each
/// interval is exactly the set of points closer to its key than to any neighbor,
/// clipped to the extent. With no keys the partition is empty; with one key it is
/// the whole extent.
pub fn spans(keys: &[f64], extent: Extent) -> Vec<Span> {
    let n = keys.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = if i == 0 {
            extent.lo
        } else {
            keys[i - 1] + (keys[i] - keys[i - 1]) / 2.0
        };
        let end = if i == n - 1 {
            extent.hi
        } else {
            keys[i] + (keys[i + 1] - keys[i]) / 2.0
        };
        out.push(Span {
            start,
            size: abs_f64(end - start),
        });
    }
    out
}

/// Lay out `indices` along one axis, writing `location`/`size` onto every record.
///
/// Records are binned by `field`; each bin's members receive that key's
/// midpoint-rule interval, and excluded records (key outside `extent`) have both
/// output fields explicitly unset so no stale value survives. All key reads
/// happen before the first write, so a malformed accessor fails without mutating
/// anything. Returns the bins so callers can reuse the grouping.
pub fn layout(
    data: &mut Dataset,
    indices: &[usize],
    field: &str,
    extent: Extent,
    location: &str,
    size: &str,
) -> Result<Bins, VoronoiError> {
    let bins = bin_by_key(data, indices, field, extent)?;
    let spans = spans(&bins.keys, extent);

    let tuples = data.tuples_mut();
    for (group, span) in bins.groups.iter().zip(&spans) {
        for &i in group {
            tuples[i].set(location, span.start);
            tuples[i].set(size, span.size);
        }
    }
    for &i in &bins.excluded {
        tuples[i].clear(location);
        tuples[i].clear(size);
    }

    Ok(bins)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec::Vec;

    use super::*;

    fn assert_close(a: f64, b: f64) {
        let d = abs_f64(a - b);
        assert!(d < 1.0e-9, "expected {b}, got {a} (|Δ|={d})");
    }

    #[test]
    fn midpoint_rule_matches_worked_example() {
        // Keys 1, 2, 4 in [0, 5]:
        //   1 -> [0, 1.5)   size 1.5
        //   2 -> [1.5, 3)   size 1.5
        //   4 -> [3, 5]     size 2
        let s = spans(&[1.0, 2.0, 4.0], Extent::new(0.0, 5.0));
        assert_eq!(
            s,
            [
                Span { start: 0.0, size: 1.5 },
                Span { start: 1.5, size: 1.5 },
                Span { start: 3.0, size: 2.0 },
            ]
        );
    }

    #[test]
    fn single_key_spans_the_whole_extent() {
        let s = spans(&[3.0], Extent::new(0.0, 5.0));
        assert_eq!(s, [Span { start: 0.0, size: 5.0 }]);
    }

    #[test]
    fn no_keys_produce_no_spans() {
        assert!(spans(&[], Extent::new(0.0, 5.0)).is_empty());
    }

    #[test]
    fn spans_tile_the_extent_without_gap_or_overlap() {
        let extent = Extent::new(-2.0, 11.0);
        let keys = [-1.5, 0.25, 0.5, 3.0, 10.0];
        let s = spans(&keys, extent);

        // Contiguous: each interval starts where the previous one ended.
        let mut cursor = extent.lo;
        for span in &s {
            assert_close(span.start, cursor);
            assert!(span.size >= 0.0, "sizes are non-negative");
            cursor = span.start + span.size;
        }
        assert_close(cursor, extent.hi);

        // Total coverage equals the extent span.
        let total: f64 = s.iter().map(|s| s.size).sum();
        assert_close(total, extent.span());
    }

    #[test]
    fn reversed_extent_yields_non_negative_sizes() {
        let s = spans(&[1.0, 2.0, 4.0], Extent::new(5.0, 0.0));
        // First interval runs from 5 down to 1.5.
        assert_close(s[0].start, 5.0);
        assert_close(s[0].size, 3.5);
        for span in &s {
            assert!(span.size >= 0.0, "sizes are non-negative");
        }
    }

    #[test]
    fn degenerate_extent_collapses_to_zero_size() {
        let s = spans(&[2.0], Extent::new(2.0, 2.0));
        assert_eq!(s, [Span { start: 2.0, size: 0.0 }]);
    }

    #[test]
    fn layout_writes_shared_intervals_per_key() {
        let mut data = Dataset::new();
        for x in [1.0, 2.0, 4.0, 2.0] {
            data.insert().set("x", x);
        }
        let all: Vec<usize> = (0..data.len()).collect();

        let bins = layout(&mut data, &all, "x", Extent::new(0.0, 5.0), "lx", "lw").unwrap();
        assert_eq!(bins.len(), 3);

        let t = data.tuples();
        assert_eq!(t[0].f64("lx"), Some(0.0));
        assert_eq!(t[0].f64("lw"), Some(1.5));
        // Records sharing key 2 receive the identical interval.
        assert_eq!(t[1].f64("lx"), t[3].f64("lx"));
        assert_eq!(t[1].f64("lw"), t[3].f64("lw"));
        assert_eq!(t[1].f64("lx"), Some(1.5));
        assert_eq!(t[2].f64("lx"), Some(3.0));
        assert_eq!(t[2].f64("lw"), Some(2.0));
    }

    #[test]
    fn layout_clears_stale_fields_on_excluded_records() {
        let mut data = Dataset::new();
        let t = data.insert();
        t.set("x", 10.0);
        // Stale output from an earlier run.
        t.set("lx", 3.0);
        t.set("lw", 2.0);

        layout(&mut data, &[0], "x", Extent::new(0.0, 5.0), "lx", "lw").unwrap();

        let t = &data.tuples()[0];
        assert!(!t.contains("lx"));
        assert!(!t.contains("lw"));
    }

    #[test]
    fn layout_fails_without_mutating_on_bad_accessor() {
        let mut data = Dataset::new();
        data.insert().set("x", 1.0);
        data.insert().set("x", "bad");
        for t in data.tuples_mut() {
            let _ = t.take_dirty();
        }
        let all: Vec<usize> = (0..data.len()).collect();

        let err = layout(&mut data, &all, "x", Extent::new(0.0, 5.0), "lx", "lw").unwrap_err();
        assert!(matches!(err, VoronoiError::FieldNotNumeric { .. }));
        assert!(!data.tuples()[0].contains("lx"));
        assert!(data.tuples()[0].dirty().is_empty());
    }
}
