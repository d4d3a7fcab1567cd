// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed binner: group records by exact numeric key.

use alloc::string::String;
use alloc::vec::Vec;

use mosaic_core::Dataset;

use crate::interval::Extent;
use crate::voronoi::VoronoiError;

/// The result of binning a set of records by a numeric key.
///
/// `keys[i]` is the i-th distinct in-extent key in ascending order, and
/// `groups[i]` holds the dataset indices of every record sharing that exact key.
/// `excluded` holds the indices of records whose key fell outside the extent
/// (including NaN keys, which are outside every extent).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bins {
    /// Distinct in-extent keys, sorted ascending.
    pub keys: Vec<f64>,
    /// Record indices per key, parallel to `keys`.
    pub groups: Vec<Vec<usize>>,
    /// Record indices whose key is outside the extent.
    pub excluded: Vec<usize>,
}

impl Bins {
    /// Return the number of distinct in-extent keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Return whether no record had an in-extent key.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Group `indices` into [`Bins`] by the exact numeric value of `field`.
///
/// Grouping is by exact numeric equality, not bucketing: two records share a bin
/// only when their keys compare equal (`-0.0` and `0.0` share one). Keys outside
/// `extent` go to [`Bins::excluded`]. A missing or non-numeric `field` on any
/// record is a configuration error; the function is otherwise pure and performs
/// no mutation.
pub fn bin_by_key(
    data: &Dataset,
    indices: &[usize],
    field: &str,
    extent: Extent,
) -> Result<Bins, VoronoiError> {
    let mut keyed: Vec<(f64, usize)> = Vec::with_capacity(indices.len());
    let mut excluded = Vec::new();

    for &i in indices {
        let tuple = &data.tuples()[i];
        let Some(key) = tuple.f64(field) else {
            return Err(VoronoiError::FieldNotNumeric {
                field: String::from(field),
                tuple: tuple.id(),
            });
        };
        if extent.contains(key) {
            keyed.push((key, i));
        } else {
            excluded.push(i);
        }
    }

    keyed.sort_by(|a, b| {
        cmp_f64_bits(a.0.to_bits(), b.0.to_bits()).then_with(|| a.1.cmp(&b.1))
    });

    let mut keys: Vec<f64> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (key, i) in keyed {
        match keys.last() {
            Some(&last) if last == key => {
                groups.last_mut().expect("parallel to keys").push(i);
            }
            _ => {
                keys.push(key);
                groups.push(Vec::from([i]));
            }
        }
    }

    Ok(Bins {
        keys,
        groups,
        excluded,
    })
}

fn cmp_f64_bits(a: u64, b: u64) -> core::cmp::Ordering {
    let a = f64::from_bits(a);
    let b = f64::from_bits(b);
    match a.partial_cmp(&b) {
        Some(ord) => ord,
        None => {
            // Sort NaNs last for deterministic ordering.
            if a.is_nan() && !b.is_nan() {
                core::cmp::Ordering::Greater
            } else if !a.is_nan() && b.is_nan() {
                core::cmp::Ordering::Less
            } else {
                core::cmp::Ordering::Equal
            }
        }
    }
}
