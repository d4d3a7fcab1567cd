// Copyright 2026 the Mosaic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `mosaic_core`: tuple store and changeset protocol for the Mosaic dataflow runtime.
//!
//! This crate provides:
//! - named mutable record fields with per-field dirty tracking ([`Tuple`]/[`Value`])
//! - an ordered, owner-managed record collection ([`Dataset`])
//! - a small field-name set for modified-field reporting ([`FieldSet`])
//! - the changeset exchanged between dataflow nodes ([`Changeset`]/[`Delta`])
//! - the batch-recompute contract for transforms whose outputs are globally
//!   interdependent across records ([`BatchTransform`])
//!
//! It intentionally does NOT provide any transform logic, scales, or rendering.
//!
//! Conceptually, a dataflow engine can:
//! - keep its live records in a [`Dataset`] (the engine creates and destroys tuples;
//!   transforms only update fields in place)
//! - hand any upstream [`Changeset`] to a [`BatchTransform`] node via
//!   [`BatchTransform::on_changeset`]
//! - forward the returned changeset, whose [`Changeset::touched`] set names the output
//!   fields the node rewrote, to downstream nodes.

#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Stable identifier for a [`Tuple`].
///
/// Ids are assigned by the owning [`Dataset`] and remain stable for the life of the
/// tuple; this is what lets changesets refer to records across recomputations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TupleId(pub u64);

/// A field value on a [`Tuple`].
///
/// Absence of a field is the third state: "no value". Transforms use it to
/// distinguish an excluded record from one with a zero-sized output.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A numeric value.
    Number(f64),
    /// A string value.
    Str(String),
}

impl Value {
    /// Return the numeric value, if this is a [`Value::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Str(_) => None,
        }
    }

    /// Return the string value, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Str(s) => Some(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(String::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// A small ordered set of field names.
///
/// Used for modified-field reporting on tuples and changesets. Insertion order is
/// preserved and duplicates are merged. The inline capacity matches the four layout
/// output fields, so the common case never allocates a spill vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(SmallVec<[String; 4]>);

impl FieldSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Insert a field name, returning `true` if it was not already present.
    pub fn insert(&mut self, field: impl Into<String>) -> bool {
        let field = field.into();
        if self.0.iter().any(|f| *f == field) {
            return false;
        }
        self.0.push(field);
        true
    }

    /// Return whether the set contains `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    /// Iterate over the field names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Return the number of fields in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

/// A single data record: named mutable fields plus a stable identity.
///
/// Tuples are created and destroyed by the owning [`Dataset`]; transforms mutate
/// fields in place and never add or remove tuples. Every write is recorded in a
/// per-tuple dirty set so the surrounding engine can see which fields were most
/// recently touched (see [`Tuple::take_dirty`]).
#[derive(Debug, Clone)]
pub struct Tuple {
    id: TupleId,
    fields: HashMap<String, Value>,
    dirty: FieldSet,
}

impl Tuple {
    fn new(id: TupleId) -> Self {
        Self {
            id,
            fields: HashMap::new(),
            dirty: FieldSet::new(),
        }
    }

    /// Return this tuple's stable identifier.
    pub fn id(&self) -> TupleId {
        self.id
    }

    /// Return the value of `field`, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Return the numeric value of `field`, if set and numeric.
    pub fn f64(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    /// Return whether `field` currently has a value.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Set `field` to `value`, fully overwriting any previous value.
    ///
    /// The write is recorded in the dirty set even if the value is unchanged;
    /// dirty tracking is conservative by design.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        self.dirty.insert(field.clone());
        self.fields.insert(field, value.into());
    }

    /// Explicitly unset `field`.
    ///
    /// A removed value is recorded in the dirty set; clearing an already-absent
    /// field is a no-op.
    pub fn clear(&mut self, field: &str) {
        if self.fields.remove(field).is_some() {
            self.dirty.insert(field);
        }
    }

    /// Return the fields written since the last [`Tuple::take_dirty`].
    pub fn dirty(&self) -> &FieldSet {
        &self.dirty
    }

    /// Drain and return the dirty field set.
    pub fn take_dirty(&mut self) -> FieldSet {
        core::mem::take(&mut self.dirty)
    }
}

/// An ordered collection of [`Tuple`]s with stable, monotonically assigned ids.
///
/// The dataset is the single owner of its tuples. Iteration order is the insertion
/// order and is stable across field mutation; transforms rely on it only for stable
/// grouping, not for output correctness.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tuples: Vec<Tuple>,
    next_id: u64,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self {
            tuples: Vec::new(),
            next_id: 0,
        }
    }

    /// Append a new empty tuple and return a mutable reference to it.
    pub fn insert(&mut self) -> &mut Tuple {
        let id = TupleId(self.next_id);
        self.next_id += 1;
        self.tuples.push(Tuple::new(id));
        self.tuples.last_mut().expect("just pushed")
    }

    /// Remove the tuple with the given id, preserving the order of the rest.
    pub fn remove(&mut self, id: TupleId) -> Option<Tuple> {
        let pos = self.tuples.iter().position(|t| t.id == id)?;
        Some(self.tuples.remove(pos))
    }

    /// Return the tuple with the given id, if present.
    pub fn get(&self, id: TupleId) -> Option<&Tuple> {
        self.tuples.iter().find(|t| t.id == id)
    }

    /// Return the tuple with the given id, if present (mutable).
    pub fn get_mut(&mut self, id: TupleId) -> Option<&mut Tuple> {
        self.tuples.iter_mut().find(|t| t.id == id)
    }

    /// Return the tuples in order.
    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    /// Return the tuples in order (mutable).
    pub fn tuples_mut(&mut self) -> &mut [Tuple] {
        &mut self.tuples
    }

    /// Return the number of tuples.
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Return whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

/// A single structural change to a dataset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Delta {
    /// A tuple was added.
    Insert(TupleId),
    /// A tuple's fields were modified.
    Update(TupleId),
    /// A tuple was removed.
    Remove(TupleId),
}

/// A description of dataset changes exchanged between dataflow nodes.
///
/// `deltas` carries structural changes (inserts/updates/removes); `touched` names
/// the fields a node modified. A node that recomputes globally emits a changeset
/// with an empty delta list and a non-empty touched set: mutation happens in place
/// on the shared dataset, and the changeset communicates *which fields* changed,
/// not which values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    /// Structural per-tuple changes, in upstream order.
    pub deltas: Vec<Delta>,
    /// Field names modified on the dataset.
    pub touched: FieldSet,
}

impl Changeset {
    /// Create an empty changeset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a changeset that reports modified fields only, with no
    /// structural deltas.
    pub fn retouch(touched: FieldSet) -> Self {
        Self {
            deltas: Vec::new(),
            touched,
        }
    }

    /// Append a structural delta.
    pub fn push(&mut self, delta: Delta) {
        self.deltas.push(delta);
    }

    /// Return whether the changeset carries no deltas and no touched fields.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.touched.is_empty()
    }
}

/// The batch-recompute contract for dataflow transforms.
///
/// Implement this for transforms whose outputs are globally interdependent across
/// records: any upstream change invalidates every output, so the node always
/// recomputes over the full current snapshot rather than the changed subset.
///
/// Implementors provide [`BatchTransform::batch`]; the surrounding engine calls
/// [`BatchTransform::on_changeset`], which ignores the incoming delta contents and
/// wraps the recomputation's modified-field set in an outgoing changeset.
pub trait BatchTransform {
    /// The error type surfaced when the transform's configuration is invalid.
    type Error: fmt::Debug;

    /// Recompute over the full dataset snapshot, returning the modified fields.
    ///
    /// Must either fail before mutating or mutate only after the whole result is
    /// computed; no partial output is valid on failure.
    fn batch(&self, data: &mut Dataset) -> Result<FieldSet, Self::Error>;

    /// React to an upstream changeset with a full recomputation.
    ///
    /// The incoming changeset only serves as the trigger; its delta contents are
    /// not consulted. The outgoing changeset carries no structural deltas.
    fn on_changeset(
        &self,
        _input: &Changeset,
        data: &mut Dataset,
    ) -> Result<Changeset, Self::Error> {
        let touched = self.batch(data)?;
        Ok(Changeset::retouch(touched))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn set_and_clear_track_dirty_fields() {
        let mut data = Dataset::new();
        let t = data.insert();
        t.set("x", 1.0);
        t.set("label", "a");

        assert_eq!(t.f64("x"), Some(1.0));
        assert_eq!(t.get("label").and_then(Value::as_str), Some("a"));
        assert!(t.dirty().contains("x"));
        assert!(t.dirty().contains("label"));

        let dirty = t.take_dirty();
        assert_eq!(dirty.len(), 2);
        assert!(t.dirty().is_empty());

        t.clear("x");
        assert!(!t.contains("x"));
        assert!(t.dirty().contains("x"));

        // Clearing an absent field is a no-op and does not re-dirty it.
        let _ = t.take_dirty();
        t.clear("x");
        assert!(t.dirty().is_empty());
    }

    #[test]
    fn non_numeric_fields_are_not_f64() {
        let mut data = Dataset::new();
        let t = data.insert();
        t.set("x", "not a number");
        assert_eq!(t.f64("x"), None);
        assert_eq!(t.f64("missing"), None);
    }

    #[test]
    fn dataset_ids_are_stable_across_removal() {
        let mut data = Dataset::new();
        let a = data.insert().id();
        let b = data.insert().id();
        let c = data.insert().id();
        assert_eq!((a, b, c), (TupleId(0), TupleId(1), TupleId(2)));

        data.remove(b);
        assert_eq!(data.len(), 2);
        assert_eq!(data.tuples()[0].id(), a);
        assert_eq!(data.tuples()[1].id(), c);

        // Ids are never reused.
        let d = data.insert().id();
        assert_eq!(d, TupleId(3));
        assert!(data.get(b).is_none());
        assert!(data.get(d).is_some());
    }

    #[test]
    fn field_set_dedups_and_preserves_order() {
        let mut set = FieldSet::new();
        assert!(set.insert("w"));
        assert!(set.insert("x"));
        assert!(!set.insert("w"));
        assert_eq!(set.len(), 2);

        let order: Vec<&str> = set.iter().collect();
        assert_eq!(order, ["w", "x"]);
        assert!(set.contains("x"));
        assert!(!set.contains("y"));
    }

    struct Stamp;

    impl BatchTransform for Stamp {
        type Error = ();

        fn batch(&self, data: &mut Dataset) -> Result<FieldSet, ()> {
            for t in data.tuples_mut() {
                t.set("stamp", 1.0);
            }
            Ok(["stamp"].into_iter().collect())
        }
    }

    #[test]
    fn on_changeset_recomputes_and_reports_fields_only() {
        let mut data = Dataset::new();
        let id = data.insert().id();

        // The incoming deltas are a trigger only; contents are ignored.
        let mut incoming = Changeset::new();
        incoming.push(Delta::Remove(TupleId(999)));

        let out = Stamp.on_changeset(&incoming, &mut data).unwrap();
        assert!(out.deltas.is_empty());
        assert!(out.touched.contains("stamp"));
        assert_eq!(data.get(id).unwrap().f64("stamp"), Some(1.0));
    }

    #[test]
    fn retouch_changeset_is_not_empty() {
        let cs = Changeset::retouch(["layout_x"].into_iter().collect());
        assert!(!cs.is_empty());
        assert!(Changeset::new().is_empty());
    }
}
