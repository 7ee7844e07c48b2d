//! Composite key ranges.
//!
//! Each constraint contributes one position to the start and end keys:
//!
//! | bound                 | start   | end     |
//! |-----------------------|---------|---------|
//! | `Equal(v)`            | `v`     | `v`     |
//! | `Between(lo, hi)`     | `lo`    | `hi`    |
//! | `GreaterOrEqual(v)`   | `v`     | open    |
//! | `LessOrEqual(v)`      | open    | `v`     |
//! | none                  | open    | open    |
//!
//! An open position (serialized as `null`) matches any value from that
//! position onward. Positions are never reordered: composite ranges are
//! only meaningful most-significant column first.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grammar::{Bound, Constraint};
use crate::value::{KeyValue, collate};

/// A composite key whose positions may be open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(Vec<Option<KeyValue>>);

impl CompositeKey {
    /// Create an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a position.
    pub fn push(&mut self, value: Option<KeyValue>) {
        self.0.push(value);
    }

    /// Position `index`, `None` when open or out of range.
    pub fn get(&self, index: usize) -> Option<&KeyValue> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Iterate positions.
    pub fn iter(&self) -> std::slice::Iter<'_, Option<KeyValue>> {
        self.0.iter()
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON array form, open positions as `null`.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|p| p.as_ref().map_or(Value::Null, KeyValue::to_json))
                .collect(),
        )
    }

    /// Compare an emitted key against this bound.
    ///
    /// Returns `None` once an open position is reached with all earlier
    /// positions equal: the remainder of the key is unconstrained.
    fn compare(&self, key: &[Value]) -> Option<Ordering> {
        for (i, position) in self.0.iter().enumerate() {
            let bound = position.as_ref()?;
            let value = key.get(i).unwrap_or(&Value::Null);
            match collate(value, &bound.to_json()) {
                Ordering::Equal => continue,
                other => return Some(other),
            }
        }
        Some(Ordering::Equal)
    }
}

impl From<Vec<Option<KeyValue>>> for CompositeKey {
    fn from(positions: Vec<Option<KeyValue>>) -> Self {
        Self(positions)
    }
}

/// Start and end keys of a range scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// Lower key.
    pub start: CompositeKey,
    /// Upper key.
    pub end: CompositeKey,
    /// Whether a key equal to `start` matches.
    pub inclusive_start: bool,
    /// Whether a key equal to `end` matches.
    pub inclusive_end: bool,
}

impl RangeSpec {
    /// Compile constraints, in column order, into start and end keys.
    pub fn compile(constraints: &[Constraint]) -> Self {
        let mut start = CompositeKey::new();
        let mut end = CompositeKey::new();
        for constraint in constraints {
            let (lower, upper) = endpoints(constraint.bound.as_ref());
            start.push(lower);
            end.push(upper);
        }
        Self {
            start,
            end,
            inclusive_start: true,
            inclusive_end: true,
        }
    }

    /// Whether an emitted key falls inside the range.
    pub fn contains(&self, key: &[Value]) -> bool {
        let above_start = match self.start.compare(key) {
            Some(Ordering::Less) => false,
            Some(Ordering::Equal) => self.inclusive_start,
            _ => true,
        };
        let below_end = match self.end.compare(key) {
            Some(Ordering::Greater) => false,
            Some(Ordering::Equal) => self.inclusive_end,
            _ => true,
        };
        above_start && below_end
    }
}

fn endpoints(bound: Option<&Bound>) -> (Option<KeyValue>, Option<KeyValue>) {
    match bound {
        Some(Bound::Equal(v)) => (Some(v.clone()), Some(v.clone())),
        Some(Bound::Between(lo, hi)) => (Some(lo.clone()), Some(hi.clone())),
        Some(Bound::GreaterOrEqual(v)) => (Some(v.clone()), None),
        Some(Bound::LessOrEqual(v)) => (None, Some(v.clone())),
        None => (None, None),
    }
}
