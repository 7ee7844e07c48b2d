//! Field paths and typed field selectors.
//!
//! A [`FieldPath`] is the root-to-leaf list of member names a selector
//! reads, e.g. `["Name", "First"]` for `w => w.Name.First`. Paths are
//! extracted from an [`Expr`] by walking member accesses back to the
//! selector parameter; any other node aborts extraction.
//!
//! ```rust
//! use settee_query::field::FieldPath;
//! use settee_query::select;
//! use settee_query::expr::NodeKind;
//! use settee_query::QueryError;
//!
//! struct Widget;
//!
//! let selector: settee_query::Selector<Widget, String> = select!(<String> w => w.Name.First);
//! assert_eq!(selector.path().unwrap().to_string(), "Name.First");
//!
//! let call: settee_query::Selector<Widget> = select!(w => w.Name.len());
//! match call.path() {
//!     Err(QueryError::UnsupportedExpression { kind, .. }) => assert_eq!(kind, NodeKind::Call),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, NodeKind};
use crate::value::KeyValue;

/// Ordered property names from the entity root to a leaf.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(SmallVec<[SmolStr; 2]>);

impl FieldPath {
    /// Extract the path selected by `expr`.
    ///
    /// Only a chain of member accesses ending at the selector parameter is
    /// accepted. Nothing is returned for partially valid chains.
    pub fn extract(expr: &Expr) -> QueryResult<Self> {
        let mut segments: SmallVec<[SmolStr; 2]> = SmallVec::new();
        let mut node = expr;
        loop {
            match node {
                Expr::Member { target, name } => {
                    segments.push(name.clone());
                    node = target;
                }
                Expr::Parameter(_) if !segments.is_empty() => break,
                other => return Err(QueryError::unsupported_expression(expr, other.kind())),
            }
        }
        segments.reverse();
        Ok(Self(segments))
    }

    /// Parse a dotted path such as `"Name.First"`.
    pub fn parse(text: &str) -> QueryResult<Self> {
        let segments: SmallVec<[SmolStr; 2]> = text.split('.').map(SmolStr::new).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(QueryError::unsupported_expression(text, NodeKind::Opaque));
        }
        Ok(Self(segments))
    }

    /// Path segments, root first.
    pub fn segments(&self) -> &[SmolStr] {
        &self.0
    }

    /// The last segment.
    pub fn leaf(&self) -> &str {
        self.0.last().map(SmolStr::as_str).unwrap_or_default()
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Ordered, duplicate-free list of field paths.
///
/// The order is the composite key column order of the generated index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldSequence(Vec<FieldPath>);

impl FieldSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a path, rejecting one already present.
    pub fn try_push(&mut self, path: FieldPath) -> QueryResult<()> {
        if self.contains(&path) {
            return Err(QueryError::duplicate_field(&path));
        }
        self.0.push(path);
        Ok(())
    }

    /// Wrap paths already known to be distinct.
    pub(crate) fn from_unique(paths: Vec<FieldPath>) -> Self {
        debug_assert!(
            paths
                .iter()
                .enumerate()
                .all(|(i, path)| !paths[..i].contains(path)),
            "duplicate field path"
        );
        Self(paths)
    }

    /// Check whether the path is already in the sequence.
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.0.contains(path)
    }

    /// Iterate in column order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldPath> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<FieldPath>> for FieldSequence {
    type Error = QueryError;

    fn try_from(paths: Vec<FieldPath>) -> QueryResult<Self> {
        let mut sequence = Self::new();
        for path in paths {
            sequence.try_push(path)?;
        }
        Ok(sequence)
    }
}

impl<'a> IntoIterator for &'a FieldSequence {
    type Item = &'a FieldPath;
    type IntoIter = std::slice::Iter<'a, FieldPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A field selector over entity `E` yielding values of type `K`.
///
/// Build one with [`select!`](crate::select) or declaratively with
/// [`Selector::field`] and [`Selector::member`]. Bounds applied to the
/// selected field must convert into `K`.
pub struct Selector<E, K = KeyValue> {
    expr: Expr,
    _marker: PhantomData<fn(&E) -> K>,
}

impl<E, K> Selector<E, K> {
    /// Wrap an expression tree.
    pub fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _marker: PhantomData,
        }
    }

    /// Select a top-level field by name.
    pub fn field(name: impl Into<SmolStr>) -> Self {
        Self::from_expr(Expr::member(Expr::parameter("e"), name))
    }

    /// Descend into a member of the current selection.
    pub fn member<K2>(self, name: impl Into<SmolStr>) -> Selector<E, K2> {
        Selector::from_expr(Expr::member(self.expr, name))
    }

    /// The underlying expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Extract the selected field path.
    pub fn path(&self) -> QueryResult<FieldPath> {
        FieldPath::extract(&self.expr)
    }
}

impl<E, K> Clone for Selector<E, K> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<E, K> fmt::Debug for Selector<E, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.expr.to_string()).finish()
    }
}
