//! Bounds and the ordering rule that governs them.
//!
//! A range query over a composite view key only makes sense when the bound
//! kinds never get *narrower* as the key columns go on: an equality prefix
//! pins the leading columns, range bounds follow, upper-only bounds close the
//! chain, and unbounded columns may only trail. Each bound kind belongs to a
//! [`Stage`]; stages along a chain must be non-decreasing.
//!
//! The staged builder in [`crate::builder`] enforces this with types. The
//! [`ConstraintChain`] below checks the same rule at runtime for queries
//! assembled from data.
//!
//! ```rust
//! use settee_query::field::FieldPath;
//! use settee_query::grammar::{Bound, Constraint, ConstraintChain};
//!
//! let chain = ConstraintChain::new()
//!     .try_push(Constraint::new(FieldPath::parse("Name")?, Bound::Equal("gizmo".into())))?
//!     .try_push(Constraint::new(FieldPath::parse("Price")?, Bound::GreaterOrEqual(10.into())))?;
//! assert_eq!(chain.len(), 2);
//!
//! // equality after a range column can never be satisfied by one scan
//! let err = chain
//!     .try_push(Constraint::new(FieldPath::parse("Stock")?, Bound::Equal(1.into())))
//!     .unwrap_err();
//! assert!(err.to_string().contains("Stock"));
//! # Ok::<(), settee_query::QueryError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::field::{FieldPath, FieldSequence};
use crate::value::KeyValue;

/// A bound on one composite key column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Column equals the value.
    Equal(KeyValue),
    /// Column lies within `[lower, upper]`.
    Between(KeyValue, KeyValue),
    /// Column is at least the value.
    GreaterOrEqual(KeyValue),
    /// Column is at most the value.
    LessOrEqual(KeyValue),
}

impl Bound {
    /// The openness class of this bound.
    pub fn kind(&self) -> BoundKind {
        match self {
            Self::Equal(_) => BoundKind::Equal,
            Self::Between(..) => BoundKind::Between,
            Self::GreaterOrEqual(_) => BoundKind::LowerOnly,
            Self::LessOrEqual(_) => BoundKind::UpperOnly,
        }
    }
}

/// Openness class of a column bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    /// Exact value.
    Equal,
    /// Inclusive lower and upper value.
    Between,
    /// Inclusive lower value only.
    LowerOnly,
    /// Inclusive upper value only.
    UpperOnly,
    /// No bound.
    Open,
}

impl BoundKind {
    /// Stage this kind belongs to.
    pub fn stage(self) -> Stage {
        match self {
            Self::Equal => Stage::Primary,
            Self::Between | Self::LowerOnly => Stage::Secondary,
            Self::UpperOnly => Stage::Tertiary,
            Self::Open => Stage::Open,
        }
    }
}

impl fmt::Display for BoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equal => "equal",
            Self::Between => "between",
            Self::LowerOnly => "greater-or-equal",
            Self::UpperOnly => "less-or-equal",
            Self::Open => "open",
        };
        f.write_str(name)
    }
}

/// Builder stage, ordered from most to least constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Equality prefix.
    Primary,
    /// Range bounds.
    Secondary,
    /// Upper-only bounds.
    Tertiary,
    /// Unbounded trailing columns.
    Open,
}

impl Stage {
    /// Whether a bound of `next` kind may follow this stage.
    pub fn admits(self, next: BoundKind) -> bool {
        next.stage() >= self
    }
}

/// A field together with its bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    /// The constrained field.
    pub path: FieldPath,
    /// The bound, or `None` for an unbounded column.
    pub bound: Option<Bound>,
}

impl Constraint {
    /// A bounded column.
    pub fn new(path: FieldPath, bound: Bound) -> Self {
        Self {
            path,
            bound: Some(bound),
        }
    }

    /// An unbounded column.
    pub fn open(path: FieldPath) -> Self {
        Self { path, bound: None }
    }

    /// The openness class of this column.
    pub fn kind(&self) -> BoundKind {
        self.bound.as_ref().map_or(BoundKind::Open, Bound::kind)
    }
}

#[derive(Debug)]
struct Link {
    constraint: Constraint,
    prev: Option<Arc<Link>>,
}

/// Persistent, append-only list of constraints.
///
/// Appending returns a new chain and leaves the receiver untouched, so a
/// shared prefix can be extended in several directions (or from several
/// threads) independently. Clones share structure.
#[derive(Clone, Default)]
pub struct ConstraintChain {
    head: Option<Arc<Link>>,
    len: usize,
}

impl ConstraintChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stage reached by the last constraint.
    pub fn stage(&self) -> Stage {
        self.head
            .as_ref()
            .map_or(Stage::Primary, |link| link.constraint.kind().stage())
    }

    /// Check whether `path` is already constrained.
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.iter_rev().any(|c| &c.path == path)
    }

    /// Fail with [`QueryError::DuplicateField`] if `path` is already constrained.
    pub fn check_field(&self, path: &FieldPath) -> QueryResult<()> {
        if self.contains(path) {
            return Err(QueryError::duplicate_field(path));
        }
        Ok(())
    }

    /// Append a constraint, checking for duplicates and bound order.
    pub fn try_push(&self, constraint: Constraint) -> QueryResult<Self> {
        self.check_field(&constraint.path)?;
        if let Some(last) = &self.head {
            let after = last.constraint.kind();
            if !after.stage().admits(constraint.kind()) {
                return Err(QueryError::grammar_violation(
                    &constraint.path,
                    constraint.kind(),
                    after,
                ));
            }
        }
        Ok(self.push(constraint))
    }

    /// Append without checks; the staged builder has already enforced them.
    pub(crate) fn push(&self, constraint: Constraint) -> Self {
        debug_assert!(!self.contains(&constraint.path));
        debug_assert!(self.is_empty() || self.stage().admits(constraint.kind()));
        Self {
            head: Some(Arc::new(Link {
                constraint,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Constraints in column order.
    pub fn constraints(&self) -> Vec<Constraint> {
        let mut out: Vec<Constraint> = self.iter_rev().cloned().collect();
        out.reverse();
        out
    }

    /// Field paths in column order.
    pub fn fields(&self) -> FieldSequence {
        // push and try_push both reject duplicates
        FieldSequence::from_unique(self.constraints().into_iter().map(|c| c.path).collect())
    }

    fn iter_rev(&self) -> impl Iterator<Item = &Constraint> {
        std::iter::successors(self.head.as_deref(), |link| link.prev.as_deref())
            .map(|link| &link.constraint)
    }
}

impl fmt::Debug for ConstraintChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.constraints()).finish()
    }
}
