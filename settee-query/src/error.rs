//! Error types for building and executing range queries.
//!
//! Errors fall into two groups:
//! - build-time errors ([`QueryError::UnsupportedExpression`],
//!   [`QueryError::DuplicateField`], [`QueryError::GrammarViolation`]) are
//!   produced while a predicate chain is assembled and never touch the store;
//! - execution errors ([`QueryError::Store`], [`QueryError::TypeMismatch`])
//!   only occur inside `list()` / `exec()` / [`Repository::execute`].
//!
//! Every error maps to a stable [`ErrorCode`] of the form `S{category}{number}`:
//! - 1xxx: query construction
//! - 3xxx: document store
//! - 6xxx: materialization
//! - 7xxx: configuration
//!
//! ```rust
//! use settee_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::duplicate_field("Name");
//! assert_eq!(err.code(), ErrorCode::DuplicateField);
//! assert_eq!(err.code().code(), "S1002");
//! assert!(err.to_string().contains("Name"));
//! ```
//!
//! [`Repository::execute`]: crate::executor::Repository::execute

use std::fmt;

use thiserror::Error;

use crate::expr::NodeKind;
use crate::grammar::BoundKind;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query construction errors (1xxx)
    /// Field selector is not a plain member access chain (S1001).
    UnsupportedExpression = 1001,
    /// Same field constrained twice in one chain (S1002).
    DuplicateField = 1002,
    /// Bound kinds out of order (S1003).
    GrammarViolation = 1003,
    /// Query without any field (S1004).
    EmptyQuery = 1004,

    // Store errors (3xxx)
    /// Store could not be reached (S3001).
    StoreUnavailable = 3001,
    /// Index exists with a different definition (S3002).
    IndexConflict = 3002,
    /// Index does not exist (S3003).
    UnknownIndex = 3003,
    /// Store call timed out (S3004).
    StoreTimeout = 3004,
    /// Any other backend failure (S3005).
    Backend = 3005,

    // Materialization errors (6xxx)
    /// Document does not belong to the requested entity type (S6001).
    TypeMismatch = 6001,

    // Configuration errors (7xxx)
    /// Invalid configuration (S7001).
    InvalidConfiguration = 7001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedExpression => "Unsupported field selector",
            Self::DuplicateField => "Field used more than once",
            Self::GrammarViolation => "Bounds out of order",
            Self::EmptyQuery => "Query selects no field",
            Self::StoreUnavailable => "Document store unavailable",
            Self::IndexConflict => "Conflicting index definition",
            Self::UnknownIndex => "Unknown index",
            Self::StoreTimeout => "Store operation timed out",
            Self::Backend => "Document store error",
            Self::TypeMismatch => "Document type mismatch",
            Self::InvalidConfiguration => "Invalid configuration",
        }
    }

    /// Whether the error is raised while building a query, before any I/O.
    pub fn is_build_time(&self) -> bool {
        (*self as u16) < 2000
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors reported by a [`DocumentStore`](crate::traits::DocumentStore).
///
/// These are propagated unchanged; no retry happens in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An index with the same name but a different definition exists.
    #[error("index '{name}' already exists with a different definition")]
    IndexConflict {
        /// Name of the conflicting index.
        name: String,
    },

    /// A scan referenced an index the store does not know.
    #[error("index '{0}' does not exist")]
    UnknownIndex(String),

    /// The call did not complete within the configured timeout.
    #[error("store operation timed out after {0}ms")]
    Timeout(u64),

    /// Any other backend failure.
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create an index conflict error.
    pub fn index_conflict(name: impl Into<String>) -> Self {
        Self::IndexConflict { name: name.into() }
    }

    /// Create a generic backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::StoreUnavailable,
            Self::IndexConflict { .. } => ErrorCode::IndexConflict,
            Self::UnknownIndex(_) => ErrorCode::UnknownIndex,
            Self::Timeout(_) => ErrorCode::StoreTimeout,
            Self::Backend(_) => ErrorCode::Backend,
        }
    }
}

/// Why a document could not be materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// The document id carries another entity's discriminator.
    Discriminator {
        /// The discriminator found on the document id.
        found: String,
    },
    /// The discriminator matched but the body has the wrong shape.
    Shape(String),
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discriminator { found } => write!(f, "discriminator is '{}'", found),
            Self::Shape(message) => write!(f, "body does not match: {}", message),
        }
    }
}

/// A matched document does not correspond to the requested entity type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("document '{document_id}' is not a {expected} ({reason})")]
pub struct TypeMismatchError {
    /// Name of the requested entity type.
    pub expected: String,
    /// Id of the offending document.
    pub document_id: String,
    /// What did not match.
    pub reason: MismatchReason,
}

impl TypeMismatchError {
    /// Mismatch on the id discriminator.
    pub fn discriminator(
        expected: impl Into<String>,
        document_id: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            expected: expected.into(),
            document_id: document_id.into(),
            reason: MismatchReason::Discriminator {
                found: found.into(),
            },
        }
    }

    /// Mismatch on the document body.
    pub fn shape(
        expected: impl Into<String>,
        document_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            expected: expected.into(),
            document_id: document_id.into(),
            reason: MismatchReason::Shape(message.into()),
        }
    }
}

/// Errors that can occur while building or executing a query.
#[derive(Error, Debug, Clone)]
pub enum QueryError {
    /// A field selector used something other than member access on its parameter.
    #[error(
        "unsupported field selector `{expression}`: {kind} expressions cannot select a field, only member access from the selector parameter can"
    )]
    UnsupportedExpression {
        /// Textual form of the selector.
        expression: String,
        /// Kind of the node that stopped extraction.
        kind: NodeKind,
    },

    /// The same field path appears more than once in a chain.
    #[error("field '{field}' can be used only once per query")]
    DuplicateField {
        /// The repeated field path.
        field: String,
    },

    /// A bound was applied out of the `Equal* (Between|GreaterOrEqual)* LessOrEqual*` order.
    #[error("cannot apply {bound} bound to '{field}' after {after} bound")]
    GrammarViolation {
        /// The field that received the bound.
        field: String,
        /// The rejected bound kind.
        bound: BoundKind,
        /// The bound kind already in the chain.
        after: BoundKind,
    },

    /// A query was run without selecting any field.
    #[error("a range query needs at least one field")]
    EmptyQuery,

    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A matched document could not be materialized.
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatchError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl QueryError {
    /// Create an unsupported expression error.
    pub fn unsupported_expression(expression: impl fmt::Display, kind: NodeKind) -> Self {
        Self::UnsupportedExpression {
            expression: expression.to_string(),
            kind,
        }
    }

    /// Create a duplicate field error.
    pub fn duplicate_field(field: impl fmt::Display) -> Self {
        Self::DuplicateField {
            field: field.to_string(),
        }
    }

    /// Create a grammar violation error.
    pub fn grammar_violation(field: impl fmt::Display, bound: BoundKind, after: BoundKind) -> Self {
        Self::GrammarViolation {
            field: field.to_string(),
            bound,
            after,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedExpression { .. } => ErrorCode::UnsupportedExpression,
            Self::DuplicateField { .. } => ErrorCode::DuplicateField,
            Self::GrammarViolation { .. } => ErrorCode::GrammarViolation,
            Self::EmptyQuery => ErrorCode::EmptyQuery,
            Self::Store(e) => e.code(),
            Self::TypeMismatch(_) => ErrorCode::TypeMismatch,
            Self::Config(_) => ErrorCode::InvalidConfiguration,
        }
    }

    /// Check if this error was raised before any store call.
    pub fn is_build_error(&self) -> bool {
        self.code().is_build_time()
    }

    /// Check if this is a store error.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Check if this is a type mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch(_))
    }

    /// Check if this is a store timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_timeout())
    }
}
