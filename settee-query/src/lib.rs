//! # settee-query
//!
//! Typed range queries over CouchDB-style view indexes.
//!
//! A query is a chain of field selections with bounds. It compiles into two
//! artifacts:
//! - an [`IndexDefinition`] whose name and map function depend only on the
//!   selected fields, so the same query always reuses the same view;
//! - a [`RangeSpec`] with the start and end composite keys to scan.
//!
//! ## Building Queries
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_json::json;
//! use settee_query::prelude::*;
//! # use settee_query::traits::{BoxFuture, DocumentStream, ScanRequest};
//! # use settee_query::error::StoreResult;
//! # struct NoStore;
//! # impl DocumentStore for NoStore {
//! #     fn ensure_index<'a>(&'a self, _: &'a IndexDefinition) -> BoxFuture<'a, StoreResult<()>> {
//! #         Box::pin(async { Ok(()) })
//! #     }
//! #     fn range_scan(&self, _: ScanRequest) -> BoxFuture<'_, StoreResult<DocumentStream>> {
//! #         Box::pin(async { Ok(futures::StreamExt::boxed(futures::stream::empty())) })
//! #     }
//! # }
//!
//! #[derive(Deserialize)]
//! struct Widget {
//!     #[serde(rename = "Name")]
//!     name: String,
//!     #[serde(rename = "Price")]
//!     price: i64,
//! }
//!
//! impl Entity for Widget {
//!     const ENTITY_NAME: &'static str = "Widget";
//! }
//!
//! let widgets: Repository<_, Widget> = Repository::new(NoStore);
//! let spec = widgets
//!     .r#where(select!(w => w.Name))?
//!     .equal("gizmo")
//!     .and(select!(w => w.Price))?
//!     .greater_or_equal(10)
//!     .spec();
//!
//! assert_eq!(spec.index.name, "by-Name-Price");
//! assert_eq!(spec.range.start.to_json(), json!(["gizmo", 10]));
//! assert_eq!(spec.range.end.to_json(), json!(["gizmo", null]));
//! # Ok::<(), QueryError>(())
//! ```
//!
//! ## Grammar
//!
//! Bounds follow `Equal* (Between | GreaterOrEqual)* LessOrEqual*`, enforced
//! by the builder's types (see [`builder`]). Queries assembled from data use
//! [`ConstraintChain::try_push`], which applies the same rule at runtime.
//!
//! ## Execution
//!
//! [`Expression::list`](builder::Expression::list) ensures the index,
//! scans it and returns a lazy [`EntityStream`]. Store failures and type
//! mismatches are returned as [`QueryError`]; the stream stops at the first
//! error.

pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod expr;
pub mod field;
pub mod grammar;
pub mod index;
pub mod logging;
pub mod macros;
pub mod query;
pub mod range;
pub mod traits;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{
    Expression, FieldOperator, Primary, PrimaryExpression, PrimaryOperator, Secondary,
    SecondaryExpression, SecondaryOperator, Tertiary, TertiaryExpression, TertiaryOperator,
};
pub use config::{QueryConfig, QueryConfigBuilder};
pub use error::{
    ErrorCode, MismatchReason, QueryError, QueryResult, StoreError, StoreResult, TypeMismatchError,
};
pub use executor::{EntityStream, Repository};
pub use expr::{Expr, NodeKind};
pub use field::{FieldPath, FieldSequence, Selector};
pub use grammar::{Bound, BoundKind, Constraint, ConstraintChain, Stage};
pub use index::IndexDefinition;
pub use query::QuerySpecification;
pub use range::{CompositeKey, RangeSpec};
pub use traits::{DocumentStore, Entity, RawDocument, ScanRequest};
pub use value::KeyValue;

// Re-export logging utilities
pub use logging::{
    get_log_format, get_log_level, init as init_logging, init_debug, init_with_level,
    is_debug_enabled,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{QueryError, QueryResult, StoreError};
    pub use crate::executor::{EntityStream, Repository};
    pub use crate::field::Selector;
    pub use crate::grammar::{Bound, Constraint, ConstraintChain};
    pub use crate::index::IndexDefinition;
    pub use crate::query::QuerySpecification;
    pub use crate::select;
    pub use crate::traits::{DocumentStore, Entity};
    pub use crate::value::KeyValue;
}
