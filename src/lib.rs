//! # Settee
//!
//! Typed range queries for CouchDB-style document stores.
//!
//! Settee provides:
//! - A staged query builder whose types only offer the bounds that still
//!   make sense for a composite view key
//! - Deterministic view index generation, so equal queries share one index
//! - Range compilation into start and end keys
//! - Lazy, typed result streams
//! - An in-memory store for tests and local development
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use settee::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Widget {
//!     #[serde(rename = "Name")]
//!     name: String,
//!     #[serde(rename = "Price")]
//!     price: f64,
//! }
//!
//! impl Entity for Widget {
//!     const ENTITY_NAME: &'static str = "Widget";
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), QueryError> {
//! let store = MemoryStore::new();
//! store.put_entity("a", &Widget { name: "gizmo".into(), price: 12.5 })?;
//!
//! let widgets: Repository<_, Widget> = Repository::new(store);
//! let found = widgets
//!     .r#where(select!(w => w.Name))?
//!     .equal("gizmo")
//!     .and(select!(w => w.Price))?
//!     .between(10.0, 20.0)
//!     .exec()
//!     .await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Grammar
//!
//! Once a range bound is applied, equality is no longer available:
//!
//! ```rust,compile_fail
//! # use settee::prelude::*;
//! # #[derive(serde::Deserialize)] struct Widget {}
//! # impl Entity for Widget { const ENTITY_NAME: &'static str = "Widget"; }
//! let widgets: Repository<MemoryStore, Widget> = Repository::new(MemoryStore::new());
//! let _ = widgets
//!     .r#where(select!(w => w.Price)).unwrap()
//!     .greater_or_equal(10)
//!     .and(select!(w => w.Name)).unwrap()
//!     .equal("gizmo");
//! ```
//!
//! and after `less_or_equal` only further upper bounds are:
//!
//! ```rust,compile_fail
//! # use settee::prelude::*;
//! # #[derive(serde::Deserialize)] struct Widget {}
//! # impl Entity for Widget { const ENTITY_NAME: &'static str = "Widget"; }
//! let widgets: Repository<MemoryStore, Widget> = Repository::new(MemoryStore::new());
//! let _ = widgets
//!     .r#where(select!(w => w.Price)).unwrap()
//!     .less_or_equal(10)
//!     .and(select!(w => w.Stock)).unwrap()
//!     .greater_or_equal(1);
//! ```
//!
//! A typed selector only accepts bounds of its key type:
//!
//! ```rust,compile_fail
//! # use settee::prelude::*;
//! # #[derive(serde::Deserialize)] struct Widget {}
//! # impl Entity for Widget { const ENTITY_NAME: &'static str = "Widget"; }
//! let widgets: Repository<MemoryStore, Widget> = Repository::new(MemoryStore::new());
//! let _ = widgets
//!     .r#where(select!(<i64> w => w.Price)).unwrap()
//!     .equal("ten");
//! ```
//!
//! ## Logging
//!
//! With the `logging` feature, [`logging::init`] installs a subscriber
//! controlled by `SETTEE_DEBUG`, `SETTEE_LOG_LEVEL` and `SETTEE_LOG_FORMAT`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use settee_query::{
    Bound, BoundKind, CompositeKey, Constraint, ConstraintChain, DocumentStore, Entity,
    EntityStream, ErrorCode, Expr, Expression, FieldOperator, FieldPath, FieldSequence,
    IndexDefinition, KeyValue, NodeKind, QueryConfig, QueryConfigBuilder, QueryError,
    QueryResult, QuerySpecification, RangeSpec, RawDocument, Repository, ScanRequest, Selector,
    StoreError, StoreResult, TypeMismatchError, select,
};

/// Core query types.
pub mod query {
    pub use settee_query::*;
}

/// In-memory backend.
pub mod memory {
    pub use settee_memory::*;
}

/// Logging setup.
pub mod logging {
    pub use settee_query::logging::*;
}

pub use settee_memory::MemoryStore;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use settee_memory::MemoryStore;
    pub use settee_query::prelude::*;
}
