//! # settee-memory
//!
//! In-memory document store for Settee.
//!
//! [`MemoryStore`] keeps documents in a sorted map and evaluates view
//! indexes itself: for a scan it emits the composite key of every document
//! carrying the index's discriminator, keeps the keys inside the requested
//! range, and orders the rows by view collation, then document id. It is
//! meant for tests and local development.
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use settee_memory::MemoryStore;
//! use settee_query::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize)]
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
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), QueryError> {
//! let store = MemoryStore::new();
//! store.put_entity("1", &Widget { name: "gizmo".into(), price: 12 })?;
//! store.put_entity("2", &Widget { name: "gizmo".into(), price: 3 })?;
//!
//! let widgets: Repository<_, Widget> = Repository::new(store);
//! let cheap = widgets
//!     .r#where(select!(w => w.Name))?
//!     .equal("gizmo")
//!     .and(select!(w => w.Price))?
//!     .less_or_equal(5)
//!     .exec()
//!     .await?;
//! assert_eq!(cheap.len(), 1);
//! assert_eq!(cheap[0].price, 3);
//! # Ok(())
//! # }
//! ```

pub mod store;

pub use store::MemoryStore;
