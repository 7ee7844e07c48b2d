//! Core traits: entities and the document store.

use std::future::Future;
use std::pin::Pin;

use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{StoreResult, TypeMismatchError};
use crate::index::IndexDefinition;
use crate::range::RangeSpec;

/// A boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Stream of raw documents produced by a range scan.
pub type DocumentStream = BoxStream<'static, StoreResult<RawDocument>>;

/// Separator between the discriminator and the local part of a document id.
pub const ID_SEPARATOR: char = '-';

/// A type stored as documents whose ids start with its discriminator.
///
/// Field names used in selectors are the serialized field names, so an
/// entity usually derives `Deserialize` with matching `rename`s.
///
/// ```rust
/// use serde::Deserialize;
/// use settee_query::traits::Entity;
///
/// #[derive(Deserialize)]
/// struct Widget {
///     #[serde(rename = "Name")]
///     name: String,
/// }
///
/// impl Entity for Widget {
///     const ENTITY_NAME: &'static str = "Widget";
/// }
///
/// assert_eq!(Widget::discriminator(), "widget");
/// assert_eq!(Widget::document_id("42"), "widget-42");
/// ```
pub trait Entity: DeserializeOwned + Send + 'static {
    /// The entity type name.
    const ENTITY_NAME: &'static str;

    /// Id prefix identifying documents of this type.
    fn discriminator() -> String {
        Self::ENTITY_NAME.to_lowercase()
    }

    /// Full document id for a local id.
    fn document_id(local: &str) -> String {
        format!("{}{}{}", Self::discriminator(), ID_SEPARATOR, local)
    }
}

/// A document as returned by a range scan.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Document id, `{discriminator}-{local}`.
    pub id: String,
    /// Revision, when the store tracks one.
    pub rev: Option<String>,
    /// The emitted index key.
    pub key: Value,
    /// Document body.
    pub body: Value,
}

impl RawDocument {
    /// Create a document with an empty key.
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            rev: None,
            key: Value::Null,
            body,
        }
    }

    /// Set the emitted key.
    pub fn with_key(mut self, key: Value) -> Self {
        self.key = key;
        self
    }

    /// Set the revision.
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    /// Leading id part before the first separator, if any.
    ///
    /// Discriminators may themselves contain the separator, so this is only
    /// a hint for error reports; matching uses the full id prefix.
    pub fn discriminator(&self) -> Option<&str> {
        self.id.split_once(ID_SEPARATOR).map(|(prefix, _)| prefix)
    }
}

/// What a store is asked to scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// Discriminator of the entity the index belongs to.
    pub discriminator: String,
    /// Index to scan.
    pub index_name: String,
    /// Key range.
    pub range: RangeSpec,
    /// Rows to skip.
    pub skip: u64,
    /// Maximum rows to return.
    pub limit: Option<u64>,
}

impl ScanRequest {
    /// Start key in JSON form.
    pub fn start_key(&self) -> Value {
        self.range.start.to_json()
    }

    /// End key in JSON form.
    pub fn end_key(&self) -> Value {
        self.range.end.to_json()
    }
}

/// A document store with view indexes and range scans.
///
/// Both operations may fail with a [`StoreError`](crate::error::StoreError),
/// which is propagated to the caller unchanged. Implementations must accept
/// repeated `ensure_index` calls with an identical definition.
pub trait DocumentStore: Send + Sync + 'static {
    /// Create the index if absent.
    fn ensure_index<'a>(&'a self, index: &'a IndexDefinition) -> BoxFuture<'a, StoreResult<()>>;

    /// Scan an index over a key range, in key order.
    fn range_scan(&self, request: ScanRequest) -> BoxFuture<'_, StoreResult<DocumentStream>>;

    /// Turn a scanned document into an entity.
    fn materialize<E: Entity>(&self, document: RawDocument) -> Result<E, TypeMismatchError> {
        materialize_document(document)
    }
}

/// Check the id discriminator, then deserialize the body.
pub fn materialize_document<E: Entity>(document: RawDocument) -> Result<E, TypeMismatchError> {
    let expected = format!("{}{}", E::discriminator(), ID_SEPARATOR);
    if !document.id.starts_with(&expected) {
        let found = document.discriminator().unwrap_or_default().to_string();
        return Err(TypeMismatchError::discriminator(
            E::ENTITY_NAME,
            document.id,
            found,
        ));
    }
    serde_json::from_value(document.body)
        .map_err(|e| TypeMismatchError::shape(E::ENTITY_NAME, document.id, e.to_string()))
}
