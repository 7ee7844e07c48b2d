//! The in-memory store.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use settee_query::error::{StoreError, StoreResult};
use settee_query::field::FieldPath;
use settee_query::index::IndexDefinition;
use settee_query::traits::{
    BoxFuture, DocumentStore, DocumentStream, Entity, ID_SEPARATOR, RawDocument, ScanRequest,
};
use settee_query::value::collate;

#[derive(Debug, Clone)]
struct StoredDocument {
    generation: u64,
    body: Value,
}

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<String, StoredDocument>,
    /// Keyed by (discriminator, index name): one design document per entity type.
    indexes: HashMap<(String, String), IndexDefinition>,
    scan_failure: Option<StoreError>,
}

/// A [`DocumentStore`] holding every document in process memory.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every store call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `range_scan` fail with `error`.
    pub fn fail_next_scan(&self, error: StoreError) {
        self.inner.write().scan_failure = Some(error);
    }

    /// Insert or replace a document, returning its new revision.
    pub fn put(&self, id: impl Into<String>, body: Value) -> String {
        let id = id.into();
        let mut inner = self.inner.write();
        let generation = inner
            .documents
            .get(&id)
            .map_or(1, |existing| existing.generation + 1);
        trace!(id = %id, generation, "Storing document");
        inner
            .documents
            .insert(id, StoredDocument { generation, body });
        revision(generation)
    }

    /// Serialize and store an entity under `{discriminator}-{local_id}`.
    pub fn put_entity<E>(&self, local_id: &str, entity: &E) -> StoreResult<String>
    where
        E: Entity + Serialize,
    {
        let body = serde_json::to_value(entity).map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(self.put(E::document_id(local_id), body))
    }

    /// Fetch a document body.
    pub fn get(&self, id: &str) -> Option<Value> {
        self.inner.read().documents.get(id).map(|d| d.body.clone())
    }

    /// Delete a document; returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.write().documents.remove(id).is_some()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.inner.read().documents.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().documents.is_empty()
    }

    /// Names of the ensured indexes, sorted.
    pub fn indexes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .read()
            .indexes
            .keys()
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn register(&self, index: &IndexDefinition) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let slot = (index.discriminator.clone(), index.name.clone());
        match inner.indexes.get(&slot) {
            Some(existing) if existing.is_compatible(index) => {
                trace!(index = %index.name, "Index already present");
                Ok(())
            }
            Some(_) => Err(StoreError::index_conflict(&index.name)),
            None => {
                debug!(index = %index.name, discriminator = %index.discriminator, "Creating index");
                inner.indexes.insert(slot, index.clone());
                Ok(())
            }
        }
    }

    fn scan(&self, request: &ScanRequest) -> StoreResult<Vec<RawDocument>> {
        let mut inner = self.inner.write();
        if let Some(error) = inner.scan_failure.take() {
            return Err(error);
        }

        let slot = (request.discriminator.clone(), request.index_name.clone());
        let index = inner
            .indexes
            .get(&slot)
            .ok_or_else(|| StoreError::UnknownIndex(request.index_name.clone()))?;

        let prefix = format!("{}{}", index.discriminator, ID_SEPARATOR);
        let mut rows: Vec<(Vec<Value>, &String, &StoredDocument)> = inner
            .documents
            .range(prefix.clone()..)
            .take_while(|(id, _)| id.starts_with(&prefix))
            .filter_map(|(id, doc)| {
                let key = emit_key(&doc.body, index.fields.iter())?;
                request.range.contains(&key).then_some((key, id, doc))
            })
            .collect();

        rows.sort_by(|a, b| compare_keys(&a.0, &b.0).then_with(|| a.1.cmp(b.1)));

        let skip = usize::try_from(request.skip).unwrap_or(usize::MAX);
        let limit = request
            .limit
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        let documents: Vec<RawDocument> = rows
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(key, id, doc)| {
                RawDocument::new(id.clone(), doc.body.clone())
                    .with_key(Value::Array(key))
                    .with_rev(revision(doc.generation))
            })
            .collect();

        debug!(
            index = %request.index_name,
            rows = documents.len(),
            "Range scan complete"
        );
        Ok(documents)
    }
}

impl DocumentStore for MemoryStore {
    fn ensure_index<'a>(&'a self, index: &'a IndexDefinition) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.pause().await;
            self.register(index)
        })
    }

    fn range_scan(&self, request: ScanRequest) -> BoxFuture<'_, StoreResult<DocumentStream>> {
        Box::pin(async move {
            self.pause().await;
            let documents = self.scan(&request)?;
            Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
        })
    }
}

fn revision(generation: u64) -> String {
    format!("{}-mem", generation)
}

/// The key the generated map function would emit, or `None` when it would
/// throw by reading through an undefined or null intermediate value.
fn emit_key<'a>(body: &Value, fields: impl Iterator<Item = &'a FieldPath>) -> Option<Vec<Value>> {
    fields.map(|path| read_path(body, path)).collect()
}

fn read_path(body: &Value, path: &FieldPath) -> Option<Value> {
    let mut current = body;
    let segments = path.segments();
    for (i, segment) in segments.iter().enumerate() {
        if current.is_null() {
            return None;
        }
        match current.get(segment.as_str()) {
            Some(next) => current = next,
            None if i + 1 == segments.len() => return Some(Value::Null),
            None => return None,
        }
    }
    Some(current.clone())
}

fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| collate(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}
