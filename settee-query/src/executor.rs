//! Query execution.
//!
//! Running a [`QuerySpecification`] takes two store calls, strictly in
//! order: `ensure_index` must finish before `range_scan` is issued. Both are
//! bounded by the configured timeout. The scanned documents are then
//! materialized lazily as the caller pulls from the returned
//! [`EntityStream`]; the first error ends the stream.

use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use tracing::{debug, info, trace, warn};

use crate::builder::PrimaryOperator;
use crate::config::QueryConfig;
use crate::error::{QueryError, QueryResult, StoreError, StoreResult};
use crate::field::Selector;
use crate::grammar::ConstraintChain;
use crate::query::QuerySpecification;
use crate::traits::{BoxFuture, DocumentStore, Entity};
use crate::value::KeyValue;

/// Entry point for range queries over one entity type.
///
/// Cloning is cheap: the store and configuration are shared.
pub struct Repository<S, E> {
    store: Arc<S>,
    config: Arc<QueryConfig>,
    _entity: PhantomData<fn() -> E>,
}

impl<S, E> Repository<S, E>
where
    S: DocumentStore,
    E: Entity,
{
    /// Create a repository with the default configuration.
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Create a repository over a shared store.
    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            config: Arc::new(QueryConfig::default()),
            _entity: PhantomData,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Start a query on the selected field.
    pub fn r#where<K>(&self, selector: Selector<E, K>) -> QueryResult<PrimaryOperator<S, E, K>>
    where
        K: Into<KeyValue>,
    {
        let field = selector.path()?;
        Ok(PrimaryOperator::new(self.clone(), ConstraintChain::new(), field))
    }

    /// Compile a chain assembled at runtime.
    pub fn spec_for(&self, chain: &ConstraintChain) -> QueryResult<QuerySpecification> {
        if chain.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(self.compile(chain))
    }

    pub(crate) fn compile(&self, chain: &ConstraintChain) -> QuerySpecification {
        let spec = QuerySpecification::compile(
            E::ENTITY_NAME,
            &E::discriminator(),
            &self.config.index_prefix,
            chain,
        );
        debug!(
            entity = E::ENTITY_NAME,
            index = %spec.index.name,
            columns = spec.fields().len(),
            "Compiled range query"
        );
        spec
    }

    /// Ensure the index, scan it, and stream materialized entities.
    pub async fn execute(&self, spec: &QuerySpecification) -> QueryResult<EntityStream<E>> {
        let started = Instant::now();
        if self.config.log_queries {
            info!(
                entity = %spec.entity,
                index = %spec.index.name,
                start_key = %spec.range.start.to_json(),
                end_key = %spec.range.end.to_json(),
                skip = spec.skip,
                limit = ?spec.limit,
                "Executing range query"
            );
        }

        debug!(index = %spec.index.name, "Ensuring index");
        self.guard("ensure_index", self.store.ensure_index(&spec.index))
            .await?;

        debug!(index = %spec.index.name, "Scanning index");
        let documents = self
            .guard("range_scan", self.store.range_scan(spec.scan_request()))
            .await?;

        debug!(
            index = %spec.index.name,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Range scan opened"
        );

        let store = Arc::clone(&self.store);
        let entities = documents
            .map(move |item| -> QueryResult<E> {
                let document = item?;
                trace!(id = %document.id, "Materializing document");
                store.materialize::<E>(document).map_err(|e| {
                    warn!(id = %e.document_id, expected = %e.expected, "Type mismatch");
                    QueryError::from(e)
                })
            })
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                *failed = item.is_err();
                future::ready(Some(item))
            })
            .boxed();

        Ok(EntityStream::new(entities))
    }

    async fn guard<T>(
        &self,
        operation: &'static str,
        call: BoxFuture<'_, StoreResult<T>>,
    ) -> QueryResult<T> {
        let Some(limit) = self.config.timeout() else {
            return Ok(call.await?);
        };
        match tokio::time::timeout(limit, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                let ms = limit.as_millis() as u64;
                warn!(operation, timeout_ms = ms, "Store call timed out");
                Err(StoreError::Timeout(ms).into())
            }
        }
    }
}

impl<S, E> Clone for Repository<S, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            _entity: PhantomData,
        }
    }
}

impl<S, E> fmt::Debug for Repository<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &std::any::type_name::<E>())
            .field("config", &self.config)
            .finish()
    }
}

/// Lazy, single-use stream of query results.
///
/// Ends after the first error.
pub struct EntityStream<E> {
    inner: BoxStream<'static, QueryResult<E>>,
}

impl<E> EntityStream<E> {
    pub(crate) fn new(inner: BoxStream<'static, QueryResult<E>>) -> Self {
        Self { inner }
    }

    /// Collect every entity, stopping at the first error.
    pub async fn try_collect_vec(self) -> QueryResult<Vec<E>> {
        self.try_collect().await
    }
}

impl<E> Stream for EntityStream<E> {
    type Item = QueryResult<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<E> fmt::Debug for EntityStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStream").finish_non_exhaustive()
    }
}
