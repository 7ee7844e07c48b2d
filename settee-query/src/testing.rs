//! Test doubles shared by the unit tests.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::error::{StoreError, StoreResult};
use crate::index::IndexDefinition;
use crate::traits::{BoxFuture, DocumentStream, DocumentStore, Entity, RawDocument, ScanRequest};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub(crate) struct Widget {
    #[serde(rename = "Name")]
    pub(crate) name: String,
    #[serde(rename = "Price")]
    pub(crate) price: i64,
}

impl Entity for Widget {
    const ENTITY_NAME: &'static str = "Widget";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    EnsureIndex(String),
    RangeScan(String),
}

/// Records every call and answers scans with a fixed document list.
#[derive(Debug, Default)]
pub(crate) struct RecordingStore {
    documents: Vec<RawDocument>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    requests: Mutex<Vec<ScanRequest>>,
    failure: Mutex<Option<StoreError>>,
}

impl RecordingStore {
    pub(crate) fn with_documents(documents: Vec<RawDocument>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn fail_with(&self, error: StoreError) {
        *self.failure.lock() = Some(error);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn last_request(&self) -> Option<ScanRequest> {
        self.requests.lock().last().cloned()
    }

    fn record(&self, call: Call) -> StoreResult<()> {
        self.calls.lock().push(call);
        match self.failure.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl DocumentStore for RecordingStore {
    fn ensure_index<'a>(&'a self, index: &'a IndexDefinition) -> BoxFuture<'a, StoreResult<()>> {
        let recorded = self.record(Call::EnsureIndex(index.name.clone()));
        Box::pin(async move {
            self.pause().await;
            recorded
        })
    }

    fn range_scan(&self, request: ScanRequest) -> BoxFuture<'_, StoreResult<DocumentStream>> {
        let recorded = self.record(Call::RangeScan(request.index_name.clone()));
        self.requests.lock().push(request);
        Box::pin(async move {
            self.pause().await;
            recorded?;
            let documents: Vec<StoreResult<RawDocument>> =
                self.documents.iter().cloned().map(Ok).collect();
            Ok(stream::iter(documents).boxed())
        })
    }
}
