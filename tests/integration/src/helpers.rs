//! Test helpers for integration tests
//!
//! Provides a full engine-over-memory-store harness, document builders,
//! and a polling wait for watch-published derived state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use study_common::StoreConfig;
use study_core::traits::{
    CollectionSnapshot, Document, DocumentSnapshot, DocumentStore, StoreResult,
};
use study_engine::{session_channel, GroupViewModel, SessionHandle};
use study_store::MemoryStore;

/// How long `wait_until` polls before giving up
const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Create a fresh shared group store
pub fn new_group() -> Arc<MemoryStore> {
    MemoryStore::new_shared()
}

/// Join the group as one signed-in participant: returns the identity handle
/// and a composed view model over the shared store.
pub fn join_group(store: &Arc<MemoryStore>, uid: &str) -> (SessionHandle, GroupViewModel) {
    let (handle, session) = session_channel();
    handle.sign_in(uid);
    let vm = GroupViewModel::new(
        store.clone() as Arc<dyn DocumentStore>,
        session,
        StoreConfig::default(),
    );
    (handle, vm)
}

/// Build a document from field pairs
pub fn doc(pairs: &[(&str, Value)]) -> Document {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Wait until the watched value satisfies the predicate, returning it
///
/// # Panics
/// Panics when the condition is not reached within the timeout or the
/// source closes early - both are test failures.
pub async fn wait_until<T: Clone>(
    rx: &mut watch::Receiver<T>,
    mut pred: impl FnMut(&T) -> bool,
) -> T {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            if pred(&rx.borrow()) {
                return rx.borrow().clone();
            }
            rx.changed().await.expect("source closed while waiting");
        }
    })
    .await
    .expect("condition not reached in time")
}

/// Store wrapper that delays the first point read against one collection.
///
/// Used to make one derivation's join phase slow enough that a newer source
/// notification overtakes it, exercising the stale-derivation guard.
pub struct SlowLookupStore {
    inner: Arc<MemoryStore>,
    slow_collection: String,
    delay: Duration,
    armed: AtomicBool,
}

impl SlowLookupStore {
    pub fn new(inner: Arc<MemoryStore>, slow_collection: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner,
            slow_collection: slow_collection.into(),
            delay,
            armed: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl DocumentStore for SlowLookupStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<DocumentSnapshot>> {
        if collection == self.slow_collection && self.armed.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.get_document(collection, id).await
    }

    async fn put_merge(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        self.inner.put_merge(collection, id, fields).await
    }

    async fn append_document(&self, collection: &str, fields: Document) -> StoreResult<String> {
        self.inner.append_document(collection, fields).await
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<()> {
        self.inner.increment_field(collection, id, field, delta).await
    }

    fn subscribe_collection(&self, collection: &str) -> watch::Receiver<CollectionSnapshot> {
        self.inner.subscribe_collection(collection)
    }

    fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
    ) -> watch::Receiver<Option<DocumentSnapshot>> {
        self.inner.subscribe_document(collection, id)
    }
}
