//! In-memory document store
//!
//! Collections are insertion-ordered vectors of `(id, fields)` pairs inside
//! a `DashMap`, so snapshot order is append order - the tie-break the
//! message stream and the ranking rely on. Every mutation publishes a fresh
//! full snapshot to the collection's watch channel and to the affected
//! document channel.
//!
//! Two testing hooks are exposed: a write-failure injection switch and a
//! mutation counter, both used by the scenario suite to assert that
//! rejected operations issue zero remote writes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Number, Value};
use tokio::sync::watch;

use study_core::traits::{
    CollectionSnapshot, Document, DocumentSnapshot, DocumentStore, StoreError, StoreResult,
};

/// In-process document store with watch-based change subscriptions
pub struct MemoryStore {
    /// Collection name -> insertion-ordered documents
    collections: DashMap<String, Vec<(String, Document)>>,

    /// Collection name -> full-snapshot publisher
    collection_watch: DashMap<String, watch::Sender<CollectionSnapshot>>,

    /// (collection, id) -> single-document publisher
    document_watch: DashMap<(String, String), watch::Sender<Option<DocumentSnapshot>>>,

    /// When set, every mutation fails with `StoreError::Unavailable`
    fail_writes: AtomicBool,

    /// Count of successful mutations
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            collection_watch: DashMap::new(),
            document_watch: DashMap::new(),
            fail_writes: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    /// Create an empty store wrapped in `Arc`
    #[must_use]
    pub fn new_shared() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::new())
    }

    /// Toggle write-failure injection
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of mutations applied so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Reject the mutation if failure injection is active
    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }

    /// Current full snapshot of a collection
    fn snapshot_of(&self, collection: &str) -> CollectionSnapshot {
        let docs = self
            .collections
            .get(collection)
            .map(|entry| {
                entry
                    .iter()
                    .map(|(id, fields)| DocumentSnapshot::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        CollectionSnapshot { docs }
    }

    /// Current state of a single document
    fn document_of(&self, collection: &str, id: &str) -> Option<DocumentSnapshot> {
        self.collections.get(collection).and_then(|entry| {
            entry
                .iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(doc_id, fields)| DocumentSnapshot::new(doc_id.clone(), fields.clone()))
        })
    }

    /// Push fresh snapshots to all subscribers of the collection and the
    /// touched document
    fn publish(&self, collection: &str, id: &str) {
        if let Some(tx) = self.collection_watch.get(collection) {
            tx.send_replace(self.snapshot_of(collection));
        }
        let key = (collection.to_string(), id.to_string());
        if let Some(tx) = self.document_watch.get(&key) {
            tx.send_replace(self.document_of(collection, id));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(collection, id, "Mutation published");
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<DocumentSnapshot>> {
        Ok(self.document_of(collection, id))
    }

    async fn put_merge(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        self.check_writable()?;
        {
            let mut entry = self.collections.entry(collection.to_string()).or_default();
            match entry.iter_mut().find(|(doc_id, _)| doc_id == id) {
                Some((_, existing)) => {
                    // shallow per-field merge: siblings are never touched
                    for (key, value) in fields {
                        existing.insert(key, value);
                    }
                }
                None => entry.push((id.to_string(), fields)),
            }
        }
        self.publish(collection, id);
        Ok(())
    }

    async fn append_document(&self, collection: &str, fields: Document) -> StoreResult<String> {
        self.check_writable()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        {
            let mut entry = self.collections.entry(collection.to_string()).or_default();
            entry.push((id.clone(), fields));
        }
        self.publish(collection, &id);
        Ok(id)
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<()> {
        self.check_writable()?;
        {
            let mut entry = self.collections.entry(collection.to_string()).or_default();
            match entry.iter_mut().find(|(doc_id, _)| doc_id == id) {
                Some((_, existing)) => {
                    let next = match existing.get(field) {
                        Some(Value::Number(n)) => {
                            if let Some(i) = n.as_i64() {
                                Value::Number(Number::from(i + delta))
                            } else if let Some(f) = n.as_f64() {
                                Number::from_f64(f + delta as f64)
                                    .map(Value::Number)
                                    .ok_or_else(|| {
                                        StoreError::Serialization(format!(
                                            "non-finite increment result for {field}"
                                        ))
                                    })?
                            } else {
                                return Err(StoreError::Serialization(format!(
                                    "field {field} is not a representable number"
                                )));
                            }
                        }
                        None => Value::Number(Number::from(delta)),
                        Some(_) => {
                            return Err(StoreError::Serialization(format!(
                                "field {field} is not numeric"
                            )));
                        }
                    };
                    existing.insert(field.to_string(), next);
                }
                None => {
                    // increments create the document, matching the remote
                    // service's upsert semantics
                    let mut fields = Document::new();
                    fields.insert(field.to_string(), Value::Number(Number::from(delta)));
                    entry.push((id.to_string(), fields));
                }
            }
        }
        self.publish(collection, id);
        Ok(())
    }

    fn subscribe_collection(&self, collection: &str) -> watch::Receiver<CollectionSnapshot> {
        let tx = self
            .collection_watch
            .entry(collection.to_string())
            .or_insert_with(|| watch::channel(self.snapshot_of(collection)).0);
        tx.subscribe()
    }

    fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
    ) -> watch::Receiver<Option<DocumentSnapshot>> {
        let key = (collection.to_string(), id.to_string());
        let tx = self
            .document_watch
            .entry(key)
            .or_insert_with(|| watch::channel(self.document_of(collection, id)).0);
        tx.subscribe()
    }
}
