//! Document-store port - the narrow contract over the external store
//!
//! The persistent service is an opaque, multi-writer document/collection
//! store reachable only through this trait: point reads, merge-writes,
//! append-only inserts, atomic increments, and push-based change
//! subscriptions. The mutation primitives are deliberately the ones that
//! stay safe under concurrent writers without coordination; nothing here
//! performs an unconditional overwrite of another party's fields.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

/// Field map of a single document
pub type Document = serde_json::Map<String, Value>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Transport-class errors from the remote store
///
/// These are surfaced to callers and never auto-retried; retry policy
/// belongs to the transport layer underneath the store implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("access denied: {0}")]
    Denied(String),

    #[error("malformed document: {0}")]
    Serialization(String),
}

/// A single document together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub fields: Document,
}

impl DocumentSnapshot {
    /// Create a snapshot from an id and field map
    pub fn new(id: impl Into<String>, fields: Document) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a field value
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a string field
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Full snapshot of a collection, in insertion order
///
/// Subscriptions deliver the whole collection on every change rather than
/// incremental diffs; consumers re-derive from scratch, which keeps the
/// derived view consistent under out-of-order delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSnapshot {
    pub docs: Vec<DocumentSnapshot>,
}

impl CollectionSnapshot {
    /// Number of documents in the snapshot
    #[inline]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check if the snapshot is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// The document-store port
///
/// Subscriptions are `tokio::watch` channels carrying full snapshots: a new
/// subscriber observes the current state immediately, and delivery conflates
/// to latest-wins, which is exactly the guarantee the full-snapshot
/// re-derivation model needs. Dropping the receiver releases the
/// subscription.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read of a single document
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<DocumentSnapshot>>;

    /// Merge-write: upsert only the given fields, preserving siblings
    async fn put_merge(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()>;

    /// Append-only insert with a store-assigned id; returns the new id
    async fn append_document(&self, collection: &str, fields: Document) -> StoreResult<String>;

    /// Atomic numeric increment of one field (creates document/field at
    /// `delta` when absent)
    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<()>;

    /// Subscribe to full snapshots of a collection
    fn subscribe_collection(&self, collection: &str) -> watch::Receiver<CollectionSnapshot>;

    /// Subscribe to a single document (or its absence)
    fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
    ) -> watch::Receiver<Option<DocumentSnapshot>>;
}
