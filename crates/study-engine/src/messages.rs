//! Message stream manager
//!
//! Maintains the ordered chat log from a live collection subscription and
//! exposes the send operation. Every notification re-sorts the entire known
//! set and re-emits the full list; the full-snapshot model keeps ordering
//! correct under out-of-order delivery without diff bookkeeping.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use validator::Validate;

use study_core::traits::{Document, DocumentStore};
use study_core::{sort_by_sent_at, ChatMessage, SyncError, SyncResult, UserId};

/// Maximum accepted message length, matching the remote rules
const MAX_MESSAGE_LEN: usize = 2000;

/// Outbound message payload
#[derive(Debug, Clone, Validate)]
pub struct OutgoingMessage {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub content: String,
}

/// Live view over the shared message collection
pub struct MessageStream {
    store: Arc<dyn DocumentStore>,
    collection: String,
    rx: watch::Receiver<Vec<ChatMessage>>,
    pump: JoinHandle<()>,
}

impl MessageStream {
    /// Start the stream: subscribes to the collection and keeps the ordered
    /// log current until shutdown or drop.
    pub fn spawn(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        let collection = collection.into();
        let (tx, rx) = watch::channel(Vec::new());
        let mut source = store.subscribe_collection(&collection);
        let log_target = collection.clone();

        let pump = tokio::spawn(async move {
            loop {
                let snapshot = source.borrow_and_update().clone();
                let mut messages: Vec<ChatMessage> = snapshot
                    .docs
                    .iter()
                    .filter_map(ChatMessage::from_snapshot)
                    .collect();
                sort_by_sent_at(&mut messages);
                tx.send_replace(messages);

                if source.changed().await.is_err() {
                    tracing::debug!(collection = %log_target, "Message source closed");
                    break;
                }
            }
        });

        Self {
            store,
            collection,
            rx,
            pump,
        }
    }

    /// Subscribe to the ordered message list
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.rx.clone()
    }

    /// The current ordered message list
    pub fn current(&self) -> Vec<ChatMessage> {
        self.rx.borrow().clone()
    }

    /// Append a message to the shared log.
    ///
    /// Rejected locally (zero remote writes) when the body is
    /// empty/whitespace-only or no sender is given. On success the caller
    /// may clear its input buffer; on a transport error the caller keeps
    /// the typed body for retry - nothing local is mutated and there is no
    /// automatic retry. The sender's own subscription notification is the
    /// authoritative echo; no optimistic local insert happens here.
    pub async fn send(
        &self,
        sender: Option<&UserId>,
        display_name: &str,
        body: &str,
    ) -> SyncResult<()> {
        let sender = sender.ok_or(SyncError::NotAuthenticated)?;
        if body.trim().is_empty() {
            return Err(SyncError::EmptyMessage);
        }

        let outgoing = OutgoingMessage {
            content: body.to_string(),
        };
        if outgoing.validate().is_err() {
            return Err(SyncError::MessageTooLong {
                max: MAX_MESSAGE_LEN,
            });
        }

        let mut fields = Document::new();
        fields.insert("sender".into(), Value::String(sender.to_string()));
        fields.insert("senderName".into(), Value::String(display_name.to_string()));
        fields.insert(
            "messageID".into(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
        fields.insert("message".into(), Value::String(outgoing.content));
        fields.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));

        let id = self.store.append_document(&self.collection, fields).await?;
        tracing::info!(message_id = %id, "Message appended");
        Ok(())
    }

    /// Stop the pump and release the store subscription
    pub fn shutdown(&self) {
        self.pump.abort();
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
