//! Display-name resolution
//!
//! Profiles are sparse: until a username is observed, the raw uid is the
//! display name. Resolution is live - a profile edit reaches every resolver
//! without a refetch. Used by the message stream (stamping outgoing
//! messages) and by anything rendering the current user.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use validator::Validate;

use study_core::traits::{Document, DocumentStore};
use study_core::{SyncError, SyncResult, UserId, UserProfile};

/// Username update payload, validated like the remote rules
#[derive(Debug, Clone, Validate)]
struct UsernameUpdate {
    #[validate(length(min = 2, max = 32, message = "Username must be 2-32 characters"))]
    username: String,
}

/// Profile reads and writes over the users collection
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ProfileService {
    /// Create a new service over the given collection
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Start a live display-name resolver for one user
    pub fn resolver(&self, uid: UserId) -> NameResolver {
        NameResolver::spawn(Arc::clone(&self.store), self.collection.clone(), uid)
    }

    /// One-shot display-name lookup with the uid fallback
    pub async fn display_name(&self, uid: &UserId) -> String {
        match self.store.get_document(&self.collection, uid.as_str()).await {
            Ok(Some(snap)) => UserProfile::from_snapshot(&snap).display_name().to_string(),
            Ok(None) => uid.to_string(),
            Err(err) => {
                tracing::warn!(uid = %uid, error = %err, "Profile lookup failed, using uid");
                uid.to_string()
            }
        }
    }

    /// Merge-write the `username` field of the user's profile
    pub async fn set_username(&self, uid: &UserId, username: &str) -> SyncResult<()> {
        let update = UsernameUpdate {
            username: username.trim().to_string(),
        };
        if update.validate().is_err() {
            return Err(SyncError::InvalidUsername(username.to_string()));
        }

        let mut fields = Document::new();
        fields.insert("username".into(), Value::String(update.username));
        self.store
            .put_merge(&self.collection, uid.as_str(), fields)
            .await?;
        tracing::info!(uid = %uid, "Username updated");
        Ok(())
    }
}

/// Live display name for one user
pub struct NameResolver {
    uid: UserId,
    rx: watch::Receiver<String>,
    pump: JoinHandle<()>,
}

impl NameResolver {
    fn spawn(store: Arc<dyn DocumentStore>, collection: String, uid: UserId) -> Self {
        let mut source = store.subscribe_document(&collection, uid.as_str());
        let (tx, rx) = watch::channel(uid.to_string());
        let pump_uid = uid.clone();

        let pump = tokio::spawn(async move {
            loop {
                let name = source
                    .borrow_and_update()
                    .as_ref()
                    .map(|snap| UserProfile::from_snapshot(snap).display_name().to_string())
                    .unwrap_or_else(|| pump_uid.to_string());
                tx.send_replace(name);

                if source.changed().await.is_err() {
                    tracing::debug!(uid = %pump_uid, "Profile source closed");
                    break;
                }
            }
        });

        Self { uid, rx, pump }
    }

    /// The user this resolver follows
    pub fn uid(&self) -> &UserId {
        &self.uid
    }

    /// The current display name
    pub fn current(&self) -> String {
        self.rx.borrow().clone()
    }

    /// Subscribe to display-name changes
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }

    /// Stop the pump and release the store subscription
    pub fn shutdown(&self) {
        self.pump.abort();
    }
}

impl Drop for NameResolver {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
