//! Group settings synchronizer
//!
//! One shared document of feature toggles, edited concurrently by every
//! participant. The synchronizer keeps the current state live and writes
//! updates as single-key merges so sibling toggles are never clobbered.
//!
//! The toggles are advisory display filters only: consumers keep their data
//! subscriptions running while a panel is disabled, so re-enabling it is
//! instant.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use study_core::traits::DocumentStore;
use study_core::{GroupSettings, SettingKey, SyncResult};

/// Live view over the shared settings document
pub struct SettingsSync {
    store: Arc<dyn DocumentStore>,
    collection: String,
    document_id: String,
    rx: watch::Receiver<GroupSettings>,
    pump: JoinHandle<()>,
}

impl SettingsSync {
    /// Start the synchronizer. A missing remote document emits the
    /// hard-coded defaults.
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        let collection = collection.into();
        let document_id = document_id.into();
        let (tx, rx) = watch::channel(GroupSettings::default());
        let mut source = store.subscribe_document(&collection, &document_id);

        let pump = tokio::spawn(async move {
            loop {
                let settings = source
                    .borrow_and_update()
                    .as_ref()
                    .map(GroupSettings::from_snapshot)
                    .unwrap_or_default();
                tx.send_replace(settings);

                if source.changed().await.is_err() {
                    tracing::debug!("Settings source closed");
                    break;
                }
            }
        });

        Self {
            store,
            collection,
            document_id,
            rx,
            pump,
        }
    }

    /// Subscribe to settings changes
    pub fn subscribe(&self) -> watch::Receiver<GroupSettings> {
        self.rx.clone()
    }

    /// The current settings
    pub fn current(&self) -> GroupSettings {
        self.rx.borrow().clone()
    }

    /// Toggle one setting with a single-key merge write
    pub async fn update(&self, key: SettingKey, value: bool) -> SyncResult<()> {
        self.store
            .put_merge(&self.collection, &self.document_id, key.merge_document(value))
            .await?;
        tracing::info!(key = %key, value, "Setting updated");
        Ok(())
    }

    /// Stop the pump and release the store subscription
    pub fn shutdown(&self) {
        self.pump.abort();
    }
}

impl Drop for SettingsSync {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use study_core::traits::Document;
    use study_store::MemoryStore;

    async fn wait_until<T: Clone>(
        rx: &mut watch::Receiver<T>,
        mut pred: impl FnMut(&T) -> bool,
    ) -> T {
        tokio::time::timeout(Duration::from_secs(2), async {
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

    #[tokio::test]
    async fn test_missing_document_emits_defaults() {
        let store = MemoryStore::new_shared();
        let sync = SettingsSync::spawn(store, "groupSettings", "default");
        assert_eq!(sync.current(), GroupSettings::default());
    }

    #[tokio::test]
    async fn test_update_reaches_subscribers() {
        let store = MemoryStore::new_shared();
        let sync = SettingsSync::spawn(store, "groupSettings", "default");
        let mut rx = sync.subscribe();

        sync.update(SettingKey::EnableLeaderboard, false).await.unwrap();
        let settings = wait_until(&mut rx, |s| !s.enable_leaderboard).await;
        assert!(!settings.enable_leaderboard);
    }

    #[tokio::test]
    async fn test_update_preserves_concurrent_sibling_edit() {
        let store = MemoryStore::new_shared();
        let sync = SettingsSync::spawn(store.clone(), "groupSettings", "default");
        let mut rx = sync.subscribe();

        sync.update(SettingKey::EnableLeaderboard, false).await.unwrap();

        // another participant toggles a sibling key directly
        let mut sibling = Document::new();
        sibling.insert("enableSharedCoins".into(), json!(true));
        store
            .put_merge("groupSettings", "default", sibling)
            .await
            .unwrap();

        sync.update(SettingKey::EnableLeaderboard, true).await.unwrap();

        let settings =
            wait_until(&mut rx, |s| s.enable_leaderboard && s.enable_shared_coins).await;
        assert!(settings.enable_leaderboard);
        assert!(settings.enable_shared_coins);
    }
}
