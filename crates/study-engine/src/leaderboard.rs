//! Leaderboard aggregator
//!
//! Subscribes to the raw statistics collection and re-derives the full
//! joined ranking on every change: for each non-sentinel row the profile
//! username and trophy awards are resolved concurrently by point reads,
//! the sentinel row supplies the group totals, and the whole view is
//! emitted atomically - never a partial list.
//!
//! Derivations race: a second notification may arrive while a slow join is
//! still resolving. Each derivation carries a generation number taken when
//! its notification arrived; emission is guarded so a stale derivation can
//! never overwrite a newer one (last notification wins).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use study_common::StoreConfig;
use study_core::traits::{CollectionSnapshot, DocumentStore};
use study_core::{
    sort_ranking, GroupTotals, LeaderboardEntry, LeaderboardView, StudyTime, SyncError,
    SyncResult, TrophyAward, UserId, UserProfile, UserStatistics,
};

struct Inner {
    store: Arc<dyn DocumentStore>,
    config: StoreConfig,
    tx: watch::Sender<LeaderboardView>,
    /// Bumped once per source notification
    generation: AtomicU64,
    /// Generation of the last emitted view; guards against stale overwrite
    last_emitted: Mutex<u64>,
}

/// Live derived ranking over the statistics collection
pub struct LeaderboardAggregator {
    inner: Arc<Inner>,
    rx: watch::Receiver<LeaderboardView>,
    pump: JoinHandle<()>,
}

impl LeaderboardAggregator {
    /// Start the aggregator: subscribes to the statistics collection and
    /// keeps the derived view current until shutdown or drop.
    pub fn spawn(store: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        let (tx, rx) = watch::channel(LeaderboardView::default());
        let mut source = store.subscribe_collection(&config.statistics_collection);
        let inner = Arc::new(Inner {
            store,
            config,
            tx,
            generation: AtomicU64::new(0),
            last_emitted: Mutex::new(0),
        });

        let pump_inner = Arc::clone(&inner);
        let pump = tokio::spawn(async move {
            loop {
                let snapshot = source.borrow_and_update().clone();
                let generation = pump_inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::spawn(derive(Arc::clone(&pump_inner), snapshot, generation));

                if source.changed().await.is_err() {
                    tracing::debug!("Statistics source closed");
                    break;
                }
            }
        });

        Self { inner, rx, pump }
    }

    /// Subscribe to derived views
    pub fn subscribe(&self) -> watch::Receiver<LeaderboardView> {
        self.rx.clone()
    }

    /// The current derived view
    pub fn current(&self) -> LeaderboardView {
        self.rx.borrow().clone()
    }

    /// Send a like to another user's row
    pub async fn like(&self, caller: &UserId, target: &UserId) -> SyncResult<()> {
        self.bump(caller, target, "likes").await
    }

    /// Send a nudge to another user's row
    pub async fn nudge(&self, caller: &UserId, target: &UserId) -> SyncResult<()> {
        self.bump(caller, target, "nudges").await
    }

    /// Unconditional counter increment; self-targeting is rejected before
    /// any remote call. Pure increments compose under concurrent callers,
    /// so no read-modify-write is involved.
    async fn bump(&self, caller: &UserId, target: &UserId, field: &'static str) -> SyncResult<()> {
        if caller == target {
            return Err(SyncError::SelfTarget(target.clone()));
        }
        self.inner
            .store
            .increment_field(
                &self.inner.config.statistics_collection,
                target.as_str(),
                field,
                1,
            )
            .await?;
        tracing::debug!(uid = %target, field, "Counter incremented");
        Ok(())
    }

    /// Stop the pump and release the store subscription
    pub fn shutdown(&self) {
        self.pump.abort();
    }
}

impl Drop for LeaderboardAggregator {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// One full derivation of the view for a given source snapshot
async fn derive(inner: Arc<Inner>, snapshot: CollectionSnapshot, generation: u64) {
    let rows: Vec<UserStatistics> = snapshot
        .docs
        .iter()
        .map(UserStatistics::from_snapshot)
        .collect();

    let sentinel_minutes = rows
        .iter()
        .find(|r| r.uid.as_str() == inner.config.sentinel_id)
        .map(|r| r.total_time_studied)
        .unwrap_or(StudyTime::ZERO);

    let user_rows: Vec<&UserStatistics> = rows
        .iter()
        .filter(|r| r.uid.as_str() != inner.config.sentinel_id)
        .collect();

    let mut entries =
        futures::future::join_all(user_rows.iter().map(|row| resolve_entry(&inner, row))).await;
    sort_ranking(&mut entries);

    let coins = read_group_coins(&inner).await;

    let view = LeaderboardView {
        entries,
        totals: GroupTotals {
            minutes_studied: sentinel_minutes,
            coins,
        },
        generation,
    };

    // Emission guard: discard if a newer notification has already arrived,
    // or if a newer derivation has already been emitted.
    let mut last = inner.last_emitted.lock();
    if inner.generation.load(Ordering::SeqCst) != generation || *last >= generation {
        tracing::debug!(generation, "Discarded stale leaderboard derivation");
        return;
    }
    *last = generation;
    inner.tx.send_replace(view);
    tracing::trace!(generation, "Leaderboard view emitted");
}

/// Resolve one ranked row, joining profile and trophies concurrently.
/// Lookup failures degrade this row to its defaults; the rest of the
/// ranking is unaffected.
async fn resolve_entry(inner: &Inner, row: &UserStatistics) -> LeaderboardEntry {
    let (profile, trophies) = tokio::join!(
        inner
            .store
            .get_document(&inner.config.users_collection, row.uid.as_str()),
        inner
            .store
            .get_document(&inner.config.trophies_collection, row.uid.as_str()),
    );

    let username = match profile {
        Ok(Some(snap)) => UserProfile::from_snapshot(&snap).display_name().to_string(),
        Ok(None) => row.uid.to_string(),
        Err(err) => {
            tracing::warn!(uid = %row.uid, error = %err, "Profile lookup failed, using uid");
            row.uid.to_string()
        }
    };

    let trophy_glyphs = match trophies {
        Ok(Some(snap)) => TrophyAward::from_snapshot(&snap).glyphs(),
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(uid = %row.uid, error = %err, "Trophy lookup failed, showing none");
            Vec::new()
        }
    };

    LeaderboardEntry {
        uid: row.uid.clone(),
        username,
        minutes_studied: row.total_time_studied,
        likes: row.likes,
        nudges: row.nudges,
        trophy_glyphs,
    }
}

/// Read the group coin total; a missing document (or a transport error)
/// resolves to zero rather than failing the derivation.
async fn read_group_coins(inner: &Inner) -> u64 {
    match inner
        .store
        .get_document(&inner.config.coins_collection, &inner.config.sentinel_id)
        .await
    {
        Ok(Some(snap)) => snap
            .field("coins")
            .and_then(Value::as_i64)
            .map(|n| n.max(0) as u64)
            .unwrap_or(0),
        Ok(None) => 0,
        Err(err) => {
            tracing::warn!(error = %err, "Coin total lookup failed, showing zero");
            0
        }
    }
}
