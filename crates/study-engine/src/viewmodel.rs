//! View model composition
//!
//! Composes the session context, message stream, leaderboard aggregator,
//! settings synchronizer, and display-name resolution into the single
//! read-only state tuple plus action set a host UI consumes. Every
//! subscription handle is owned here and released on shutdown; there is no
//! ambient registry.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use study_common::StoreConfig;
use study_core::traits::DocumentStore;
use study_core::{
    ChatMessage, GroupSettings, LeaderboardView, SettingKey, SyncError, SyncResult, UserId,
};

use crate::leaderboard::LeaderboardAggregator;
use crate::messages::MessageStream;
use crate::profile::ProfileService;
use crate::session::{CurrentUser, SessionContext};
use crate::settings::SettingsSync;

/// Which screen the host is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Chat,
    Leaderboard,
    Settings,
    Profile,
}

/// Read-only, always-current state tuple for the presentation layer
#[derive(Debug, Clone)]
pub struct ViewState {
    pub screen: Screen,
    pub current_user: Option<CurrentUser>,
    pub display_name: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub leaderboard: LeaderboardView,
    pub settings: GroupSettings,
}

impl ViewState {
    /// Whether a gated panel should be shown. Advisory only: the backing
    /// subscriptions keep running either way, so flipping a toggle back on
    /// is instant.
    pub fn panel_visible(&self, key: SettingKey) -> bool {
        self.settings.get(key)
    }
}

/// The composed engine surface for one group session
pub struct GroupViewModel {
    session: SessionContext,
    messages: MessageStream,
    leaderboard: LeaderboardAggregator,
    settings: SettingsSync,
    profile: ProfileService,
    display_name: watch::Receiver<Option<String>>,
    screen: RwLock<Screen>,
    binder: JoinHandle<()>,
}

impl GroupViewModel {
    /// Compose the managers over one store and session
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: SessionContext,
        config: StoreConfig,
    ) -> Self {
        let messages = MessageStream::spawn(Arc::clone(&store), config.chat_collection.clone());
        let leaderboard = LeaderboardAggregator::spawn(Arc::clone(&store), config.clone());
        let settings = SettingsSync::spawn(
            Arc::clone(&store),
            config.settings_collection.clone(),
            config.sentinel_id.clone(),
        );
        let profile = ProfileService::new(store, config.users_collection.clone());

        let (display_tx, display_name) = watch::channel(None);
        let binder = tokio::spawn(bind_display_name(
            session.clone(),
            profile.clone(),
            display_tx,
        ));

        Self {
            session,
            messages,
            leaderboard,
            settings,
            profile,
            display_name,
            screen: RwLock::new(Screen::default()),
            binder,
        }
    }

    // === State ===

    /// The full state tuple, observed at call time
    pub fn snapshot(&self) -> ViewState {
        ViewState {
            screen: *self.screen.read(),
            current_user: self.session.current_user(),
            display_name: self.display_name.borrow().clone(),
            messages: self.messages.current(),
            leaderboard: self.leaderboard.current(),
            settings: self.settings.current(),
        }
    }

    /// Subscribe to the ordered message list
    pub fn messages(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.messages.subscribe()
    }

    /// Subscribe to derived leaderboard views
    pub fn leaderboard(&self) -> watch::Receiver<LeaderboardView> {
        self.leaderboard.subscribe()
    }

    /// Subscribe to settings changes
    pub fn settings(&self) -> watch::Receiver<GroupSettings> {
        self.settings.subscribe()
    }

    /// Subscribe to the current user's display name
    pub fn display_name(&self) -> watch::Receiver<Option<String>> {
        self.display_name.clone()
    }

    /// The active screen
    pub fn screen(&self) -> Screen {
        *self.screen.read()
    }

    /// Switch the active screen
    pub fn set_screen(&self, screen: Screen) {
        *self.screen.write() = screen;
    }

    // === Actions ===

    /// Send a chat message as the current user
    pub async fn send_message(&self, body: &str) -> SyncResult<()> {
        let user = self.session.current_user();
        let uid = user.as_ref().map(|u| &u.uid);
        let display_name = self
            .display_name
            .borrow()
            .clone()
            .or_else(|| uid.map(ToString::to_string))
            .unwrap_or_default();
        self.messages.send(uid, &display_name, body).await
    }

    /// Like another user's statistics row
    pub async fn like(&self, target: &UserId) -> SyncResult<()> {
        let caller = self.session.current_uid().ok_or(SyncError::NotAuthenticated)?;
        self.leaderboard.like(&caller, target).await
    }

    /// Nudge another user's statistics row
    pub async fn nudge(&self, target: &UserId) -> SyncResult<()> {
        let caller = self.session.current_uid().ok_or(SyncError::NotAuthenticated)?;
        self.leaderboard.nudge(&caller, target).await
    }

    /// Toggle one group setting
    pub async fn set_setting(&self, key: SettingKey, value: bool) -> SyncResult<()> {
        self.settings.update(key, value).await
    }

    /// Change the current user's display name
    pub async fn set_username(&self, username: &str) -> SyncResult<()> {
        let caller = self.session.current_uid().ok_or(SyncError::NotAuthenticated)?;
        self.profile.set_username(&caller, username).await
    }

    /// Reserved: message editing is declared on the action surface but has
    /// no observed semantics yet.
    pub async fn edit_message(&self, _message_id: &str, _body: &str) -> SyncResult<()> {
        Err(SyncError::Unsupported)
    }

    /// Reserved: message deletion is declared on the action surface but has
    /// no observed semantics yet.
    pub async fn delete_message(&self, _message_id: &str) -> SyncResult<()> {
        Err(SyncError::Unsupported)
    }

    /// Release every subscription and stop all pump tasks
    pub fn shutdown(&self) {
        self.messages.shutdown();
        self.leaderboard.shutdown();
        self.settings.shutdown();
        self.binder.abort();
        tracing::debug!("View model shut down");
    }
}

impl Drop for GroupViewModel {
    fn drop(&mut self) {
        self.binder.abort();
    }
}

/// Follow the session: while signed in, mirror the user's live display
/// name; while signed out, publish `None`. Rebinds whenever the identity
/// changes, dropping the previous resolver (and its subscription).
async fn bind_display_name(
    session: SessionContext,
    profile: ProfileService,
    tx: watch::Sender<Option<String>>,
) {
    let mut session_rx = session.subscribe();
    loop {
        let user = session_rx.borrow_and_update().clone();
        match user {
            None => {
                tx.send_replace(None);
                if session_rx.changed().await.is_err() {
                    return;
                }
            }
            Some(user) => {
                let resolver = profile.resolver(user.uid.clone());
                let mut name_rx = resolver.subscribe();
                loop {
                    tx.send_replace(Some(name_rx.borrow_and_update().clone()));
                    tokio::select! {
                        changed = name_rx.changed() => {
                            if changed.is_err() {
                                // resolver closed: the store is gone
                                return;
                            }
                        }
                        changed = session_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            // identity changed: rebind
                            break;
                        }
                    }
                }
            }
        }
    }
}
