//! Session context - pushed identity state
//!
//! The identity provider is an external collaborator: it pushes the current
//! user (or its absence) through the [`SessionHandle`]; the engine consumes
//! the [`SessionContext`] read-only. Nothing here performs credential
//! exchange.

use tokio::sync::watch;

use study_core::UserId;

/// The signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: UserId,
}

/// Provider-side half: the identity layer pushes state changes here
pub struct SessionHandle {
    tx: watch::Sender<Option<CurrentUser>>,
}

/// Engine-side half: read-only view of the current identity
#[derive(Debug, Clone)]
pub struct SessionContext {
    rx: watch::Receiver<Option<CurrentUser>>,
}

/// Create a linked handle/context pair, starting signed out
pub fn session_channel() -> (SessionHandle, SessionContext) {
    let (tx, rx) = watch::channel(None);
    (SessionHandle { tx }, SessionContext { rx })
}

impl SessionHandle {
    /// Report a sign-in
    pub fn sign_in(&self, uid: impl Into<UserId>) {
        let uid = uid.into();
        tracing::info!(uid = %uid, "User signed in");
        self.tx.send_replace(Some(CurrentUser { uid }));
    }

    /// Report a sign-out
    pub fn sign_out(&self) {
        tracing::info!("User signed out");
        self.tx.send_replace(None);
    }
}

impl SessionContext {
    /// The current user, observed at call time
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.rx.borrow().clone()
    }

    /// The current uid, observed at call time
    pub fn current_uid(&self) -> Option<UserId> {
        self.rx.borrow().as_ref().map(|u| u.uid.clone())
    }

    /// Whether anyone is signed in right now
    pub fn is_signed_in(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Subscribe to identity changes
    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.rx.clone()
    }
}
