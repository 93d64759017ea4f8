//! User profile entity - sparse display-name record

use serde::{Deserialize, Serialize};

use crate::traits::DocumentSnapshot;
use crate::value_objects::UserId;

/// Sparse user profile; absence of `username` means the raw uid is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub username: Option<String>,
}

impl UserProfile {
    /// Decode a profile from a stored document
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        Self {
            uid: UserId::new(snapshot.id.clone()),
            username: snapshot
                .str_field("username")
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// The name to display: the stored username, or the raw uid
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(self.uid.as_str())
    }
}
