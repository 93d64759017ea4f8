//! Group settings - shared feature toggles
//!
//! A single document edited concurrently by multiple participants. Updates
//! always merge-write exactly one key so sibling toggles are never
//! clobbered. The toggles are advisory display filters: disabling a panel
//! must not stop the underlying subscription.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::{Document, DocumentSnapshot};

/// Group-wide feature toggles with their hard-coded defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    pub enable_group_stats: bool,
    pub enable_leaderboard: bool,
    pub enable_shared_coins: bool,
    pub show_trophies: bool,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            enable_group_stats: true,
            enable_leaderboard: true,
            enable_shared_coins: false,
            show_trophies: true,
        }
    }
}

impl GroupSettings {
    /// Decode settings from the shared document; missing fields keep their
    /// defaults, a missing document is `Self::default()` at the call site.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| {
            snapshot
                .field(name)
                .and_then(Value::as_bool)
                .unwrap_or(default)
        };
        Self {
            enable_group_stats: flag("enableGroupStats", defaults.enable_group_stats),
            enable_leaderboard: flag("enableLeaderboard", defaults.enable_leaderboard),
            enable_shared_coins: flag("enableSharedCoins", defaults.enable_shared_coins),
            show_trophies: flag("showTrophies", defaults.show_trophies),
        }
    }

    /// Read one toggle by key
    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::EnableGroupStats => self.enable_group_stats,
            SettingKey::EnableLeaderboard => self.enable_leaderboard,
            SettingKey::EnableSharedCoins => self.enable_shared_coins,
            SettingKey::ShowTrophies => self.show_trophies,
        }
    }
}

/// The settings document keys that may be toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    EnableGroupStats,
    EnableLeaderboard,
    EnableSharedCoins,
    ShowTrophies,
}

impl SettingKey {
    /// The stored field name for this key
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::EnableGroupStats => "enableGroupStats",
            Self::EnableLeaderboard => "enableLeaderboard",
            Self::EnableSharedCoins => "enableSharedCoins",
            Self::ShowTrophies => "showTrophies",
        }
    }

    /// Build the single-key merge document for an update
    pub fn merge_document(&self, value: bool) -> Document {
        let mut fields = Document::new();
        fields.insert(self.field_name().to_string(), Value::Bool(value));
        fields
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}
