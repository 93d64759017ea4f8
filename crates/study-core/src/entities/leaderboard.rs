//! Derived leaderboard types
//!
//! These are never persisted: every emission is a full recomputation from
//! the current source documents, so a view can never mix a stale username
//! with a fresh counter.

use serde::Serialize;

use crate::value_objects::{StudyTime, UserId};

/// One ranked row of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub uid: UserId,
    pub username: String,
    pub minutes_studied: StudyTime,
    pub likes: u64,
    pub nudges: u64,
    pub trophy_glyphs: Vec<&'static str>,
}

/// Group-wide totals from the sentinel rows
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GroupTotals {
    pub minutes_studied: StudyTime,
    pub coins: u64,
}

/// An atomically-emitted leaderboard view
///
/// `generation` increases monotonically with each source notification; a
/// consumer comparing generations can tell a fresh view from a replay.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LeaderboardView {
    pub entries: Vec<LeaderboardEntry>,
    pub totals: GroupTotals,
    pub generation: u64,
}

impl LeaderboardView {
    /// Find the entry for a user, if ranked
    pub fn entry(&self, uid: &UserId) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| &e.uid == uid)
    }
}

/// Sort entries descending by minutes studied; stable, so ties keep the
/// source snapshot order.
pub fn sort_ranking(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        b.minutes_studied
            .minutes()
            .total_cmp(&a.minutes_studied.minutes())
    });
}
