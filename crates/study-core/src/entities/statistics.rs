//! User statistics entity - raw per-user engagement counters
//!
//! One row per user, keyed by uid. The sentinel row (`uid = "default"`)
//! carries group-aggregate totals and must never be ranked.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::DocumentSnapshot;
use crate::value_objects::{StudyTime, UserId};

/// Raw statistics row for one user (or the sentinel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub uid: UserId,
    pub total_time_studied: StudyTime,
    pub likes: u64,
    pub nudges: u64,
}

impl UserStatistics {
    /// Decode a statistics row from a stored document.
    ///
    /// The uid comes from the `uid` field when present, otherwise from the
    /// document id. Counters and studied time fall back to zero.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        let uid = snapshot
            .str_field("uid")
            .map(UserId::from)
            .unwrap_or_else(|| UserId::new(snapshot.id.clone()));

        Self {
            uid,
            total_time_studied: StudyTime::from_field(snapshot.field("totalTimeStudied")),
            likes: counter(snapshot.field("likes")),
            nudges: counter(snapshot.field("nudges")),
        }
    }

    /// Check whether this is the group-aggregate sentinel row
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.uid.is_sentinel()
    }
}

/// Counters are non-negative; anything else reads as zero
fn counter(value: Option<&Value>) -> u64 {
    value
        .and_then(Value::as_i64)
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}
