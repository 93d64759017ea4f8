//! # study-core
//!
//! Domain layer containing entities, value objects, domain errors, and the
//! document-store port. This crate has zero dependencies on any concrete
//! store or presentation technology.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    glyph_for, sort_by_sent_at, sort_ranking, ChatMessage, GroupSettings, GroupTotals,
    LeaderboardEntry, LeaderboardView, MessageBody, SettingKey, TrophyAward, UserProfile,
    UserStatistics,
};
pub use error::{SyncError, SyncResult};
pub use traits::{
    CollectionSnapshot, Document, DocumentSnapshot, DocumentStore, StoreError, StoreResult,
};
pub use value_objects::{StudyTime, UserId};
