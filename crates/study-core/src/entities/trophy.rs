//! Trophy awards and the static glyph catalog

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::DocumentSnapshot;
use crate::value_objects::UserId;

/// Static catalog mapping trophy ids to display glyphs
const GLYPH_CATALOG: &[(&str, &str)] = &[
    ("scholar", "\u{1F4D6}"),     // 📖
    ("streak", "\u{1F525}"),      // 🔥
    ("early_bird", "\u{1F305}"),  // 🌅
    ("night_owl", "\u{1F989}"),   // 🦉
    ("marathon", "\u{1F3C5}"),    // 🏅
    ("champion", "\u{1F3C6}"),    // 🏆
    ("helper", "\u{1F91D}"),      // 🤝
];

/// Glyph shown for trophy ids the catalog does not know
const UNKNOWN_GLYPH: &str = "\u{1F396}"; // 🎖

/// Map a trophy id to its display glyph
pub fn glyph_for(trophy_id: &str) -> &'static str {
    GLYPH_CATALOG
        .iter()
        .find(|(id, _)| *id == trophy_id)
        .map(|(_, glyph)| *glyph)
        .unwrap_or(UNKNOWN_GLYPH)
}

/// Sparse trophy record; absence means zero trophies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrophyAward {
    pub uid: UserId,
    pub items: Vec<String>,
}

impl TrophyAward {
    /// Decode an award from a stored document
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        let items = snapshot
            .field("items")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            uid: UserId::new(snapshot.id.clone()),
            items,
        }
    }

    /// Resolve the ordered glyph sequence for this award
    pub fn glyphs(&self) -> Vec<&'static str> {
        self.items.iter().map(|id| glyph_for(id)).collect()
    }
}
