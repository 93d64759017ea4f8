//! Study time - total time studied by a user
//!
//! The statistics collection stores studied time in two raw shapes that
//! coexist in the wild: a plain numeric minute count, or a clock-style
//! `"HH:MM:SS"` string. Both normalize here to fractional minutes; display
//! always renders the canonical `HH:MM:SS` form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Normalized studied time, in fractional minutes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyTime(f64);

impl StudyTime {
    /// Zero studied time
    pub const ZERO: Self = Self(0.0);

    /// Create from a minute count
    #[inline]
    pub fn from_minutes(minutes: f64) -> Self {
        Self(minutes.max(0.0))
    }

    /// Parse a clock-style string: `"HH:MM:SS"` (or `"MM:SS"`)
    pub fn from_clock(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        let (h, m, s) = match parts.as_slice() {
            [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
            [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
            _ => return None,
        };
        if h < 0.0 || m < 0.0 || s < 0.0 {
            return None;
        }
        Some(Self(h * 60.0 + m + s / 60.0))
    }

    /// Normalize a raw document field value (number of minutes or clock string).
    ///
    /// Unparseable or missing values resolve to zero; this is the documented
    /// not-found fallback, not an error.
    pub fn from_field(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => Self::from_minutes(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => Self::from_clock(s).unwrap_or(Self::ZERO),
            _ => Self::ZERO,
        }
    }

    /// Total minutes, fractional
    #[inline]
    pub fn minutes(&self) -> f64 {
        self.0
    }

    /// Whole minutes, rounded down
    #[inline]
    pub fn whole_minutes(&self) -> u64 {
        self.0 as u64
    }

    /// Render the canonical `HH:MM:SS` string
    pub fn to_clock(&self) -> String {
        let total_seconds = (self.0 * 60.0).round() as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl fmt::Display for StudyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_clock())
    }
}
