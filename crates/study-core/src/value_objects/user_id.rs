//! User identifier - opaque id assigned by the external identity provider
//!
//! The statistics collection reserves the id `"default"` as a sentinel row
//! holding group-aggregate totals; it is never a real user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Reserved id for the group-aggregate sentinel row
    pub const SENTINEL: &'static str = "default";

    /// Create a new UserId from a raw string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this id is the group-aggregate sentinel
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.0 == Self::SENTINEL
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
