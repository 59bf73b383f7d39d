//! Identity newtypes for documents, sessions, and runs.
//!
//! All IDs are distinct newtype wrappers, providing type safety so that a
//! `RunId` cannot be accidentally used where a `SessionId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an editor document (its URI as reported by the editor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

/// Unique visualizer session identifier (UUID v4 newtype).
///
/// A fresh id is minted every time a panel is opened, so results that belong
/// to an earlier panel can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

/// Monotonic run counter within one host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl DocumentId {
    pub fn new(uri: impl Into<String>) -> Self {
        DocumentId(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl RunId {
    /// Returns the id following this one.
    pub fn next(self) -> RunId {
        RunId(self.0.wrapping_add(1))
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
