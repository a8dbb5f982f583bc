//! Narrative state labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in the engine's narrative state machine.
///
/// The client treats the label as uninterpreted, except for the two
/// chapter states whose `ui_data` carries a `chapter` number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateName(String);

impl StateName {
    /// Initial state of every new session.
    pub const WELCOME: &'static str = "welcome";
    /// Chapter opening; `ui_data.chapter` holds the chapter number.
    pub const CHAPTER_BEFORE: &'static str = "chapter_before";
    /// Chapter resolution; `ui_data.chapter` holds the chapter number.
    pub const CHAPTER_AFTER: &'static str = "chapter_after";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is one of the chapter states.
    pub fn is_chapter(&self) -> bool {
        matches!(self.0.as_str(), Self::CHAPTER_BEFORE | Self::CHAPTER_AFTER)
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for StateName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StateName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
