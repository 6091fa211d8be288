//! Display mode: the normal site or the serialized machine view.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the machine-view overlay is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The normal, visual site.
    Human,
    /// The full-screen Markdown dump.
    Machine,
}

impl Mode {
    /// Parse a mode from its persisted literal.
    ///
    /// Only the exact literals `"human"` and `"machine"` are recognized.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "human" => Some(Self::Human),
            "machine" => Some(Self::Machine),
            _ => None,
        }
    }

    /// Interpret a persisted value. Missing or unrecognized values yield `Human`.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(Self::from_str).unwrap_or_default()
    }

    /// The literal stored for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Machine => "machine",
        }
    }

    /// The other mode.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Human => Self::Machine,
            Self::Machine => Self::Human,
        }
    }

    /// Whether the overlay is showing.
    pub fn is_machine(&self) -> bool {
        matches!(self, Self::Machine)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Human
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
