//! Operation kinds served by the reviewer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two operations the reviewer performs on a code sample.
///
/// The operation kind is part of every cache fingerprint, so the same
/// code analysed and refactored occupies two distinct cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Analysis,
    Refactor,
}

impl Operation {
    /// Stable lowercase name, used in cache keys, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Analysis => "analysis",
            Operation::Refactor => "refactor",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
