//! Structured review and refactor results.

use serde::{Deserialize, Serialize};

/// Categorised review findings.
///
/// All three lists are always present. A category the model did not
/// produce (or produced in an unrecognisable shape) is an empty list,
/// never absent. Order is extraction order, not significance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub style: Vec<String>,
    #[serde(default)]
    pub performance: Vec<String>,
    #[serde(default)]
    pub security: Vec<String>,
}

impl AnalysisResult {
    /// Total number of findings across all categories.
    pub fn len(&self) -> usize {
        self.style.len() + self.performance.len() + self.security.len()
    }

    /// True when no category produced a finding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A refactoring of caller-supplied code.
///
/// `original` is always the caller's input verbatim, never text echoed
/// by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactorResult {
    pub original: String,
    pub refactored: String,
    #[serde(default)]
    pub improvements: Vec<String>,
}

impl RefactorResult {
    /// Whether the model produced no change to the input.
    pub fn is_noop(&self) -> bool {
        self.original == self.refactored
    }
}
