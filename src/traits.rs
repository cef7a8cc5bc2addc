//! Core CodeReviewer trait

use async_trait::async_trait;

use crate::{AnalysisResult, ProviderId, RefactorResult, Result};

/// The surface exposed to the request-handling layer.
///
/// Implementations memoize by exact code text, so callers may resubmit
/// freely; a cache hit never reaches a provider.
#[async_trait]
pub trait CodeReviewer: Send + Sync {
    /// Categorised review findings for `code`.
    async fn analyze(&self, code: &str) -> Result<AnalysisResult>;

    /// Refactoring of `code`. `original` in the result is always `code`.
    async fn refactor(&self, code: &str) -> Result<RefactorResult>;

    /// Switch the active provider by id (`"openai"`, `"llama"`).
    ///
    /// On error the previous selection is kept.
    fn select_model(&self, id: &str) -> Result<()>;

    /// The active provider.
    fn current_model(&self) -> ProviderId;
}
