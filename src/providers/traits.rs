//! Completion provider trait.
//!
//! Every vendor sits behind [`CompletionProvider`]: one request in, the
//! completion text out. Vendor errors are not caught here; adapters map
//! them to [`MimirError::Upstream`](crate::MimirError::Upstream) carrying
//! their [`ProviderId`] and the orchestrator propagates them unchanged.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use mimir::{CompletionProvider, CompletionRequest, ProviderId, Result};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl CompletionProvider for Canned {
//!     fn id(&self) -> ProviderId { ProviderId::Llama }
//!     fn name(&self) -> &str { "canned" }
//!     async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
//!         Ok(r#"{"security": ["Validate input"]}"#.to_string())
//!     }
//! }
//! ```

use async_trait::async_trait;

use super::prompts;
use crate::Result;
use crate::types::{Operation, ProviderId, SamplingParams};

/// One completion request: the task, its full prompt, and sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub operation: Operation,
    /// Task prompt prefix followed by the code.
    pub prompt: String,
    pub params: SamplingParams,
}

impl CompletionRequest {
    /// Build the request for `operation` on `code`.
    pub fn new(operation: Operation, code: &str, params: SamplingParams) -> Self {
        Self {
            operation,
            prompt: prompts::build(operation, code),
            params,
        }
    }
}

/// A model vendor's completion API.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Which vendor slot this adapter fills.
    fn id(&self) -> ProviderId;

    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Send the request and return the first completion's text.
    ///
    /// A response without content yields an empty string, not an error.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Raw analysis completion for `code`.
    async fn analyze(&self, code: &str, params: &SamplingParams) -> Result<String> {
        self.complete(&CompletionRequest::new(Operation::Analysis, code, *params))
            .await
    }

    /// Raw refactor completion for `code`.
    async fn refactor(&self, code: &str, params: &SamplingParams) -> Result<String> {
        self.complete(&CompletionRequest::new(Operation::Refactor, code, *params))
            .await
    }
}
