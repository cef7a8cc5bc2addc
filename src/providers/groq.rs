//! Groq client for the llama provider slot.
//!
//! Groq serves Llama models behind an OpenAI-compatible API.
//! See: <https://console.groq.com/docs/openai>

use std::time::Duration;

use async_trait::async_trait;

use super::openai_compat::{ChatEndpoint, ChatMessage, ChatRequest};
use super::traits::{CompletionProvider, CompletionRequest};
use crate::Result;
use crate::types::ProviderId;

/// Default base URL for Groq's OpenAI-compatible API
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// Client for Groq-hosted Llama, filling the `llama` provider slot.
///
/// Sends the prompt as a single user message with no response-format
/// constraint.
#[derive(Clone)]
pub struct GroqClient {
    endpoint: ChatEndpoint,
}

impl GroqClient {
    /// Create a client with the given API key.
    ///
    /// Fails with `Configuration` if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let endpoint = ChatEndpoint::new(ProviderId::Llama, api_key.into(), base_url, DEFAULT_MODEL)?;
        Ok(Self { endpoint })
    }

    /// Override the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.endpoint.model = model.into();
        self
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.endpoint.model
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    fn id(&self) -> ProviderId {
        ProviderId::Llama
    }

    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let messages = vec![ChatMessage::user(&request.prompt)];
        let body = ChatRequest::new(&self.endpoint.model, messages, &request.params);
        self.endpoint.send(&body).await
    }
}
