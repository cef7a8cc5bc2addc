//! OpenAI chat-completions client.
//!
//! See: <https://platform.openai.com/docs/api-reference/chat>

use std::time::Duration;

use async_trait::async_trait;

use super::openai_compat::{ChatEndpoint, ChatMessage, ChatRequest};
use super::prompts;
use super::traits::{CompletionProvider, CompletionRequest};
use crate::Result;
use crate::types::ProviderId;

/// Default base URL for the OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4-0125-preview";

/// Client for OpenAI, filling the `openai` provider slot.
///
/// Sends a task-specific system message followed by the prompt, and asks
/// for a JSON-object response.
#[derive(Clone)]
pub struct OpenAiClient {
    endpoint: ChatEndpoint,
}

impl OpenAiClient {
    /// Create a client with the given API key.
    ///
    /// Fails with `Configuration` if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let endpoint = ChatEndpoint::new(ProviderId::OpenAi, api_key.into(), base_url, DEFAULT_MODEL)?;
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
impl CompletionProvider for OpenAiClient {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let messages = vec![
            ChatMessage::system(prompts::system_message(request.operation)),
            ChatMessage::user(&request.prompt),
        ];
        let body = ChatRequest::new(&self.endpoint.model, messages, &request.params).json_object();
        self.endpoint.send(&body).await
    }
}
