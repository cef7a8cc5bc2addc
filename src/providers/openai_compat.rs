//! OpenAI-compatible chat-completions wire layer.
//!
//! Both vendors speak the `/chat/completions` protocol; they differ only
//! in base URL, default model and message shaping. This module owns the
//! HTTP round trip and the status-to-error mapping.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::UpstreamCause;
use crate::types::{ProviderId, SamplingParams};
use crate::{MimirError, Result};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// An authenticated chat-completions endpoint.
#[derive(Clone)]
pub(crate) struct ChatEndpoint {
    provider: ProviderId,
    api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    http: Client,
}

impl ChatEndpoint {
    /// Fails with `Configuration` when the key is blank.
    pub fn new(
        provider: ProviderId,
        api_key: String,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(MimirError::Configuration(format!(
                "{provider}: API key is empty"
            )));
        }
        let http = Client::builder()
            .build()
            .map_err(|e| MimirError::Configuration(format!("{provider}: HTTP client: {e}")))?;

        Ok(Self {
            provider,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            http,
        })
    }

    /// POST the request and return the first choice's content.
    pub async fn send(&self, body: &ChatRequest<'_>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(provider = %self.provider, model = %self.model, "sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.upstream(UpstreamCause::from_reqwest(&e)))?;

        let response = self.handle_response_errors(response).await?;

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.upstream(UpstreamCause::from_reqwest(&e)))?;

        Ok(completion.into_content())
    }

    fn upstream(&self, cause: UpstreamCause) -> MimirError {
        MimirError::upstream(self.provider, cause)
    }

    /// Check response status and map to the appropriate error.
    async fn handle_response_errors(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let cause = match status.as_u16() {
            401 => UpstreamCause::AuthenticationFailed,
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                UpstreamCause::RateLimited { retry_after }
            }
            code => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&body)
                    .ok()
                    .map(|e| e.error.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("{} API error: {}", self.provider, status));
                UpstreamCause::Api {
                    status: code,
                    message,
                }
            }
        };
        Err(self.upstream(cause))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, messages: Vec<ChatMessage<'a>>, params: &SamplingParams) -> Self {
        Self {
            model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            response_format: None,
        }
    }

    /// Ask the vendor to constrain output to a JSON object.
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            kind: "json_object",
        });
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

impl ChatResponse {
    fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}
