//! Provider adapters.
//!
//! One client per vendor behind [`CompletionProvider`]. Both vendors speak
//! the OpenAI chat-completions protocol, so the HTTP layer is shared.

mod groq;
mod openai;
mod openai_compat;
pub mod prompts;
mod traits;

pub use groq::GroqClient;
pub use openai::OpenAiClient;
pub use openai_compat::DEFAULT_TIMEOUT;
pub use traits::{CompletionProvider, CompletionRequest};

/// Default base URLs and models, per vendor.
pub mod defaults {
    pub use super::groq::{DEFAULT_BASE_URL as GROQ_BASE_URL, DEFAULT_MODEL as GROQ_MODEL};
    pub use super::openai::{DEFAULT_BASE_URL as OPENAI_BASE_URL, DEFAULT_MODEL as OPENAI_MODEL};
}
