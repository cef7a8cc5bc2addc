//! Provider identity and sampling parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MimirError;

/// Identifies one of the supported model vendors.
///
/// The string forms (`"openai"`, `"llama"`) are what callers pass to
/// model selection and what configuration files contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "llama")]
    Llama,
}

impl ProviderId {
    /// Every known provider, in fallback order.
    pub const ALL: [ProviderId; 2] = [ProviderId::OpenAi, ProviderId::Llama];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Llama => "llama",
        }
    }

    /// The provider tried when this one has no credential.
    pub fn fallback(&self) -> ProviderId {
        match self {
            ProviderId::OpenAi => ProviderId::Llama,
            ProviderId::Llama => ProviderId::OpenAi,
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            ProviderId::OpenAi => 0,
            ProviderId::Llama => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> ProviderId {
        match value {
            0 => ProviderId::OpenAi,
            _ => ProviderId::Llama,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = MimirError;

    /// Exact, case-sensitive match on the provider's string form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderId::OpenAi),
            "llama" => Ok(ProviderId::Llama),
            other => Err(MimirError::InvalidModel(other.to_string())),
        }
    }
}

/// Sampling parameters sent with every completion request.
///
/// Fixed for the lifetime of a [`Reviewer`](crate::Reviewer); only the
/// active provider can change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2048,
            top_p: 0.95,
        }
    }
}

impl SamplingParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }
}
