//! Builder for configuring reviewer instances

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::Reviewer;
use crate::cache::{CacheConfig, CacheStore, MemoryCache};
use crate::config::{Config, Secrets};
use crate::providers::{CompletionProvider, DEFAULT_TIMEOUT, GroqClient, OpenAiClient};
use crate::selector::ModelSelector;
use crate::types::{ProviderId, SamplingParams};
use crate::Result;

/// Main entry point for creating reviewer instances.
pub struct Mimir;

impl Mimir {
    /// Create a new builder for configuring the reviewer.
    pub fn builder() -> MimirBuilder {
        MimirBuilder::new()
    }
}

/// Settings for one built-in vendor client.
#[derive(Debug, Clone, Default)]
struct VendorSettings {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

/// Builder for configuring reviewer instances.
pub struct MimirBuilder {
    openai: VendorSettings,
    groq: VendorSettings,
    custom: Vec<Arc<dyn CompletionProvider>>,
    default_provider: ProviderId,
    params: SamplingParams,
    timeout: Option<Duration>,
    cache: Option<Arc<dyn CacheStore>>,
    redis_url: Option<String>,
    cache_config: CacheConfig,
}

impl MimirBuilder {
    pub fn new() -> Self {
        Self {
            openai: VendorSettings::default(),
            groq: VendorSettings::default(),
            custom: Vec::new(),
            default_provider: ProviderId::Llama,
            params: SamplingParams::default(),
            timeout: None,
            cache: None,
            redis_url: None,
            cache_config: CacheConfig::default(),
        }
    }

    /// Configure the OpenAI provider.
    pub fn openai(mut self, api_key: impl Into<String>) -> Self {
        self.openai.api_key = Some(api_key.into());
        self
    }

    /// Configure the llama provider (Groq).
    pub fn groq(mut self, api_key: impl Into<String>) -> Self {
        self.groq.api_key = Some(api_key.into());
        self
    }

    /// Override the OpenAI model id.
    pub fn openai_model(mut self, model: impl Into<String>) -> Self {
        self.openai.model = Some(model.into());
        self
    }

    /// Override the Groq model id.
    pub fn groq_model(mut self, model: impl Into<String>) -> Self {
        self.groq.model = Some(model.into());
        self
    }

    /// Point the OpenAI client at another base URL.
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai.base_url = Some(url.into());
        self
    }

    /// Point the Groq client at another base URL.
    pub fn groq_base_url(mut self, url: impl Into<String>) -> Self {
        self.groq.base_url = Some(url.into());
        self
    }

    /// Register a custom adapter. It replaces any built-in client with
    /// the same [`ProviderId`].
    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.custom.push(provider);
        self
    }

    /// Preferred provider at startup (default: llama).
    pub fn default_provider(mut self, id: ProviderId) -> Self {
        self.default_provider = id;
        self
    }

    pub fn sampling(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Set the per-call timeout for built-in clients (seconds).
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Use a custom cache backend instead of the in-memory one.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Store results on the redis server at `url` (requires the `redis`
    /// feature). A cache set with [`MimirBuilder::cache`] takes precedence.
    pub fn redis(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Apply a loaded [`Config`] and the credentials in [`Secrets`].
    pub fn from_config(self, config: &Config, secrets: &Secrets) -> Self {
        self.from_config_with(config, secrets, |name| std::env::var(name).ok())
    }

    /// [`MimirBuilder::from_config`] with credential env reads going
    /// through `lookup`.
    pub fn from_config_with(
        mut self,
        config: &Config,
        secrets: &Secrets,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        for id in ProviderId::ALL {
            let overrides = config.providers.for_provider(id);
            let settings = match id {
                ProviderId::OpenAi => &mut self.openai,
                ProviderId::Llama => &mut self.groq,
            };
            if let Some(key) = secrets.api_key_with(id, &lookup) {
                settings.api_key = Some(key);
            }
            if overrides.model.is_some() {
                settings.model = overrides.model.clone();
            }
            if overrides.base_url.is_some() {
                settings.base_url = overrides.base_url.clone();
            }
        }
        self.default_provider = config.ai.model;
        self.params = config.sampling();
        self.timeout = Some(config.request_timeout());
        self.cache_config = config.cache_config();
        if config.cache.redis_url.is_some() {
            self.redis_url = config.cache.redis_url.clone();
        }
        self
    }

    /// Build the reviewer.
    ///
    /// Fails with `Configuration` if a given API key is blank, if no
    /// provider is usable, or if a redis URL is invalid or the `redis`
    /// feature is off.
    pub fn build(self) -> Result<Reviewer> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let mut providers: Vec<Arc<dyn CompletionProvider>> = Vec::new();

        if let Some(key) = self.openai.api_key {
            let mut client = match self.openai.base_url {
                Some(url) => OpenAiClient::with_base_url(key, url)?,
                None => OpenAiClient::new(key)?,
            }
            .with_timeout(timeout);
            if let Some(model) = self.openai.model {
                client = client.with_model(model);
            }
            debug!(model = client.model(), "openai provider configured");
            providers.push(Arc::new(client));
        }

        if let Some(key) = self.groq.api_key {
            let mut client = match self.groq.base_url {
                Some(url) => GroqClient::with_base_url(key, url)?,
                None => GroqClient::new(key)?,
            }
            .with_timeout(timeout);
            if let Some(model) = self.groq.model {
                client = client.with_model(model);
            }
            debug!(model = client.model(), "llama provider configured");
            providers.push(Arc::new(client));
        }

        providers.extend(self.custom);

        let selector = ModelSelector::new(providers, self.default_provider)?;
        let cache: Arc<dyn CacheStore> = match (self.cache, self.redis_url) {
            (Some(cache), _) => cache,
            (None, Some(url)) => redis_cache(&url)?,
            (None, None) => Arc::new(MemoryCache::new(&self.cache_config)),
        };
        debug!(cache = cache.name(), "result cache configured");

        Ok(Reviewer::new(selector, cache, self.cache_config, self.params))
    }
}

#[cfg(feature = "redis")]
fn redis_cache(url: &str) -> Result<Arc<dyn CacheStore>> {
    Ok(Arc::new(crate::cache::RedisCache::new(url)?))
}

#[cfg(not(feature = "redis"))]
fn redis_cache(_url: &str) -> Result<Arc<dyn CacheStore>> {
    Err(crate::MimirError::Configuration(
        "redis_url is set but mimir was built without the `redis` feature".to_string(),
    ))
}

impl Default for MimirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MimirError;

    #[test]
    fn no_provider_fails() {
        let err = Mimir::builder().build().unwrap_err();
        assert!(matches!(err, MimirError::Configuration(_)));
    }

    #[test]
    fn blank_key_fails() {
        let err = Mimir::builder().openai("").build().unwrap_err();
        assert!(matches!(err, MimirError::Configuration(_)));
    }

    #[test]
    fn default_falls_back_to_configured_provider() {
        let reviewer = Mimir::builder()
            .openai("sk-test")
            .default_provider(ProviderId::Llama)
            .build()
            .unwrap();
        assert_eq!(reviewer.current_model(), ProviderId::OpenAi);
        assert_eq!(reviewer.available_models(), vec![ProviderId::OpenAi]);
    }

    #[test]
    fn from_config_reads_keys_and_sampling() {
        let mut config = Config::default();
        config.ai.model = ProviderId::OpenAi;
        config.ai.temperature = 0.1;
        let lookup = |name: &str| match name {
            "OPENAI_API_KEY" => Some("sk-env".to_string()),
            "GROQ_API_KEY" => Some("gsk-env".to_string()),
            _ => None,
        };
        let reviewer = Mimir::builder()
            .from_config_with(&config, &Secrets::default(), lookup)
            .build()
            .unwrap();
        assert_eq!(reviewer.current_model(), ProviderId::OpenAi);
        assert_eq!(reviewer.available_models(), ProviderId::ALL.to_vec());
        assert_eq!(reviewer.sampling().temperature, 0.1);
    }

    #[cfg(not(feature = "redis"))]
    #[test]
    fn redis_url_without_feature_fails() {
        let err = Mimir::builder()
            .groq("gsk-test")
            .redis("redis://127.0.0.1:6379")
            .build()
            .unwrap_err();
        assert!(matches!(err, MimirError::Configuration(ref msg) if msg.contains("redis")));
    }

    #[cfg(feature = "redis")]
    #[test]
    fn from_config_redis_url_selects_redis_cache() {
        let mut config = Config::default();
        config.cache.redis_url = Some("redis://127.0.0.1:6379".to_string());
        let reviewer = Mimir::builder()
            .from_config_with(&config, &Secrets::default(), |name| {
                (name == "GROQ_API_KEY").then(|| "gsk-env".to_string())
            })
            .build()
            .unwrap();
        assert!(format!("{reviewer:?}").contains("\"redis\""));
    }

    #[test]
    fn explicit_cache_wins_over_redis_url() {
        let reviewer = Mimir::builder()
            .groq("gsk-test")
            .redis("redis://127.0.0.1:6379")
            .cache(Arc::new(MemoryCache::default()))
            .build()
            .unwrap();
        assert!(format!("{reviewer:?}").contains("\"memory\""));
    }

    #[test]
    fn from_config_without_credentials_fails_at_build() {
        let err = Mimir::builder()
            .from_config_with(&Config::default(), &Secrets::default(), |_| None)
            .build()
            .unwrap_err();
        assert!(matches!(err, MimirError::Configuration(_)));
    }
}
