//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (CLI flag; must exist)
//! 2. `~/.mimir/config.toml` (user)
//! 3. `/etc/mimir/config.toml` (system)
//!
//! No file at all means defaults. `AI_MODEL`, `AI_TEMPERATURE`,
//! `AI_MAX_TOKENS`, `AI_TOP_P` and `REDIS_URL` then override the file.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.mimir/secrets.toml` (user, must be 0600)
//! 2. `/etc/mimir/secrets.toml` (system, must be 0600)
//!
//! and fall back to `OPENAI_API_KEY` / `GROQ_API_KEY`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::types::{ProviderId, SamplingParams};
use crate::{MimirError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Provider choice and sampling.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Default provider id (default: "llama").
    #[serde(default = "default_model")]
    pub model: ProviderId,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Per-call provider timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> ProviderId {
    ProviderId::Llama
}

fn default_temperature() -> f32 {
    SamplingParams::default().temperature
}

fn default_max_tokens() -> u32 {
    SamplingParams::default().max_tokens
}

fn default_top_p() -> f32 {
    SamplingParams::default().top_p
}

fn default_timeout() -> u64 {
    60
}

/// Result cache limits.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Entry lifetime in seconds for both operations (default: 86400).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum cached entries (default: 10000). In-memory backend only.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Store results on this redis server instead of in memory.
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            redis_url: None,
        }
    }
}

fn default_ttl_secs() -> u64 {
    crate::cache::DEFAULT_TTL.as_secs()
}

fn default_max_entries() -> u64 {
    CacheConfig::default().max_entries
}

/// Per-vendor overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ApiProviderConfig,
    #[serde(default)]
    pub groq: ApiProviderConfig,
}

/// API provider overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProviderConfig {
    /// Model id sent to the vendor.
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL of the vendor's OpenAI-compatible API.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProvidersConfig {
    /// Overrides for the vendor filling `provider`'s slot.
    pub fn for_provider(&self, provider: ProviderId) -> &ApiProviderConfig {
        match provider {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Llama => &self.groq,
        }
    }
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openai: Option<ApiKeySecret>,
    #[serde(default)]
    pub groq: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Provider id → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(ProviderId, &str)] = &[
    (ProviderId::OpenAi, "OPENAI_API_KEY"),
    (ProviderId::Llama, "GROQ_API_KEY"),
];

impl Config {
    /// Load configuration from the standard locations, then apply
    /// environment overrides.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.mimir/config.toml`
    /// 3. `/etc/mimir/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env_with(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a config file without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MimirError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `None` when no file exists.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MimirError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mimir").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/mimir/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply `AI_*` and `REDIS_URL` overrides read through `lookup`.
    ///
    /// Numeric values that do not parse, or parse to zero, keep the current
    /// value. An unknown `AI_MODEL` is a configuration error.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(model) = lookup("AI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.ai.model = model.trim().parse().map_err(|_| {
                MimirError::Configuration(format!(
                    "AI_MODEL={model:?} is not a known provider (expected \"openai\" or \"llama\")"
                ))
            })?;
        }
        if let Some(value) = lookup("AI_TEMPERATURE").and_then(|v| nonzero_number(&v)) {
            self.ai.temperature = value as f32;
        }
        if let Some(value) = lookup("AI_MAX_TOKENS").and_then(|v| nonzero_number(&v))
            && value >= 1.0
        {
            self.ai.max_tokens = value as u32;
        }
        if let Some(value) = lookup("AI_TOP_P").and_then(|v| nonzero_number(&v)) {
            self.ai.top_p = value as f32;
        }
        if let Some(url) = lookup("REDIS_URL").filter(|v| !v.trim().is_empty()) {
            self.cache.redis_url = Some(url.trim().to_string());
        }
        Ok(())
    }

    pub fn sampling(&self) -> SamplingParams {
        SamplingParams::new()
            .temperature(self.ai.temperature)
            .max_tokens(self.ai.max_tokens)
            .top_p(self.ai.top_p)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.cache.max_entries)
            .ttl(Duration::from_secs(self.cache.ttl_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.request_timeout_secs)
    }
}

/// A finite, non-zero number, or `None`.
fn nonzero_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v != 0.0)
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.mimir/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/mimir/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (keys may come from env vars).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".mimir").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/mimir/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MimirError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(MimirError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// API key for a provider, falling back to its environment variable
    /// read through `lookup`. Blank keys count as absent.
    pub fn api_key_with(
        &self,
        provider: ProviderId,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        let from_file = match provider {
            ProviderId::OpenAi => self.openai.as_ref(),
            ProviderId::Llama => self.groq.as_ref(),
        }
        .map(|s| s.api_key.trim().to_string())
        .filter(|key| !key.is_empty());

        from_file.or_else(|| {
            PROVIDER_ENV_VARS
                .iter()
                .find(|(id, _)| *id == provider)
                .and_then(|(_, env_var)| lookup(env_var))
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.ai.model, ProviderId::Llama);
        assert_eq!(config.ai.max_tokens, 2048);
        assert_eq!(config.ai.request_timeout_secs, 60);
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert_eq!(config.cache.max_entries, 10_000);
        assert_eq!(config.sampling(), SamplingParams::default());
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [ai]
            model = "openai"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ai.model, ProviderId::OpenAi);
        // Defaults preserved
        assert_eq!(config.ai.top_p, 0.95);
        assert_eq!(config.cache.ttl_secs, 86_400);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [ai]
            model = "llama"
            temperature = 0.1
            max_tokens = 4000
            top_p = 0.9
            request_timeout_secs = 15

            [cache]
            ttl_secs = 3600
            max_entries = 500

            [providers.openai]
            model = "gpt-4o"

            [providers.groq]
            model = "llama3-8b-8192"
            base_url = "http://localhost:8080/v1"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ai.max_tokens, 4000);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.cache_config().max_entries, 500);
        assert_eq!(config.cache_config().analysis_ttl, Duration::from_secs(3600));
        assert_eq!(config.providers.openai.model.as_deref(), Some("gpt-4o"));
        assert!(config.providers.openai.base_url.is_none());
        assert_eq!(
            config.providers.for_provider(ProviderId::Llama).base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
    }

    #[test]
    fn unknown_model_in_file_is_rejected() {
        let toml = r#"
            [ai]
            model = "gpt-4"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_with(env(&[
                ("AI_MODEL", "openai"),
                ("AI_TEMPERATURE", "0.7"),
                ("AI_MAX_TOKENS", "1024"),
                ("AI_TOP_P", "0.5"),
            ]))
            .unwrap();
        assert_eq!(config.ai.model, ProviderId::OpenAi);
        assert_eq!(config.ai.temperature, 0.7);
        assert_eq!(config.ai.max_tokens, 1024);
        assert_eq!(config.ai.top_p, 0.5);
    }

    #[test]
    fn redis_url_from_file_and_env() {
        let toml = r#"
            [cache]
            redis_url = "redis://cache.internal:6379"
        "#;
        let mut config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://cache.internal:6379")
        );

        config
            .apply_env_with(env(&[("REDIS_URL", " redis://localhost:6379/2 ")]))
            .unwrap();
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://localhost:6379/2")
        );

        config.apply_env_with(env(&[("REDIS_URL", "  ")])).unwrap();
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://localhost:6379/2")
        );
        assert!(Config::default().cache.redis_url.is_none());
    }

    #[test]
    fn unparseable_or_zero_numbers_keep_defaults() {
        let mut config = Config::default();
        config
            .apply_env_with(env(&[
                ("AI_TEMPERATURE", "warm"),
                ("AI_MAX_TOKENS", "0"),
                ("AI_TOP_P", ""),
            ]))
            .unwrap();
        assert_eq!(config.sampling(), SamplingParams::default());
    }

    #[test]
    fn unknown_env_model_is_configuration_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_with(env(&[("AI_MODEL", "mistral")]))
            .unwrap_err();
        assert!(matches!(err, MimirError::Configuration(ref msg) if msg.contains("mistral")));
        assert_eq!(config.ai.model, ProviderId::Llama);
    }

    #[test]
    fn parse_secrets() {
        let toml = r#"
            [openai]
            api_key = "sk-test-key"
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.openai.as_ref().unwrap().api_key, "sk-test-key");
        assert!(secrets.groq.is_none());
    }

    #[test]
    fn api_key_prefers_file_then_env() {
        let secrets = Secrets {
            openai: Some(ApiKeySecret {
                api_key: "from-file".to_string(),
            }),
            ..Default::default()
        };
        let lookup = env(&[("OPENAI_API_KEY", "from-env"), ("GROQ_API_KEY", "gsk-env")]);
        assert_eq!(
            secrets.api_key_with(ProviderId::OpenAi, &lookup),
            Some("from-file".to_string())
        );
        assert_eq!(
            secrets.api_key_with(ProviderId::Llama, &lookup),
            Some("gsk-env".to_string())
        );
    }

    #[test]
    fn blank_keys_are_absent() {
        let secrets = Secrets {
            groq: Some(ApiKeySecret {
                api_key: "   ".to_string(),
            }),
            ..Default::default()
        };
        let lookup = env(&[("GROQ_API_KEY", "")]);
        assert_eq!(secrets.api_key_with(ProviderId::Llama, &lookup), None);
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }
}
