//! Review/refactor orchestration.
//!
//! ```text
//! analyze(code)
//!     │ fingerprint(analysis, code)
//!     ▼
//! cache.get ──hit──► decode ──► return
//!     │ miss
//!     ▼
//! selector.active() ──► provider.analyze ──► extract_analysis
//!     │
//!     ▼
//! cache.get again ──already stored──► return stored result
//!     │ still absent
//!     ▼
//! cache.put(ttl) ──► return
//! ```
//!
//! Concurrent misses on the same fingerprint may each call a provider; the
//! second look at the cache makes the first successful writer win. A blank
//! completion is never cached, so the next request asks again.

mod builder;

pub use builder::{Mimir, MimirBuilder};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheConfig, CacheStore, Fingerprint};
use crate::extract::{extract_analysis, extract_refactor_traced};
use crate::selector::ModelSelector;
use crate::telemetry;
use crate::traits::CodeReviewer;
use crate::types::{AnalysisResult, Operation, ProviderId, RefactorResult, SamplingParams};
use crate::Result;

/// Cached code review and refactoring over the active provider.
pub struct Reviewer {
    selector: ModelSelector,
    cache: Arc<dyn CacheStore>,
    cache_config: CacheConfig,
    params: SamplingParams,
}

impl Reviewer {
    pub(crate) fn new(
        selector: ModelSelector,
        cache: Arc<dyn CacheStore>,
        cache_config: CacheConfig,
        params: SamplingParams,
    ) -> Self {
        Self {
            selector,
            cache,
            cache_config,
            params,
        }
    }

    /// Review findings for `code`, from cache when possible.
    pub async fn analyze(&self, code: &str) -> Result<AnalysisResult> {
        let key = Fingerprint::analysis(code);
        self.resolve(Operation::Analysis, code, &key, |text| {
            let result = extract_analysis(text);
            let strategy = if result.is_empty() {
                "none"
            } else {
                "labeled_arrays"
            };
            Ok((result, strategy))
        })
        .await
    }

    /// Refactoring of `code`, from cache when possible.
    ///
    /// Fails with `NoStructuredContent` when the completion held nothing
    /// usable; such failures are not cached.
    pub async fn refactor(&self, code: &str) -> Result<RefactorResult> {
        let key = Fingerprint::refactor(code);
        self.resolve(Operation::Refactor, code, &key, |text| {
            extract_refactor_traced(text, code)
        })
        .await
    }

    /// Switch the active provider.
    pub fn select_model(&self, id: &str) -> Result<ProviderId> {
        self.selector.select(id)
    }

    pub fn current_model(&self) -> ProviderId {
        self.selector.current()
    }

    /// Providers with a configured adapter.
    pub fn available_models(&self) -> Vec<ProviderId> {
        self.selector.available()
    }

    pub fn sampling(&self) -> SamplingParams {
        self.params
    }

    #[instrument(skip_all, fields(operation = %operation, fingerprint = %key.short()))]
    async fn resolve<T, F>(
        &self,
        operation: Operation,
        code: &str,
        key: &Fingerprint,
        extract: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&str) -> Result<(T, &'static str)>,
    {
        if let Some(hit) = self.lookup::<T>(key).await {
            debug!("cache hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => operation.as_str())
                .increment(1);
            return Ok(hit);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => operation.as_str())
            .increment(1);

        // Captured once: a concurrent switch does not affect this call.
        let provider = self.selector.active()?;
        let start = Instant::now();
        let completion = match operation {
            Operation::Analysis => provider.analyze(code, &self.params).await,
            Operation::Refactor => provider.refactor(code, &self.params).await,
        };
        Self::record_request(operation, provider.id(), start, completion.is_ok());
        let completion = completion?;
        debug!(
            provider = %provider.id(),
            chars = completion.len(),
            "completion received"
        );

        let (result, strategy) = match extract(&completion) {
            Ok(extracted) => extracted,
            Err(e) => {
                Self::record_extraction(operation, "none");
                warn!(provider = %provider.id(), error = %e, "extraction failed");
                return Err(e);
            }
        };
        Self::record_extraction(operation, strategy);

        if let Some(existing) = self.lookup::<T>(key).await {
            debug!("result stored concurrently, keeping the first");
            return Ok(existing);
        }
        if completion.trim().is_empty() {
            debug!(provider = %provider.id(), "blank completion, result not cached");
            return Ok(result);
        }
        self.store(key, &result, operation).await;
        info!(provider = %provider.id(), strategy, "result cached");
        Ok(result)
    }

    /// Decoded cached value. Backend errors and undecodable payloads are
    /// logged and read as absent.
    async fn lookup<T: DeserializeOwned>(&self, key: &Fingerprint) -> Option<T> {
        let payload = match self.cache.get(key).await {
            Ok(payload) => payload?,
            Err(e) => {
                warn!(cache = self.cache.name(), error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(cache = self.cache.name(), error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &Fingerprint, value: &T, operation: Operation) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode result for cache");
                return;
            }
        };
        let ttl = self.cache_config.ttl_for(operation);
        if let Err(e) = self.cache.put(key, payload, ttl).await {
            warn!(cache = self.cache.name(), error = %e, "cache write failed");
        }
    }

    /// Record request outcome metrics (counter + histogram).
    fn record_request(operation: Operation, provider: ProviderId, start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        let elapsed = start.elapsed().as_secs_f64();
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider.as_str(),
            "operation" => operation.as_str(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider.as_str(),
            "operation" => operation.as_str(),
        )
        .record(elapsed);
    }

    fn record_extraction(operation: Operation, strategy: &'static str) {
        metrics::counter!(telemetry::EXTRACTION_TOTAL,
            "operation" => operation.as_str(),
            "strategy" => strategy,
        )
        .increment(1);
    }
}

impl std::fmt::Debug for Reviewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reviewer")
            .field("selector", &self.selector)
            .field("cache", &self.cache.name())
            .field("params", &self.params)
            .finish()
    }
}

#[async_trait]
impl CodeReviewer for Reviewer {
    async fn analyze(&self, code: &str) -> Result<AnalysisResult> {
        Reviewer::analyze(self, code).await
    }

    async fn refactor(&self, code: &str) -> Result<RefactorResult> {
        Reviewer::refactor(self, code).await
    }

    fn select_model(&self, id: &str) -> Result<()> {
        Reviewer::select_model(self, id).map(|_| ())
    }

    fn current_model(&self) -> ProviderId {
        Reviewer::current_model(self)
    }
}
