//! Telemetry metric name constants.
//!
//! Centralised metric names for mimir operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mimir_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider id ("openai" or "llama")
//! - `operation`: "analysis" or "refactor"
//! - `status`: outcome: "ok" or "error"
//! - `strategy`: extraction strategy that produced the result

/// Total completion requests sent to providers.
///
/// Labels: `provider`, `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "mimir_requests_total";

/// Provider request duration in seconds.
///
/// Labels: `provider`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "mimir_request_duration_seconds";

/// Total cache hits.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "mimir_cache_hits_total";

/// Total cache misses.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "mimir_cache_misses_total";

/// Total extractions, by the strategy that succeeded.
///
/// Labels: `operation`, `strategy` (e.g. "strict_json", "markdown";
/// "noop" for a refactor with no new code, "none" when extraction failed
/// or found nothing).
pub const EXTRACTION_TOTAL: &str = "mimir_extraction_total";

/// Total runtime provider switches.
///
/// Labels: `provider` (the newly active one).
pub const MODEL_SWITCHES_TOTAL: &str = "mimir_model_switches_total";
