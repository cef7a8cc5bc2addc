//! Mimir - cached LLM code review and refactoring
//!
//! Sends a code sample to the active model provider with a task prompt,
//! recovers structured results from the loosely formatted completion,
//! and memoizes them by a fingerprint of the exact input so identical
//! submissions never pay for a second model call.
//!
//! # Example
//!
//! ```rust,no_run
//! use mimir::{Mimir, ProviderId};
//!
//! #[tokio::main]
//! async fn main() -> mimir::Result<()> {
//!     let reviewer = Mimir::builder()
//!         .groq("gsk-your-key")
//!         .openai("sk-your-key")
//!         .default_provider(ProviderId::Llama)
//!         .build()?;
//!
//!     let analysis = reviewer.analyze("function f(){}").await?;
//!     println!("security: {:?}", analysis.security);
//!
//!     reviewer.select_model("openai")?;
//!     let refactor = reviewer.refactor("function f(){}").await?;
//!     println!("{}", refactor.refactored);
//!     Ok(())
//! }
//! ```
//!
//! # Extraction only
//!
//! ```rust
//! let text = r#"{"style and readability": ["Add docstring"], "security": []}"#;
//! let result = mimir::extract::extract_analysis(text);
//! assert_eq!(result.style, vec!["Add docstring"]);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod providers;
pub mod reviewer;
pub mod selector;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheEntry, CacheStore, Fingerprint, MemoryCache};
#[cfg(feature = "redis")]
pub use cache::RedisCache;
pub use config::{Config, Secrets};
pub use error::{MimirError, Result, UpstreamCause};
pub use providers::{CompletionProvider, CompletionRequest, GroqClient, OpenAiClient};
pub use reviewer::{Mimir, MimirBuilder, Reviewer};
pub use selector::ModelSelector;
pub use traits::CodeReviewer;
pub use types::{AnalysisResult, Operation, ProviderId, RefactorResult, SamplingParams};
