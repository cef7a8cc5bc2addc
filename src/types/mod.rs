//! Public types for the mimir API.

mod operation;
mod provider;
mod review;

pub use operation::Operation;
pub use provider::{ProviderId, SamplingParams};
pub use review::{AnalysisResult, RefactorResult};
