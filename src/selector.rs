//! Active provider selection.
//!
//! The selector holds one adapter per configured vendor and an atomic
//! "active" id. Switching is visible to every call that starts afterwards;
//! calls already in flight keep the `Arc` they captured.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{info, warn};

use crate::providers::CompletionProvider;
use crate::telemetry;
use crate::types::ProviderId;
use crate::{MimirError, Result};

/// Process-wide choice of the active provider.
pub struct ModelSelector {
    /// Indexed by `ProviderId::to_u8`.
    slots: [Option<Arc<dyn CompletionProvider>>; 2],
    active: AtomicU8,
}

impl ModelSelector {
    /// Build from the constructed adapters and the preferred default.
    ///
    /// If `preferred` has no adapter, the other provider is used when it
    /// has one. Fails with `Configuration` when no adapter is present.
    /// A later adapter with the same id replaces an earlier one.
    pub fn new(
        providers: impl IntoIterator<Item = Arc<dyn CompletionProvider>>,
        preferred: ProviderId,
    ) -> Result<Self> {
        let mut slots: [Option<Arc<dyn CompletionProvider>>; 2] = [None, None];
        for provider in providers {
            let index = provider.id().to_u8() as usize;
            slots[index] = Some(provider);
        }

        let selector = Self {
            slots,
            active: AtomicU8::new(preferred.to_u8()),
        };

        if selector.has(preferred) {
            return Ok(selector);
        }
        let fallback = preferred.fallback();
        if selector.has(fallback) {
            warn!(
                preferred = %preferred,
                fallback = %fallback,
                "preferred provider has no credential, falling back"
            );
            selector.active.store(fallback.to_u8(), Ordering::Release);
            return Ok(selector);
        }
        Err(MimirError::Configuration(
            "no provider credential configured (set OPENAI_API_KEY or GROQ_API_KEY)".to_string(),
        ))
    }

    /// The active provider id.
    pub fn current(&self) -> ProviderId {
        ProviderId::from_u8(self.active.load(Ordering::Acquire))
    }

    /// Switch by string id.
    ///
    /// Unknown ids fail with `InvalidModel`; known ids without an adapter
    /// fail with `ProviderNotConfigured`. Either way the selection is
    /// unchanged.
    pub fn select(&self, id: &str) -> Result<ProviderId> {
        let id: ProviderId = id.parse()?;
        self.select_provider(id)?;
        Ok(id)
    }

    /// Switch to `id`.
    pub fn select_provider(&self, id: ProviderId) -> Result<()> {
        if !self.has(id) {
            return Err(MimirError::ProviderNotConfigured(id));
        }
        let previous = ProviderId::from_u8(self.active.swap(id.to_u8(), Ordering::AcqRel));
        if previous != id {
            info!(from = %previous, to = %id, "active provider switched");
        }
        metrics::counter!(telemetry::MODEL_SWITCHES_TOTAL, "provider" => id.as_str()).increment(1);
        Ok(())
    }

    /// Providers that have an adapter, in fixed order.
    pub fn available(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.has(*id))
            .collect()
    }

    /// The adapter for the active provider.
    pub fn active(&self) -> Result<Arc<dyn CompletionProvider>> {
        let id = self.current();
        self.get(id).ok_or(MimirError::ProviderNotConfigured(id))
    }

    /// The adapter for `id`, if configured.
    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn CompletionProvider>> {
        self.slots[id.to_u8() as usize].clone()
    }

    fn has(&self, id: ProviderId) -> bool {
        self.slots[id.to_u8() as usize].is_some()
    }
}

impl std::fmt::Debug for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSelector")
            .field("current", &self.current())
            .field("available", &self.available())
            .finish()
    }
}
