//! Lookup sources.
//!
//! Defines the `LookupSource` trait and the HTTP implementation used
//! for every remote provider.

pub mod http;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::SourceSpec;
use crate::types::{PhoneNumber, SourceError, SourcePayload};

/// Abstraction over one remote lookup provider.
///
/// A single call, no retries: the orchestrator owns the retry policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupSource: Send + Sync {
    /// Fetch whatever the provider knows about `phone`.
    ///
    /// `Ok(None)` means the provider answered JSON `null`.
    async fn fetch(&self, phone: &PhoneNumber) -> Result<Option<SourcePayload>, SourceError>;
}

/// A source together with its immutable configuration (name, role, rank).
#[derive(Clone)]
pub struct SourceHandle {
    pub spec: SourceSpec,
    pub source: Arc<dyn LookupSource>,
}

impl SourceHandle {
    pub fn new(spec: SourceSpec, source: Arc<dyn LookupSource>) -> Self {
        Self { spec, source }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

impl std::fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceHandle").field("spec", &self.spec).finish_non_exhaustive()
    }
}
