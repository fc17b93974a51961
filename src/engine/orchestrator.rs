//! Lookup orchestrator.
//!
//! Validates the number, queries the configured sources under the retry
//! policy and applies the merge strategy:
//!
//! - `premium_first`: premium sources one at a time; the first usable
//!   answer is returned untouched. Otherwise every compliance/person
//!   source is queried concurrently and shallow-merged in ascending
//!   rank, so the higher rank wins a key collision.
//! - `all_parallel`: every source at once, each answer kept in its own
//!   section.
//!
//! Per-source failures are logged and treated as "no answer". Only a
//! resolution with nothing usable left surfaces an error.

use anyhow::Result;
use futures::future::join_all;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::merge;
use super::sink::{Presentation, PresentationState};
use crate::config::AppConfig;
use crate::report::Report;
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::sources::http::{build_client, HttpSource};
use crate::sources::SourceHandle;
use crate::types::{
    LookupError, MergedRecord, PartitionedRecord, PhoneNumber, Resolution, SourceOutcome,
    SourceRole, SourceSection, Strategy,
};

pub struct Orchestrator {
    strategy: Strategy,
    retry: RetryPolicy,
    /// Ascending precedence: (rank, name).
    sources: Vec<SourceHandle>,
}

impl Orchestrator {
    pub fn new(strategy: Strategy, retry: RetryPolicy, mut sources: Vec<SourceHandle>) -> Self {
        sources.sort_by(|a, b| {
            (a.spec.rank, a.spec.name.as_str()).cmp(&(b.spec.rank, b.spec.name.as_str()))
        });
        Self {
            strategy,
            retry,
            sources,
        }
    }

    /// Build HTTP sources for every configured endpoint.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        cfg.validate()?;
        let http = build_client(&cfg.lookup)?;
        let sources = cfg
            .sources
            .iter()
            .map(|spec| {
                let source = HttpSource::new(http.clone(), spec.name.clone(), spec.url.clone());
                SourceHandle::new(spec.clone(), Arc::new(source))
            })
            .collect();
        Ok(Self::new(cfg.lookup.strategy, cfg.retry.policy(), sources))
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Source names in merge order (lowest precedence first).
    pub fn merge_order(&self) -> Vec<&str> {
        self.sources.iter().map(SourceHandle::name).collect()
    }

    /// Resolve a string that must be exactly ten digits.
    pub async fn resolve(&self, input: &str) -> Result<Resolution, LookupError> {
        let phone = PhoneNumber::parse(input)?;
        self.resolve_phone(&phone).await
    }

    pub async fn resolve_phone(&self, phone: &PhoneNumber) -> Result<Resolution, LookupError> {
        info!(phone = %phone, strategy = %self.strategy, "Resolving");
        let result = match self.strategy {
            Strategy::PremiumFirst => self.premium_first(phone).await,
            Strategy::AllParallel => self.all_parallel(phone).await,
        };
        match &result {
            Ok(_) => info!(phone = %phone, "Resolution complete"),
            Err(e) => warn!(phone = %phone, error = %e, "Resolution failed"),
        }
        result
    }

    /// Full cycle against a presentation target: take a ticket, resolve
    /// free-form input, render, publish. The result is also returned.
    pub async fn resolve_into(&self, sink: &Presentation, input: &str) -> Result<Report, LookupError> {
        let ticket = sink.begin(input);
        let result = match PhoneNumber::from_input(input) {
            Ok(phone) => self
                .resolve_phone(&phone)
                .await
                .map(|resolution| Report::from_record(&resolution.view())),
            Err(e) => Err(e),
        };
        if !sink.publish(ticket, PresentationState::from_result(&result)) {
            debug!(input, "Result superseded by a newer lookup");
        }
        result
    }

    async fn premium_first(&self, phone: &PhoneNumber) -> Result<Resolution, LookupError> {
        let mut attempted = 0;
        let mut unavailable = 0;

        let mut premiums: Vec<&SourceHandle> = self
            .sources
            .iter()
            .filter(|h| h.spec.role == SourceRole::Premium)
            .collect();
        premiums.sort_by_key(|h| Reverse(h.spec.rank));

        for handle in premiums {
            attempted += 1;
            match self.query(handle, phone).await {
                SourceOutcome::Payload(payload) if payload.is_usable() => {
                    info!(source = handle.name(), fields = payload.len(), "Using premium answer");
                    return Ok(Resolution::Merged(MergedRecord::from_payload(payload)));
                }
                SourceOutcome::Unavailable(_) => unavailable += 1,
                _ => debug!(source = handle.name(), "Premium answer unusable, falling back"),
            }
        }

        let standard: Vec<&SourceHandle> = self
            .sources
            .iter()
            .filter(|h| h.spec.role.is_standard())
            .collect();
        let outcomes = self.query_all(&standard, phone).await;

        attempted += outcomes.len();
        unavailable += outcomes.iter().filter(|o| o.is_unavailable()).count();
        if attempted > 0 && unavailable == attempted {
            return Err(LookupError::AllSourcesFailed { attempted });
        }

        let merged = merge::merge_ordered(outcomes.into_iter().filter_map(SourceOutcome::into_payload));
        if merged.content_fields() == 0 {
            return Err(LookupError::NoData);
        }

        debug!(fields = merged.len(), "Merged standard sources");
        Ok(Resolution::Merged(MergedRecord::from_payload(merged)))
    }

    async fn all_parallel(&self, phone: &PhoneNumber) -> Result<Resolution, LookupError> {
        let handles: Vec<&SourceHandle> = self.sources.iter().collect();
        let outcomes = self.query_all(&handles, phone).await;

        if !outcomes.is_empty() && outcomes.iter().all(SourceOutcome::is_unavailable) {
            return Err(LookupError::AllSourcesFailed {
                attempted: outcomes.len(),
            });
        }

        let sections = handles
            .iter()
            .zip(outcomes)
            .map(|(handle, outcome)| SourceSection {
                source: handle.spec.name.clone(),
                role: handle.spec.role,
                rank: handle.spec.rank,
                record: outcome.into_payload().map(MergedRecord::from_payload),
            })
            .collect();
        let parts = PartitionedRecord { sections };

        if merge::populated_fields(&parts) == 0 {
            return Err(LookupError::NoData);
        }
        Ok(Resolution::Partitioned(parts))
    }

    /// Query several sources concurrently. Results come back in the order
    /// of `handles`, never in completion order.
    async fn query_all(&self, handles: &[&SourceHandle], phone: &PhoneNumber) -> Vec<SourceOutcome> {
        join_all(handles.iter().map(|h| self.query(h, phone))).await
    }

    async fn query(&self, handle: &SourceHandle, phone: &PhoneNumber) -> SourceOutcome {
        let outcome = self
            .retry
            .run(handle.name(), |_| handle.source.fetch(phone))
            .await;

        match outcome {
            RetryOutcome::Succeeded {
                value: Some(payload),
                attempts,
            } => {
                debug!(source = handle.name(), attempts, fields = payload.len(), "Source answered");
                SourceOutcome::Payload(payload)
            }
            RetryOutcome::Succeeded { value: None, attempts } => {
                debug!(source = handle.name(), attempts, "Source answered null");
                SourceOutcome::Null
            }
            RetryOutcome::Exhausted { error, attempts } => {
                warn!(source = handle.name(), attempts, error = %error, "Source unavailable");
                SourceOutcome::Unavailable(error)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
