//! Presentation target.
//!
//! A single "current result" slot, published over a `watch` channel.
//! Every resolution takes a [`Ticket`] when it starts; the ticket is
//! consumed by the one write it is allowed. A write is applied only if
//! no newer resolution has started since, so a slow response for an
//! old number can never replace the output of a newer lookup.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::report::Report;
use crate::types::LookupError;

/// What the presentation area currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PresentationState {
    Idle,
    Loading { phone: String },
    Ready { report: Report },
    Failed { message: String, retryable: bool },
}

impl PresentationState {
    pub fn from_result(result: &Result<Report, LookupError>) -> Self {
        match result {
            Ok(report) => PresentationState::Ready {
                report: report.clone(),
            },
            Err(e) => PresentationState::Failed {
                message: e.to_string(),
                retryable: e.is_retryable(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Number of resolutions started so far.
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub state: PresentationState,
}

/// Permission to write one result. Deliberately not `Clone`.
#[derive(Debug)]
pub struct Ticket {
    generation: u64,
    lookup_id: Uuid,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lookup_id(&self) -> Uuid {
        self.lookup_id
    }
}

pub struct Presentation {
    tx: watch::Sender<Snapshot>,
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Presentation {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot {
            generation: 0,
            lookup_id: None,
            updated_at: Utc::now(),
            state: PresentationState::Idle,
        });
        Self { tx }
    }

    /// Start a resolution: supersede whatever is in flight and show `Loading`.
    pub fn begin(&self, phone: &str) -> Ticket {
        let lookup_id = Uuid::new_v4();
        let mut generation = 0;
        self.tx.send_modify(|snap| {
            snap.generation += 1;
            snap.lookup_id = Some(lookup_id);
            snap.updated_at = Utc::now();
            snap.state = PresentationState::Loading {
                phone: phone.to_string(),
            };
            generation = snap.generation;
        });
        debug!(generation, %lookup_id, "Resolution started");
        Ticket {
            generation,
            lookup_id,
        }
    }

    /// Apply a finished resolution. Returns `false` if it was superseded.
    pub fn publish(&self, ticket: Ticket, state: PresentationState) -> bool {
        let applied = self.tx.send_if_modified(|snap| {
            if snap.generation != ticket.generation {
                return false;
            }
            snap.updated_at = Utc::now();
            snap.state = state;
            true
        });

        if !applied {
            debug!(
                generation = ticket.generation,
                lookup_id = %ticket.lookup_id,
                current = self.tx.borrow().generation,
                "Discarding superseded result"
            );
        }
        applied
    }

    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
