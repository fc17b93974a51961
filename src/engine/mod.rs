//! Core engine: resolve, merge, publish.

pub mod merge;
pub mod orchestrator;
pub mod sink;

pub use orchestrator::Orchestrator;
pub use sink::{Presentation, PresentationState, Snapshot, Ticket};
