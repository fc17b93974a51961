//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::{Orchestrator, Presentation, Snapshot};
use crate::types::LookupError;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub orchestrator: Orchestrator,
    /// The one presentation area every lookup writes to.
    pub presentation: Presentation,
}

impl DashboardState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            presentation: Presentation::new(),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

fn status_for(error: &LookupError) -> StatusCode {
    match error {
        LookupError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LookupError::NoData => StatusCode::NOT_FOUND,
        LookupError::AllSourcesFailed { .. } => StatusCode::BAD_GATEWAY,
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/lookup/:phone
pub async fn lookup(State(state): State<AppState>, Path(phone): Path<String>) -> Response {
    match state
        .orchestrator
        .resolve_into(&state.presentation, &phone)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => (
            status_for(&e),
            Json(ErrorResponse {
                error: e.to_string(),
                retryable: e.is_retryable(),
            }),
        )
            .into_response(),
    }
}

/// GET /api/current
pub async fn current(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.presentation.current())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
