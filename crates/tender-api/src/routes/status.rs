//! # Status Route
//!
//! `GET /status` — the closing hook's external trigger point. An
//! external scheduler polls it; the status route effectively acts as an
//! action triggered by a cron job. It is never behind the session gate.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::hooks::{self, ClosingOutcome};
use crate::state::AppState;

/// Service status plus the outcome of the closing-hook invocation this
/// poll triggered.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusReport {
    /// Always "ok" when the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// What the closing hook did on this poll.
    pub closing: ClosingOutcome,
}

/// GET /status — report service status and run the closing hook.
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Service status", body = StatusReport),
    ),
    tag = "operations"
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    let closing = hooks::run_closing(&state).await;
    Json(StatusReport {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        closing,
    })
}
