//! # tender-api — Axum API Services for the Tender Stack
//!
//! The HTTP layer of the procurement marketplace. Assembles the entity
//! resources — each an implementation of the generic CRUD contract in
//! [`crud`] — together with the operational surface (status, health,
//! metrics, OpenAPI).
//!
//! ## API Surface
//!
//! | Prefix                               | Module                    |
//! |--------------------------------------|---------------------------|
//! | `/api/opportunities/fixed-price/*`   | [`routes::opportunities`] |
//! | `/api/opportunities/team-based/*`    | [`routes::opportunities`] |
//! | `/api/proposals/fixed-price/*`       | [`routes::proposals`]     |
//! | `/api/proposals/team-based/*`        | [`routes::proposals`]     |
//! | `/api/users/*`                       | [`routes::users`]         |
//! | `/status`                            | [`routes::status`]        |
//! | `/health/*`, `/metrics`, `/openapi.json` | operational, unauthenticated |
//!
//! `/status` doubles as the scheduled closing hook's trigger: an
//! external scheduler polls it and the hook advances opportunities past
//! their proposal deadline. It is deliberately outside the session gate.

pub mod auth;
pub mod crud;
pub mod db;
pub mod error;
pub mod hooks;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::opportunities::OpportunityResource;
use crate::routes::proposals::ProposalResource;
use crate::routes::users::UserResource;
use crate::routes::{FixedPrice, TeamBased};

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router.
///
/// The status route, health probes, `/metrics`, and `/openapi.json` sit
/// outside `/api` and remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(crud::router::<OpportunityResource<FixedPrice>>())
        .merge(crud::router::<OpportunityResource<TeamBased>>())
        .merge(crud::router::<ProposalResource<FixedPrice>>())
        .merge(crud::router::<ProposalResource<TeamBased>>())
        .merge(crud::router::<UserResource>());

    let mut router = Router::new()
        .route("/status", get(routes::status::status))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router())
        .nest("/api", api);

    if state.config.metrics_enabled {
        router = router
            .route("/metrics", get(prometheus_metrics))
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(state.metrics.clone()));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /metrics — Prometheus scrape endpoint.
///
/// Domain gauges (opportunities and proposals by status) are refreshed
/// from the stores on each scrape (pull model), then the registry is
/// encoded in text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = &state.metrics;

    metrics.opportunities_total().reset();
    for (status, count) in state.store.opportunity_status_counts() {
        metrics
            .opportunities_total()
            .with_label_values(&[&status])
            .set(count as f64);
    }

    metrics.proposals_total().reset();
    for (status, count) in state.store.proposal_status_counts() {
        metrics
            .proposals_total()
            .with_label_values(&[&status])
            .set(count as f64);
    }

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe — always 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the database connection when one is
/// configured. In-memory mode is always ready.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
