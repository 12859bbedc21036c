//! # OpenAPI Document
//!
//! Auto-generated OpenAPI spec via utoipa derive macros, served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// The API document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tender Stack API",
        description = "Procurement marketplace: opportunities, proposals, and their lifecycles."
    ),
    paths(crate::routes::status::status),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::hooks::ClosingOutcome,
        crate::routes::status::StatusReport,
    )),
    tags(
        (name = "operations", description = "Service status and the scheduled closing hook")
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI route.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve))
}

async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
