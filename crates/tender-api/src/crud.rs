//! # Generic CRUD Resource Contract
//!
//! The typed request lifecycle every entity endpoint implements against:
//! parse → operation permission → content validation → transition guard →
//! execute → respond. The trait fixes the shapes; the generic router
//! builds the five REST routes for any implementor, so the HTTP surface
//! of every resource is identical by construction.
//!
//! Guarantees enforced here and by every implementor:
//! - operation-level permission is checked before any content
//!   validation, short-circuiting with the generic permission error;
//! - malformed bodies become structured 400 responses without touching
//!   the resource;
//! - side effects happen only inside `execute` paths, after both gates.

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::MaybeSession;
use crate::error::AppError;
use crate::state::AppState;

/// A typed CRUD resource. Operations default to "not found" so a
/// resource only implements the verbs it supports — the original's
/// routers answer unimplemented verbs with their standard 404.
#[async_trait]
pub trait CrudResource: Send + Sync + 'static {
    /// Route namespace under `/api`, e.g. `opportunities/fixed-price`.
    const NAMESPACE: &'static str;

    /// Parsed create body.
    type CreateBody: DeserializeOwned + Send + 'static;
    /// Parsed update body — a tagged action for every resource here.
    type UpdateBody: DeserializeOwned + Send + 'static;
    /// List query parameters.
    type ListQuery: DeserializeOwned + Send + 'static;
    /// The entity returned by every operation.
    type Entity: Serialize + Send + 'static;

    async fn create(
        state: &AppState,
        session: Option<&tender_core::Session>,
        body: Self::CreateBody,
    ) -> Result<Self::Entity, AppError> {
        let _ = (state, session, body);
        Err(AppError::NotFound("unsupported operation".to_string()))
    }

    async fn read_many(
        state: &AppState,
        session: Option<&tender_core::Session>,
        query: Self::ListQuery,
    ) -> Result<Vec<Self::Entity>, AppError> {
        let _ = (state, session, query);
        Err(AppError::NotFound("unsupported operation".to_string()))
    }

    async fn read_one(
        state: &AppState,
        session: Option<&tender_core::Session>,
        id: Uuid,
    ) -> Result<Self::Entity, AppError> {
        let _ = (state, session, id);
        Err(AppError::NotFound("unsupported operation".to_string()))
    }

    async fn update(
        state: &AppState,
        session: Option<&tender_core::Session>,
        id: Uuid,
        body: Self::UpdateBody,
    ) -> Result<Self::Entity, AppError> {
        let _ = (state, session, id, body);
        Err(AppError::NotFound("unsupported operation".to_string()))
    }

    async fn delete(
        state: &AppState,
        session: Option<&tender_core::Session>,
        id: Uuid,
    ) -> Result<Self::Entity, AppError> {
        let _ = (state, session, id);
        Err(AppError::NotFound("unsupported operation".to_string()))
    }
}

/// Build the REST routes for a resource:
///
/// ```text
/// POST   /<namespace>        create
/// GET    /<namespace>        read_many
/// GET    /<namespace>/:id    read_one
/// PUT    /<namespace>/:id    update
/// DELETE /<namespace>/:id    delete
/// ```
pub fn router<R: CrudResource>() -> Router<AppState> {
    let root = format!("/{}", R::NAMESPACE);
    let item = format!("/{}/:id", R::NAMESPACE);
    Router::new()
        .route(&root, get(read_many::<R>).post(create::<R>))
        .route(
            &item,
            get(read_one::<R>).put(update::<R>).delete(destroy::<R>),
        )
}

async fn create<R: CrudResource>(
    State(state): State<AppState>,
    session: MaybeSession,
    body: Result<Json<R::CreateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<R::Entity>), AppError> {
    let Json(body) = body.map_err(AppError::malformed_body)?;
    let entity = R::create(&state, session.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

async fn read_many<R: CrudResource>(
    State(state): State<AppState>,
    session: MaybeSession,
    query: Result<Query<R::ListQuery>, QueryRejection>,
) -> Result<Json<Vec<R::Entity>>, AppError> {
    let Query(query) = query.map_err(AppError::malformed_body)?;
    let entities = R::read_many(&state, session.as_ref(), query).await?;
    Ok(Json(entities))
}

async fn read_one<R: CrudResource>(
    State(state): State<AppState>,
    session: MaybeSession,
    Path(id): Path<Uuid>,
) -> Result<Json<R::Entity>, AppError> {
    let entity = R::read_one(&state, session.as_ref(), id).await?;
    Ok(Json(entity))
}

async fn update<R: CrudResource>(
    State(state): State<AppState>,
    session: MaybeSession,
    Path(id): Path<Uuid>,
    body: Result<Json<R::UpdateBody>, JsonRejection>,
) -> Result<Json<R::Entity>, AppError> {
    let Json(body) = body.map_err(AppError::malformed_body)?;
    let entity = R::update(&state, session.as_ref(), id, body).await?;
    Ok(Json(entity))
}

async fn destroy<R: CrudResource>(
    State(state): State<AppState>,
    session: MaybeSession,
    Path(id): Path<Uuid>,
) -> Result<Json<R::Entity>, AppError> {
    let entity = R::delete(&state, session.as_ref(), id).await?;
    Ok(Json(entity))
}
