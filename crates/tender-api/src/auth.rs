//! # Session Resolution
//!
//! Authentication happens outside this system — an identity provider
//! issues opaque bearer tokens. This module resolves a token to a
//! [`Session`] through the [`SessionResolver`] trait:
//!
//! - [`PgSessions`] reads the `sessions` table (joined to `users`).
//! - [`StaticSessions`] holds a token map in memory, for development and
//!   router-level tests.
//!
//! The [`MaybeSession`] extractor never rejects: anonymous requests
//! resolve to `None` and each resource decides what anonymity means.
//! Resolved sessions are refreshed against the in-memory user store so a
//! terms acceptance or deactivation takes effect on the very next
//! request.

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use parking_lot::RwLock;
use sqlx::PgPool;

use tender_core::{Session, User, UserId, UserType};

use crate::state::AppState;

/// Resolves an opaque bearer token to an authenticated session.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve the token, or `None` when it matches no session.
    async fn resolve(&self, token: &str) -> Option<Session>;
}

/// In-memory token map. Used by tests and by deployments without a
/// database, where sessions are provisioned at startup.
#[derive(Default)]
pub struct StaticSessions {
    sessions: RwLock<HashMap<String, Session>>,
}

impl StaticSessions {
    /// Register a session under the given token.
    pub fn insert(&self, token: impl Into<String>, session: Session) {
        self.sessions.write().insert(token.into(), session);
    }
}

#[async_trait]
impl SessionResolver for StaticSessions {
    async fn resolve(&self, token: &str) -> Option<Session> {
        self.sessions.read().get(token).cloned()
    }
}

/// Postgres-backed session resolution.
pub struct PgSessions {
    pool: PgPool,
}

impl PgSessions {
    /// Build a resolver over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: uuid::Uuid,
    user_type: String,
    name: String,
    email: Option<String>,
    active: bool,
    accepted_terms_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
impl SessionResolver for PgSessions {
    async fn resolve(&self, token: &str) -> Option<Session> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT u.id, u.user_type, u.name, u.email, u.active,
                    u.accepted_terms_at, u.created_at
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read session");
            None
        })?;

        let user_type = match UserType::parse(&row.user_type) {
            Ok(ut) => ut,
            Err(e) => {
                tracing::warn!(error = %e, "unknown user type in sessions table");
                return None;
            }
        };

        Some(Session::for_user(User {
            id: UserId::from_uuid(row.id),
            user_type,
            name: row.name,
            email: row.email,
            active: row.active,
            accepted_terms_at: row.accepted_terms_at.map(Into::into),
            created_at: row.created_at.into(),
        }))
    }
}

/// Extractor yielding the request's session, if any. Never rejects.
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
    /// Borrow the inner session.
    pub fn as_ref(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        let mut session = match app.sessions.resolve(&token).await {
            Some(s) => s,
            None => return Ok(Self(None)),
        };
        // The store is authoritative for user state; pick up terms
        // acceptance or deactivation without a new login.
        if let Some(current) = app.store.get_user(&session.user.id) {
            session.user = current;
        }
        Ok(Self(Some(session)))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tender_core::Timestamp;

    fn session() -> Session {
        Session::for_user(User {
            id: UserId::new(),
            user_type: UserType::Vendor,
            name: "vendor".to_string(),
            email: None,
            active: true,
            accepted_terms_at: None,
            created_at: Timestamp::now(),
        })
    }

    #[tokio::test]
    async fn static_sessions_resolve_registered_tokens() {
        let resolver = StaticSessions::default();
        resolver.insert("tok-1", session());
        assert!(resolver.resolve("tok-1").await.is_some());
        assert!(resolver.resolve("tok-2").await.is_none());
    }
}
