//! # User Resource
//!
//! Accounts are created by the identity provider, not through this API,
//! so the resource has no create verb. Updates are tagged actions:
//! accepting the platform terms (a vendor prerequisite for bidding),
//! deactivation (self or admin), and reactivation (admin only).

use axum::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use tender_core::{Session, Timestamp, User, UserId};
use tender_lifecycle::permission;

use crate::crud::CrudResource;
use crate::db;
use crate::error::AppError;
use crate::state::AppState;

/// The user resource.
pub struct UserResource;

/// Tagged update actions for a user account.
#[derive(Debug, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "camelCase")]
pub enum UpdateUserBody {
    /// Accept the platform terms on one's own account.
    AcceptTerms(String),
    /// Deactivate the account.
    Deactivate(String),
    /// Reactivate a deactivated account.
    Reactivate(String),
}

/// No list filters.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {}

#[async_trait]
impl CrudResource for UserResource {
    const NAMESPACE: &'static str = "users";

    type CreateBody = serde_json::Value;
    type UpdateBody = UpdateUserBody;
    type ListQuery = UserListQuery;
    type Entity = User;

    async fn read_many(
        state: &AppState,
        session: Option<&Session>,
        _query: UserListQuery,
    ) -> Result<Vec<User>, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        if !permission::read_many_users(session) {
            return Err(AppError::Permission);
        }
        Ok(state.store.list_users())
    }

    async fn read_one(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<User, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        let user = state
            .store
            .get_user(&UserId::from_uuid(id))
            .ok_or_else(not_found)?;
        if !permission::read_user(session, &user) {
            return Err(AppError::Permission);
        }
        Ok(user)
    }

    async fn update(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
        body: UpdateUserBody,
    ) -> Result<User, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        let id = UserId::from_uuid(id);
        let target = state.store.get_user(&id).ok_or_else(not_found)?;

        let event = match body {
            UpdateUserBody::AcceptTerms(_) => {
                if !permission::accept_terms(session, &target) {
                    return Err(AppError::Permission);
                }
                let now = Timestamp::now();
                state.store.with_user_mut(&id, |u| {
                    // Idempotent: the first acceptance timestamp stands.
                    u.accepted_terms_at.get_or_insert(now);
                });
                "user accepted terms"
            }
            UpdateUserBody::Deactivate(_) => {
                if !permission::deactivate_user(session, &target) {
                    return Err(AppError::Permission);
                }
                state.store.with_user_mut(&id, |u| u.active = false);
                "user deactivated"
            }
            UpdateUserBody::Reactivate(_) => {
                if !permission::reactivate_user(session) {
                    return Err(AppError::Permission);
                }
                state.store.with_user_mut(&id, |u| u.active = true);
                "user reactivated"
            }
        };

        let updated = state.store.get_user(&id).ok_or_else(not_found)?;
        if let Some(pool) = &state.db_pool {
            db::users::upsert(pool, &updated).await?;
        }
        db::audit::record(state, event, &updated, Some(&session.user)).await;
        Ok(updated)
    }

    async fn delete(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<User, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        let id = UserId::from_uuid(id);
        let target = state.store.get_user(&id).ok_or_else(not_found)?;
        if !permission::deactivate_user(session, &target) {
            return Err(AppError::Permission);
        }
        // Accounts are deactivated, never destroyed: their history
        // attributions must survive.
        state.store.with_user_mut(&id, |u| u.active = false);
        let updated = state.store.get_user(&id).ok_or_else(not_found)?;
        if let Some(pool) = &state.db_pool {
            db::users::upsert(pool, &updated).await?;
        }
        db::audit::record(state, "user deactivated", &updated, Some(&session.user)).await;
        Ok(updated)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("user not found".to_string())
}
