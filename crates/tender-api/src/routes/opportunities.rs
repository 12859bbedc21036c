//! # Opportunity Resource
//!
//! Every mutation follows the resource contract: operation permission
//! first (short-circuiting with the generic permission error before any
//! content is looked at), then tier-appropriate validation, then the
//! transition guard, then execution — write-through persistence followed
//! by the audit entry.
//!
//! Update requests are a tagged action body, one enum variant per verb;
//! the match below is the complete set of user-facing opportunity verbs.
//! The deadline-driven `Published → Evaluation` edge has no variant here
//! on purpose — it belongs to the closing hook alone.

use std::marker::PhantomData;

use axum::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use tender_core::{AddendumId, OpportunityId, Session, Timestamp};
use tender_lifecycle::{
    permission, Opportunity, OpportunityStatus, ProposalStatus,
};
use tender_validate::opportunity::{
    validate_addendum_text, validate_fields_strict, validate_note, validate_opportunity,
    validate_status, OpportunityFieldErrors, OpportunityPayload,
};
use tender_validate::ValidationMode;

use crate::crud::CrudResource;
use crate::db;
use crate::error::AppError;
use crate::routes::KindRoute;
use crate::state::AppState;

/// The opportunity resource, generic over its namespace/kind marker.
pub struct OpportunityResource<K>(PhantomData<K>);

/// Create body: the full payload plus the status to create in, which
/// must be `DRAFT` or `PUBLISHED`.
#[derive(Debug, Deserialize)]
pub struct CreateOpportunityBody {
    #[serde(flatten)]
    pub payload: OpportunityPayload,
    pub status: Option<String>,
}

/// Tagged update actions for an opportunity.
#[derive(Debug, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "camelCase")]
pub enum UpdateOpportunityBody {
    /// Save a new version of the editable fields.
    Edit(OpportunityPayload),
    /// Publish a draft (or reactivate a suspended opportunity).
    Publish(String),
    /// Pull a published opportunity from the public site.
    Suspend(String),
    /// Cancel the opportunity.
    Cancel(String),
    /// Post an addendum.
    AddAddendum(String),
}

/// No list filters; visibility does the narrowing.
#[derive(Debug, Default, Deserialize)]
pub struct OpportunityListQuery {}

#[async_trait]
impl<K: KindRoute> CrudResource for OpportunityResource<K> {
    const NAMESPACE: &'static str = K::OPPORTUNITIES;

    type CreateBody = CreateOpportunityBody;
    type UpdateBody = UpdateOpportunityBody;
    type ListQuery = OpportunityListQuery;
    type Entity = Opportunity;

    async fn create(
        state: &AppState,
        session: Option<&Session>,
        body: CreateOpportunityBody,
    ) -> Result<Opportunity, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        if !permission::create_opportunity(session) {
            return Err(AppError::Permission);
        }

        let status = validate_status(
            body.status.as_deref().unwrap_or("DRAFT"),
            &[OpportunityStatus::Draft, OpportunityStatus::Published],
        )
        .map_err(|status| {
            AppError::validation(&OpportunityFieldErrors {
                status,
                ..Default::default()
            })
        })?;

        let mode = match status {
            OpportunityStatus::Published => ValidationMode::Strict,
            _ => ValidationMode::Draft,
        };
        let now = Timestamp::now();
        let fields = validate_opportunity(
            &body.payload,
            mode,
            state.config.max_budget(K::KIND),
            now,
            None,
        )
        .map_err(|e| AppError::validation(&e))?;

        let opportunity = Opportunity::new(
            OpportunityId::new(),
            K::KIND,
            session.user.id,
            fields,
            status,
            now,
        )
        .map_err(|_| AppError::Permission)?;

        if let Some(pool) = &state.db_pool {
            db::opportunities::persist_created(pool, &opportunity).await?;
        }
        state.store.insert_opportunity(opportunity.clone());
        db::audit::record(state, "opportunity created", &opportunity, Some(&session.user)).await;
        Ok(opportunity)
    }

    async fn read_many(
        state: &AppState,
        session: Option<&Session>,
        _query: OpportunityListQuery,
    ) -> Result<Vec<Opportunity>, AppError> {
        Ok(state
            .store
            .list_opportunities()
            .into_iter()
            .filter(|o| o.kind == K::KIND && permission::read_opportunity(session, o))
            .collect())
    }

    async fn read_one(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<Opportunity, AppError> {
        let opportunity = get::<K>(state, id)?;
        if !permission::read_opportunity(session, &opportunity) {
            // Invisible and nonexistent are indistinguishable.
            return Err(not_found());
        }
        Ok(opportunity)
    }

    async fn update(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
        body: UpdateOpportunityBody,
    ) -> Result<Opportunity, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        let opportunity = get::<K>(state, id)?;
        let now = Timestamp::now();

        match body {
            UpdateOpportunityBody::Edit(payload) => {
                edit::<K>(state, session, opportunity, payload, now).await
            }
            UpdateOpportunityBody::Publish(note) => {
                publish::<K>(state, session, opportunity, note, now).await
            }
            UpdateOpportunityBody::Suspend(note) => {
                suspend(state, session, opportunity, note, now).await
            }
            UpdateOpportunityBody::Cancel(note) => {
                cancel(state, session, opportunity, note, now).await
            }
            UpdateOpportunityBody::AddAddendum(text) => {
                add_addendum(state, session, opportunity, text, now).await
            }
        }
    }

    async fn delete(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<Opportunity, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        let opportunity = get::<K>(state, id)?;
        if !permission::delete_opportunity(session, &opportunity) {
            return Err(AppError::Permission);
        }
        if opportunity.status != OpportunityStatus::Draft {
            return Err(AppError::Permission);
        }

        if let Some(pool) = &state.db_pool {
            db::opportunities::persist_deleted(pool, opportunity.id).await?;
        }
        state.store.remove_opportunity(&opportunity.id);
        db::audit::record(state, "opportunity deleted", &opportunity, Some(&session.user)).await;
        Ok(opportunity)
    }
}

// ─── Verb handlers ───────────────────────────────────────────────────

async fn edit<K: KindRoute>(
    state: &AppState,
    session: &Session,
    opportunity: Opportunity,
    payload: OpportunityPayload,
    now: Timestamp,
) -> Result<Opportunity, AppError> {
    if !permission::edit_opportunity(session, &opportunity) {
        return Err(AppError::Permission);
    }
    // Drafts edit leniently; published opportunities are public, so
    // their edits must pass the strict tier and land before the
    // deadline.
    let mode = match opportunity.status {
        OpportunityStatus::Draft => ValidationMode::Draft,
        OpportunityStatus::Published => {
            if opportunity.deadline_elapsed(now) {
                return Err(AppError::Permission);
            }
            ValidationMode::Strict
        }
        _ => return Err(AppError::Permission),
    };

    let floor = opportunity.fields.proposal_deadline.min(now);
    let fields = validate_opportunity(
        &payload,
        mode,
        state.config.max_budget(K::KIND),
        now,
        Some(floor),
    )
    .map_err(|e| AppError::validation(&e))?;

    let event = state
        .store
        .with_opportunity_mut(&opportunity.id, |o| {
            o.apply_edit(fields, session.user.id, now)
        })
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    let updated = state
        .store
        .get_opportunity(&opportunity.id)
        .ok_or_else(not_found)?;
    if let Some(pool) = &state.db_pool {
        db::opportunities::persist_version(pool, &updated, session.user.id, event.as_ref())
            .await?;
    }
    db::audit::record(state, "opportunity updated", &updated, Some(&session.user)).await;
    Ok(updated)
}

async fn publish<K: KindRoute>(
    state: &AppState,
    session: &Session,
    opportunity: Opportunity,
    note: String,
    now: Timestamp,
) -> Result<Opportunity, AppError> {
    if !permission::publish_opportunity(session, &opportunity) {
        return Err(AppError::Permission);
    }

    // Publication validates the current version at the strict tier. The
    // deadline floor is pinned down to the stored deadline so an
    // opportunity drafted past its deadline can still be published (the
    // closing hook will pick it up on its next scan).
    let floor = opportunity.fields.proposal_deadline.min(now);
    validate_fields_strict(
        &opportunity.fields,
        state.config.max_budget(K::KIND),
        now,
        Some(floor),
    )
    .map_err(|e| AppError::validation(&e))?;

    let record = state
        .store
        .with_opportunity_mut(&opportunity.id, |o| {
            o.publish(session.user.id, note, now)
        })
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    let updated = state
        .store
        .get_opportunity(&opportunity.id)
        .ok_or_else(not_found)?;
    if let Some(pool) = &state.db_pool {
        db::opportunities::persist_status(pool, updated.id, &record).await?;
    }
    db::audit::record(state, "opportunity published", &updated, Some(&session.user)).await;
    Ok(updated)
}

async fn suspend(
    state: &AppState,
    session: &Session,
    opportunity: Opportunity,
    note: String,
    now: Timestamp,
) -> Result<Opportunity, AppError> {
    if !permission::suspend_opportunity(session) {
        return Err(AppError::Permission);
    }
    let note = validate_note(&note).map_err(|e| AppError::invalid_field("note", e))?;

    let record = state
        .store
        .with_opportunity_mut(&opportunity.id, |o| {
            o.suspend(session.user.id, note, now)
        })
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    let updated = state
        .store
        .get_opportunity(&opportunity.id)
        .ok_or_else(not_found)?;
    if let Some(pool) = &state.db_pool {
        db::opportunities::persist_status(pool, updated.id, &record).await?;
    }
    db::audit::record(state, "opportunity suspended", &updated, Some(&session.user)).await;
    Ok(updated)
}

async fn cancel(
    state: &AppState,
    session: &Session,
    opportunity: Opportunity,
    note: String,
    now: Timestamp,
) -> Result<Opportunity, AppError> {
    if !permission::cancel_opportunity(session, &opportunity) {
        return Err(AppError::Permission);
    }
    // Once a proposal has been awarded, the opportunity is spoken for.
    let awarded_exists = state
        .store
        .proposals_for_opportunity(&opportunity.id)
        .iter()
        .any(|p| p.status == ProposalStatus::Awarded);
    if awarded_exists {
        return Err(AppError::Permission);
    }
    let note = validate_note(&note).map_err(|e| AppError::invalid_field("note", e))?;

    let record = state
        .store
        .with_opportunity_mut(&opportunity.id, |o| {
            o.cancel(session.user.id, note, now)
        })
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    let updated = state
        .store
        .get_opportunity(&opportunity.id)
        .ok_or_else(not_found)?;
    if let Some(pool) = &state.db_pool {
        db::opportunities::persist_status(pool, updated.id, &record).await?;
    }
    db::audit::record(state, "opportunity canceled", &updated, Some(&session.user)).await;
    Ok(updated)
}

async fn add_addendum(
    state: &AppState,
    session: &Session,
    opportunity: Opportunity,
    text: String,
    now: Timestamp,
) -> Result<Opportunity, AppError> {
    if !permission::add_addendum(session, &opportunity) {
        return Err(AppError::Permission);
    }
    let text =
        validate_addendum_text(&text).map_err(|e| AppError::invalid_field("addendum", e))?;

    let (addendum, record) = state
        .store
        .with_opportunity_mut(&opportunity.id, |o| {
            o.add_addendum(AddendumId::new(), text, session.user.id, now)
        })
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    let updated = state
        .store
        .get_opportunity(&opportunity.id)
        .ok_or_else(not_found)?;
    if let Some(pool) = &state.db_pool {
        db::opportunities::persist_addendum(pool, updated.id, &addendum, &record).await?;
    }
    db::audit::record(state, "addendum added", &updated, Some(&session.user)).await;
    Ok(updated)
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn get<K: KindRoute>(state: &AppState, id: Uuid) -> Result<Opportunity, AppError> {
    state
        .store
        .get_opportunity(&OpportunityId::from_uuid(id))
        .filter(|o| o.kind == K::KIND)
        .ok_or_else(not_found)
}

fn not_found() -> AppError {
    AppError::NotFound("opportunity not found".to_string())
}
