//! # Proposal Resource
//!
//! Bids are sealed: a vendor sees only their own proposals, and
//! government staff cannot read any until the parent opportunity leaves
//! its open phase. One proposal per vendor per opportunity.
//!
//! The award verb is the one multi-entity mutation in the system. It is
//! exclusive per opportunity: a sibling already holding `AWARDED` fails
//! the verb with a conflict, checked against the store before execution
//! and re-checked inside the write-through transaction.

use std::marker::PhantomData;

use axum::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use tender_core::{ProposalId, Session, Timestamp};
use tender_lifecycle::{permission, Opportunity, OpportunityStatus, Proposal, ProposalStatus};
use tender_validate::proposal::{
    validate_disqualification_reason, validate_note, validate_proposal, validate_score,
    validate_status, validate_submission, ProposalFieldErrors, ProposalPayload,
};
use tender_validate::ValidationMode;

use crate::crud::CrudResource;
use crate::db;
use crate::error::AppError;
use crate::routes::KindRoute;
use crate::state::AppState;

/// The proposal resource, generic over its namespace/kind marker.
pub struct ProposalResource<K>(PhantomData<K>);

/// Create body: the payload plus the status to create in, which must be
/// `DRAFT` or `SUBMITTED`.
#[derive(Debug, Deserialize)]
pub struct CreateProposalBody {
    #[serde(flatten)]
    pub payload: ProposalPayload,
    pub status: Option<String>,
}

/// Tagged update actions for a proposal.
#[derive(Debug, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "camelCase")]
pub enum UpdateProposalBody {
    /// Replace the editable fields of a draft.
    Edit(ProposalPayload),
    /// Submit the draft against its (open) opportunity.
    Submit(String),
    /// Withdraw a submitted proposal.
    Withdraw(String),
    /// Score the proposal during evaluation.
    Score(f64),
    /// Award the proposal.
    Award(String),
    /// Disqualify the proposal, with a required reason.
    Disqualify(String),
}

/// List filter: narrow to one opportunity's proposals.
#[derive(Debug, Default, Deserialize)]
pub struct ProposalListQuery {
    pub opportunity: Option<Uuid>,
}

#[async_trait]
impl<K: KindRoute> CrudResource for ProposalResource<K> {
    const NAMESPACE: &'static str = K::PROPOSALS;

    type CreateBody = CreateProposalBody;
    type UpdateBody = UpdateProposalBody;
    type ListQuery = ProposalListQuery;
    type Entity = Proposal;

    async fn create(
        state: &AppState,
        session: Option<&Session>,
        body: CreateProposalBody,
    ) -> Result<Proposal, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        if !permission::create_proposal(session) {
            return Err(AppError::Permission);
        }

        let status = validate_status(
            body.status.as_deref().unwrap_or("DRAFT"),
            &[ProposalStatus::Draft, ProposalStatus::Submitted],
        )
        .map_err(|status| {
            AppError::validation(&ProposalFieldErrors {
                status,
                ..Default::default()
            })
        })?;

        let Some(opportunity_id) = body.payload.opportunity else {
            return Err(AppError::validation(&ProposalFieldErrors {
                opportunity: vec!["Please identify the opportunity.".to_string()],
                ..Default::default()
            }));
        };
        let opportunity = parent::<K>(state, opportunity_id)?;
        if !permission::read_opportunity(Some(session), &opportunity) {
            return Err(opportunity_not_found());
        }

        // One proposal per vendor per opportunity.
        if state
            .store
            .proposal_by_author(&opportunity.id, &session.user.id)
            .is_some()
        {
            return Err(AppError::Conflict(
                "you have already submitted a proposal for this opportunity".to_string(),
            ));
        }

        let now = Timestamp::now();
        let mode = match status {
            ProposalStatus::Submitted => {
                if !opportunity.accepting_proposals(now) {
                    return Err(AppError::Permission);
                }
                ValidationMode::Strict
            }
            _ => ValidationMode::Draft,
        };
        let fields =
            validate_proposal(&body.payload, mode).map_err(|e| AppError::validation(&e))?;

        let proposal = Proposal::new(
            ProposalId::new(),
            opportunity.id,
            session.user.id,
            fields.proponent,
            fields.proposal_text,
            fields.additional_comments,
            status,
            now,
        )
        .map_err(|_| AppError::Permission)?;

        if let Some(pool) = &state.db_pool {
            db::proposals::persist_created(pool, &proposal).await?;
        }
        state.store.insert_proposal(proposal.clone());
        db::audit::record(state, "proposal created", &proposal, Some(&session.user)).await;
        Ok(proposal)
    }

    async fn read_many(
        state: &AppState,
        session: Option<&Session>,
        query: ProposalListQuery,
    ) -> Result<Vec<Proposal>, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };

        let proposals = match query.opportunity {
            Some(id) => {
                let opportunity = parent::<K>(state, id)?;
                // Staff asking for an open opportunity's bids is a
                // permission failure, not an empty list: bids stay
                // sealed until evaluation.
                if permission::is_public_sector(session)
                    && !matches!(
                        opportunity.status,
                        OpportunityStatus::Evaluation | OpportunityStatus::Awarded
                    )
                {
                    return Err(AppError::Permission);
                }
                state.store.proposals_for_opportunity(&opportunity.id)
            }
            None => state.store.list_proposals(),
        };

        Ok(proposals
            .into_iter()
            .filter(|p| {
                parent_status::<K>(state, p)
                    .map(|status| permission::read_proposal(Some(session), p, status))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn read_one(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<Proposal, AppError> {
        let proposal = get(state, id)?;
        let status = parent_status::<K>(state, &proposal).ok_or_else(not_found)?;
        if !permission::read_proposal(session, &proposal, status) {
            return Err(not_found());
        }
        Ok(proposal)
    }

    async fn update(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
        body: UpdateProposalBody,
    ) -> Result<Proposal, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        let proposal = get(state, id)?;
        let opportunity = parent::<K>(state, proposal.opportunity.0)?;
        let now = Timestamp::now();

        match body {
            UpdateProposalBody::Edit(payload) => {
                edit(state, session, proposal, payload, now).await
            }
            UpdateProposalBody::Submit(note) => {
                submit(state, session, proposal, opportunity, note, now).await
            }
            UpdateProposalBody::Withdraw(note) => {
                withdraw(state, session, proposal, note, now).await
            }
            UpdateProposalBody::Score(value) => {
                score(state, session, proposal, opportunity, value, now).await
            }
            UpdateProposalBody::Award(note) => {
                award(state, session, proposal, opportunity, note, now).await
            }
            UpdateProposalBody::Disqualify(reason) => {
                disqualify(state, session, proposal, reason, now).await
            }
        }
    }

    async fn delete(
        state: &AppState,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<Proposal, AppError> {
        let Some(session) = session else {
            return Err(AppError::Permission);
        };
        let proposal = get(state, id)?;
        parent::<K>(state, proposal.opportunity.0)?;
        if !permission::delete_proposal(session, &proposal) {
            return Err(AppError::Permission);
        }
        if proposal.status != ProposalStatus::Draft {
            return Err(AppError::Permission);
        }

        if let Some(pool) = &state.db_pool {
            db::proposals::persist_deleted(pool, proposal.id).await?;
        }
        state.store.remove_proposal(&proposal.id);
        db::audit::record(state, "proposal deleted", &proposal, Some(&session.user)).await;
        Ok(proposal)
    }
}

// ─── Verb handlers ───────────────────────────────────────────────────

async fn edit(
    state: &AppState,
    session: &Session,
    proposal: Proposal,
    payload: ProposalPayload,
    now: Timestamp,
) -> Result<Proposal, AppError> {
    if !permission::edit_proposal(session, &proposal) {
        return Err(AppError::Permission);
    }
    let fields =
        validate_proposal(&payload, ValidationMode::Draft).map_err(|e| AppError::validation(&e))?;

    state
        .store
        .with_proposal_mut(&proposal.id, |p| {
            p.apply_edit(
                fields.proponent,
                fields.proposal_text,
                fields.additional_comments,
                now,
            )
        })
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    let updated = state.store.get_proposal(&proposal.id).ok_or_else(not_found)?;
    if let Some(pool) = &state.db_pool {
        db::proposals::persist_updated(pool, &updated).await?;
    }
    db::audit::record(state, "proposal updated", &updated, Some(&session.user)).await;
    Ok(updated)
}

async fn submit(
    state: &AppState,
    session: &Session,
    proposal: Proposal,
    opportunity: Opportunity,
    note: String,
    now: Timestamp,
) -> Result<Proposal, AppError> {
    if !permission::submit_proposal(session, &proposal) {
        return Err(AppError::Permission);
    }
    if !opportunity.accepting_proposals(now) {
        return Err(AppError::Permission);
    }
    // Submission validates the proposal's current state strictly.
    validate_submission(&proposal).map_err(|e| AppError::validation(&e))?;
    let note = validate_note(&note).map_err(|e| AppError::invalid_field("note", e))?;

    let record = state
        .store
        .with_proposal_mut(&proposal.id, |p| p.submit(session.user.id, note, now))
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    persist_and_audit(state, session, proposal.id, &record, "proposal submitted").await
}

async fn withdraw(
    state: &AppState,
    session: &Session,
    proposal: Proposal,
    note: String,
    now: Timestamp,
) -> Result<Proposal, AppError> {
    if !permission::withdraw_proposal(session, &proposal) {
        return Err(AppError::Permission);
    }
    let note = validate_note(&note).map_err(|e| AppError::invalid_field("note", e))?;

    // Withdrawal is undefined from Draft; the lifecycle edge check
    // surfaces as the generic permission error.
    let record = state
        .store
        .with_proposal_mut(&proposal.id, |p| p.withdraw(session.user.id, note, now))
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    persist_and_audit(state, session, proposal.id, &record, "proposal withdrawn").await
}

async fn score(
    state: &AppState,
    session: &Session,
    proposal: Proposal,
    opportunity: Opportunity,
    value: f64,
    now: Timestamp,
) -> Result<Proposal, AppError> {
    if !permission::evaluate_proposal(session) {
        return Err(AppError::Permission);
    }
    // Scoring opens only once the opportunity is in evaluation.
    if opportunity.status != OpportunityStatus::Evaluation {
        return Err(AppError::Permission);
    }
    let value = validate_score(value).map_err(|e| AppError::invalid_field("score", e))?;

    let record = state
        .store
        .with_proposal_mut(&proposal.id, |p| p.score(value, session.user.id, now))
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    persist_and_audit(state, session, proposal.id, &record, "proposal scored").await
}

async fn award(
    state: &AppState,
    session: &Session,
    proposal: Proposal,
    opportunity: Opportunity,
    note: String,
    now: Timestamp,
) -> Result<Proposal, AppError> {
    if !permission::evaluate_proposal(session) {
        return Err(AppError::Permission);
    }
    if opportunity.status != OpportunityStatus::Evaluation {
        return Err(AppError::Permission);
    }
    // Award requires a scored proposal.
    if proposal.status != ProposalStatus::Evaluated {
        return Err(AppError::Permission);
    }
    let note = validate_note(&note).map_err(|e| AppError::invalid_field("note", e))?;

    let siblings = state.store.proposals_for_opportunity(&opportunity.id);
    // Exclusive per opportunity: a sibling already awarded is a
    // conflict, not a second winner.
    if siblings
        .iter()
        .any(|p| p.id != proposal.id && p.status == ProposalStatus::Awarded)
    {
        return Err(conflict_already_awarded());
    }

    // Stage every transition on clones so nothing is visible (or
    // persisted) unless the whole award holds together.
    let actor = session.user.id;
    let mut winner = proposal.clone();
    let winner_record = winner
        .award(actor, note, now)
        .map_err(|_| AppError::Permission)?;

    let mut awarded_opportunity = opportunity.clone();
    let opportunity_record = awarded_opportunity
        .award(actor, String::new(), now)
        .map_err(|_| AppError::Permission)?;

    let mut updated_siblings = Vec::new();
    let mut sibling_records = Vec::new();
    for sibling in siblings {
        if sibling.id == winner.id || sibling.status.is_terminal() {
            continue;
        }
        let mut sibling = sibling.clone();
        if let Ok(record) = sibling.mark_not_awarded(actor, now) {
            sibling_records.push((sibling.id, record));
            updated_siblings.push(sibling);
        }
    }

    // The write-through transaction re-checks sibling exclusivity; two
    // racing awards cannot both commit.
    if let Some(pool) = &state.db_pool {
        let committed = db::proposals::persist_award(
            pool,
            winner.id,
            &winner_record,
            awarded_opportunity.id,
            &opportunity_record,
            &sibling_records,
        )
        .await?;
        if !committed {
            return Err(conflict_already_awarded());
        }
    }

    state.store.insert_proposal(winner.clone());
    state.store.insert_opportunity(awarded_opportunity);
    for sibling in updated_siblings {
        state.store.insert_proposal(sibling);
    }

    db::audit::record(state, "proposal awarded", &winner, Some(&session.user)).await;
    Ok(winner)
}

async fn disqualify(
    state: &AppState,
    session: &Session,
    proposal: Proposal,
    reason: String,
    now: Timestamp,
) -> Result<Proposal, AppError> {
    if !permission::evaluate_proposal(session) {
        return Err(AppError::Permission);
    }
    let reason = validate_disqualification_reason(&reason)
        .map_err(|e| AppError::invalid_field("disqualificationReason", e))?;

    let record = state
        .store
        .with_proposal_mut(&proposal.id, |p| {
            p.disqualify(reason, session.user.id, now)
        })
        .ok_or_else(not_found)?
        .map_err(|_| AppError::Permission)?;

    persist_and_audit(state, session, proposal.id, &record, "proposal disqualified").await
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Persist one status record and append the audit entry, returning the
/// updated proposal.
async fn persist_and_audit(
    state: &AppState,
    session: &Session,
    id: ProposalId,
    record: &tender_lifecycle::ProposalHistoryRecord,
    event: &str,
) -> Result<Proposal, AppError> {
    let updated = state.store.get_proposal(&id).ok_or_else(not_found)?;
    if let Some(pool) = &state.db_pool {
        db::proposals::persist_status(pool, &updated, record).await?;
    }
    db::audit::record(state, event, &updated, Some(&session.user)).await;
    Ok(updated)
}

fn get(state: &AppState, id: Uuid) -> Result<Proposal, AppError> {
    state
        .store
        .get_proposal(&ProposalId::from_uuid(id))
        .ok_or_else(not_found)
}

/// The parent opportunity, constrained to this namespace's kind.
fn parent<K: KindRoute>(state: &AppState, id: Uuid) -> Result<Opportunity, AppError> {
    state
        .store
        .get_opportunity(&tender_core::OpportunityId::from_uuid(id))
        .filter(|o| o.kind == K::KIND)
        .ok_or_else(opportunity_not_found)
}

fn parent_status<K: KindRoute>(state: &AppState, proposal: &Proposal) -> Option<OpportunityStatus> {
    state
        .store
        .get_opportunity(&proposal.opportunity)
        .filter(|o| o.kind == K::KIND)
        .map(|o| o.status)
}

fn not_found() -> AppError {
    AppError::NotFound("proposal not found".to_string())
}

fn opportunity_not_found() -> AppError {
    AppError::NotFound("opportunity not found".to_string())
}

fn conflict_already_awarded() -> AppError {
    AppError::Conflict("a proposal has already been awarded for this opportunity".to_string())
}
