//! Proposal persistence operations.
//!
//! The award path is the one multi-entity transaction in the system: the
//! winning proposal's status, the parent opportunity's status, and every
//! sibling's `NOT_AWARDED` entry commit together, guarded by an in-
//! transaction check that no sibling has already been awarded.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use tender_core::{OpportunityId, ProposalId, UserId};
use tender_lifecycle::{
    OpportunityHistoryRecord, Proponent, Proposal, ProposalHistoryRecord, ProposalStatus,
};

/// Insert a freshly created proposal with its initial history.
pub async fn persist_created(pool: &PgPool, proposal: &Proposal) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO proposals
             (id, opportunity, created_by, created_at, updated_at, proposal_text,
              additional_comments, proponent, score)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(proposal.id.0)
    .bind(proposal.opportunity.0)
    .bind(proposal.created_by.0)
    .bind(DateTime::<Utc>::from(proposal.created_at))
    .bind(DateTime::<Utc>::from(proposal.updated_at))
    .bind(&proposal.proposal_text)
    .bind(&proposal.additional_comments)
    .bind(Json(&proposal.proponent))
    .bind(proposal.score)
    .execute(&mut *tx)
    .await?;

    for record in &proposal.history {
        insert_status(&mut *tx, proposal.id, record).await?;
    }

    tx.commit().await
}

/// Update the editable fields of a draft.
pub async fn persist_updated(pool: &PgPool, proposal: &Proposal) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE proposals SET proposal_text = $1, additional_comments = $2, proponent = $3,
                              updated_at = $4
         WHERE id = $5",
    )
    .bind(&proposal.proposal_text)
    .bind(&proposal.additional_comments)
    .bind(Json(&proposal.proponent))
    .bind(DateTime::<Utc>::from(proposal.updated_at))
    .bind(proposal.id.0)
    .execute(pool)
    .await?;
    Ok(())
}

/// Append one status-change entry, keeping the denormalized score column
/// in step.
pub async fn persist_status(
    pool: &PgPool,
    proposal: &Proposal,
    record: &ProposalHistoryRecord,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    insert_status(&mut *tx, proposal.id, record).await?;
    if record.status == ProposalStatus::Evaluated {
        sqlx::query("UPDATE proposals SET score = $1, updated_at = $2 WHERE id = $3")
            .bind(proposal.score)
            .bind(DateTime::<Utc>::from(proposal.updated_at))
            .bind(proposal.id.0)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await
}

/// Record an award atomically: the winner's `AWARDED` entry, the parent
/// opportunity's `AWARDED` entry, and every sibling's `NOT_AWARDED`
/// entry.
///
/// Returns `Ok(false)` without writing anything when a sibling proposal
/// already holds `AWARDED` — the check runs inside the same transaction
/// as the writes, so two racing awards cannot both pass it.
pub async fn persist_award(
    pool: &PgPool,
    winner: ProposalId,
    winner_record: &ProposalHistoryRecord,
    opportunity: OpportunityId,
    opportunity_record: &OpportunityHistoryRecord,
    sibling_records: &[(ProposalId, ProposalHistoryRecord)],
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let awarded_sibling = sqlx::query_scalar::<_, Uuid>(
        "SELECT p.id FROM proposals p
         JOIN LATERAL (
             SELECT status FROM proposal_statuses ps
             WHERE ps.proposal = p.id ORDER BY ps.seq DESC LIMIT 1
         ) latest ON TRUE
         WHERE p.opportunity = $1 AND p.id <> $2 AND latest.status = 'AWARDED'
         FOR UPDATE OF p",
    )
    .bind(opportunity.0)
    .bind(winner.0)
    .fetch_optional(&mut *tx)
    .await?;

    if awarded_sibling.is_some() {
        // Dropping the transaction rolls it back.
        return Ok(false);
    }

    insert_status(&mut *tx, winner, winner_record).await?;
    super::opportunities::insert_status(&mut *tx, opportunity, opportunity_record).await?;
    for (sibling, record) in sibling_records {
        insert_status(&mut *tx, *sibling, record).await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Delete a draft proposal. History cascades.
pub async fn persist_deleted(pool: &PgPool, id: ProposalId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM proposals WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert one history row. Shared with the closing path in
/// `opportunities.rs`.
pub(super) async fn insert_status<'e, E: PgExecutor<'e>>(
    executor: E,
    id: ProposalId,
    record: &ProposalHistoryRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO proposal_statuses (proposal, created_at, created_by, status, note)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id.0)
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(record.created_by.map(|u| u.0))
    .bind(record.status.to_string())
    .bind(&record.note)
    .execute(executor)
    .await?;
    Ok(())
}

// ─── Hydration ───────────────────────────────────────────────────────

/// Load and reassemble every proposal from its base row and history.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Proposal>, sqlx::Error> {
    let bases = sqlx::query_as::<_, ProposalRow>(
        "SELECT id, opportunity, created_by, created_at, updated_at, proposal_text,
                additional_comments, proponent, score
         FROM proposals ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let statuses = sqlx::query_as::<_, StatusRow>(
        "SELECT proposal, created_at, created_by, status, note
         FROM proposal_statuses ORDER BY proposal, seq",
    )
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(bases.len());
    for base in bases {
        let mut status = None;
        let mut history = Vec::new();
        for row in statuses.iter().filter(|s| s.proposal == base.id) {
            let Some(parsed) = ProposalStatus::parse(&row.status) else {
                tracing::warn!(id = %base.id, status = %row.status, "unknown status in history");
                continue;
            };
            status = Some(parsed);
            history.push(ProposalHistoryRecord {
                created_at: row.created_at.into(),
                created_by: row.created_by.map(UserId::from_uuid),
                status: parsed,
                note: row.note.clone(),
            });
        }
        let Some(status) = status else {
            tracing::warn!(id = %base.id, "skipping proposal with no status history");
            continue;
        };

        out.push(Proposal {
            id: ProposalId::from_uuid(base.id),
            opportunity: OpportunityId::from_uuid(base.opportunity),
            created_by: UserId::from_uuid(base.created_by),
            status,
            score: base.score,
            proponent: base.proponent.0,
            proposal_text: base.proposal_text,
            additional_comments: base.additional_comments,
            created_at: base.created_at.into(),
            updated_at: base.updated_at.into(),
            history,
        });
    }

    Ok(out)
}

// ─── Row types ───────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: Uuid,
    opportunity: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    proposal_text: String,
    additional_comments: String,
    proponent: Json<Proponent>,
    score: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    proposal: Uuid,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    status: String,
    note: String,
}
