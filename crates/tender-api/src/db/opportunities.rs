//! Opportunity persistence operations.
//!
//! Write-through functions take a `&PgPool` and wrap multi-row writes in
//! a transaction. Lifecycle legality is enforced at the domain layer,
//! not in SQL; these functions record exactly the history entries the
//! domain produced.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use tender_core::{AddendumId, OpportunityId, Timestamp, UserId};
use tender_lifecycle::{
    Addendum, Opportunity, OpportunityEvent, OpportunityHistoryRecord, OpportunityHistoryType,
    OpportunityKind, OpportunityStatus, OpportunityVersionFields, ProposalHistoryRecord,
};

/// Insert a freshly created opportunity: base row, first version, and
/// its initial history.
pub async fn persist_created(pool: &PgPool, opportunity: &Opportunity) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO opportunities (id, kind, created_by, created_at) VALUES ($1, $2, $3, $4)")
        .bind(opportunity.id.0)
        .bind(opportunity.kind.to_string())
        .bind(opportunity.created_by.0)
        .bind(DateTime::<Utc>::from(opportunity.created_at))
        .execute(&mut *tx)
        .await?;

    insert_version(
        &mut *tx,
        opportunity.id,
        &opportunity.fields,
        Some(opportunity.created_by),
        opportunity.created_at,
    )
    .await?;

    for record in &opportunity.history {
        insert_status(&mut *tx, opportunity.id, record).await?;
    }

    tx.commit().await
}

/// Insert a new version snapshot, plus the `EDITED` history entry when
/// the edit was made against a public opportunity.
pub async fn persist_version(
    pool: &PgPool,
    opportunity: &Opportunity,
    actor: UserId,
    event_record: Option<&OpportunityHistoryRecord>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    insert_version(
        &mut *tx,
        opportunity.id,
        &opportunity.fields,
        Some(actor),
        opportunity.updated_at,
    )
    .await?;

    if let Some(record) = event_record {
        insert_status(&mut *tx, opportunity.id, record).await?;
    }

    tx.commit().await
}

/// Append one status-change history entry.
pub async fn persist_status(
    pool: &PgPool,
    id: OpportunityId,
    record: &OpportunityHistoryRecord,
) -> Result<(), sqlx::Error> {
    insert_status(pool, id, record).await
}

/// Insert an addendum together with its history entry.
pub async fn persist_addendum(
    pool: &PgPool,
    id: OpportunityId,
    addendum: &Addendum,
    record: &OpportunityHistoryRecord,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO opportunity_addenda (id, opportunity, created_at, created_by, description)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(addendum.id.0)
    .bind(id.0)
    .bind(DateTime::<Utc>::from(addendum.created_at))
    .bind(addendum.created_by.map(|u| u.0))
    .bind(&addendum.description)
    .execute(&mut *tx)
    .await?;

    insert_status(&mut *tx, id, record).await?;

    tx.commit().await
}

/// Record one deadline closing: the opportunity's `EVALUATION` entry and
/// each submitted proposal's `UNDER_REVIEW` entry, atomically.
pub async fn persist_closing(
    pool: &PgPool,
    id: OpportunityId,
    record: &OpportunityHistoryRecord,
    proposal_records: &[(tender_core::ProposalId, ProposalHistoryRecord)],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    insert_status(&mut *tx, id, record).await?;
    for (proposal_id, proposal_record) in proposal_records {
        super::proposals::insert_status(&mut *tx, *proposal_id, proposal_record).await?;
    }

    tx.commit().await
}

/// Delete a draft opportunity. History and versions cascade.
pub async fn persist_deleted(pool: &PgPool, id: OpportunityId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM opportunities WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert one version row.
async fn insert_version<'e, E: PgExecutor<'e>>(
    executor: E,
    id: OpportunityId,
    fields: &OpportunityVersionFields,
    created_by: Option<UserId>,
    created_at: Timestamp,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO opportunity_versions
             (opportunity, created_at, created_by, title, teaser, remote_ok, remote_desc,
              location, reward, skills, description, proposal_deadline, assignment_date,
              start_date, completion_date, submission_info, acceptance_criteria,
              evaluation_criteria)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
    )
    .bind(id.0)
    .bind(DateTime::<Utc>::from(created_at))
    .bind(created_by.map(|u| u.0))
    .bind(&fields.title)
    .bind(&fields.teaser)
    .bind(fields.remote_ok)
    .bind(&fields.remote_desc)
    .bind(&fields.location)
    .bind(fields.reward)
    .bind(&fields.skills)
    .bind(&fields.description)
    .bind(DateTime::<Utc>::from(fields.proposal_deadline))
    .bind(DateTime::<Utc>::from(fields.assignment_date))
    .bind(DateTime::<Utc>::from(fields.start_date))
    .bind(fields.completion_date.map(DateTime::<Utc>::from))
    .bind(&fields.submission_info)
    .bind(&fields.acceptance_criteria)
    .bind(&fields.evaluation_criteria)
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert one history row. Shared with the award path in
/// `proposals.rs`.
pub(super) async fn insert_status<'e, E: PgExecutor<'e>>(
    executor: E,
    id: OpportunityId,
    record: &OpportunityHistoryRecord,
) -> Result<(), sqlx::Error> {
    let (status, event) = match record.record_type {
        OpportunityHistoryType::Status(s) => (Some(s.to_string()), None),
        OpportunityHistoryType::Event(e) => (None, Some(e.as_str())),
    };
    sqlx::query(
        "INSERT INTO opportunity_statuses (opportunity, created_at, created_by, status, event, note)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id.0)
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(record.created_by.map(|u| u.0))
    .bind(status)
    .bind(event)
    .bind(&record.note)
    .execute(executor)
    .await?;
    Ok(())
}

// ─── Hydration ───────────────────────────────────────────────────────

/// Load and reassemble every opportunity from its base row, versions,
/// history, and addenda.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Opportunity>, sqlx::Error> {
    let bases = sqlx::query_as::<_, BaseRow>(
        "SELECT id, kind, created_by, created_at FROM opportunities ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let versions = sqlx::query_as::<_, VersionRow>(
        "SELECT opportunity, created_at, title, teaser, remote_ok, remote_desc, location,
                reward, skills, description, proposal_deadline, assignment_date, start_date,
                completion_date, submission_info, acceptance_criteria, evaluation_criteria
         FROM opportunity_versions ORDER BY opportunity, seq",
    )
    .fetch_all(pool)
    .await?;

    let statuses = sqlx::query_as::<_, StatusRow>(
        "SELECT opportunity, created_at, created_by, status, event, note
         FROM opportunity_statuses ORDER BY opportunity, seq",
    )
    .fetch_all(pool)
    .await?;

    let addenda = sqlx::query_as::<_, AddendumRow>(
        "SELECT id, opportunity, created_at, created_by, description
         FROM opportunity_addenda ORDER BY opportunity, created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(bases.len());
    for base in bases {
        let Some(kind) = OpportunityKind::parse(&base.kind) else {
            tracing::warn!(id = %base.id, kind = %base.kind, "skipping opportunity with unknown kind");
            continue;
        };

        let own_versions: Vec<_> = versions.iter().filter(|v| v.opportunity == base.id).collect();
        let Some(current) = own_versions.last() else {
            tracing::warn!(id = %base.id, "skipping opportunity with no versions");
            continue;
        };

        let mut status = None;
        let mut history = Vec::new();
        for row in statuses.iter().filter(|s| s.opportunity == base.id) {
            let record_type = match (&row.status, &row.event) {
                (Some(s), _) => match OpportunityStatus::parse(s) {
                    Some(parsed) => {
                        status = Some(parsed);
                        OpportunityHistoryType::Status(parsed)
                    }
                    None => {
                        tracing::warn!(id = %base.id, status = %s, "unknown status in history");
                        continue;
                    }
                },
                (None, Some(e)) => match OpportunityEvent::parse(e) {
                    Some(parsed) => OpportunityHistoryType::Event(parsed),
                    None => {
                        tracing::warn!(id = %base.id, event = %e, "unknown event in history");
                        continue;
                    }
                },
                (None, None) => continue,
            };
            history.push(OpportunityHistoryRecord {
                created_at: row.created_at.into(),
                created_by: row.created_by.map(UserId::from_uuid),
                record_type,
                note: row.note.clone(),
            });
        }
        let Some(status) = status else {
            tracing::warn!(id = %base.id, "skipping opportunity with no status history");
            continue;
        };

        let updated_at = history
            .last()
            .map(|r| r.created_at)
            .unwrap_or_else(|| current.created_at.into())
            .max(current.created_at.into());

        out.push(Opportunity {
            id: OpportunityId::from_uuid(base.id),
            kind,
            status,
            created_by: UserId::from_uuid(base.created_by),
            created_at: base.created_at.into(),
            updated_at,
            version: own_versions.len() as u32,
            fields: current.fields(),
            addenda: addenda
                .iter()
                .filter(|a| a.opportunity == base.id)
                .map(|a| Addendum {
                    id: AddendumId::from_uuid(a.id),
                    created_at: a.created_at.into(),
                    created_by: a.created_by.map(UserId::from_uuid),
                    description: a.description.clone(),
                })
                .collect(),
            history,
        });
    }

    Ok(out)
}

// ─── Row types ───────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct BaseRow {
    id: Uuid,
    kind: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct VersionRow {
    opportunity: Uuid,
    created_at: DateTime<Utc>,
    title: String,
    teaser: String,
    remote_ok: bool,
    remote_desc: String,
    location: String,
    reward: i64,
    skills: Vec<String>,
    description: String,
    proposal_deadline: DateTime<Utc>,
    assignment_date: DateTime<Utc>,
    start_date: DateTime<Utc>,
    completion_date: Option<DateTime<Utc>>,
    submission_info: String,
    acceptance_criteria: String,
    evaluation_criteria: String,
}

impl VersionRow {
    fn fields(&self) -> OpportunityVersionFields {
        OpportunityVersionFields {
            title: self.title.clone(),
            teaser: self.teaser.clone(),
            remote_ok: self.remote_ok,
            remote_desc: self.remote_desc.clone(),
            location: self.location.clone(),
            reward: self.reward,
            skills: self.skills.clone(),
            description: self.description.clone(),
            proposal_deadline: self.proposal_deadline.into(),
            assignment_date: self.assignment_date.into(),
            start_date: self.start_date.into(),
            completion_date: self.completion_date.map(Into::into),
            submission_info: self.submission_info.clone(),
            acceptance_criteria: self.acceptance_criteria.clone(),
            evaluation_criteria: self.evaluation_criteria.clone(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    opportunity: Uuid,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    status: Option<String>,
    event: Option<String>,
    note: String,
}

#[derive(sqlx::FromRow)]
struct AddendumRow {
    id: Uuid,
    opportunity: Uuid,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    description: String,
}
