//! # Opportunity Lifecycle State Machine
//!
//! Models the lifecycle of a posted opportunity, from draft through
//! publication, evaluation, and award.
//!
//! ## States
//!
//! ```text
//! Draft ──publish()──▶ Published ──close()──▶ Evaluation ──award()──▶ Awarded
//!   │                    │    ▲                   │
//!   │              suspend()  └──publish()        │
//!   │                    ▼         │              │
//!   │                 Suspended ───┘              │
//!   │                    │                        │
//!   └────────────────────┴──── cancel() ──────────┴──▶ Canceled
//! ```
//!
//! `close()` is reserved for the deadline-driven closing hook; no
//! user-facing verb maps to it. `award()` is invoked transitively when a
//! proposal on this opportunity is awarded.
//!
//! Every edit produces a new immutable version snapshot; the entity here
//! exposes the current version's fields flat, with prior versions
//! retained by the persistence layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tender_core::{AddendumId, OpportunityId, Timestamp, UserId};

// ─── Kind ────────────────────────────────────────────────────────────

/// The two flavors of opportunity. They share one lifecycle shape; the
/// kind selects presentation and the strict-tier maximum budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityKind {
    /// A fixed-price piece of work awarded to a single proponent.
    FixedPrice,
    /// A team-based engagement delivered by an organization.
    TeamBased,
}

impl std::fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FixedPrice => "FIXED_PRICE",
            Self::TeamBased => "TEAM_BASED",
        };
        f.write_str(s)
    }
}

impl OpportunityKind {
    /// Parse a kind label.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "FIXED_PRICE" => Some(Self::FixedPrice),
            "TEAM_BASED" => Some(Self::TeamBased),
            _ => None,
        }
    }
}

// ─── Status ──────────────────────────────────────────────────────────

/// The lifecycle status of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStatus {
    /// Being drafted; visible only to its author and administrators.
    Draft,
    /// Publicly visible and accepting proposals until the deadline.
    Published,
    /// Deadline elapsed; proposals are being evaluated.
    Evaluation,
    /// A proposal has been awarded (terminal).
    Awarded,
    /// Temporarily pulled from the public site.
    Suspended,
    /// Canceled before award (terminal).
    Canceled,
}

impl OpportunityStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Awarded | Self::Canceled)
    }

    /// Whether the opportunity is visible to the public in this status.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Published | Self::Evaluation | Self::Awarded)
    }

    /// The declared transition edges out of this status.
    pub fn valid_transitions(&self) -> &'static [OpportunityStatus] {
        use OpportunityStatus::*;
        match self {
            Draft => &[Published, Canceled],
            Published => &[Evaluation, Suspended, Canceled],
            Evaluation => &[Awarded, Canceled],
            Suspended => &[Published, Canceled],
            Awarded => &[],
            Canceled => &[],
        }
    }

    /// Whether a single declared edge leads from `self` to `to`.
    pub fn can_transition_to(&self, to: OpportunityStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Parse a status label (e.g., `"PUBLISHED"`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DRAFT" => Some(Self::Draft),
            "PUBLISHED" => Some(Self::Published),
            "EVALUATION" => Some(Self::Evaluation),
            "AWARDED" => Some(Self::Awarded),
            "SUSPENDED" => Some(Self::Suspended),
            "CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Evaluation => "EVALUATION",
            Self::Awarded => "AWARDED",
            Self::Suspended => "SUSPENDED",
            Self::Canceled => "CANCELED",
        };
        f.write_str(s)
    }
}

// ─── History ─────────────────────────────────────────────────────────

/// Non-status events recorded in an opportunity's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityEvent {
    /// An addendum was posted after publication.
    AddendumAdded,
    /// A new version was saved while the opportunity was public.
    Edited,
    /// A free-form note was attached.
    NoteAdded,
}

impl OpportunityEvent {
    /// The canonical label for this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddendumAdded => "ADDENDUM_ADDED",
            Self::Edited => "EDITED",
            Self::NoteAdded => "NOTE_ADDED",
        }
    }

    /// Parse an event label.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ADDENDUM_ADDED" => Some(Self::AddendumAdded),
            "EDITED" => Some(Self::Edited),
            "NOTE_ADDED" => Some(Self::NoteAdded),
            _ => None,
        }
    }
}

impl std::fmt::Display for OpportunityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a history entry records: a status change or a free-form event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "camelCase")]
pub enum OpportunityHistoryType {
    /// The opportunity entered this status.
    Status(OpportunityStatus),
    /// A non-status event occurred.
    Event(OpportunityEvent),
}

/// One append-only, attributed history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityHistoryRecord {
    /// When the entry was recorded.
    pub created_at: Timestamp,
    /// The acting user; `None` for system-driven transitions (deadline
    /// closing).
    pub created_by: Option<UserId>,
    /// Status change or event tag.
    #[serde(rename = "type")]
    pub record_type: OpportunityHistoryType,
    /// Optional human-readable note.
    pub note: String,
}

/// An addendum communicating changes after publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addendum {
    /// Unique addendum identifier.
    pub id: AddendumId,
    /// When the addendum was posted.
    pub created_at: Timestamp,
    /// Who posted it.
    pub created_by: Option<UserId>,
    /// The addendum text.
    pub description: String,
}

// ─── Version fields ──────────────────────────────────────────────────

/// The editable field set of an opportunity. Each edit snapshots a new
/// immutable version of this struct; the latest is the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityVersionFields {
    /// Opportunity title.
    pub title: String,
    /// Short teaser shown in listings.
    pub teaser: String,
    /// Whether remote work is acceptable.
    pub remote_ok: bool,
    /// Description of the remote arrangement, when `remote_ok`.
    pub remote_desc: String,
    /// Work location.
    pub location: String,
    /// Reward / budget in whole dollars.
    pub reward: i64,
    /// Required skills.
    pub skills: Vec<String>,
    /// Full description.
    pub description: String,
    /// Deadline for proposal submission.
    pub proposal_deadline: Timestamp,
    /// Date the work is assigned to the winning proponent.
    pub assignment_date: Timestamp,
    /// Work start date.
    pub start_date: Timestamp,
    /// Work completion date, when known.
    pub completion_date: Option<Timestamp>,
    /// How to submit the work product.
    pub submission_info: String,
    /// Acceptance criteria.
    pub acceptance_criteria: String,
    /// Evaluation criteria.
    pub evaluation_criteria: String,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from opportunity lifecycle transitions.
#[derive(Error, Debug)]
pub enum OpportunityError {
    /// Attempted transition is not a declared edge.
    #[error("invalid opportunity transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Attempted target status.
        to: String,
    },

    /// The opportunity is in a terminal status.
    #[error("opportunity is in terminal status {state}")]
    TerminalState {
        /// The terminal status.
        state: String,
    },

    /// The requested operation is not available in the current status.
    #[error("operation {operation} is not available in status {state}")]
    InvalidOperation {
        /// The operation that was attempted.
        operation: &'static str,
        /// The current status.
        state: String,
    },
}

// ─── Opportunity ─────────────────────────────────────────────────────

/// An opportunity with its current version fields, status, addenda, and
/// transition history.
///
/// Transition methods validate the requested edge and append a history
/// record; they return the appended record so the persistence layer can
/// write exactly what happened. Who may call each verb is decided by the
/// predicates in [`crate::permission`], not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    /// Unique identifier.
    pub id: OpportunityId,
    /// Fixed-price or team-based.
    pub kind: OpportunityKind,
    /// Current lifecycle status.
    pub status: OpportunityStatus,
    /// The author.
    pub created_by: UserId,
    /// When the opportunity was created.
    pub created_at: Timestamp,
    /// When the current version was saved.
    pub updated_at: Timestamp,
    /// Current version number, starting at 1.
    pub version: u32,
    /// Current version fields.
    #[serde(flatten)]
    pub fields: OpportunityVersionFields,
    /// Addenda posted after publication.
    pub addenda: Vec<Addendum>,
    /// Ordered transition history.
    pub history: Vec<OpportunityHistoryRecord>,
}

impl Opportunity {
    /// Create a new opportunity in `Draft` or `Published` status — the
    /// only statuses an opportunity may be created in directly.
    pub fn new(
        id: OpportunityId,
        kind: OpportunityKind,
        created_by: UserId,
        fields: OpportunityVersionFields,
        status: OpportunityStatus,
        now: Timestamp,
    ) -> Result<Self, OpportunityError> {
        if !matches!(
            status,
            OpportunityStatus::Draft | OpportunityStatus::Published
        ) {
            return Err(OpportunityError::InvalidOperation {
                operation: "create",
                state: status.to_string(),
            });
        }
        let mut opportunity = Self {
            id,
            kind,
            status,
            created_by,
            created_at: now,
            updated_at: now,
            version: 1,
            fields,
            addenda: Vec::new(),
            history: Vec::new(),
        };
        opportunity.push_record(
            OpportunityHistoryType::Status(status),
            Some(created_by),
            String::new(),
            now,
        );
        Ok(opportunity)
    }

    /// Save a new version of the editable fields. Does not change status.
    ///
    /// Editing is only possible while the opportunity is a draft or still
    /// published; the resource layer additionally enforces the deadline
    /// for published opportunities.
    pub fn apply_edit(
        &mut self,
        fields: OpportunityVersionFields,
        actor: UserId,
        now: Timestamp,
    ) -> Result<Option<OpportunityHistoryRecord>, OpportunityError> {
        if !matches!(
            self.status,
            OpportunityStatus::Draft | OpportunityStatus::Published
        ) {
            return Err(OpportunityError::InvalidOperation {
                operation: "edit",
                state: self.status.to_string(),
            });
        }
        self.fields = fields;
        self.version += 1;
        self.updated_at = now;
        // Edits to a public opportunity are visible history; draft churn
        // is not.
        if self.status == OpportunityStatus::Published {
            let record = self.push_record(
                OpportunityHistoryType::Event(OpportunityEvent::Edited),
                Some(actor),
                String::new(),
                now,
            );
            return Ok(Some(record));
        }
        Ok(None)
    }

    /// Publish the opportunity (`Draft → Published`, or
    /// `Suspended → Published` on reactivation).
    pub fn publish(
        &mut self,
        actor: UserId,
        note: String,
        now: Timestamp,
    ) -> Result<OpportunityHistoryRecord, OpportunityError> {
        self.transition(OpportunityStatus::Published, Some(actor), note, now)
    }

    /// Suspend a published opportunity (`Published → Suspended`).
    pub fn suspend(
        &mut self,
        actor: UserId,
        note: String,
        now: Timestamp,
    ) -> Result<OpportunityHistoryRecord, OpportunityError> {
        self.transition(OpportunityStatus::Suspended, Some(actor), note, now)
    }

    /// Cancel the opportunity from any non-terminal status.
    ///
    /// The sibling guard — "not while an awarded proposal exists" — is a
    /// cross-entity rule enforced at the resource layer.
    pub fn cancel(
        &mut self,
        actor: UserId,
        note: String,
        now: Timestamp,
    ) -> Result<OpportunityHistoryRecord, OpportunityError> {
        self.transition(OpportunityStatus::Canceled, Some(actor), note, now)
    }

    /// Close the opportunity past its deadline (`Published → Evaluation`).
    ///
    /// System-driven: only the scheduled closing hook calls this, so the
    /// record carries no actor.
    pub fn close(&mut self, now: Timestamp) -> Result<OpportunityHistoryRecord, OpportunityError> {
        self.transition(OpportunityStatus::Evaluation, None, String::new(), now)
    }

    /// Mark the opportunity awarded (`Evaluation → Awarded`). Invoked
    /// transitively when one of its proposals is awarded.
    pub fn award(
        &mut self,
        actor: UserId,
        note: String,
        now: Timestamp,
    ) -> Result<OpportunityHistoryRecord, OpportunityError> {
        self.transition(OpportunityStatus::Awarded, Some(actor), note, now)
    }

    /// Post an addendum. Available from publication onward.
    pub fn add_addendum(
        &mut self,
        id: AddendumId,
        description: String,
        actor: UserId,
        now: Timestamp,
    ) -> Result<(Addendum, OpportunityHistoryRecord), OpportunityError> {
        if !self.status.is_public() {
            return Err(OpportunityError::InvalidOperation {
                operation: "addAddendum",
                state: self.status.to_string(),
            });
        }
        let addendum = Addendum {
            id,
            created_at: now,
            created_by: Some(actor),
            description,
        };
        self.addenda.push(addendum.clone());
        let record = self.push_record(
            OpportunityHistoryType::Event(OpportunityEvent::AddendumAdded),
            Some(actor),
            String::new(),
            now,
        );
        Ok((addendum, record))
    }

    /// Whether proposals may currently be submitted against this
    /// opportunity.
    pub fn accepting_proposals(&self, now: Timestamp) -> bool {
        self.status == OpportunityStatus::Published && now <= self.fields.proposal_deadline
    }

    /// Whether the proposal deadline has elapsed.
    pub fn deadline_elapsed(&self, now: Timestamp) -> bool {
        now > self.fields.proposal_deadline
    }

    /// Validate and perform a status transition, appending its record.
    fn transition(
        &mut self,
        to: OpportunityStatus,
        actor: Option<UserId>,
        note: String,
        now: Timestamp,
    ) -> Result<OpportunityHistoryRecord, OpportunityError> {
        if self.status.is_terminal() {
            return Err(OpportunityError::TerminalState {
                state: self.status.to_string(),
            });
        }
        if !self.status.can_transition_to(to) {
            return Err(OpportunityError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(self.push_record(OpportunityHistoryType::Status(to), actor, note, now))
    }

    /// Append a history record and return a copy of it.
    fn push_record(
        &mut self,
        record_type: OpportunityHistoryType,
        created_by: Option<UserId>,
        note: String,
        now: Timestamp,
    ) -> OpportunityHistoryRecord {
        let record = OpportunityHistoryRecord {
            created_at: now,
            created_by,
            record_type,
            note,
        };
        self.history.push(record.clone());
        record
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(deadline: Timestamp) -> OpportunityVersionFields {
        OpportunityVersionFields {
            title: "Build the thing".to_string(),
            teaser: "A thing needs building".to_string(),
            remote_ok: true,
            remote_desc: "Fully remote".to_string(),
            location: "Victoria".to_string(),
            reward: 50_000,
            skills: vec!["rust".to_string()],
            description: "Build it well".to_string(),
            proposal_deadline: deadline,
            assignment_date: deadline,
            start_date: deadline,
            completion_date: None,
            submission_info: "git".to_string(),
            acceptance_criteria: "works".to_string(),
            evaluation_criteria: "quality".to_string(),
        }
    }

    fn draft() -> Opportunity {
        let now = Timestamp::now();
        Opportunity::new(
            OpportunityId::new(),
            OpportunityKind::FixedPrice,
            UserId::new(),
            fields(now),
            OpportunityStatus::Draft,
            now,
        )
        .unwrap()
    }

    fn published() -> Opportunity {
        let mut opp = draft();
        opp.publish(opp.created_by, String::new(), Timestamp::now())
            .unwrap();
        opp
    }

    // ── Creation ─────────────────────────────────────────────────────

    #[test]
    fn test_create_as_draft_records_history() {
        let opp = draft();
        assert_eq!(opp.status, OpportunityStatus::Draft);
        assert_eq!(opp.version, 1);
        assert_eq!(opp.history.len(), 1);
        assert_eq!(
            opp.history[0].record_type,
            OpportunityHistoryType::Status(OpportunityStatus::Draft)
        );
    }

    #[test]
    fn test_cannot_create_in_evaluation() {
        let now = Timestamp::now();
        let result = Opportunity::new(
            OpportunityId::new(),
            OpportunityKind::TeamBased,
            UserId::new(),
            fields(now),
            OpportunityStatus::Evaluation,
            now,
        );
        assert!(result.is_err());
    }

    // ── Transitions ──────────────────────────────────────────────────

    #[test]
    fn test_publish_from_draft() {
        let mut opp = draft();
        opp.publish(opp.created_by, "Published".to_string(), Timestamp::now())
            .unwrap();
        assert_eq!(opp.status, OpportunityStatus::Published);
        assert_eq!(opp.history.len(), 2);
    }

    #[test]
    fn test_suspend_and_reactivate() {
        let mut opp = published();
        let admin = UserId::new();
        opp.suspend(admin, String::new(), Timestamp::now()).unwrap();
        assert_eq!(opp.status, OpportunityStatus::Suspended);
        opp.publish(admin, String::new(), Timestamp::now()).unwrap();
        assert_eq!(opp.status, OpportunityStatus::Published);
    }

    #[test]
    fn test_close_then_award() {
        let mut opp = published();
        opp.close(Timestamp::now()).unwrap();
        assert_eq!(opp.status, OpportunityStatus::Evaluation);
        // Closing records no actor.
        assert!(opp.history.last().unwrap().created_by.is_none());
        opp.award(UserId::new(), String::new(), Timestamp::now())
            .unwrap();
        assert_eq!(opp.status, OpportunityStatus::Awarded);
    }

    #[test]
    fn test_undeclared_edges_rejected() {
        // Draft -> Awarded directly is not a declared edge.
        let mut opp = draft();
        let result = opp.award(UserId::new(), String::new(), Timestamp::now());
        assert!(matches!(
            result,
            Err(OpportunityError::InvalidTransition { .. })
        ));
        assert_eq!(opp.status, OpportunityStatus::Draft);

        // Draft -> Evaluation is the hook's edge, only from Published.
        assert!(opp.close(Timestamp::now()).is_err());

        // Draft -> Suspended is not declared.
        assert!(opp
            .suspend(UserId::new(), String::new(), Timestamp::now())
            .is_err());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut opp = published();
        opp.cancel(opp.created_by, "no longer needed".to_string(), Timestamp::now())
            .unwrap();
        assert_eq!(opp.status, OpportunityStatus::Canceled);
        let result = opp.publish(opp.created_by, String::new(), Timestamp::now());
        assert!(matches!(result, Err(OpportunityError::TerminalState { .. })));
    }

    #[test]
    fn test_cancel_from_every_non_terminal_status() {
        for build in [draft as fn() -> Opportunity, published] {
            let mut opp = build();
            opp.cancel(opp.created_by, String::new(), Timestamp::now())
                .unwrap();
            assert_eq!(opp.status, OpportunityStatus::Canceled);
        }
        let mut opp = published();
        opp.close(Timestamp::now()).unwrap();
        opp.cancel(opp.created_by, String::new(), Timestamp::now())
            .unwrap();
        assert_eq!(opp.status, OpportunityStatus::Canceled);
    }

    // ── Editing ──────────────────────────────────────────────────────

    #[test]
    fn test_edit_draft_bumps_version_without_history() {
        let mut opp = draft();
        let mut f = opp.fields.clone();
        f.title = "Retitled".to_string();
        let record = opp
            .apply_edit(f, opp.created_by, Timestamp::now())
            .unwrap();
        assert!(record.is_none());
        assert_eq!(opp.version, 2);
        assert_eq!(opp.fields.title, "Retitled");
        assert_eq!(opp.history.len(), 1);
    }

    #[test]
    fn test_edit_published_is_recorded() {
        let mut opp = published();
        let f = opp.fields.clone();
        let record = opp
            .apply_edit(f, opp.created_by, Timestamp::now())
            .unwrap();
        assert!(record.is_some());
        assert_eq!(
            opp.history.last().unwrap().record_type,
            OpportunityHistoryType::Event(OpportunityEvent::Edited)
        );
    }

    #[test]
    fn test_cannot_edit_in_evaluation() {
        let mut opp = published();
        opp.close(Timestamp::now()).unwrap();
        let f = opp.fields.clone();
        assert!(opp.apply_edit(f, opp.created_by, Timestamp::now()).is_err());
    }

    // ── Addenda ──────────────────────────────────────────────────────

    #[test]
    fn test_addendum_requires_publication() {
        let mut opp = draft();
        let result = opp.add_addendum(
            AddendumId::new(),
            "changed scope".to_string(),
            opp.created_by,
            Timestamp::now(),
        );
        assert!(result.is_err());

        let mut opp = published();
        opp.add_addendum(
            AddendumId::new(),
            "changed scope".to_string(),
            opp.created_by,
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(opp.addenda.len(), 1);
        assert_eq!(
            opp.history.last().unwrap().record_type,
            OpportunityHistoryType::Event(OpportunityEvent::AddendumAdded)
        );
    }

    // ── Deadlines ────────────────────────────────────────────────────

    #[test]
    fn test_accepting_proposals_window() {
        let now = Timestamp::now();
        let future = Timestamp::from_epoch_secs(now.epoch_secs() + 3600).unwrap();
        let past = Timestamp::from_epoch_secs(now.epoch_secs() - 3600).unwrap();

        let mut opp = draft();
        opp.fields.proposal_deadline = future;
        assert!(!opp.accepting_proposals(now)); // drafts never accept

        opp.publish(opp.created_by, String::new(), now).unwrap();
        assert!(opp.accepting_proposals(now));

        opp.fields.proposal_deadline = past;
        assert!(!opp.accepting_proposals(now));
        assert!(opp.deadline_elapsed(now));
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn test_status_labels() {
        assert_eq!(OpportunityStatus::Published.to_string(), "PUBLISHED");
        assert_eq!(
            OpportunityStatus::parse("EVALUATION"),
            Some(OpportunityStatus::Evaluation)
        );
        assert_eq!(OpportunityStatus::parse("bogus"), None);
        let json = serde_json::to_string(&OpportunityStatus::Evaluation).unwrap();
        assert_eq!(json, "\"EVALUATION\"");
    }

    #[test]
    fn test_opportunity_serde_roundtrip() {
        let opp = published();
        let json = serde_json::to_string(&opp).unwrap();
        assert!(json.contains("\"proposalDeadline\""));
        let parsed: Opportunity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, opp.status);
        assert_eq!(parsed.id, opp.id);
        assert_eq!(parsed.history.len(), opp.history.len());
    }
}
