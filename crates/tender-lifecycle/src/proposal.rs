//! # Proposal Lifecycle State Machine
//!
//! Models the lifecycle of a vendor's bid against an opportunity.
//!
//! ## States
//!
//! ```text
//! Draft ──submit()──▶ Submitted ──▶ UnderReview ──score()──▶ Evaluated ──award()──▶ Awarded
//!                         │              │                      │  │
//!                         │              │                      │  └──▶ NotAwarded
//!                         └──────────────┴──── withdraw() ──────┴──▶ Withdrawn
//!
//! (any non-terminal) ──disqualify()──▶ Disqualified
//! ```
//!
//! `Submitted → UnderReview` is system-driven: it happens when the parent
//! opportunity enters evaluation, via the closing hook. Awarding one
//! proposal marks its evaluated and submitted siblings `NotAwarded`.
//!
//! A proposal's opportunity reference is immutable after creation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tender_core::{OpportunityId, OrganizationId, ProposalId, Timestamp, UserId};

// ─── Status ──────────────────────────────────────────────────────────

/// The lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    /// Being drafted; visible only to its author.
    Draft,
    /// Submitted against an open opportunity.
    Submitted,
    /// The parent opportunity entered evaluation.
    UnderReview,
    /// Scored by government staff.
    Evaluated,
    /// The winning proposal (terminal).
    Awarded,
    /// A sibling proposal won (terminal).
    NotAwarded,
    /// Disqualified with a reason (terminal).
    Disqualified,
    /// Withdrawn by its author (terminal).
    Withdrawn,
}

impl ProposalStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Awarded | Self::NotAwarded | Self::Disqualified | Self::Withdrawn
        )
    }

    /// The declared transition edges out of this status.
    ///
    /// `Disqualified` is additionally reachable from every non-terminal
    /// status via `disqualify()`.
    pub fn valid_transitions(&self) -> &'static [ProposalStatus] {
        use ProposalStatus::*;
        match self {
            Draft => &[Submitted, Disqualified],
            Submitted => &[UnderReview, NotAwarded, Withdrawn, Disqualified],
            UnderReview => &[Evaluated, NotAwarded, Withdrawn, Disqualified],
            Evaluated => &[Awarded, NotAwarded, Withdrawn, Disqualified],
            Awarded | NotAwarded | Disqualified | Withdrawn => &[],
        }
    }

    /// Whether a single declared edge leads from `self` to `to`.
    pub fn can_transition_to(&self, to: ProposalStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Parse a status label (e.g., `"SUBMITTED"`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "UNDER_REVIEW" => Some(Self::UnderReview),
            "EVALUATED" => Some(Self::Evaluated),
            "AWARDED" => Some(Self::Awarded),
            "NOT_AWARDED" => Some(Self::NotAwarded),
            "DISQUALIFIED" => Some(Self::Disqualified),
            "WITHDRAWN" => Some(Self::Withdrawn),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Evaluated => "EVALUATED",
            Self::Awarded => "AWARDED",
            Self::NotAwarded => "NOT_AWARDED",
            Self::Disqualified => "DISQUALIFIED",
            Self::Withdrawn => "WITHDRAWN",
        };
        f.write_str(s)
    }
}

// ─── Proponent ───────────────────────────────────────────────────────

/// Contact block for an individual proponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualProponent {
    /// Legal name.
    pub legal_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone, possibly empty.
    pub phone: String,
    /// Street address, line 1.
    pub street1: String,
    /// Street address, line 2, possibly empty.
    pub street2: String,
    /// City.
    pub city: String,
    /// Province or state.
    pub region: String,
    /// Postal or ZIP code.
    pub mail_code: String,
    /// Country.
    pub country: String,
}

/// Who is bidding: an individual or a registered organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "camelCase")]
pub enum Proponent {
    /// An individual with a full contact block.
    Individual(IndividualProponent),
    /// A registered vendor organization.
    Organization(OrganizationId),
}

// ─── History ─────────────────────────────────────────────────────────

/// One append-only, attributed history entry. Proposal history records
/// status changes only; the note carries context (a disqualification
/// reason, for instance).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalHistoryRecord {
    /// When the entry was recorded.
    pub created_at: Timestamp,
    /// The acting user; `None` for system-driven transitions.
    pub created_by: Option<UserId>,
    /// The status the proposal entered.
    pub status: ProposalStatus,
    /// Optional human-readable note.
    pub note: String,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from proposal lifecycle transitions.
#[derive(Error, Debug)]
pub enum ProposalError {
    /// Attempted transition is not a declared edge.
    #[error("invalid proposal transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Attempted target status.
        to: String,
    },

    /// The proposal is in a terminal status.
    #[error("proposal is in terminal status {state}")]
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

// ─── Proposal ────────────────────────────────────────────────────────

/// A vendor's bid against a specific opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Unique identifier.
    pub id: ProposalId,
    /// The opportunity this proposal bids on. Immutable after creation.
    pub opportunity: OpportunityId,
    /// The vendor who authored the proposal.
    pub created_by: UserId,
    /// Current lifecycle status.
    pub status: ProposalStatus,
    /// Score assigned during evaluation, 0–100.
    pub score: Option<f64>,
    /// Who is bidding.
    pub proponent: Proponent,
    /// The pitch.
    pub proposal_text: String,
    /// Anything else the evaluators should know.
    pub additional_comments: String,
    /// When the proposal was created.
    pub created_at: Timestamp,
    /// When the proposal was last edited.
    pub updated_at: Timestamp,
    /// Ordered transition history.
    pub history: Vec<ProposalHistoryRecord>,
}

impl Proposal {
    /// Create a new proposal in `Draft` or `Submitted` status — the only
    /// statuses a proposal may be created in directly.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProposalId,
        opportunity: OpportunityId,
        created_by: UserId,
        proponent: Proponent,
        proposal_text: String,
        additional_comments: String,
        status: ProposalStatus,
        now: Timestamp,
    ) -> Result<Self, ProposalError> {
        if !matches!(status, ProposalStatus::Draft | ProposalStatus::Submitted) {
            return Err(ProposalError::InvalidOperation {
                operation: "create",
                state: status.to_string(),
            });
        }
        let mut proposal = Self {
            id,
            opportunity,
            created_by,
            status,
            score: None,
            proponent,
            proposal_text,
            additional_comments,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        };
        proposal.push_record(status, Some(created_by), String::new(), now);
        Ok(proposal)
    }

    /// Replace the editable fields. Only drafts may be edited.
    pub fn apply_edit(
        &mut self,
        proponent: Proponent,
        proposal_text: String,
        additional_comments: String,
        now: Timestamp,
    ) -> Result<(), ProposalError> {
        if self.status != ProposalStatus::Draft {
            return Err(ProposalError::InvalidOperation {
                operation: "edit",
                state: self.status.to_string(),
            });
        }
        self.proponent = proponent;
        self.proposal_text = proposal_text;
        self.additional_comments = additional_comments;
        self.updated_at = now;
        Ok(())
    }

    /// Submit the draft (`Draft → Submitted`).
    pub fn submit(
        &mut self,
        actor: UserId,
        note: String,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        self.transition(ProposalStatus::Submitted, Some(actor), note, now)
    }

    /// Withdraw the proposal. Defined from `Submitted`, `UnderReview`,
    /// and `Evaluated` only — there is nothing to withdraw from `Draft`,
    /// and the resource layer surfaces that as a permission error.
    pub fn withdraw(
        &mut self,
        actor: UserId,
        note: String,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        self.transition(ProposalStatus::Withdrawn, Some(actor), note, now)
    }

    /// Move the proposal under review (`Submitted → UnderReview`).
    ///
    /// System-driven: happens when the parent opportunity enters
    /// evaluation, so the record carries no actor.
    pub fn move_under_review(
        &mut self,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        self.transition(ProposalStatus::UnderReview, None, String::new(), now)
    }

    /// Score the proposal (`UnderReview → Evaluated`). The score itself
    /// is validated upstream (0–100, two decimal places).
    pub fn score(
        &mut self,
        score: f64,
        actor: UserId,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        let record = self.transition(
            ProposalStatus::Evaluated,
            Some(actor),
            format!("scored {score}"),
            now,
        )?;
        self.score = Some(score);
        Ok(record)
    }

    /// Award the proposal (`Evaluated → Awarded`).
    pub fn award(
        &mut self,
        actor: UserId,
        note: String,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        self.transition(ProposalStatus::Awarded, Some(actor), note, now)
    }

    /// Mark the proposal not awarded because a sibling won.
    pub fn mark_not_awarded(
        &mut self,
        actor: UserId,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        self.transition(
            ProposalStatus::NotAwarded,
            Some(actor),
            String::new(),
            now,
        )
    }

    /// Disqualify the proposal from any non-terminal status. A reason
    /// note is required; the resource layer validates it.
    pub fn disqualify(
        &mut self,
        reason: String,
        actor: UserId,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        if self.status.is_terminal() {
            return Err(ProposalError::TerminalState {
                state: self.status.to_string(),
            });
        }
        self.status = ProposalStatus::Disqualified;
        self.updated_at = now;
        Ok(self.push_record(ProposalStatus::Disqualified, Some(actor), reason, now))
    }

    /// Validate and perform a status transition, appending its record.
    fn transition(
        &mut self,
        to: ProposalStatus,
        actor: Option<UserId>,
        note: String,
        now: Timestamp,
    ) -> Result<ProposalHistoryRecord, ProposalError> {
        if self.status.is_terminal() {
            return Err(ProposalError::TerminalState {
                state: self.status.to_string(),
            });
        }
        if !self.status.can_transition_to(to) {
            return Err(ProposalError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(self.push_record(to, actor, note, now))
    }

    fn push_record(
        &mut self,
        status: ProposalStatus,
        created_by: Option<UserId>,
        note: String,
        now: Timestamp,
    ) -> ProposalHistoryRecord {
        let record = ProposalHistoryRecord {
            created_at: now,
            created_by,
            status,
            note,
        };
        self.history.push(record.clone());
        record
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
