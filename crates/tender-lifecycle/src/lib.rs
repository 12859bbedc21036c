//! # tender-lifecycle — Status Transition Authority
//!
//! Implements the state machines of the Tender Stack. Each entity carries
//! its current status plus an append-only history of transition records;
//! transition methods validate the requested edge against a declared
//! transition table and reject everything else with a structured error.
//!
//! ## State Machines
//!
//! - **Opportunity** (`opportunity.rs`):
//!   `Draft → Published → Evaluation → Awarded` with `Suspended` and
//!   `Canceled` branches. The `Published → Evaluation` edge belongs to
//!   the deadline-driven closing hook alone.
//!
//! - **Proposal** (`proposal.rs`):
//!   `Draft → Submitted → UnderReview → Evaluated → Awarded` with
//!   `NotAwarded`, `Disqualified`, and `Withdrawn` terminals.
//!
//! ## Permissions
//!
//! Role and ownership checks are centralized in `permission.rs` as
//! explicit `(session, entity) -> bool` predicates. They are consulted
//! once at the resource boundary — transition methods themselves only
//! enforce state legality, never who is asking.
//!
//! ## Design
//!
//! Statuses are enums with validated transitions rather than typestate
//! types: both machines have terminal branches reachable from several
//! states, and the set of legal edges depends on runtime data (deadlines,
//! sibling proposals), so a `transition()`-returns-`Result` design fits
//! better than a web of zero-sized state types.

pub mod opportunity;
pub mod permission;
pub mod proposal;

// ─── Opportunity re-exports ─────────────────────────────────────────

pub use opportunity::{
    Addendum, Opportunity, OpportunityError, OpportunityEvent, OpportunityHistoryRecord,
    OpportunityHistoryType, OpportunityKind, OpportunityStatus, OpportunityVersionFields,
};

// ─── Proposal re-exports ────────────────────────────────────────────

pub use proposal::{
    IndividualProponent, Proponent, Proposal, ProposalError, ProposalHistoryRecord, ProposalStatus,
};
