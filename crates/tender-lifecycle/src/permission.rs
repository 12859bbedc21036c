//! # Permission Predicates
//!
//! Every role and ownership rule in the marketplace, centralized as
//! explicit predicate functions over `(session, entity)`. The resource
//! layer consults these once per request, before content validation of
//! the operation itself; transition methods never re-derive them.
//!
//! Predicates return `bool` — the caller maps `false` to the single
//! generic permission error so responses never reveal whether an entity
//! exists, who owns it, or which check failed.

use tender_core::{Session, UserType};

use crate::opportunity::{Opportunity, OpportunityStatus};
use crate::proposal::Proposal;

/// Whether the request carries an authenticated, active session.
pub fn is_signed_in(session: Option<&Session>) -> bool {
    matches!(session, Some(s) if s.user.active)
}

fn active(session: &Session) -> bool {
    session.user.active
}

fn has_role(session: &Session, role: UserType) -> bool {
    active(session) && session.user.user_type == role
}

/// Government staff or administrator.
pub fn is_public_sector(session: &Session) -> bool {
    active(session) && session.user.user_type.is_public_sector()
}

/// Administrator.
pub fn is_admin(session: &Session) -> bool {
    has_role(session, UserType::Admin)
}

/// Vendor.
pub fn is_vendor(session: &Session) -> bool {
    has_role(session, UserType::Vendor)
}

fn owns_opportunity(session: &Session, opportunity: &Opportunity) -> bool {
    session.user.id == opportunity.created_by
}

fn owns_proposal(session: &Session, proposal: &Proposal) -> bool {
    session.user.id == proposal.created_by
}

// ─── Opportunity verbs ───────────────────────────────────────────────

/// Post a new opportunity (draft or published).
pub fn create_opportunity(session: &Session) -> bool {
    is_public_sector(session)
}

/// Save a new version of an opportunity.
pub fn edit_opportunity(session: &Session, opportunity: &Opportunity) -> bool {
    is_admin(session) || (is_public_sector(session) && owns_opportunity(session, opportunity))
}

/// Publish a draft. Reactivating a suspended opportunity also uses the
/// publish verb but is reserved for administrators.
pub fn publish_opportunity(session: &Session, opportunity: &Opportunity) -> bool {
    if opportunity.status == OpportunityStatus::Suspended {
        return is_admin(session);
    }
    is_public_sector(session)
}

/// Suspend a published opportunity.
pub fn suspend_opportunity(session: &Session) -> bool {
    is_admin(session)
}

/// Cancel an opportunity. The awarded-sibling guard is separate.
pub fn cancel_opportunity(session: &Session, opportunity: &Opportunity) -> bool {
    is_admin(session) || (is_public_sector(session) && owns_opportunity(session, opportunity))
}

/// Post an addendum.
pub fn add_addendum(session: &Session, opportunity: &Opportunity) -> bool {
    is_admin(session) || (is_public_sector(session) && owns_opportunity(session, opportunity))
}

/// Delete an opportunity (drafts only; the status gate is separate).
pub fn delete_opportunity(session: &Session, opportunity: &Opportunity) -> bool {
    is_admin(session) || (is_public_sector(session) && owns_opportunity(session, opportunity))
}

/// Whether this session may see the opportunity at all. Public statuses
/// are visible to everyone, including anonymous readers; the rest only
/// to public-sector staff.
pub fn read_opportunity(session: Option<&Session>, opportunity: &Opportunity) -> bool {
    if opportunity.status.is_public() {
        return true;
    }
    matches!(session, Some(s) if is_public_sector(s))
}

// ─── Proposal verbs ──────────────────────────────────────────────────

/// Create a proposal. Vendors only, and the platform terms must have
/// been accepted first.
pub fn create_proposal(session: &Session) -> bool {
    is_vendor(session) && session.user.accepted_terms()
}

/// Edit a proposal draft.
pub fn edit_proposal(session: &Session, proposal: &Proposal) -> bool {
    is_vendor(session) && owns_proposal(session, proposal)
}

/// Submit a proposal. Requires accepted terms like creation.
pub fn submit_proposal(session: &Session, proposal: &Proposal) -> bool {
    is_vendor(session) && owns_proposal(session, proposal) && session.user.accepted_terms()
}

/// Withdraw a submitted proposal.
pub fn withdraw_proposal(session: &Session, proposal: &Proposal) -> bool {
    is_vendor(session) && owns_proposal(session, proposal)
}

/// Delete a proposal draft.
pub fn delete_proposal(session: &Session, proposal: &Proposal) -> bool {
    is_vendor(session) && owns_proposal(session, proposal)
}

/// Score, award, or disqualify — the evaluation verbs.
pub fn evaluate_proposal(session: &Session) -> bool {
    is_public_sector(session)
}

/// Whether this session may read the proposal. The owner always may;
/// public-sector staff only once the parent opportunity has left its
/// open phase (otherwise bids stay sealed).
pub fn read_proposal(
    session: Option<&Session>,
    proposal: &Proposal,
    opportunity_status: OpportunityStatus,
) -> bool {
    let Some(s) = session else {
        return false;
    };
    if is_vendor(s) && owns_proposal(s, proposal) {
        return true;
    }
    is_public_sector(s)
        && matches!(
            opportunity_status,
            OpportunityStatus::Evaluation | OpportunityStatus::Awarded
        )
}

// ─── User verbs ──────────────────────────────────────────────────────

/// List user accounts.
pub fn read_many_users(session: &Session) -> bool {
    is_admin(session)
}

/// Read one user account: self or an administrator.
pub fn read_user(session: &Session, target: &tender_core::User) -> bool {
    is_admin(session) || session.user.id == target.id
}

/// Accept the platform terms on one's own account.
pub fn accept_terms(session: &Session, target: &tender_core::User) -> bool {
    active(session) && session.user.id == target.id
}

/// Deactivate an account: self or an administrator.
pub fn deactivate_user(session: &Session, target: &tender_core::User) -> bool {
    is_admin(session) || session.user.id == target.id
}

/// Reactivate an account. Administrators only — a deactivated user
/// cannot resurrect themselves.
pub fn reactivate_user(session: &Session) -> bool {
    is_admin(session)
}

// ─── Tests ───────────────────────────────────────────────────────────
