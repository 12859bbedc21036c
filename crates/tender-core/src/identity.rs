//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the Tender Stack.
//! These prevent accidental identifier confusion — you cannot pass a
//! `ProposalId` where an `OpportunityId` is expected, so a handler can
//! never look up the wrong table with the right UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an opportunity (a posted piece of work).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpportunityId(pub Uuid);

/// Unique identifier for a proposal (a vendor's bid on an opportunity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub Uuid);

/// Unique identifier for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

/// Unique identifier for an addendum posted against an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddendumId(pub Uuid);

/// Unique identifier for a vendor organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub Uuid);

macro_rules! impl_id {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

impl_id!(OpportunityId, "opportunity");
impl_id!(ProposalId, "proposal");
impl_id!(UserId, "user");
impl_id!(AddendumId, "addendum");
impl_id!(OrganizationId, "organization");
