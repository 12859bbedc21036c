//! # tender-core — Foundational Types for the Tender Stack
//!
//! This crate is the bedrock of the Tender Stack, a procurement marketplace
//! where government staff post opportunities and vendors bid on them. It
//! defines the primitives every other crate builds on. It depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `OpportunityId`,
//!    `ProposalId`, `UserId`, `AddendumId` — all newtypes over `Uuid`.
//!    No bare strings or naked UUIDs for identifiers.
//!
//! 2. **UTC-only timestamps.** The `Timestamp` type always carries UTC.
//!    Inputs with other offsets are converted at the boundary; date-only
//!    inputs normalize to the marketplace's close-of-business time.
//!
//! 3. **Roles are an enum, not strings.** `UserType` has three variants
//!    and every permission decision matches on it exhaustively.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tender-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod actor;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use actor::{Session, User, UserType};
pub use error::CoreError;
pub use identity::{AddendumId, OpportunityId, OrganizationId, ProposalId, UserId};
pub use temporal::Timestamp;
