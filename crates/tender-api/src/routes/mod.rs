//! # Resource Routes
//!
//! One resource module per entity. Opportunities and proposals are
//! served under two namespaces — fixed-price and team-based — from one
//! generic implementation each; the two flavors share a lifecycle shape
//! and differ only in presentation and budget ceiling, so the namespace
//! marker picks the kind at compile time.

pub mod opportunities;
pub mod proposals;
pub mod status;
pub mod users;

use tender_lifecycle::OpportunityKind;

/// Compile-time selection of an opportunity flavor and its route
/// namespaces.
pub trait KindRoute: Send + Sync + 'static {
    /// The opportunity kind this namespace serves.
    const KIND: OpportunityKind;
    /// Namespace for the opportunity resource.
    const OPPORTUNITIES: &'static str;
    /// Namespace for the proposal resource.
    const PROPOSALS: &'static str;
}

/// Fixed-price namespaces (`opportunities/fixed-price`, …).
pub struct FixedPrice;

impl KindRoute for FixedPrice {
    const KIND: OpportunityKind = OpportunityKind::FixedPrice;
    const OPPORTUNITIES: &'static str = "opportunities/fixed-price";
    const PROPOSALS: &'static str = "proposals/fixed-price";
}

/// Team-based namespaces (`opportunities/team-based`, …).
pub struct TeamBased;

impl KindRoute for TeamBased {
    const KIND: OpportunityKind = OpportunityKind::TeamBased;
    const OPPORTUNITIES: &'static str = "opportunities/team-based";
    const PROPOSALS: &'static str = "proposals/team-based";
}
