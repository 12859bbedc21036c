//! # Application State
//!
//! Shared state for the Axum application: configuration, the in-memory
//! stores, the optional Postgres pool for write-through persistence, the
//! session resolver, the closing-hook debounce, and the metrics registry.
//!
//! The in-memory stores are authoritative at runtime. When a pool is
//! configured, every mutation is also persisted (write-through) and the
//! stores are hydrated from Postgres at startup; without one the service
//! runs in-memory only (development and test mode).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use sqlx::PgPool;

use tender_core::{OpportunityId, ProposalId, User, UserId};
use tender_lifecycle::{Opportunity, OpportunityKind, Proposal};

use crate::auth::SessionResolver;
use crate::hooks::ClosingHook;
use crate::middleware::metrics::ApiMetrics;

/// Deployment configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Strict-tier reward ceiling for fixed-price opportunities.
    pub fixed_price_max_budget: i64,
    /// Strict-tier reward ceiling for team-based opportunities.
    pub team_based_max_budget: i64,
    /// Minimum interval between closing-hook scans.
    pub closing_interval: Duration,
    /// Whether the Prometheus middleware and `/metrics` route are mounted.
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            fixed_price_max_budget: 70_000,
            team_based_max_budget: 2_000_000,
            closing_interval: Duration::from_millis(60_000),
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Read configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("TENDER_HOST").unwrap_or(defaults.host),
            port: env_parse("TENDER_PORT").unwrap_or(defaults.port),
            fixed_price_max_budget: env_parse("FIXED_PRICE_MAX_BUDGET")
                .unwrap_or(defaults.fixed_price_max_budget),
            team_based_max_budget: env_parse("TEAM_BASED_MAX_BUDGET")
                .unwrap_or(defaults.team_based_max_budget),
            closing_interval: env_parse("CLOSING_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.closing_interval),
            metrics_enabled: std::env::var("TENDER_METRICS_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// The strict-tier reward ceiling for the given opportunity kind.
    pub fn max_budget(&self, kind: OpportunityKind) -> i64 {
        match kind {
            OpportunityKind::FixedPrice => self.fixed_price_max_budget,
            OpportunityKind::TeamBased => self.team_based_max_budget,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// The in-memory entity stores.
#[derive(Clone, Default)]
pub struct Store {
    opportunities: Arc<RwLock<HashMap<OpportunityId, Opportunity>>>,
    proposals: Arc<RwLock<HashMap<ProposalId, Proposal>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl Store {
    // ── Opportunities ────────────────────────────────────────────────

    pub fn insert_opportunity(&self, opportunity: Opportunity) {
        self.opportunities
            .write()
            .insert(opportunity.id, opportunity);
    }

    pub fn get_opportunity(&self, id: &OpportunityId) -> Option<Opportunity> {
        self.opportunities.read().get(id).cloned()
    }

    pub fn list_opportunities(&self) -> Vec<Opportunity> {
        let mut all: Vec<_> = self.opportunities.read().values().cloned().collect();
        all.sort_by_key(|o| (o.created_at, o.id.0));
        all
    }

    pub fn remove_opportunity(&self, id: &OpportunityId) -> Option<Opportunity> {
        self.opportunities.write().remove(id)
    }

    /// Run a closure against an opportunity under the write lock.
    pub fn with_opportunity_mut<F, R>(&self, id: &OpportunityId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Opportunity) -> R,
    {
        self.opportunities.write().get_mut(id).map(f)
    }

    // ── Proposals ────────────────────────────────────────────────────

    pub fn insert_proposal(&self, proposal: Proposal) {
        self.proposals.write().insert(proposal.id, proposal);
    }

    pub fn get_proposal(&self, id: &ProposalId) -> Option<Proposal> {
        self.proposals.read().get(id).cloned()
    }

    pub fn list_proposals(&self) -> Vec<Proposal> {
        let mut all: Vec<_> = self.proposals.read().values().cloned().collect();
        all.sort_by_key(|p| (p.created_at, p.id.0));
        all
    }

    pub fn remove_proposal(&self, id: &ProposalId) -> Option<Proposal> {
        self.proposals.write().remove(id)
    }

    pub fn with_proposal_mut<F, R>(&self, id: &ProposalId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Proposal) -> R,
    {
        self.proposals.write().get_mut(id).map(f)
    }

    /// All proposals bidding on the given opportunity.
    pub fn proposals_for_opportunity(&self, opportunity: &OpportunityId) -> Vec<Proposal> {
        let mut all: Vec<_> = self
            .proposals
            .read()
            .values()
            .filter(|p| p.opportunity == *opportunity)
            .cloned()
            .collect();
        all.sort_by_key(|p| (p.created_at, p.id.0));
        all
    }

    /// A vendor's existing proposal on an opportunity, if any. Backs the
    /// one-proposal-per-vendor conflict check.
    pub fn proposal_by_author(
        &self,
        opportunity: &OpportunityId,
        author: &UserId,
    ) -> Option<Proposal> {
        self.proposals
            .read()
            .values()
            .find(|p| p.opportunity == *opportunity && p.created_by == *author)
            .cloned()
    }

    // ── Users ────────────────────────────────────────────────────────

    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    pub fn get_user(&self, id: &UserId) -> Option<User> {
        self.users.read().get(id).cloned()
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut all: Vec<_> = self.users.read().values().cloned().collect();
        all.sort_by_key(|u| (u.created_at, u.id.0));
        all
    }

    pub fn with_user_mut<F, R>(&self, id: &UserId, f: F) -> Option<R>
    where
        F: FnOnce(&mut User) -> R,
    {
        self.users.write().get_mut(id).map(f)
    }

    // ── Metrics support ──────────────────────────────────────────────

    /// Opportunity counts per status label, for the `/metrics` scrape.
    pub fn opportunity_status_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for o in self.opportunities.read().values() {
            *counts.entry(o.status.to_string()).or_default() += 1;
        }
        counts
    }

    /// Proposal counts per status label, for the `/metrics` scrape.
    pub fn proposal_status_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for p in self.proposals.read().values() {
            *counts.entry(p.status.to_string()).or_default() += 1;
        }
        counts
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Deployment configuration.
    pub config: AppConfig,
    /// Authoritative in-memory stores.
    pub store: Store,
    /// Optional Postgres pool for write-through persistence.
    pub db_pool: Option<PgPool>,
    /// Resolves opaque bearer tokens to sessions.
    pub sessions: Arc<dyn SessionResolver>,
    /// Debounce state for the scheduled closing hook.
    pub closing: Arc<ClosingHook>,
    /// Prometheus metrics registry.
    pub metrics: ApiMetrics,
}

impl AppState {
    /// In-memory state with default configuration and no resolvable
    /// sessions. Suitable for tests that only touch public routes.
    pub fn new() -> Self {
        Self::with_config(
            AppConfig::default(),
            None,
            Arc::new(crate::auth::StaticSessions::default()),
        )
    }

    /// Build state from explicit parts.
    pub fn with_config(
        config: AppConfig,
        db_pool: Option<PgPool>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        let closing = Arc::new(ClosingHook::new(config.closing_interval));
        Self {
            config,
            store: Store::default(),
            db_pool,
            sessions,
            closing,
            metrics: ApiMetrics::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
