//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, every
//! mutation is written through to PostgreSQL (multi-step mutations in a
//! single transaction) and the in-memory stores are hydrated from it at
//! startup. When absent, the API operates in in-memory-only mode
//! (suitable for development and testing).
//!
//! ## Layout
//!
//! Statuses live in append-only history tables (`opportunity_statuses`,
//! `proposal_statuses`); an entity's current status is the latest row
//! carrying one, exactly as the domain history is modeled. Versions of
//! an opportunity's editable fields append to `opportunity_versions`;
//! the current version is the latest.

pub mod audit;
pub mod opportunities;
pub mod proposals;
pub mod users;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::state::AppState;

/// Embedded schema, applied idempotently at startup.
const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Initialize the database connection pool and apply the schema.
///
/// Returns `None` if no URL was provided (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or schema
/// application fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set — running in-memory only mode. \
             State will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    tracing::info!("Database schema applied");

    Ok(Some(pool))
}

/// Load all persisted state into the in-memory stores. Called once at
/// startup, after `init_pool`.
pub async fn hydrate(state: &AppState) -> Result<(), sqlx::Error> {
    let Some(pool) = &state.db_pool else {
        return Ok(());
    };

    let users = users::load_all(pool).await?;
    let user_count = users.len();
    for user in users {
        state.store.insert_user(user);
    }

    let opportunities = opportunities::load_all(pool).await?;
    let opportunity_count = opportunities.len();
    for opportunity in opportunities {
        state.store.insert_opportunity(opportunity);
    }

    let proposals = proposals::load_all(pool).await?;
    let proposal_count = proposals.len();
    for proposal in proposals {
        state.store.insert_proposal(proposal);
    }

    tracing::info!(
        users = user_count,
        opportunities = opportunity_count,
        proposals = proposal_count,
        "hydrated stores from PostgreSQL"
    );
    Ok(())
}
