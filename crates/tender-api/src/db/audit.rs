//! # Audit Log Writer
//!
//! Appends one structured, attributed record per successful mutating
//! operation. Called after the persistence step commits, never before,
//! and never on a failed operation.
//!
//! Auditing is best-effort: a failed append is logged and swallowed, so
//! it can never roll back or fail the mutation it describes. Every entry
//! also emits a structured `tracing` event, which is the whole of the
//! audit trail when no database is configured.

use chrono::Utc;
use serde::Serialize;

use tender_core::User;

use crate::state::AppState;

/// Append an audit record naming the mutation, the acting user (if
/// any), and a JSON snapshot of the entity as of the mutation.
pub async fn record<T: Serialize>(state: &AppState, event: &str, snapshot: &T, actor: Option<&User>) {
    let snapshot = match serde_json::to_value(snapshot) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(event, error = %e, "audit snapshot serialization failed");
            serde_json::Value::Null
        }
    };

    tracing::info!(
        event,
        actor = actor.map(|u| u.id.to_string()).as_deref().unwrap_or("system"),
        "audit"
    );

    let Some(pool) = &state.db_pool else {
        return;
    };

    let result = sqlx::query(
        "INSERT INTO audit_events (created_at, actor, actor_name, event, snapshot)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Utc::now())
    .bind(actor.map(|u| u.id.0))
    .bind(actor.map(|u| u.name.clone()))
    .bind(event)
    .bind(snapshot)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(event, error = %e, "audit append failed; mutation unaffected");
    }
}
