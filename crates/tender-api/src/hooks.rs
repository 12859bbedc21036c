//! # Scheduled Closing Hook
//!
//! The deadline-driven entry point. An external scheduler polls
//! `GET /status`; each poll invokes [`run_closing`], which scans for
//! published opportunities whose proposal deadline has elapsed and moves
//! them to evaluation, carrying their submitted proposals to under
//! review. This hook is the only path for the `Published → Evaluation`
//! edge — no user-facing verb can force it.
//!
//! The scan is idempotent (an already-closed opportunity no longer
//! matches the filter) and **throttled**: a module-owned timestamp
//! coalesces repeated polls inside the configured window into one scan.
//! The throttle is an in-process debounce, not a distributed lock —
//! multiple server instances each debounce independently.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tender_core::{OpportunityId, ProposalId, Timestamp};
use tender_lifecycle::ProposalStatus;

use crate::state::AppState;

/// Debounce state for the closing hook.
pub struct ClosingHook {
    min_interval: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl ClosingHook {
    /// Create a hook that scans at most once per `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run: Mutex::new(None),
        }
    }

    /// Claim a scan slot. Returns `false` while inside the window of the
    /// previous claim.
    pub fn try_begin(&self) -> bool {
        let mut last = self.last_run.lock();
        if matches!(*last, Some(at) if at.elapsed() < self.min_interval) {
            return false;
        }
        *last = Some(Instant::now());
        true
    }
}

/// What one invocation of the hook did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ClosingOutcome {
    /// Whether a scan ran, or the invocation was coalesced.
    pub ran: bool,
    /// How many opportunities the scan closed.
    pub closed: usize,
}

/// Run the closing hook against current state.
pub async fn run_closing(state: &AppState) -> ClosingOutcome {
    if !state.closing.try_begin() {
        state.metrics.record_closing_throttled();
        return ClosingOutcome {
            ran: false,
            closed: 0,
        };
    }

    let now = Timestamp::now();
    let due: Vec<OpportunityId> = state
        .store
        .list_opportunities()
        .into_iter()
        .filter(|o| {
            o.status == tender_lifecycle::OpportunityStatus::Published && o.deadline_elapsed(now)
        })
        .map(|o| o.id)
        .collect();

    let mut closed = 0;
    for id in &due {
        match close_one(state, *id, now).await {
            Ok(()) => closed += 1,
            Err(e) => {
                tracing::error!(opportunity = %id, error = %e, "closing failed");
            }
        }
    }

    state.metrics.record_closing_run(closed);
    if closed > 0 {
        tracing::info!(closed, "closing hook advanced opportunities to evaluation");
    }
    ClosingOutcome { ran: true, closed }
}

/// Close one opportunity: `Published → Evaluation`, with every submitted
/// proposal carried to `UnderReview`. In-memory first, then one
/// write-through transaction, then the audit entry.
async fn close_one(
    state: &AppState,
    id: OpportunityId,
    now: Timestamp,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let record = state
        .store
        .with_opportunity_mut(&id, |opp| opp.close(now))
        .ok_or("opportunity vanished mid-scan")??;

    let submitted: Vec<ProposalId> = state
        .store
        .proposals_for_opportunity(&id)
        .into_iter()
        .filter(|p| p.status == ProposalStatus::Submitted)
        .map(|p| p.id)
        .collect();

    let mut proposal_records = Vec::with_capacity(submitted.len());
    for proposal_id in submitted {
        if let Some(result) = state
            .store
            .with_proposal_mut(&proposal_id, |p| p.move_under_review(now))
        {
            proposal_records.push((proposal_id, result?));
        }
    }

    if let Some(pool) = &state.db_pool {
        crate::db::opportunities::persist_closing(pool, id, &record, &proposal_records).await?;
    }

    if let Some(snapshot) = state.store.get_opportunity(&id) {
        crate::db::audit::record(state, "opportunity closed", &snapshot, None).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_coalesces_within_window() {
        let hook = ClosingHook::new(Duration::from_secs(60));
        assert!(hook.try_begin());
        assert!(!hook.try_begin());
        assert!(!hook.try_begin());
    }

    #[test]
    fn test_zero_window_never_throttles() {
        let hook = ClosingHook::new(Duration::ZERO);
        assert!(hook.try_begin());
        assert!(hook.try_begin());
    }

    #[test]
    fn test_window_expiry_reopens_the_hook() {
        let hook = ClosingHook::new(Duration::from_millis(10));
        assert!(hook.try_begin());
        assert!(!hook.try_begin());
        std::thread::sleep(Duration::from_millis(15));
        assert!(hook.try_begin());
    }
}
