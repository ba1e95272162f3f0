//! Background stepper for unattended simulations.
//!
//! Every tick moves each session one market day forward and logs its value at
//! the new date. Disabled when the interval is 0.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use papertrade_core::portfolio::{LogOutcome, SnapshotRunSummary};

use crate::main_lib::AppState;

/// Starts the step scheduler. Returns `false` when `interval_secs` is 0.
pub fn start_step_scheduler(state: Arc<AppState>, interval_secs: u64) -> bool {
    if interval_secs == 0 {
        info!("Step scheduler disabled (PT_STEP_INTERVAL_SECS=0)");
        return false;
    }

    tokio::spawn(async move {
        info!("Step scheduler started ({}s interval)", interval_secs);
        let mut ticker = interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so a restart does not step.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_step(&state).await;
        }
    });
    true
}

/// Advances every session and snapshots it. Per-session failures are logged
/// and counted; they never stop the loop.
pub async fn run_step(state: &Arc<AppState>) -> SnapshotRunSummary {
    let mut summary = SnapshotRunSummary::default();
    let sessions = match state.session_service.list_sessions() {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!("Scheduled step skipped, could not list sessions: {}", e);
            return summary;
        }
    };

    for session in sessions {
        let _guard = match state.lock_session(&session.id).await {
            Ok((guard, _)) => guard,
            Err(e) if e.is_not_found() => {
                debug!("Session {} was deleted before its step", session.id);
                continue;
            }
            Err(e) => {
                warn!("Failed to lock session {}: {}", session.id, e);
                summary.failed += 1;
                continue;
            }
        };

        let date = match state
            .session_service
            .advance_simulated_date(&session.id)
            .await
        {
            Ok(date) => date,
            Err(e) => {
                warn!("Failed to advance session {}: {}", session.id, e);
                summary.failed += 1;
                continue;
            }
        };

        match state.valuation_service.log_value(&session.id, date).await {
            Ok(LogOutcome::Recorded(_)) => summary.recorded += 1,
            Ok(LogOutcome::Replaced(_)) => summary.replaced += 1,
            Ok(LogOutcome::Unchanged(_)) => summary.unchanged += 1,
            Err(e) => {
                warn!("Failed to snapshot session {} on {}: {}", session.id, date, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Scheduled step: {} recorded, {} replaced, {} unchanged, {} failed",
        summary.recorded, summary.replaced, summary.unchanged, summary.failed
    );
    summary
}
