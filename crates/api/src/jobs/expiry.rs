//! # Slot expiry sweep
//!
//! Scans every slot that is not yet EXPIRED, following the pagination
//! cursor to the end, and marks those whose end has passed. Each update is
//! independent: a failure is logged and counted in
//! [`SweepSummary::failed`] but never stops the sweep. Only a failed scan
//! aborts, since the sweep cannot know which slots it missed.
//!
//! Every scanned record counts towards [`SweepSummary::processed`], including
//! records that cannot be decoded and are skipped.
//!
//! Expired slots are excluded by the scan filter, so repeated or
//! overlapping sweeps do no extra work.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDateTime;
use skillsession_core::{
    errors::SessionResult,
    models::slot::{SlotStatus, SweepSummary},
};
use skillsession_db::{DocumentStore, repositories::slot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::ApiState;

/// Marks every slot in `table` whose end is before `now` as EXPIRED.
///
/// `now` must already be in the deployment timezone.
pub async fn sweep_expired_slots(
    store: &dyn DocumentStore,
    table: &str,
    now: NaiveDateTime,
) -> SessionResult<SweepSummary> {
    let items = slot::scan_unexpired(store, table).await?;
    let mut summary = SweepSummary::default();

    for item in &items {
        summary.processed += 1;
        let slot = match slot::decode_slot(item) {
            Ok(slot) => slot,
            Err(e) => {
                warn!("Skipping malformed slot '{}': {}", item.key, e);
                continue;
            }
        };

        if slot.status.is_terminal() || !slot.is_expired_at(now) {
            continue;
        }

        match slot::set_slot_status(store, table, &item.key, SlotStatus::Expired).await {
            Ok(true) => {
                debug!("Expired slot {}", item.key);
                summary.expired += 1;
            }
            Ok(false) => {
                warn!("Slot {} disappeared before it could be expired", item.key);
                summary.failed += 1;
            }
            Err(e) => {
                warn!("Failed to expire slot {}: {:#}", item.key, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Expiry sweep finished: processed={} expired={} failed={}",
        summary.processed, summary.expired, summary.failed
    );
    Ok(summary)
}

/// Runs one sweep against the state's slot table at the current local time.
pub async fn run_expiry_sweep(state: &ApiState) -> SessionResult<SweepSummary> {
    sweep_expired_slots(state.store.as_ref(), &state.tables.slots, state.local_now()).await
}

/// Sweeps every `interval`, starting one interval after the call.
pub fn spawn_expiry_sweeper(state: Arc<ApiState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = run_expiry_sweep(&state).await {
                error!("Slot expiry sweep failed: {}", e);
            }
        }
    })
}
