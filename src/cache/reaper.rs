//! Background expiry for the cache
//!
//! The reaper wakes once per interval, takes the write lock and drops every
//! entry older than the interval. It runs until the owning cache signals
//! shutdown or goes away.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::store::Entries;

/// Spawns the reaper task for `entries`
///
/// # Arguments
/// * `runtime` - Runtime the task is spawned on
/// * `entries` - The map to expire, shared with the owning cache
/// * `interval` - Time-to-live and reap cadence
/// * `shutdown_rx` - Receives a stop signal, or closes when the cache is dropped
pub(crate) fn spawn(
    runtime: &Handle,
    entries: Entries,
    interval: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first tick (immediate)
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = reap_expired(&entries, interval);
                    if removed > 0 {
                        debug!(removed, "reaped expired cache entries");
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("cache reaper stopping");
                    break;
                }
            }
        }
    })
}

/// Runs one reap pass, returning how many entries were removed
///
/// Age is measured against a clock read taken under the write lock, so an
/// entry added just before the pass is never mistaken for a stale one.
pub(crate) fn reap_expired(entries: &Entries, interval: Duration) -> usize {
    let mut entries = entries.write();
    let now = Instant::now();
    let before = entries.len();

    entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) <= interval);

    before - entries.len()
}
