//! # Expiry Reaper
//!
//! Background sweeper, the same shape as `hkv-engine`'s
//! `ExpirationHandle`/`start_expirer`: a detached thread polling on a fixed
//! interval, stoppable via a shared `AtomicBool`. The flag it watches is the
//! engine's own `shutting_down` flag, so a shutdown both rejects new
//! foreground operations and tells the reaper to exit after its current
//! batch — one signal, not two.
//!
//! Each wakeup sweeps every shard in bounded batches, releasing that
//! shard's lock before moving to the next one, so a long sweep never holds
//! a single lock across the whole store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::stats::StatsCollector;
use crate::store::Store;

pub(crate) struct ReaperHandle {
    join: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    /// Blocks until the reaper thread has exited. Idempotent.
    pub(crate) fn join(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Starts the background sweeper. `shutting_down` must already be shared
/// with the engine's public operations; setting it is what stops this loop.
pub(crate) fn spawn(
    store: Arc<Store>,
    stats: Arc<StatsCollector>,
    interval: Duration,
    batch_cap: usize,
    shutting_down: Arc<AtomicBool>,
) -> ReaperHandle {
    let interval = if interval.is_zero() {
        Duration::from_millis(1)
    } else {
        interval
    };

    let join = std::thread::spawn(move || {
        while !shutting_down.load(Ordering::Acquire) {
            std::thread::sleep(interval);
            if shutting_down.load(Ordering::Acquire) {
                break;
            }
            let removed = sweep(&store, batch_cap);
            if removed > 0 {
                stats.record_expirations(removed as u64);
                tracing::info!(removed, "reaper sweep complete");
            } else {
                tracing::trace!("reaper sweep complete, nothing expired");
            }
        }
    });

    ReaperHandle { join: Some(join) }
}

fn sweep(store: &Store, batch_cap: usize) -> usize {
    let now = Instant::now();
    let mut total = 0;
    for i in 0..store.shard_count() {
        let (removed, freed) = store.reap_shard(i, now, batch_cap);
        if removed > 0 {
            store.bulk_remove_accounting(removed, freed);
            total += removed;
        }
    }
    total
}
