//! Background decay sweep (spec.md §4.7): every [`SWEEP_INTERVAL`], drop any
//! manager whose last heartbeat is older than [`DECAY_TIMEOUT`] and cascade
//! the removal to every actor it owned. Grounded on
//! `original_source/python/actors/registry.py`'s `_heartbeat_monitor`/
//! `_check_heartbeats` loop; the `tokio::select!` shutdown idiom follows
//! `airssys-rt`'s `registry_client` heartbeat task.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::state::RegistryState;

/// How often the sweep runs (spec.md §4.7).
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// How long without a heartbeat before a manager is declared decayed
/// (3 missed 2s heartbeats, spec.md §4.7 and the original's
/// `HEARTBEAT_TIMEOUT_S`).
pub const DECAY_TIMEOUT: Duration = Duration::from_secs(6);

/// Spawn the sweep task. Returns a handle plus a shutdown sender; dropping
/// the sender or sending `true` stops the loop after its current tick.
pub fn spawn(state: Arc<RwLock<RegistryState>>) -> (JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    sweep_once(&state, DECAY_TIMEOUT);
                }
            }
        }
    });

    (handle, shutdown_tx)
}

fn sweep_once(state: &Arc<RwLock<RegistryState>>, decay_timeout: Duration) {
    let stale = {
        let guard = state.read();
        guard.stale_managers(decay_timeout)
    };

    for manager_id in stale {
        let removed = state.write().unregister_manager(&manager_id);
        if !removed.is_empty() {
            tracing::warn!(
                manager_id = %manager_id,
                actors = ?removed,
                "manager decayed, cascading unregistration"
            );
        }
    }
}
