//! The registry's single shared state table (spec.md §4.7: "all four maps
//! behind one lock"). Grounded on `original_source/python/actors/registry.py`'s
//! `GlobalRegistry` — `_registry`, `_heartbeats`, `_manager_actors` are kept
//! as three maps inside one guarded struct rather than three separately
//! locked fields, so a lookup and a concurrent decay cascade can never
//! observe a half-updated entry (spec.md I3/I4).

// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// One registered actor: where it lives, and which manager owns it.
#[derive(Debug, Clone)]
pub struct ActorEntry {
    pub endpoint: String,
    pub manager_id: String,
}

/// The registry's name table, reverse index, and liveness map, held behind
/// one `parking_lot::RwLock` in [`crate::server`].
///
/// Heartbeat freshness is tracked with [`Instant`] rather than a wall-clock
/// timestamp (the wire protocol carries `timestamp_ms` for logging only;
/// decay math must not be sensitive to clock adjustments, matching the
/// original's use of `time.monotonic()`).
#[derive(Debug, Default)]
pub struct RegistryState {
    /// actor_name -> entry
    actors: HashMap<String, ActorEntry>,
    /// manager_id -> set of actor_names it owns
    manager_actors: HashMap<String, HashSet<String>>,
    /// manager_id -> last heartbeat instant
    heartbeats: HashMap<String, Instant>,
}

/// Outcome of [`RegistryState::register`].
pub enum RegisterOutcome {
    Ok,
    NameTaken,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `actor_name` for `manager_id`, refreshing that manager's
    /// heartbeat (spec.md §4.7 property law 4: "registration counts as an
    /// implicit heartbeat").
    pub fn register(&mut self, manager_id: &str, actor_name: &str, endpoint: &str) -> RegisterOutcome {
        if self.actors.contains_key(actor_name) {
            return RegisterOutcome::NameTaken;
        }

        self.actors.insert(
            actor_name.to_string(),
            ActorEntry {
                endpoint: endpoint.to_string(),
                manager_id: manager_id.to_string(),
            },
        );
        self.manager_actors
            .entry(manager_id.to_string())
            .or_default()
            .insert(actor_name.to_string());
        self.heartbeats.insert(manager_id.to_string(), Instant::now());

        RegisterOutcome::Ok
    }

    /// Remove `actor_name`. Idempotent: unregistering an unknown name is a
    /// no-op, not an error (spec.md §4.7). Does not touch the heartbeat map.
    pub fn unregister(&mut self, actor_name: &str) {
        if let Some(entry) = self.actors.remove(actor_name) {
            if let Some(owned) = self.manager_actors.get_mut(&entry.manager_id) {
                owned.remove(actor_name);
            }
        }
    }

    /// Resolve `actor_name` to its entry and whether its owning manager is
    /// within the heartbeat timeout, if registered.
    pub fn lookup(&self, actor_name: &str, timeout: std::time::Duration) -> Option<(ActorEntry, bool)> {
        let entry = self.actors.get(actor_name)?;
        let online = self.is_manager_online(&entry.manager_id, timeout);
        Some((entry.clone(), online))
    }

    /// Record a heartbeat for `manager_id`. Never creates registry entries;
    /// only refreshes liveness for a manager that may or may not yet own
    /// actors.
    pub fn heartbeat(&mut self, manager_id: &str) {
        self.heartbeats.insert(manager_id.to_string(), Instant::now());
    }

    pub fn is_manager_online(&self, manager_id: &str, timeout: std::time::Duration) -> bool {
        match self.heartbeats.get(manager_id) {
            Some(last) => last.elapsed() < timeout,
            None => false,
        }
    }

    /// Manager ids whose last heartbeat is older than `timeout`.
    pub fn stale_managers(&self, timeout: std::time::Duration) -> Vec<String> {
        self.heartbeats
            .iter()
            .filter(|(_, last)| last.elapsed() > timeout)
            .map(|(manager_id, _)| manager_id.clone())
            .collect()
    }

    /// Cascade-invalidate every actor owned by `manager_id` (spec.md §4.7
    /// I3/I4: a decayed manager's entire name-table footprint disappears
    /// atomically under the same lock acquisition). Returns the names
    /// removed, for logging.
    pub fn unregister_manager(&mut self, manager_id: &str) -> Vec<String> {
        let owned = self.manager_actors.remove(manager_id).unwrap_or_default();
        for actor_name in &owned {
            self.actors.remove(actor_name);
        }
        self.heartbeats.remove(manager_id);
        owned.into_iter().collect()
    }

    #[cfg(test)]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn register_rejects_duplicate_name() {
        let mut state = RegistryState::new();
        assert!(matches!(
            state.register("mgr-1", "a", "tcp://x:1"),
            RegisterOutcome::Ok
        ));
        assert!(matches!(
            state.register("mgr-2", "a", "tcp://y:2"),
            RegisterOutcome::NameTaken
        ));
    }

    #[test]
    fn register_counts_as_heartbeat() {
        let mut state = RegistryState::new();
        state.register("mgr-1", "a", "tcp://x:1");
        assert!(state.is_manager_online("mgr-1", Duration::from_secs(6)));
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut state = RegistryState::new();
        state.register("mgr-1", "a", "tcp://x:1");
        state.unregister("a");
        state.unregister("a");
        assert_eq!(state.actor_count(), 0);
    }

    #[test]
    fn lookup_missing_returns_none() {
        let state = RegistryState::new();
        assert!(state.lookup("ghost", Duration::from_secs(6)).is_none());
    }

    #[test]
    fn unregister_manager_cascades_all_owned_actors() {
        let mut state = RegistryState::new();
        state.register("mgr-1", "a", "tcp://x:1");
        state.register("mgr-1", "b", "tcp://x:2");
        state.register("mgr-2", "c", "tcp://y:1");

        let removed = state.unregister_manager("mgr-1");
        assert_eq!(removed.len(), 2);
        assert!(state.lookup("a", Duration::from_secs(6)).is_none());
        assert!(state.lookup("b", Duration::from_secs(6)).is_none());
        assert!(state.lookup("c", Duration::from_secs(6)).is_some());
    }

    #[test]
    fn stale_managers_finds_managers_past_timeout() {
        let mut state = RegistryState::new();
        state.heartbeat("mgr-1");
        assert!(state.stale_managers(Duration::from_millis(0)).contains(&"mgr-1".to_string()));
        assert!(state.stale_managers(Duration::from_secs(6)).is_empty());
    }
}
