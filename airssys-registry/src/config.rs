//! Host/manager config file for process control (spec.md §6, supplemented
//! from `original_source/python/actors/registry.py`'s `_load_config`):
//!
//! ```json
//! {
//!   "hosts": {
//!     "host-a": {
//!       "ssh": "deploy@10.0.0.5",
//!       "managers": { "mgr-1": { "service": "airssys-mgr-1" } }
//!     }
//!   }
//! }
//! ```

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::path::Path;

// Layer 2: Third-party crate imports
use serde::Deserialize;

// Layer 3: Internal module imports
use crate::error::ConfigLoadError;

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerConfig {
    /// systemd unit name to control. Defaults to the manager id if absent
    /// (matches the original's `manager_config.get("service", manager_id)`).
    pub service: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// SSH destination, e.g. `"deploy@10.0.0.5"`.
    pub ssh: String,
    #[serde(default)]
    pub managers: HashMap<String, ManagerConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    hosts: HashMap<String, HostConfig>,
}

/// Host configuration plus the derived `manager_id -> host_id` index used
/// by [`crate::process_control`].
#[derive(Debug, Clone, Default)]
pub struct ProcessControlConfig {
    pub hosts: HashMap<String, HostConfig>,
    pub manager_to_host: HashMap<String, String>,
}

impl ProcessControlConfig {
    fn from_raw(raw: RawConfig) -> Self {
        let mut manager_to_host = HashMap::new();
        for (host_id, host) in &raw.hosts {
            for manager_id in host.managers.keys() {
                manager_to_host.insert(manager_id.clone(), host_id.clone());
            }
        }
        Self {
            hosts: raw.hosts,
            manager_to_host,
        }
    }

    /// Resolve the systemd unit name to control for `manager_id`, and the
    /// host to SSH into. `None` if the manager is not in the config.
    pub fn resolve(&self, manager_id: &str) -> Option<(&HostConfig, String)> {
        let host_id = self.manager_to_host.get(manager_id)?;
        let host = self.hosts.get(host_id)?;
        let service = host
            .managers
            .get(manager_id)
            .and_then(|m| m.service.clone())
            .unwrap_or_else(|| manager_id.to_string());
        Some((host, service))
    }
}

/// Load a config file. An absent path yields an empty config (no hosts
/// configured, process-control RPCs fail with "unknown manager").
pub fn load(path: Option<&Path>) -> Result<ProcessControlConfig, ConfigLoadError> {
    let Some(path) = path else {
        return Ok(ProcessControlConfig::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let raw: RawConfig = serde_json::from_str(&contents)?;
    Ok(ProcessControlConfig::from_raw(raw))
}
