//! Registry wire protocol (spec.md §6): one JSON object per line, tagged by
//! `message_type`. Mirrors `airssys-rt`'s `registry_client::proto` exactly so
//! the two sides decode each other's lines; kept as its own copy here rather
//! than an `airssys-rt` dependency since the registry server is a standalone
//! process with no actor-to-actor wire traffic to decode.

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

/// A request received from a manager's [`RegistryClient`]-equivalent, or
/// from a process-control caller.
///
/// [`RegistryClient`]: https://docs.rs/airssys-rt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum RegistryRequest {
    RegisterActor {
        manager_id: String,
        actor_name: String,
        actor_endpoint: String,
    },
    UnregisterActor {
        actor_name: String,
    },
    LookupActor {
        actor_name: String,
    },
    Heartbeat {
        manager_id: String,
        timestamp_ms: i64,
    },
    StartManager {
        manager_id: String,
    },
    StopManager {
        manager_id: String,
    },
    RestartManager {
        manager_id: String,
    },
}

/// A reply sent back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum RegistryReply {
    RegistrationOk {
        actor_name: String,
    },
    RegistrationFailed {
        actor_name: String,
        reason: String,
    },
    LookupResult {
        actor_name: String,
        endpoint: Option<String>,
        online: bool,
    },
    HeartbeatAck,
    ManagerStatus {
        manager_id: String,
        running: bool,
        error: Option<String>,
    },
    Error {
        reason: String,
    },
}

impl RegistryRequest {
    pub fn from_line(line: &str) -> Result<Self, crate::error::RegistryError> {
        serde_json::from_str(line).map_err(|e| crate::error::RegistryError::Decode(e.to_string()))
    }
}

impl RegistryReply {
    pub fn to_line(&self) -> Result<String, crate::error::RegistryError> {
        serde_json::to_string(self).map_err(|e| crate::error::RegistryError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_decodes() {
        let line = r#"{"message_type":"RegisterActor","manager_id":"mgr-1","actor_name":"a","actor_endpoint":"tcp://x:1"}"#;
        let request = RegistryRequest::from_line(line).unwrap();
        assert!(matches!(request, RegistryRequest::RegisterActor { .. }));
    }

    #[test]
    fn lookup_result_encodes() {
        let reply = RegistryReply::LookupResult {
            actor_name: "a".to_string(),
            endpoint: None,
            online: false,
        };
        let line = reply.to_line().unwrap();
        assert!(line.contains("\"message_type\":\"LookupResult\""));
        assert!(line.contains("\"endpoint\":null"));
    }
}
