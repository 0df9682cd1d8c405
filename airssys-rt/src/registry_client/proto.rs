//! Registry wire protocol (spec.md §6): one JSON object per line, tagged by
//! `message_type`, carried over the same `Framed<_, LinesCodec>` idiom as
//! the actor-to-actor transport (`transport::wire`).

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

/// A request sent from a [`super::RegistryClient`] to the global registry.
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
}

/// A reply sent back from the global registry.
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
}

impl RegistryRequest {
    pub fn to_line(&self) -> Result<String, super::RegistryClientError> {
        serde_json::to_string(self)
            .map_err(|e| super::RegistryClientError::Protocol(e.to_string()))
    }
}

impl RegistryReply {
    pub fn from_line(line: &str) -> Result<Self, super::RegistryClientError> {
        serde_json::from_str(line)
            .map_err(|e| super::RegistryClientError::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_json() {
        let request = RegistryRequest::Heartbeat {
            manager_id: "mgr-1".to_string(),
            timestamp_ms: 1234,
        };
        let line = request.to_line().unwrap();
        assert!(line.contains("\"message_type\":\"Heartbeat\""));
    }

    #[test]
    fn reply_decodes_lookup_result() {
        let line = r#"{"message_type":"LookupResult","actor_name":"a","endpoint":"tcp://x:1","online":true}"#;
        let reply = RegistryReply::from_line(line).unwrap();
        assert!(matches!(
            reply,
            RegistryReply::LookupResult { online: true, .. }
        ));
    }
}
