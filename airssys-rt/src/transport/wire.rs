//! Self-describing wire record and the process-wide message-kind registry
//! (spec.md §4.4, §9).
//!
//! Records travel as one JSON object per line (`tokio_util::codec::LinesCodec`
//! framing, see [`super::sender`]/[`super::receiver`]), so an endpoint never
//! needs an out-of-band length prefix.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
use super::error::WireError;
use crate::message::Message;

/// A single message in transit between two managers.
///
/// `sender_actor`/`sender_endpoint` are `None` for a one-way send with no
/// reply path; both are set when the sender wants a remote reply routed
/// back to it (spec.md §4.2 reply-to-remote-sender path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecord {
    /// Name of the actor this record is addressed to.
    pub receiver: String,
    pub sender_actor: Option<String>,
    pub sender_endpoint: Option<String>,
    /// `Message::MESSAGE_TYPE` of the payload, used to pick a decoder and to
    /// reject unknown kinds before attempting to deserialize (spec.md §4.4).
    pub message_type: String,
    pub message: Value,
}

impl WireRecord {
    /// Encode a typed message into a wire record addressed to `receiver`.
    pub fn encode<M: Message + Serialize>(
        receiver: impl Into<String>,
        sender_actor: Option<String>,
        sender_endpoint: Option<String>,
        message: &M,
    ) -> Result<Self, WireError> {
        let message = serde_json::to_value(message).map_err(|e| WireError::Encode(e.to_string()))?;
        Ok(Self {
            receiver: receiver.into(),
            sender_actor,
            sender_endpoint,
            message_type: M::MESSAGE_TYPE.to_string(),
            message,
        })
    }

    /// Decode the payload as `M`, independent of `message_type` (callers are
    /// expected to check `message_type`/[`KindRegistry::is_known`] first).
    pub fn decode<M: Message + for<'de> Deserialize<'de>>(&self) -> Result<M, WireError> {
        serde_json::from_value(self.message.clone()).map_err(|e| WireError::Decode(e.to_string()))
    }

    /// Serialize to a single line with no embedded newline (a precondition
    /// of `LinesCodec`).
    pub fn to_line(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(|e| WireError::Encode(e.to_string()))
    }

    pub fn from_line(line: &str) -> Result<Self, WireError> {
        serde_json::from_str(line).map_err(|e| WireError::Decode(e.to_string()))
    }
}

/// Builds the frozen, process-wide table of known message kinds.
///
/// Constructed once at startup (one [`Message`] type per `register` call)
/// and frozen into a [`KindRegistry`] before any remote I/O begins, so the
/// set of decodable kinds never changes at runtime (spec.md §9 "Kind
/// registry is immutable after initialization").
#[derive(Debug, Default)]
pub struct KindRegistryBuilder {
    kinds: HashSet<&'static str>,
}

impl KindRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message kind by its `Message::MESSAGE_TYPE`.
    ///
    /// # Errors
    ///
    /// Returns `WireError::DuplicateKind` if the same type string was
    /// already registered, catching a programmer error at startup rather
    /// than letting two message types silently alias on the wire.
    pub fn register<M: Message>(mut self) -> Result<Self, WireError> {
        if !self.kinds.insert(M::MESSAGE_TYPE) {
            return Err(WireError::DuplicateKind(M::MESSAGE_TYPE));
        }
        Ok(self)
    }

    pub fn freeze(self) -> KindRegistry {
        KindRegistry {
            kinds: Arc::new(self.kinds),
        }
    }
}

/// Frozen, cheaply-cloneable view of the known message kinds.
///
/// The default registry knows no kinds; use [`KindRegistryBuilder`] to
/// register message types before calling [`KindRegistryBuilder::freeze`].
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: Arc<HashSet<&'static str>>,
}

impl KindRegistry {
    pub fn is_known(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessagePriority;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping {
        n: u32,
    }

    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Pong {
        n: u32,
    }

    impl Message for Pong {
        const MESSAGE_TYPE: &'static str = "pong";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    #[test]
    fn encode_decode_round_trips() {
        let record = WireRecord::encode("worker-1", None, None, &Ping { n: 7 }).unwrap();
        assert_eq!(record.message_type, "ping");
        let decoded: Ping = record.decode().unwrap();
        assert_eq!(decoded.n, 7);
    }

    #[test]
    fn line_round_trips_through_json() {
        let record = WireRecord::encode(
            "worker-1",
            Some("caller".to_string()),
            Some("tcp://127.0.0.1:9000".to_string()),
            &Ping { n: 1 },
        )
        .unwrap();
        let line = record.to_line().unwrap();
        assert!(!line.contains('\n'));
        let parsed = WireRecord::from_line(&line).unwrap();
        assert_eq!(parsed.receiver, "worker-1");
        assert_eq!(parsed.sender_actor.as_deref(), Some("caller"));
    }

    #[test]
    fn duplicate_kind_registration_fails() {
        let result = KindRegistryBuilder::new()
            .register::<Ping>()
            .and_then(|b| b.register::<Ping>());
        assert!(matches!(result, Err(WireError::DuplicateKind("ping"))));
    }

    #[test]
    fn frozen_registry_knows_registered_kinds_only() {
        let registry = KindRegistryBuilder::new()
            .register::<Ping>()
            .unwrap()
            .register::<Pong>()
            .unwrap()
            .freeze();
        assert!(registry.is_known("ping"));
        assert!(registry.is_known("pong"));
        assert!(!registry.is_known("unknown"));
    }
}
