//! Point-to-point remote sender: one cached connection per endpoint,
//! reconnect-once-then-drop on failure (spec.md §4.5).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LinesCodec};

// Layer 3: Internal module imports
use super::error::TransportError;
use super::wire::WireRecord;

type Connection = Framed<TcpStream, LinesCodec>;

/// Best-effort sender shared by every locally-managed actor that wants to
/// talk to remote peers. Connections are opened lazily and cached by
/// endpoint; a write failure evicts the cached connection and is retried
/// exactly once against a fresh connection before the message is dropped.
///
/// Cloning is cheap: the connection cache lives behind an `Arc`.
#[derive(Clone)]
pub struct RemoteSender {
    connections: Arc<Mutex<HashMap<String, Connection>>>,
}

impl RemoteSender {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Best-effort send: logs and drops the message on failure rather than
    /// surfacing an error, matching spec.md §4.1's "network failures are
    /// swallowed and logged" rule for ordinary sends across a `RemoteRef`.
    pub async fn send(&self, endpoint: &str, record: &WireRecord) {
        if let Err(error) = self.send_or_reconnect(endpoint, record).await {
            tracing::warn!(endpoint, %error, "remote send failed, message dropped");
        }
    }

    /// Same as [`Self::send`] but surfaces the error, for callers (e.g.
    /// `fast_send`) that need to report failure synchronously.
    pub async fn try_send(&self, endpoint: &str, record: &WireRecord) -> Result<(), TransportError> {
        self.send_or_reconnect(endpoint, record).await
    }

    async fn send_or_reconnect(
        &self,
        endpoint: &str,
        record: &WireRecord,
    ) -> Result<(), TransportError> {
        let line = record.to_line()?;
        let mut connections = self.connections.lock().await;

        if let Some(conn) = connections.get_mut(endpoint) {
            if conn.send(line.clone()).await.is_ok() {
                return Ok(());
            }
            connections.remove(endpoint);
        }

        let mut conn = Self::connect(endpoint).await?;
        conn.send(line)
            .await
            .map_err(|e| TransportError::Write {
                endpoint: endpoint.to_string(),
                source: e.to_string(),
            })?;
        connections.insert(endpoint.to_string(), conn);
        Ok(())
    }

    async fn connect(endpoint: &str) -> Result<Connection, TransportError> {
        let stream = TcpStream::connect(normalize(endpoint))
            .await
            .map_err(|e| TransportError::Connect {
                endpoint: endpoint.to_string(),
                source: e.to_string(),
            })?;
        Ok(Framed::new(stream, LinesCodec::new()))
    }
}

impl Default for RemoteSender {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the `tcp://` scheme and turn a bind-all host (`*`) into
/// `0.0.0.0`, used by both the sender (connect) and server (bind) sides.
pub(super) fn normalize(endpoint: &str) -> String {
    endpoint
        .strip_prefix("tcp://")
        .unwrap_or(endpoint)
        .replace('*', "0.0.0.0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_and_wildcard_host() {
        assert_eq!(normalize("tcp://*:5000"), "0.0.0.0:5000");
        assert_eq!(normalize("tcp://localhost:5000"), "localhost:5000");
        assert_eq!(normalize("127.0.0.1:5000"), "127.0.0.1:5000");
    }

    #[tokio::test]
    async fn send_to_unreachable_endpoint_is_swallowed() {
        let sender = RemoteSender::new();
        let record = WireRecord::encode("actor", None, None, &TestPing { n: 1 }).unwrap();
        // Port 0 never accepts connections; this must not panic.
        sender.send("tcp://127.0.0.1:0", &record).await;
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct TestPing {
        n: u32,
    }

    impl crate::message::Message for TestPing {
        const MESSAGE_TYPE: &'static str = "test_ping";

        fn priority(&self) -> crate::message::MessagePriority {
            crate::message::MessagePriority::Normal
        }
    }
}
