//! Client for the global registry (spec.md §4.6): a single socket behind a
//! mutex carrying both RPCs and the periodic heartbeat, matching the
//! teacher's single-connection-per-peer idiom in `transport::sender`.

mod error;
mod proto;

pub use error::RegistryClientError;
pub use proto::{RegistryReply, RegistryRequest};

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec};

/// Heartbeat interval (spec.md §4.6, §6 "heartbeat interval = 2s").
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// RPC receive deadline (spec.md §6 "registry RPC timeout = 5s").
pub const RPC_TIMEOUT: Duration = Duration::from_secs(5);

struct Inner {
    conn: Mutex<Framed<TcpStream, LinesCodec>>,
}

/// Connection to the global registry, shared by a manager to register its
/// actors and keep its liveness entry fresh.
pub struct RegistryClient {
    inner: Arc<Inner>,
    manager_id: String,
    rpc_timeout: Duration,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
    heartbeat_shutdown: watch::Sender<bool>,
}

impl RegistryClient {
    /// Connect to `endpoint` and identify future heartbeats as `manager_id`.
    pub async fn connect(
        endpoint: &str,
        manager_id: impl Into<String>,
    ) -> Result<Self, RegistryClientError> {
        let stream =
            TcpStream::connect(normalize(endpoint))
                .await
                .map_err(|source| RegistryClientError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
        let (heartbeat_shutdown, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(Framed::new(stream, LinesCodec::new())),
            }),
            manager_id: manager_id.into(),
            rpc_timeout: RPC_TIMEOUT,
            heartbeat_task: Mutex::new(None),
            heartbeat_shutdown,
        })
    }

    /// Register `actor_name` as reachable at `endpoint`. Counts as an
    /// implicit heartbeat on the registry side.
    pub async fn register(
        &self,
        actor_name: &str,
        endpoint: &str,
    ) -> Result<(), RegistryClientError> {
        let reply = call(
            &self.inner,
            self.rpc_timeout,
            RegistryRequest::RegisterActor {
                manager_id: self.manager_id.clone(),
                actor_name: actor_name.to_string(),
                actor_endpoint: endpoint.to_string(),
            },
        )
        .await?;

        match reply {
            RegistryReply::RegistrationOk { .. } => Ok(()),
            RegistryReply::RegistrationFailed { reason, .. } => {
                Err(RegistryClientError::AlreadyRegistered(reason))
            }
            other => Err(unexpected(other)),
        }
    }

    /// Remove `actor_name` from the registry. Idempotent on the server side.
    pub async fn unregister(&self, actor_name: &str) -> Result<(), RegistryClientError> {
        let reply = call(
            &self.inner,
            self.rpc_timeout,
            RegistryRequest::UnregisterActor {
                actor_name: actor_name.to_string(),
            },
        )
        .await?;

        match reply {
            RegistryReply::RegistrationOk { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Resolve `actor_name` to its endpoint. Fails on absence or decay.
    pub async fn lookup(&self, actor_name: &str) -> Result<String, RegistryClientError> {
        match self.lookup_allow_offline(actor_name).await {
            Ok((_, false)) => Err(RegistryClientError::Offline(actor_name.to_string())),
            Ok((endpoint, true)) => Ok(endpoint),
            Err(error) => Err(error),
        }
    }

    /// Resolve `actor_name`, returning the endpoint even if its owning
    /// manager has decayed (`online == false`).
    pub async fn lookup_allow_offline(
        &self,
        actor_name: &str,
    ) -> Result<(String, bool), RegistryClientError> {
        let reply = call(
            &self.inner,
            self.rpc_timeout,
            RegistryRequest::LookupActor {
                actor_name: actor_name.to_string(),
            },
        )
        .await?;

        match reply {
            RegistryReply::LookupResult {
                endpoint: Some(endpoint),
                online,
                ..
            } => Ok((endpoint, online)),
            RegistryReply::LookupResult { endpoint: None, .. } => {
                Err(RegistryClientError::NotFound(actor_name.to_string()))
            }
            other => Err(unexpected(other)),
        }
    }

    /// Spawn the background task sending `Heartbeat(manager_id)` every
    /// [`HEARTBEAT_INTERVAL`]. Failures are logged but never stop the loop
    /// (spec.md §4.6).
    pub async fn start_heartbeat(&self) {
        let mut task = self.heartbeat_task.lock().await;
        if task.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let manager_id = self.manager_id.clone();
        let timeout = self.rpc_timeout;
        let mut shutdown = self.heartbeat_shutdown.subscribe();

        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let request = RegistryRequest::Heartbeat {
                            manager_id: manager_id.clone(),
                            timestamp_ms: Utc::now().timestamp_millis(),
                        };
                        if let Err(error) = call(&inner, timeout, request).await {
                            tracing::warn!(%error, "heartbeat failed");
                        }
                    }
                }
            }
        }));
    }

    /// Stop the heartbeat loop, if running. Safe to call when not started.
    pub async fn stop_heartbeat(&self) {
        let _ = self.heartbeat_shutdown.send(true);
        if let Some(task) = self.heartbeat_task.lock().await.take() {
            let _ = task.await;
        }
    }

    /// Stop heartbeats and close the socket.
    pub async fn close(&self) {
        self.stop_heartbeat().await;
        let mut conn = self.inner.conn.lock().await;
        let _ = conn.close().await;
    }
}

async fn call(
    inner: &Inner,
    timeout: Duration,
    request: RegistryRequest,
) -> Result<RegistryReply, RegistryClientError> {
    let line = request.to_line()?;
    let mut conn = inner.conn.lock().await;

    conn.send(line).await.map_err(|error| {
        RegistryClientError::Protocol(format!("failed to send request: {error}"))
    })?;

    let reply_line = tokio::time::timeout(timeout, conn.next())
        .await
        .map_err(|_| RegistryClientError::Timeout)?
        .ok_or_else(|| RegistryClientError::Protocol("registry closed the connection".to_string()))?
        .map_err(|error| RegistryClientError::Protocol(format!("malformed reply line: {error}")))?;

    RegistryReply::from_line(&reply_line)
}

fn unexpected(reply: RegistryReply) -> RegistryClientError {
    RegistryClientError::Protocol(format!("unexpected reply: {reply:?}"))
}

fn normalize(endpoint: &str) -> String {
    endpoint
        .strip_prefix("tcp://")
        .unwrap_or(endpoint)
        .replace('*', "0.0.0.0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_fake_registry(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(format!("{reply}\n").as_bytes()).await;
        });
        addr
    }

    #[tokio::test]
    async fn register_ok_resolves() {
        let addr = spawn_fake_registry(r#"{"message_type":"RegistrationOk","actor_name":"a"}"#).await;
        let client = RegistryClient::connect(&addr, "mgr-1").await.unwrap();
        client.register("a", "tcp://127.0.0.1:9001").await.unwrap();
    }

    #[tokio::test]
    async fn register_rejected_surfaces_already_registered() {
        let addr = spawn_fake_registry(
            r#"{"message_type":"RegistrationFailed","actor_name":"a","reason":"Name already registered"}"#,
        )
        .await;
        let client = RegistryClient::connect(&addr, "mgr-1").await.unwrap();
        let result = client.register("a", "tcp://127.0.0.1:9001").await;
        assert!(matches!(
            result,
            Err(RegistryClientError::AlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn lookup_missing_is_not_found() {
        let addr = spawn_fake_registry(
            r#"{"message_type":"LookupResult","actor_name":"a","endpoint":null,"online":false}"#,
        )
        .await;
        let client = RegistryClient::connect(&addr, "mgr-1").await.unwrap();
        let result = client.lookup("a").await;
        assert!(matches!(result, Err(RegistryClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn lookup_allow_offline_returns_stale_endpoint() {
        let addr = spawn_fake_registry(
            r#"{"message_type":"LookupResult","actor_name":"a","endpoint":"tcp://x:1","online":false}"#,
        )
        .await;
        let client = RegistryClient::connect(&addr, "mgr-1").await.unwrap();
        let (endpoint, online) = client.lookup_allow_offline("a").await.unwrap();
        assert_eq!(endpoint, "tcp://x:1");
        assert!(!online);
    }
}
