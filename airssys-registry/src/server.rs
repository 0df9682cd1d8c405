//! TCP listener + RPC dispatch (spec.md §4.7/§6). The accept/per-connection
//! loop shape follows `airssys-rt`'s `transport::receiver::RemoteReceiver`;
//! each connection is a request/reply pair per line rather than a one-way
//! decode-and-enqueue, since the registry talks REQ/REP, not fire-and-forget.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};

// Layer 3: Internal module imports
use crate::config::ProcessControlConfig;
use crate::error::RegistryError;
use crate::process_control::{self, Action};
use crate::proto::{RegistryReply, RegistryRequest};
use crate::state::{RegisterOutcome, RegistryState};
use crate::sweeper::DECAY_TIMEOUT;

/// Shared server context handed to every connection task.
pub struct Server {
    state: Arc<RwLock<RegistryState>>,
    config: Arc<ProcessControlConfig>,
}

impl Server {
    pub fn new(state: Arc<RwLock<RegistryState>>, config: ProcessControlConfig) -> Self {
        Self {
            state,
            config: Arc::new(config),
        }
    }

    /// Bind `addr` and serve connections until `shutdown` fires.
    pub async fn serve(
        &self,
        addr: &str,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<(), RegistryError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RegistryError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(%addr, "registry listening");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => {
                    let Ok((stream, peer)) = accepted else { continue };
                    tracing::debug!(%peer, "registry connection accepted");
                    let state = Arc::clone(&self.state);
                    let config = Arc::clone(&self.config);
                    tokio::spawn(handle_connection(stream, state, config));
                }
            }
        }

        tracing::info!("registry stopped accepting connections");
        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<RwLock<RegistryState>>,
    config: Arc<ProcessControlConfig>,
) {
    let mut framed = Framed::new(stream, LinesCodec::new());

    while let Some(line) = framed.next().await {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(%error, "registry connection read error, closing");
                break;
            }
        };

        let reply = match RegistryRequest::from_line(&line) {
            Ok(request) => dispatch(request, &state, &config).await,
            Err(error) => {
                tracing::warn!(%error, "dropping malformed registry request");
                RegistryReply::Error {
                    reason: error.to_string(),
                }
            }
        };

        let Ok(reply_line) = reply.to_line() else {
            tracing::error!("failed to encode registry reply");
            continue;
        };

        if let Err(error) = framed.send(reply_line).await {
            tracing::warn!(%error, "failed to send registry reply, closing connection");
            break;
        }
    }
}

async fn dispatch(
    request: RegistryRequest,
    state: &Arc<RwLock<RegistryState>>,
    config: &Arc<ProcessControlConfig>,
) -> RegistryReply {
    match request {
        RegistryRequest::RegisterActor {
            manager_id,
            actor_name,
            actor_endpoint,
        } => match state.write().register(&manager_id, &actor_name, &actor_endpoint) {
            RegisterOutcome::Ok => {
                tracing::info!(%actor_name, %manager_id, "registered actor");
                RegistryReply::RegistrationOk { actor_name }
            }
            RegisterOutcome::NameTaken => {
                tracing::warn!(%actor_name, "registration rejected, name already registered");
                RegistryReply::RegistrationFailed {
                    actor_name,
                    reason: "Name already registered".to_string(),
                }
            }
        },

        RegistryRequest::UnregisterActor { actor_name } => {
            state.write().unregister(&actor_name);
            tracing::info!(%actor_name, "unregistered actor");
            RegistryReply::RegistrationOk { actor_name }
        }

        RegistryRequest::LookupActor { actor_name } => {
            match state.read().lookup(&actor_name, DECAY_TIMEOUT) {
                Some((entry, online)) => RegistryReply::LookupResult {
                    actor_name,
                    endpoint: Some(entry.endpoint),
                    online,
                },
                None => RegistryReply::LookupResult {
                    actor_name,
                    endpoint: None,
                    online: false,
                },
            }
        }

        RegistryRequest::Heartbeat { manager_id, .. } => {
            state.write().heartbeat(&manager_id);
            RegistryReply::HeartbeatAck
        }

        RegistryRequest::StartManager { manager_id } => {
            run_process_control(config, &manager_id, Action::Start).await
        }
        RegistryRequest::StopManager { manager_id } => {
            run_process_control(config, &manager_id, Action::Stop).await
        }
        RegistryRequest::RestartManager { manager_id } => {
            run_process_control(config, &manager_id, Action::Restart).await
        }
    }
}

async fn run_process_control(
    config: &Arc<ProcessControlConfig>,
    manager_id: &str,
    action: Action,
) -> RegistryReply {
    let status = process_control::run(config, manager_id, action).await;
    RegistryReply::ManagerStatus {
        manager_id: manager_id.to_string(),
        running: status.running,
        error: status.error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn client_roundtrip(addr: &str, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(format!("{request}\n").as_bytes()).await.unwrap();
        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).trim().to_string()
    }

    #[tokio::test]
    async fn register_then_lookup_round_trips() {
        let state = Arc::new(RwLock::new(RegistryState::new()));
        let server = Server::new(state, ProcessControlConfig::default());
        let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let server = Arc::new(server);
        let serving = Arc::clone(&server);
        let bind_addr = addr.clone();
        tokio::spawn(async move {
            let _ = serving.serve(&bind_addr, shutdown_rx).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let reply = client_roundtrip(
            &addr,
            r#"{"message_type":"RegisterActor","manager_id":"mgr-1","actor_name":"a","actor_endpoint":"tcp://x:1"}"#,
        )
        .await;
        assert!(reply.contains("RegistrationOk"));

        let reply = client_roundtrip(
            &addr,
            r#"{"message_type":"LookupActor","actor_name":"a"}"#,
        )
        .await;
        assert!(reply.contains("\"endpoint\":\"tcp://x:1\""));
        assert!(reply.contains("\"online\":true"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let state = Arc::new(RwLock::new(RegistryState::new()));
        let config = Arc::new(ProcessControlConfig::default());

        let first = dispatch(
            RegistryRequest::RegisterActor {
                manager_id: "mgr-1".to_string(),
                actor_name: "a".to_string(),
                actor_endpoint: "tcp://x:1".to_string(),
            },
            &state,
            &config,
        )
        .await;
        assert!(matches!(first, RegistryReply::RegistrationOk { .. }));

        let second = dispatch(
            RegistryRequest::RegisterActor {
                manager_id: "mgr-2".to_string(),
                actor_name: "a".to_string(),
                actor_endpoint: "tcp://y:1".to_string(),
            },
            &state,
            &config,
        )
        .await;
        assert!(matches!(second, RegistryReply::RegistrationFailed { .. }));
    }
}
