//! Remote receiver: accepts connections on a manager's endpoint, decodes
//! wire records, and enqueues them onto local mailboxes (spec.md §4.5).

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};

// Layer 3: Internal module imports
use super::wire::{KindRegistry, WireRecord};
use crate::message::{Message, MessageEnvelope};
use crate::util::ActorAddress;

/// Implemented by whatever owns the local actor mailboxes (the `Manager`),
/// so `RemoteReceiver` can enqueue decoded messages without depending on the
/// concrete manager type (keeps the transport layer generic-only, no `dyn`,
/// per §6.2).
#[async_trait]
pub trait MailboxLookup<M: Message>: Send + Sync {
    /// Enqueue `envelope` for the actor named `name`. Returns `false` if no
    /// such actor is managed here; the receiver logs and drops in that case.
    async fn enqueue(&self, name: &str, envelope: MessageEnvelope<M>) -> bool;
}

/// Accepts connections on a bound listener and feeds every decoded,
/// known-kind record into `actors`.
pub struct RemoteReceiver;

impl RemoteReceiver {
    /// Serve `listener` until `shutdown` is set to `true`.
    ///
    /// Each accepted connection is handled on its own task; a connection
    /// dropping or failing to parse only ends that task, never the listener.
    pub async fn serve<M, L>(
        listener: TcpListener,
        actors: Arc<L>,
        kinds: KindRegistry,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) where
        M: Message + for<'de> serde::Deserialize<'de>,
        L: MailboxLookup<M> + 'static,
    {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => {
                    let Ok((stream, _)) = accepted else { continue };
                    let actors = actors.clone();
                    let kinds = kinds.clone();
                    tokio::spawn(Self::handle_connection::<M, L>(stream, actors, kinds));
                }
            }
        }
    }

    async fn handle_connection<M, L>(stream: TcpStream, actors: Arc<L>, kinds: KindRegistry)
    where
        M: Message + for<'de> serde::Deserialize<'de>,
        L: MailboxLookup<M>,
    {
        let mut framed = Framed::new(stream, LinesCodec::new());
        while let Some(Ok(line)) = framed.next().await {
            let record = match WireRecord::from_line(&line) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(%error, "dropping malformed wire record");
                    continue;
                }
            };

            if !kinds.is_known(&record.message_type) {
                tracing::warn!(kind = %record.message_type, "dropping unknown message kind");
                continue;
            }

            let payload: M = match record.decode() {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::warn!(%error, "dropping undecodable message");
                    continue;
                }
            };

            let mut envelope = MessageEnvelope::new(payload);
            if let (Some(name), Some(endpoint)) = (&record.sender_actor, &record.sender_endpoint) {
                envelope.sender = Some(ActorAddress::remote(name.clone(), endpoint.clone()));
            }

            if !actors.enqueue(&record.receiver, envelope) {
                tracing::warn!(receiver = %record.receiver, "dropping message for unmanaged actor");
            }
        }
    }
}
