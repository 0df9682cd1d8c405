//! Wire transport: the line-delimited JSON codec, the kind registry, and the
//! sender/receiver pair that give `ActorRef::Remote` the same send/reply
//! semantics as a local `ActorRef` (spec.md §4.4, §4.5).

mod error;
mod receiver;
mod sender;
mod wire;

pub use error::{TransportError, WireError};
pub use receiver::{MailboxLookup, RemoteReceiver};
pub use sender::RemoteSender;
pub use wire::{KindRegistry, KindRegistryBuilder, WireRecord};

use crate::message::Message;

/// Handle an actor context uses to route a reply back across the wire when
/// the message it is answering came from an `ActorAddress::Remote` sender
/// (spec.md §4.2 "reply" and §4.5 "remote send path").
///
/// Cheap to clone; every actor managed by the same manager shares one.
#[derive(Clone)]
pub struct RemoteHandle {
    sender: RemoteSender,
    own_endpoint: String,
}

impl RemoteHandle {
    pub fn new(sender: RemoteSender, own_endpoint: impl Into<String>) -> Self {
        Self {
            sender,
            own_endpoint: own_endpoint.into(),
        }
    }

    /// Send `message` to the actor named `target_name` at `target_endpoint`,
    /// stamping this manager's endpoint (and, if known, the replying actor's
    /// own name) as the sender identity so the peer can route its own reply
    /// back in turn.
    ///
    /// Best-effort: failures are logged and the message is dropped, per
    /// spec.md §4.1's network-failure handling for ordinary sends.
    pub async fn reply<M: Message + serde::Serialize>(
        &self,
        target_name: &str,
        target_endpoint: &str,
        from_name: Option<&str>,
        message: &M,
    ) {
        let record = match WireRecord::encode(
            target_name,
            from_name.map(str::to_string),
            Some(self.own_endpoint.clone()),
            message,
        ) {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!(%error, "failed to encode remote reply, dropping");
                return;
            }
        };
        self.sender.send(target_endpoint, &record).await;
    }

    /// Send to an arbitrary remote actor outside of a reply (used by
    /// `ActorRef::Remote::send`, spec.md §4.1).
    pub async fn send<M: Message + serde::Serialize>(
        &self,
        target_name: &str,
        target_endpoint: &str,
        from_name: Option<&str>,
        message: &M,
    ) {
        self.reply(target_name, target_endpoint, from_name, message).await;
    }

    pub fn own_endpoint(&self) -> &str {
        &self.own_endpoint
    }
}
