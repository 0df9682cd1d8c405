//! Location-transparent actor handle (spec.md §4.1).
//!
//! `ActorRef` is the uniform handle callers outside an actor's own
//! `handle_message` use to talk to it. `Local` routes through the injected
//! broker exactly like `ActorContext::send`/`reply`; `Remote` routes through
//! the wire transport. Both variants expose the same `send`/`fast_send`
//! surface, so calling code never branches on locality (§6.2: no `dyn`,
//! the locality split is a closed enum match instead).

mod error;

pub use error::ActorRefError;

// Layer 1: Standard library imports
use std::marker::PhantomData;
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};
use crate::transport::{RemoteSender, TransportError, WireRecord};
use crate::util::ActorAddress;

/// How long a `fast_send` waits for a reply before failing (spec.md §4.1
/// fast_send timeout).
pub const FAST_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// A handle to an actor, local or remote, with identical call-site ergonomics.
pub enum ActorRef<M: Message, B: MessageBroker<M>> {
    Local(LocalRef<M, B>),
    Remote(RemoteRef),
}

impl<M: Message, B: MessageBroker<M>> Clone for ActorRef<M, B> {
    fn clone(&self) -> Self {
        match self {
            Self::Local(r) => Self::Local(r.clone()),
            Self::Remote(r) => Self::Remote(r.clone()),
        }
    }
}

impl<M: Message, B: MessageBroker<M>> ActorRef<M, B> {
    pub fn local(address: ActorAddress, broker: B) -> Self {
        Self::Local(LocalRef {
            address,
            broker,
            _marker: PhantomData,
        })
    }

    pub fn remote(name: impl Into<String>, endpoint: impl Into<String>, sender: RemoteSender) -> Self {
        Self::Remote(RemoteRef {
            name: name.into(),
            endpoint: endpoint.into(),
            sender,
        })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Fire-and-forget send (spec.md §4.1).
    pub async fn send(&self, message: M) -> Result<(), ActorRefError<B::Error>>
    where
        M: Serialize,
    {
        match self {
            Self::Local(r) => r.send(message).await,
            Self::Remote(r) => r.send(message).await,
        }
    }

    /// Synchronous send-and-await-reply (spec.md §4.1 `fast_send`).
    ///
    /// Unsupported across a `Remote` ref: the spec scopes `fast_send` to
    /// same-process calls and fails synchronously rather than silently
    /// degrading to a network round trip with its own failure modes.
    pub async fn fast_send(&self, message: M) -> Result<M, ActorRefError<B::Error>>
    where
        M: Serialize + for<'de> Deserialize<'de>,
    {
        match self {
            Self::Local(r) => r.fast_send(message).await,
            Self::Remote(_) => Err(TransportError::Unsupported.into()),
        }
    }
}

/// A ref to an actor managed by this same process.
pub struct LocalRef<M: Message, B: MessageBroker<M>> {
    address: ActorAddress,
    broker: B,
    _marker: PhantomData<M>,
}

impl<M: Message, B: MessageBroker<M>> Clone for LocalRef<M, B> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            broker: self.broker.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Message, B: MessageBroker<M>> LocalRef<M, B> {
    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    async fn send(&self, message: M) -> Result<(), ActorRefError<B::Error>>
    where
        M: Serialize,
    {
        let envelope = MessageEnvelope::new(message).with_reply_to(self.address.clone());
        self.broker.send(envelope).await.map_err(ActorRefError::Broker)
    }

    async fn fast_send(&self, message: M) -> Result<M, ActorRefError<B::Error>>
    where
        M: Serialize + for<'de> Deserialize<'de>,
    {
        let envelope = MessageEnvelope::new(message).with_reply_to(self.address.clone());
        let response = self
            .broker
            .request::<M>(envelope, FAST_SEND_TIMEOUT)
            .await
            .map_err(ActorRefError::Broker)?;
        response.map(|e| e.payload).ok_or(ActorRefError::NoReply)
    }
}

/// A ref to an actor managed by a different, possibly remote, process.
pub struct RemoteRef {
    name: String,
    endpoint: String,
    sender: RemoteSender,
}

impl Clone for RemoteRef {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            endpoint: self.endpoint.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl RemoteRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send<M: Message + Serialize, E: std::error::Error + Send + Sync + 'static>(
        &self,
        message: M,
    ) -> Result<(), ActorRefError<E>> {
        let record = WireRecord::encode(self.name.clone(), None, None, &message)
            .map_err(TransportError::from)?;
        self.sender
            .try_send(&self.endpoint, &record)
            .await
            .map_err(ActorRefError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryMessageBroker;
    use crate::mailbox::metrics::AtomicMetrics;
    use crate::mailbox::{MailboxReceiver, UnboundedMailbox};
    use crate::message::MessagePriority;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping;

    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "actorref_ping";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    type TestMailbox = UnboundedMailbox<Ping, AtomicMetrics>;
    type TestSender = crate::mailbox::UnboundedMailboxSender<Ping, AtomicMetrics>;
    type TestBroker = InMemoryMessageBroker<Ping, TestSender>;

    #[tokio::test]
    async fn local_send_reaches_mailbox() {
        let broker = TestBroker::new();
        let (mut receiver, sender) = TestMailbox::new();
        let address = ActorAddress::named("pinger");
        broker.register_actor(address.clone(), sender).unwrap();

        let actor_ref = ActorRef::local(address, broker);
        actor_ref.send(Ping).await.unwrap();

        receiver.recv().await.unwrap();
    }

    #[tokio::test]
    async fn remote_fast_send_is_unsupported() {
        let remote = ActorRef::<Ping, TestBroker>::remote(
            "worker",
            "tcp://127.0.0.1:9999",
            RemoteSender::new(),
        );
        let result = remote.fast_send(Ping).await;
        assert!(matches!(
            result,
            Err(ActorRefError::Transport(TransportError::Unsupported))
        ));
    }
}
