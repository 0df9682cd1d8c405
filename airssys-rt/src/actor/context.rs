//! Actor execution context: identity, the injected broker handle, and the
//! reply helper actors use to answer both fire-and-forget and fast-send
//! envelopes uniformly (spec.md §4.2).

// Layer 1: Standard library imports
use std::marker::PhantomData;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc}; // §3.2 MANDATORY
use serde::Serialize;

// Layer 3: Internal module imports
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};
use crate::transport::RemoteHandle;
use crate::util::{ActorAddress, ActorId};

/// Per-actor execution context handed to every lifecycle and message-handling
/// call. Generic over the broker `B` (dependency injection, ADR-006) so
/// actors never see a concrete broker type or `dyn` object (§6.2).
pub struct ActorContext<M: Message, B: MessageBroker<M>> {
    address: ActorAddress,
    id: ActorId,
    created_at: DateTime<Utc>,
    broker: B,
    /// Present when the owning manager exposes a remote endpoint; lets
    /// `reply()` hand a response to the wire transport when the original
    /// sender was a `RemoteRef` (spec.md §4.5 "location transparency").
    remote: Option<RemoteHandle>,
    /// The sender/correlation_id of the envelope currently being dispatched,
    /// set by the manager's worker loop immediately before
    /// `handle_message`/`pre_start` runs so `reply()` can answer it without
    /// `handle_message` itself taking the envelope (it only ever sees the
    /// bare payload).
    current: Option<EnvelopeMeta>,
    _marker: PhantomData<M>,
}

/// Just enough of a dispatched envelope for `reply()` to route a response:
/// deliberately excludes the payload so the worker loop can record it
/// without cloning or re-borrowing the message being handled.
struct EnvelopeMeta {
    sender: Option<ActorAddress>,
    correlation_id: Option<uuid::Uuid>,
}

impl<M: Message, B: MessageBroker<M>> ActorContext<M, B> {
    /// Create a new actor context around an injected broker handle.
    pub fn new(address: ActorAddress, broker: B) -> Self {
        Self {
            id: *address.id(),
            address,
            created_at: Utc::now(), // §3.2
            broker,
            remote: None,
            current: None,
            _marker: PhantomData,
        }
    }

    /// Record the envelope about to be dispatched. Manager-internal.
    pub(crate) fn set_current(&mut self, envelope: &MessageEnvelope<M>) {
        self.current = Some(EnvelopeMeta {
            sender: envelope.sender.clone(),
            correlation_id: envelope.correlation_id,
        });
    }

    /// Clear the envelope after dispatch completes. Manager-internal.
    pub(crate) fn clear_current(&mut self) {
        self.current = None;
    }

    /// Attach the manager's remote transport handle, enabling `reply()` to
    /// route responses back across the wire to `ActorAddress::Remote` senders.
    pub fn with_remote(mut self, remote: RemoteHandle) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Get the actor's address.
    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    /// Get the actor's ID.
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Get the actor's creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Borrow the injected message broker, for actors that need direct
    /// access beyond `send`/`reply` (e.g. to build their own `ActorRef`).
    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Fire-and-forget send to another locally-managed actor.
    pub async fn send(&self, target: ActorAddress, message: M) -> Result<(), B::Error>
    where
        M: Serialize,
    {
        let envelope = MessageEnvelope::new(message)
            .with_sender(self.address.clone())
            .with_reply_to(target);
        self.broker.send(envelope).await
    }

    /// Reply helper (spec.md §4.2): fulfils the envelope's reply slot if
    /// the original send was a `fast_send`, else sends back to the original
    /// sender (local or remote), else drops the response silently.
    ///
    /// Answers whichever envelope is currently being dispatched (see
    /// `current`); a no-op outside of `handle_message`/`pre_start`.
    pub async fn reply(&self, response: M) -> Result<(), B::Error>
    where
        M: Serialize,
    {
        let Some(original) = self.current.as_ref() else {
            return Ok(());
        };

        if let Some(correlation_id) = original.correlation_id {
            let mut response_envelope = MessageEnvelope::new(response);
            response_envelope.correlation_id = Some(correlation_id);
            return self.broker.complete_reply(correlation_id, response_envelope).await;
        }

        let Some(sender) = original.sender.clone() else {
            // No reply slot, no sender: drop (spec.md §4.2 "else drop").
            return Ok(());
        };

        match sender {
            ActorAddress::Remote { name, endpoint, .. } => {
                if let Some(remote) = &self.remote {
                    remote
                        .reply(&name, &endpoint, self.address.name(), &response)
                        .await;
                }
                Ok(())
            }
            local => {
                let envelope = MessageEnvelope::new(response)
                    .with_sender(self.address.clone())
                    .with_reply_to(local);
                self.broker.send(envelope).await
            }
        }
    }
}
