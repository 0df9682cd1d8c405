//! Owns a set of managed actors and drives their lifecycle end-to-end
//! (spec.md §4.3): one worker task per actor, a `DashMap`-backed name
//! table, a shared termination `Handle`, and — when configured with an
//! endpoint — the remote receiver that feeds this manager's mailboxes from
//! the wire.
//!
//! The worker loop follows the teacher's `spawn_actor_task` pattern from the
//! now-retired `system::actor_system` module: `pre_start`, a message loop
//! that consults `Actor::on_error`'s `ErrorAction` on failure, then
//! `post_stop`. Each managed actor's concrete type is erased behind a boxed
//! spawn closure (not a `dyn Actor`, which isn't object-safe: `handle_message`
//! is itself generic over the broker) so `Manager<M>` only needs to be
//! generic over the message type, not over every actor type it hosts.

mod config;
mod error;

pub use config::{
    ManagerConfig, ManagerConfigBuilder, DEFAULT_JOIN_TIMEOUT, DEFAULT_MAILBOX_CAPACITY,
    DEFAULT_REGISTRY_TIMEOUT,
};
pub use error::ManagerError;

// Layer 1: Standard library imports
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::actor::{Actor, ActorContext, ErrorAction};
use crate::actorref::ActorRef;
use crate::broker::InMemoryMessageBroker;
use crate::mailbox::{AtomicMetrics, MailboxError, MailboxSender, MetricsRecorder};
use crate::message::{Message, MessageEnvelope};
use crate::transport::{KindRegistry, MailboxLookup, RemoteHandle, RemoteReceiver, RemoteSender};
use crate::util::ActorAddress;

/// Broker concretely wired for manager-owned actors: the registry's mailbox
/// slot type is [`WorkerSender`], not the bare `UnboundedMailboxSender`,
/// because the manager needs to slip a `Shutdown` marker past the actor's
/// own closed message enum.
pub type ManagerBroker<M> = InMemoryMessageBroker<M, WorkerSender<M>>;

/// What actually travels down a managed actor's channel. Only
/// [`WorkerSender`] and the worker loop ever see the `Shutdown` variant;
/// actor code only ever sees `M` via `Actor::handle_message`.
enum WorkerEnvelope<M: Message> {
    Message(MessageEnvelope<M>),
    Shutdown,
}

/// Mailbox sender registered with the broker for a manager-owned actor.
///
/// Wraps a raw `mpsc::UnboundedSender` instead of `mailbox::UnboundedMailbox`
/// so `end()` can enqueue a synthetic `Shutdown` (spec.md §4.3) without
/// requiring every actor's `Message` enum to carry a lifecycle variant.
pub struct WorkerSender<M: Message> {
    tx: mpsc::UnboundedSender<WorkerEnvelope<M>>,
    metrics: Arc<AtomicMetrics>,
}

impl<M: Message> Clone for WorkerSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[async_trait]
impl<M: Message> MailboxSender<M> for WorkerSender<M> {
    type Error = MailboxError;

    async fn send(&self, envelope: MessageEnvelope<M>) -> Result<(), Self::Error> {
        self.tx
            .send(WorkerEnvelope::Message(envelope))
            .map_err(|_| MailboxError::Closed)?;
        self.metrics.record_sent();
        Ok(())
    }

    fn try_send(&self, envelope: MessageEnvelope<M>) -> Result<(), Self::Error> {
        self.tx
            .send(WorkerEnvelope::Message(envelope))
            .map_err(|_| MailboxError::Closed)?;
        self.metrics.record_sent();
        Ok(())
    }
}

/// Shared termination gate (spec.md §4.3 `Handle`): any actor (or the
/// hosting process) can request this manager to shut down.
#[derive(Clone)]
pub struct Handle {
    notify: Arc<Notify>,
    terminated: Arc<AtomicBool>,
}

impl Handle {
    fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal termination. Idempotent.
    pub fn terminate(&self) {
        if !self.terminated.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether `terminate()` has already been called.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        if self.is_terminated() {
            return;
        }
        self.notify.notified().await;
    }
}

type WorkerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type SpawnFn<M> = Box<dyn FnOnce(ManagerBroker<M>, Option<RemoteHandle>) -> WorkerFuture + Send>;

struct ManagedActor<M: Message> {
    address: ActorAddress,
    sender: WorkerSender<M>,
    alive: Arc<AtomicBool>,
    spawn: Mutex<Option<SpawnFn<M>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerRunState {
    NotStarted,
    Running,
    Stopped,
}

struct ManagerInner<M: Message + serde::Serialize + for<'de> serde::Deserialize<'de>> {
    config: ManagerConfig,
    broker: ManagerBroker<M>,
    actors: DashMap<String, Arc<ManagedActor<M>>>,
    state: parking_lot::RwLock<ManagerRunState>,
    handle: Handle,
    remote_sender: RemoteSender,
    receiver_shutdown: watch::Sender<bool>,
    receiver_task: Mutex<Option<JoinHandle<()>>>,
}

/// Owns a set of `(name, actor, mailbox, worker)` tuples and drives their
/// lifecycle (spec.md §4.3).
pub struct Manager<M: Message + serde::Serialize + for<'de> serde::Deserialize<'de>> {
    inner: Arc<ManagerInner<M>>,
}

impl<M: Message + serde::Serialize + for<'de> serde::Deserialize<'de>> Clone for Manager<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Message + serde::Serialize + for<'de> serde::Deserialize<'de>> Manager<M> {
    /// Create a new, empty manager. Call `manage()` to populate it, then
    /// `init()` to start running.
    pub fn new(config: ManagerConfig) -> Self {
        let (receiver_shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(ManagerInner {
                config,
                broker: ManagerBroker::new(),
                actors: DashMap::new(),
                state: parking_lot::RwLock::new(ManagerRunState::NotStarted),
                handle: Handle::new(),
                remote_sender: RemoteSender::new(),
                receiver_shutdown,
                receiver_task: Mutex::new(None),
            }),
        }
    }

    /// Register `actor` under `name`, creating its mailbox and binding a
    /// `LocalRef` to it. Rejects reuse of `name` and any call after `init()`
    /// (spec.md §4.3).
    pub fn manage<A>(&self, name: impl Into<String>, actor: A) -> Result<(), ManagerError>
    where
        A: Actor<Message = M> + Send + 'static,
    {
        if *self.inner.state.read() != ManagerRunState::NotStarted {
            return Err(ManagerError::AlreadyInitialized);
        }

        let name = name.into();
        if self.inner.actors.contains_key(&name) {
            return Err(ManagerError::NameInUse(name));
        }

        let address = ActorAddress::named(&name);
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkerEnvelope<M>>();
        let sender = WorkerSender {
            tx,
            metrics: Arc::new(AtomicMetrics::new()),
        };

        self.inner
            .broker
            .register_actor(address.clone(), sender.clone())
            .map_err(|_| ManagerError::NameInUse(name.clone()))?;

        let alive = Arc::new(AtomicBool::new(true));
        let worker_address = address.clone();
        let worker_alive = Arc::clone(&alive);

        let spawn: SpawnFn<M> = Box::new(move |broker, remote| {
            Box::pin(async move {
                let mut context = ActorContext::new(worker_address.clone(), broker);
                if let Some(remote) = remote {
                    context = context.with_remote(remote);
                }

                let mut actor = actor;
                if let Err(error) = actor.pre_start(&mut context).await {
                    tracing::error!(
                        actor = %worker_address,
                        %error,
                        "actor crashed during pre_start; marking dead"
                    );
                    worker_alive.store(false, Ordering::SeqCst);
                    return;
                }

                while let Some(item) = rx.recv().await {
                    let envelope = match item {
                        WorkerEnvelope::Shutdown => break,
                        WorkerEnvelope::Message(envelope) => envelope,
                    };

                    context.set_current(&envelope);
                    let result = actor.handle_message(envelope.payload, &mut context).await;
                    context.clear_current();

                    if let Err(error) = result {
                        match actor.on_error(error, &mut context).await {
                            ErrorAction::Stop => break,
                            ErrorAction::Escalate => {
                                tracing::warn!(
                                    actor = %worker_address,
                                    "error escalated with no supervisor attached; stopping"
                                );
                                break;
                            }
                            ErrorAction::Restart => {
                                tracing::warn!(
                                    actor = %worker_address,
                                    "restart requested; restarting without supervision is not supported, stopping"
                                );
                                break;
                            }
                            ErrorAction::Resume => continue,
                        }
                    }
                }

                let _ = actor.post_stop(&mut context).await;
            })
        });

        self.inner.actors.insert(
            name,
            Arc::new(ManagedActor {
                address,
                sender,
                alive,
                spawn: Mutex::new(Some(spawn)),
                worker: Mutex::new(None),
            }),
        );

        Ok(())
    }

    /// Start one worker per managed actor; each delivers a synthetic `Start`
    /// via `pre_start` before entering its message loop. Spawns the remote
    /// receiver if `config.endpoint` is set.
    pub async fn init(&self, kinds: KindRegistry) -> Result<(), ManagerError> {
        {
            let mut state = self.inner.state.write();
            if *state != ManagerRunState::NotStarted {
                return Err(ManagerError::InitTwice);
            }
            *state = ManagerRunState::Running;
        }

        let remote_handle = self.inner.config.endpoint.as_ref().map(|endpoint| {
            RemoteHandle::new(self.inner.remote_sender.clone(), endpoint.clone())
        });

        for entry in self.inner.actors.iter() {
            let managed = Arc::clone(entry.value());
            let spawn = managed.spawn.lock().await.take();
            let Some(spawn) = spawn else { continue };
            let broker = self.inner.broker.clone();
            let remote = remote_handle.clone();
            let handle = tokio::spawn(spawn(broker, remote));
            *managed.worker.lock().await = Some(handle);
        }

        if let Some(endpoint) = self.inner.config.endpoint.clone() {
            let listener = tokio::net::TcpListener::bind(&endpoint)
                .await
                .map_err(|source| ManagerError::BindFailed { endpoint, source })?;
            let actors = Arc::new(ManagerLookup {
                inner: Arc::clone(&self.inner),
            });
            let shutdown_rx = self.inner.receiver_shutdown.subscribe();
            let task = tokio::spawn(RemoteReceiver::serve(listener, actors, kinds, shutdown_rx));
            *self.inner.receiver_task.lock().await = Some(task);
        }

        Ok(())
    }

    /// Block until `handle().terminate()` has been signalled.
    pub async fn run(&self) {
        self.inner.handle.wait().await;
    }

    /// Deliver a synthetic `Shutdown` to every actor, join all workers
    /// bounded by `config.join_timeout`, and stop the remote receiver.
    /// Idempotent.
    pub async fn end(&self) {
        {
            let mut state = self.inner.state.write();
            if *state == ManagerRunState::Stopped {
                return;
            }
            *state = ManagerRunState::Stopped;
        }

        let _ = self.inner.receiver_shutdown.send(true);
        if let Some(task) = self.inner.receiver_task.lock().await.take() {
            let _ = tokio::time::timeout(self.inner.config.join_timeout, task).await;
        }

        for entry in self.inner.actors.iter() {
            let _ = entry.value().sender.tx.send(WorkerEnvelope::Shutdown);
        }

        for entry in self.inner.actors.iter() {
            let managed = Arc::clone(entry.value());
            let Some(worker) = managed.worker.lock().await.take() else {
                continue;
            };
            if tokio::time::timeout(self.inner.config.join_timeout, worker)
                .await
                .is_err()
            {
                tracing::warn!(
                    actor = %managed.address,
                    "worker did not join within the shutdown budget; abandoning"
                );
            }
        }
    }

    /// Look up the `ActorRef` bound to `name`, if it's managed here.
    pub fn get_ref(&self, name: &str) -> Option<ActorRef<M, ManagerBroker<M>>> {
        let managed = self.inner.actors.get(name)?;
        if !managed.alive.load(Ordering::SeqCst) {
            return None;
        }
        Some(ActorRef::local(
            managed.address.clone(),
            self.inner.broker.clone(),
        ))
    }

    /// This manager's listen endpoint, if it has one.
    pub fn get_endpoint(&self) -> Option<&str> {
        self.inner.config.endpoint.as_deref()
    }

    /// The shared termination gate for this manager.
    pub fn get_handle(&self) -> Handle {
        self.inner.handle.clone()
    }

    /// Number of actors currently managed.
    pub fn actor_count(&self) -> usize {
        self.inner.actors.len()
    }
}

/// Routes decoded wire messages into this manager's local mailboxes, for
/// [`RemoteReceiver`] (spec.md §4.5: "looks up `receiver` in the manager's
/// local actor map").
struct ManagerLookup<M: Message + serde::Serialize + for<'de> serde::Deserialize<'de>> {
    inner: Arc<ManagerInner<M>>,
}

#[async_trait]
impl<M: Message + serde::Serialize + for<'de> serde::Deserialize<'de>> MailboxLookup<M>
    for ManagerLookup<M>
{
    async fn enqueue(&self, name: &str, envelope: MessageEnvelope<M>) -> bool {
        let Some(managed) = self.inner.actors.get(name) else {
            return false;
        };
        managed
            .sender
            .tx
            .send(WorkerEnvelope::Message(envelope))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessagePriority;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration as StdDuration;

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    enum PingMsg {
        Ping,
        Pong,
    }

    impl Message for PingMsg {
        const MESSAGE_TYPE: &'static str = "manager_test_ping";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    #[derive(Debug)]
    struct RecorderError;

    impl std::fmt::Display for RecorderError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "recorder error")
        }
    }
    impl std::error::Error for RecorderError {}

    struct RecorderActor {
        received: Arc<AtomicU32>,
        started: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Actor for RecorderActor {
        type Message = PingMsg;
        type Error = RecorderError;

        async fn handle_message<B: crate::broker::MessageBroker<Self::Message>>(
            &mut self,
            _message: Self::Message,
            _context: &mut ActorContext<Self::Message, B>,
        ) -> Result<(), Self::Error> {
            self.received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn pre_start<B: crate::broker::MessageBroker<Self::Message>>(
            &mut self,
            _context: &mut ActorContext<Self::Message, B>,
        ) -> Result<(), Self::Error> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn post_stop<B: crate::broker::MessageBroker<Self::Message>>(
            &mut self,
            _context: &mut ActorContext<Self::Message, B>,
        ) -> Result<(), Self::Error> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_config() -> ManagerConfig {
        ManagerConfig::builder()
            .with_join_timeout(StdDuration::from_millis(500))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn manage_rejects_duplicate_name() {
        let manager = Manager::<PingMsg>::new(test_config());
        let received = Arc::new(AtomicU32::new(0));
        let started = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));

        manager
            .manage(
                "recorder",
                RecorderActor {
                    received: received.clone(),
                    started: started.clone(),
                    stopped: stopped.clone(),
                },
            )
            .unwrap();

        let result = manager.manage(
            "recorder",
            RecorderActor {
                received,
                started,
                stopped,
            },
        );
        assert!(matches!(result, Err(ManagerError::NameInUse(_))));
    }

    #[tokio::test]
    async fn init_delivers_start_and_processes_messages() {
        let manager = Manager::<PingMsg>::new(test_config());
        let received = Arc::new(AtomicU32::new(0));
        let started = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));

        manager
            .manage(
                "recorder",
                RecorderActor {
                    received: received.clone(),
                    started: started.clone(),
                    stopped: stopped.clone(),
                },
            )
            .unwrap();

        manager.init(KindRegistry::default()).await.unwrap();

        let actor_ref = manager.get_ref("recorder").unwrap();
        actor_ref.send(PingMsg::Ping).await.unwrap();
        actor_ref.send(PingMsg::Pong).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert!(started.load(Ordering::SeqCst));
        assert_eq!(received.load(Ordering::SeqCst), 2);

        manager.end().await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn manage_after_init_is_rejected() {
        let manager = Manager::<PingMsg>::new(test_config());
        manager.init(KindRegistry::default()).await.unwrap();

        let result = manager.manage(
            "late",
            RecorderActor {
                received: Arc::new(AtomicU32::new(0)),
                started: Arc::new(AtomicBool::new(false)),
                stopped: Arc::new(AtomicBool::new(false)),
            },
        );
        assert!(matches!(result, Err(ManagerError::AlreadyInitialized)));
        manager.end().await;
    }

    #[tokio::test]
    async fn handle_terminate_unblocks_run() {
        let manager = Manager::<PingMsg>::new(test_config());
        manager.init(KindRegistry::default()).await.unwrap();

        let handle = manager.get_handle();
        let waiter = tokio::spawn({
            let manager = manager.clone();
            async move { manager.run().await }
        });

        handle.terminate();
        tokio::time::timeout(StdDuration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();

        manager.end().await;
    }

    #[tokio::test]
    async fn end_is_idempotent() {
        let manager = Manager::<PingMsg>::new(test_config());
        manager.init(KindRegistry::default()).await.unwrap();
        manager.end().await;
        manager.end().await;
    }
}
