use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::handler::{EventHandler, HandlerContext};

/// Trait that user-defined event enums must implement.
///
/// The `Kind` associated type is the discriminant enum used for subscription
/// routing. This design separates "what kind of event" from "what data does
/// it carry".
pub trait EventLike: Clone + Send + Sync + 'static {
    /// The discriminant type used for routing.
    /// Must be Copy + Hash + Eq so it can be used as HashMap keys.
    type Kind: Copy + Hash + Eq + Send + Sync + std::fmt::Debug + 'static;

    /// Get the discriminant for this event instance.
    fn kind(&self) -> Self::Kind;
}

/// Event payload wrapped with its enqueue timestamp.
#[derive(Debug, Clone)]
pub struct Timestamped<E> {
    pub event: E,
    pub enqueued_at: DateTime<Utc>,
}

impl<E> Timestamped<E> {
    pub fn new(event: E) -> Self {
        Self {
            event,
            enqueued_at: Utc::now(),
        }
    }
}

/// Errors surfaced by publish operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The bounded queue is full and the publish was non-blocking.
    #[error("event bus queue is full")]
    BackpressureFull,

    /// The bus has been stopped; new events are rejected.
    #[error("event bus is not running")]
    NotRunning,

    /// The queue receiver is gone (dispatcher exited).
    #[error("event bus queue is closed")]
    Closed,
}

/// Event bus configuration.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Bounded FIFO queue capacity.
    pub queue_capacity: usize,
    /// Worker pool size; caps how many handler invocations run concurrently.
    pub workers: usize,
    /// Drain budget applied when stopping.
    pub stop_grace: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            stop_grace: Duration::from_secs(5),
        }
    }
}

type SubscriptionTable<E> = HashMap<<E as EventLike>::Kind, Vec<Arc<dyn EventHandler<E>>>>;

struct EventBusInner<E: EventLike> {
    subscriptions: Mutex<SubscriptionTable<E>>,
    tx: mpsc::Sender<Timestamped<E>>,
    rx: Mutex<Option<mpsc::Receiver<Timestamped<E>>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    workers: Arc<Semaphore>,
    cancel: CancellationToken,
    stopped: AtomicBool,
    config: EventBusConfig,
}

/// Typed pub/sub bus: bounded FIFO queue, a single dispatcher task, and a
/// fixed-size worker pool for handler invocations.
///
/// Publishers are many (MPSC); the dispatcher is the sole consumer. For each
/// dequeued event it snapshots the subscriber list and fans out one worker
/// task per subscriber, then waits for all of them before taking the next
/// event. Events of the same kind therefore reach every subscriber in
/// publish order, while the handlers of a single event run concurrently.
pub struct EventBus<E: EventLike> {
    inner: Arc<EventBusInner<E>>,
}

impl<E: EventLike> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: EventLike> EventBus<E> {
    /// Create a new event bus with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with the given configuration.
    pub fn with_config(config: EventBusConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            inner: Arc::new(EventBusInner {
                subscriptions: Mutex::new(HashMap::new()),
                tx,
                rx: Mutex::new(Some(rx)),
                dispatcher: Mutex::new(None),
                workers: Arc::new(Semaphore::new(config.workers.max(1))),
                cancel: CancellationToken::new(),
                stopped: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// Register a handler for an event kind. Idempotent: subscribing the
    /// same handler instance twice counts once.
    pub fn subscribe(&self, kind: E::Kind, handler: Arc<dyn EventHandler<E>>) {
        let mut table = self
            .inner
            .subscriptions
            .lock()
            .expect("subscription table poisoned");
        let handlers = table.entry(kind).or_default();
        if handlers.iter().any(|existing| Arc::ptr_eq(existing, &handler)) {
            debug!("handler {} already subscribed to {:?}", handler.name(), kind);
            return;
        }
        info!("subscribed {} to {:?}", handler.name(), kind);
        handlers.push(handler);
    }

    /// Remove a handler from an event kind.
    pub fn unsubscribe(&self, kind: E::Kind, handler: &Arc<dyn EventHandler<E>>) {
        let mut table = self
            .inner
            .subscriptions
            .lock()
            .expect("subscription table poisoned");
        if let Some(handlers) = table.get_mut(&kind) {
            handlers.retain(|existing| !Arc::ptr_eq(existing, handler));
        }
    }

    /// Get a cheap publisher handle usable from any task or thread.
    pub fn publisher(&self) -> EventPublisher<E> {
        EventPublisher {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Publish an event, waiting for queue space when the queue is full.
    pub async fn publish(&self, event: E) -> Result<(), BusError> {
        self.publisher().publish(event).await
    }

    /// Publish an event without blocking; fails with `BackpressureFull`
    /// when the queue is at capacity.
    pub fn try_publish(&self, event: E) -> Result<(), BusError> {
        self.publisher().try_publish(event)
    }

    /// Get the configured queue capacity.
    pub fn capacity(&self) -> usize {
        self.inner.config.queue_capacity
    }

    /// Spin up the dispatcher. Idempotent.
    pub fn start(&self) {
        let receiver = self
            .inner
            .rx
            .lock()
            .expect("receiver slot poisoned")
            .take();
        let Some(rx) = receiver else {
            debug!("event bus already started");
            return;
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(run_dispatcher(inner, rx));
        *self
            .inner
            .dispatcher
            .lock()
            .expect("dispatcher slot poisoned") = Some(task);
        info!(
            "event bus started (queue={}, workers={})",
            self.inner.config.queue_capacity, self.inner.config.workers
        );
    }

    /// Stop the bus: reject new events, drain the queue best-effort within
    /// the grace budget, and join the dispatcher. Handlers already running
    /// complete.
    pub async fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.cancel.cancel();

        let task = self
            .inner
            .dispatcher
            .lock()
            .expect("dispatcher slot poisoned")
            .take();
        if let Some(task) = task {
            let budget = self.inner.config.stop_grace + Duration::from_secs(1);
            if tokio::time::timeout(budget, task).await.is_err() {
                warn!("dispatcher did not finish within the stop grace budget");
            }
        }
        info!("event bus stopped");
    }

    /// Whether the bus is accepting events.
    pub fn is_running(&self) -> bool {
        !self.inner.stopped.load(Ordering::Acquire)
    }
}

impl<E: EventLike> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap, cloneable handle for publishing onto the bus from producer
/// threads and handler contexts.
pub struct EventPublisher<E: EventLike> {
    inner: Arc<EventBusInner<E>>,
}

impl<E: EventLike> Clone for EventPublisher<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: EventLike> EventPublisher<E> {
    /// Publish, waiting for queue space when full.
    pub async fn publish(&self, event: E) -> Result<(), BusError> {
        if self.inner.stopped.load(Ordering::Acquire) {
            return Err(BusError::NotRunning);
        }
        self.inner
            .tx
            .send(Timestamped::new(event))
            .await
            .map_err(|_| BusError::Closed)
    }

    /// Non-blocking publish; `BackpressureFull` when the queue is at capacity.
    pub fn try_publish(&self, event: E) -> Result<(), BusError> {
        if self.inner.stopped.load(Ordering::Acquire) {
            return Err(BusError::NotRunning);
        }
        self.inner
            .tx
            .try_send(Timestamped::new(event))
            .map_err(|err| match err {
                TrySendError::Full(_) => BusError::BackpressureFull,
                TrySendError::Closed(_) => BusError::Closed,
            })
    }

    /// Publish from a plain OS thread that is not on the runtime.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_publish(&self, event: E) -> Result<(), BusError> {
        if self.inner.stopped.load(Ordering::Acquire) {
            return Err(BusError::NotRunning);
        }
        self.inner
            .tx
            .blocking_send(Timestamped::new(event))
            .map_err(|_| BusError::Closed)
    }
}

async fn run_dispatcher<E: EventLike>(
    inner: Arc<EventBusInner<E>>,
    mut rx: mpsc::Receiver<Timestamped<E>>,
) {
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(msg) => dispatch_one(&inner, msg).await,
                None => return,
            }
        }
    }

    // Stop requested: drain whatever is already queued, bounded by the
    // grace budget. Dropping the receiver afterwards closes the channel
    // and unblocks any publisher still waiting on a full queue.
    let drained = tokio::time::timeout(inner.config.stop_grace, async {
        while let Ok(msg) = rx.try_recv() {
            dispatch_one(&inner, msg).await;
        }
    })
    .await;
    if drained.is_err() {
        warn!("stop grace expired with events still queued");
    }
}

async fn dispatch_one<E: EventLike>(inner: &Arc<EventBusInner<E>>, msg: Timestamped<E>) {
    let kind = msg.event.kind();
    let handlers: Vec<Arc<dyn EventHandler<E>>> = {
        let table = inner
            .subscriptions
            .lock()
            .expect("subscription table poisoned");
        table.get(&kind).cloned().unwrap_or_default()
    };
    if handlers.is_empty() {
        return;
    }

    let mut tasks = Vec::with_capacity(handlers.len());
    for handler in handlers {
        let permit = inner
            .workers
            .clone()
            .acquire_owned()
            .await
            .expect("worker pool semaphore closed");
        let event = msg.event.clone();
        let ctx = HandlerContext::new(
            EventPublisher {
                inner: Arc::clone(inner),
            },
            msg.enqueued_at,
        );
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let name = handler.name();
            if let Err(err) = handler.handle(&event, &ctx).await {
                warn!("handler {} failed on {:?}: {}", name, kind, err);
            }
        }));
    }

    for result in join_all(tasks).await {
        if let Err(err) = result {
            error!("handler task panicked while processing {:?}: {}", kind, err);
        }
    }
}
