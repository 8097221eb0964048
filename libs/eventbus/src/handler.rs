use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::bus::{BusError, EventLike, EventPublisher};

/// Errors a handler can surface. Caught and logged at the worker boundary;
/// they never stop the bus.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler processing failed: {0}")]
    Processing(String),

    #[error("event publishing failed: {0}")]
    Publish(#[from] BusError),
}

/// Context passed to every handler invocation.
///
/// Carries a publisher handle rather than the bus itself so handlers never
/// own the bus that owns them.
pub struct HandlerContext<E: EventLike> {
    publisher: EventPublisher<E>,
    /// When the event was enqueued.
    pub enqueued_at: DateTime<Utc>,
}

impl<E: EventLike> HandlerContext<E> {
    pub(crate) fn new(publisher: EventPublisher<E>, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            publisher,
            enqueued_at,
        }
    }

    /// Publish a follow-up event, waiting for queue space when full.
    pub async fn publish(&self, event: E) -> Result<(), BusError> {
        self.publisher.publish(event).await
    }

    /// Publish a follow-up event without blocking.
    pub fn try_publish(&self, event: E) -> Result<(), BusError> {
        self.publisher.try_publish(event)
    }

    /// Access the underlying publisher handle.
    pub fn publisher(&self) -> &EventPublisher<E> {
        &self.publisher
    }
}

/// Trait for event handlers.
///
/// A handler is registered per event kind via `EventBus::subscribe`; one
/// instance may be subscribed to several kinds. Invocations run to
/// completion on a worker; the dispatcher does not interrupt them.
#[async_trait]
pub trait EventHandler<E: EventLike>: Send + Sync {
    /// Handler name for logging and debugging.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Process an event. Errors are logged with event-kind context.
    async fn handle(&self, event: &E, ctx: &HandlerContext<E>) -> Result<(), HandlerError>;
}
