mod bus;
mod handler;

pub use bus::{BusError, EventBus, EventBusConfig, EventLike, EventPublisher, Timestamped};
pub use handler::{EventHandler, HandlerContext, HandlerError};
