//! Booking lifecycle events.
//!
//! The engine publishes an event whenever an order is created or one of its statuses changes. Interested parties
//! register async hooks in [`EventHooks`]; each hook gets its own [`EventHandler`] task fed by a bounded channel.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
