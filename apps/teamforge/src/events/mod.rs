// Event system
//
// Typed event envelopes and the in-process bus that dispatches them to
// agents and other handlers.

pub mod bus;
pub mod errors;
pub mod types;

pub use bus::{handler_fn, BusConfig, BusStatistics, EventBus, EventHandler, HandlerRef};
pub use errors::{BusError, BusResult, HandlerError};
pub use types::{EnvelopeField, Event, EventDraft, EventPayload, EventType};
