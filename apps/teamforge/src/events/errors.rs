use thiserror::Error;

use super::types::EventType;
use crate::agents::errors::AgentError;

/// Errors returned by the event bus itself
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Event bus is draining; {0} event rejected")]
    Closed(EventType),
}

pub type BusResult<T> = Result<T, BusError>;

/// Failure of a single handler invocation
///
/// The bus never propagates these to the publisher; each one is logged and
/// reported as a `SYSTEM_ERROR` event.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}
