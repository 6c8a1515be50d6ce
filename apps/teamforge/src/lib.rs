//! Teamforge Library
//!
//! This library provides the event-driven team matching core: the event
//! bus, the reactive agents, skill scoring and the genetic team optimizer,
//! plus in-memory adapters for its collaborators.

pub mod agents;
pub mod config;
pub mod domain;
pub mod events;
pub mod infrastructure;
