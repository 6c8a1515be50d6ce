//! Agent contract and lifecycle plumbing
//!
//! Concrete agents implement [`Agent`] and embed an [`AgentCore`]. Starting
//! an agent (through [`AgentLifecycle`], implemented for `Arc<dyn Agent>`)
//! registers one dispatch handler on the bus for each subscribed event
//! type; stopping removes it again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info, warn};

use super::errors::AgentResult;
use super::state::{AgentDescriptor, AgentStatus};
use crate::events::{
    BusResult, EnvelopeField, Event, EventBus, EventDraft, EventHandler, EventPayload, EventType,
    HandlerError, HandlerRef,
};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared by every agent: identity, bus handle, and counters
pub struct AgentCore {
    name: String,
    description: String,
    bus: Arc<EventBus>,
    running: AtomicBool,
    processed: AtomicU64,
    last_activity: Mutex<Option<DateTime<Utc>>>,
    handler: Mutex<Option<HandlerRef>>,
}

impl AgentCore {
    pub fn new(name: impl Into<String>, description: impl Into<String>, bus: Arc<EventBus>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            bus,
            running: AtomicBool::new(false),
            processed: AtomicU64::new(0),
            last_activity: Mutex::new(None),
            handler: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_activity)
    }

    fn record_activity(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_activity) = Some(Utc::now());
    }

    /// Starts a draft whose source is this agent
    pub fn event(&self, payload: EventPayload) -> EventDraft {
        EventDraft::new(self.name.clone(), payload)
    }

    /// Publishes with `source` set to this agent's name and waits for the
    /// bus to settle every handler
    pub async fn publish(&self, draft: EventDraft) -> BusResult<Arc<Event>> {
        self.bus.publish(draft.with_source(self.name.clone())).await
    }

    /// Checks that the envelope carries every required field
    ///
    /// Returns `false` and logs a warning when one is missing; callers abort
    /// processing of that event without emitting anything.
    pub fn validate_payload(&self, event: &Event, required: &[EnvelopeField]) -> bool {
        match required.iter().find(|field| !event.has_field(**field)) {
            Some(missing) => {
                warn!(
                    agent = %self.name,
                    event_id = %event.id,
                    event_type = %event.event_type(),
                    field = %missing,
                    "Missing required field; event skipped"
                );
                false
            }
            None => true,
        }
    }
}

/// A reactive agent driven by bus events
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    fn core(&self) -> &AgentCore;

    /// Event types routed to `handle` while the agent runs
    fn subscribed_types(&self) -> &'static [EventType];

    /// Event types this agent may emit
    fn published_types(&self) -> &'static [EventType];

    /// Called after the agent's handlers are registered
    async fn on_start(&self) -> AgentResult<()> {
        Ok(())
    }

    /// Called after the agent's handlers are removed
    async fn on_stop(&self) -> AgentResult<()> {
        Ok(())
    }

    /// Processes one subscribed event
    ///
    /// Validation and dependency problems are logged inside and reported as
    /// `Ok`; an `Err` here becomes a `SYSTEM_ERROR` event.
    async fn handle(&self, event: &Event) -> AgentResult<()>;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn descriptor(&self) -> AgentDescriptor {
        let core = self.core();
        AgentDescriptor {
            name: core.name().to_string(),
            description: core.description().to_string(),
            subscribed_types: self.subscribed_types().to_vec(),
            published_types: self.published_types().to_vec(),
            status: if core.is_running() {
                AgentStatus::Running
            } else {
                AgentStatus::Stopped
            },
            processed_count: core.processed_count(),
            last_activity: core.last_activity(),
        }
    }
}

/// Bus handler forwarding events to an agent
///
/// Holds the agent weakly so a forgotten subscription cannot keep it alive.
struct AgentDispatch {
    name: String,
    agent: Weak<dyn Agent>,
}

#[async_trait]
impl EventHandler for AgentDispatch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: Arc<Event>) -> Result<(), HandlerError> {
        let Some(agent) = self.agent.upgrade() else {
            return Ok(());
        };
        let core = agent.core();
        if !core.is_running() || !agent.subscribed_types().contains(&event.event_type()) {
            return Ok(());
        }

        core.record_activity();
        agent.handle(&event).await?;
        Ok(())
    }
}

/// Idempotent start/stop for shared agents
#[async_trait]
pub trait AgentLifecycle {
    async fn start(&self) -> AgentResult<()>;
    async fn stop(&self) -> AgentResult<()>;
}

#[async_trait]
impl AgentLifecycle for Arc<dyn Agent> {
    async fn start(&self) -> AgentResult<()> {
        let core = self.core();
        if core.running.swap(true, Ordering::SeqCst) {
            debug!(agent = core.name(), "Agent already running");
            return Ok(());
        }

        let handler: HandlerRef = Arc::new(AgentDispatch {
            name: core.name().to_string(),
            agent: Arc::downgrade(self),
        });
        for event_type in self.subscribed_types() {
            core.bus.subscribe(*event_type, Arc::clone(&handler)).await;
        }
        *lock(&core.handler) = Some(Arc::clone(&handler));

        if let Err(e) = self.on_start().await {
            warn!(agent = core.name(), error = %e, "Start hook failed; rolling back");
            for event_type in self.subscribed_types() {
                core.bus.unsubscribe(*event_type, &handler).await;
            }
            *lock(&core.handler) = None;
            core.running.store(false, Ordering::SeqCst);
            return Err(e);
        }

        info!(agent = core.name(), subscriptions = self.subscribed_types().len(), "Agent started");
        let started = core.event(EventPayload::AgentStarted {
            agent: core.name().to_string(),
        });
        if let Err(e) = core.publish(started).await {
            debug!(agent = core.name(), error = %e, "AGENT_STARTED not published");
        }
        Ok(())
    }

    async fn stop(&self) -> AgentResult<()> {
        let core = self.core();
        if !core.running.swap(false, Ordering::SeqCst) {
            debug!(agent = core.name(), "Agent already stopped");
            return Ok(());
        }

        let handler = lock(&core.handler).take();
        if let Some(handler) = handler {
            for event_type in self.subscribed_types() {
                core.bus.unsubscribe(*event_type, &handler).await;
            }
        }

        let hook = self.on_stop().await;
        info!(agent = core.name(), processed = core.processed_count(), "Agent stopped");

        let stopped = core.event(EventPayload::AgentStopped {
            agent: core.name().to_string(),
        });
        if let Err(e) = core.publish(stopped).await {
            debug!(agent = core.name(), error = %e, "AGENT_STOPPED not published");
        }
        hook
    }
}
