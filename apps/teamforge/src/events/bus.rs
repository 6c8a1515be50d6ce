//! In-process publish/subscribe broker
//!
//! `publish` completes once every handler registered for the event has
//! settled. Handlers run concurrently; a handler that returns an error or
//! panics is logged and reported as a `SYSTEM_ERROR` event without
//! affecting its siblings or the publisher.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::errors::{BusError, BusResult, HandlerError};
use super::types::{Event, EventDraft, EventPayload, EventType};

pub const DEFAULT_HISTORY_CAPACITY: usize = 10_000;

/// Window used by `BusStatistics::events_last_minute`
const RATE_WINDOW_SECS: i64 = 60;

/// Source name stamped on events the bus emits itself
pub const BUS_SOURCE: &str = "event-bus";

/// Something that reacts to published events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and `SYSTEM_ERROR` reports
    fn name(&self) -> &str;

    async fn handle(&self, event: Arc<Event>) -> Result<(), HandlerError>;
}

pub type HandlerRef = Arc<dyn EventHandler>;

/// Closure-backed handler, see `handler_fn`
pub struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(Arc<Event>) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: Arc<Event>) -> Result<(), HandlerError> {
        (self.f)(event).await
    }
}

/// Wraps an async closure into a handler
///
/// # Example
/// ```
/// use teamforge::events::{handler_fn, EventHandler};
///
/// let handler = handler_fn("audit", |event| async move {
///     println!("{}", event.event_type());
///     Ok(())
/// });
/// assert_eq!(handler.name(), "audit");
/// ```
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> HandlerRef
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f: move |event: Arc<Event>| -> BoxFuture<'static, Result<(), HandlerError>> {
            Box::pin(f(event))
        },
    })
}

fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Bus construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub history_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Snapshot returned by `EventBus::get_statistics`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusStatistics {
    /// Events currently held in history
    pub total_events: usize,
    /// Events published since the bus was created
    pub published_total: u64,
    pub events_by_type: BTreeMap<EventType, usize>,
    pub events_last_minute: usize,
    /// Typed subscriptions plus global listeners
    pub handler_count: usize,
}

#[derive(Debug)]
struct HandlerFailure {
    handler: String,
    error: HandlerError,
}

struct InFlight<'a> {
    bus: &'a EventBus,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.bus.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.bus.idle.notify_waiters();
        }
    }
}

/// In-process event broker with bounded history
pub struct EventBus {
    config: BusConfig,
    handlers: RwLock<HashMap<EventType, Vec<HandlerRef>>>,
    global: RwLock<Vec<HandlerRef>>,
    history: RwLock<VecDeque<Arc<Event>>>,
    published: AtomicU64,
    in_flight: AtomicUsize,
    closed: AtomicBool,
    idle: Notify,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            config,
            handlers: RwLock::new(HashMap::new()),
            global: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::with_capacity(config.history_capacity.min(1024))),
            published: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            idle: Notify::new(),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Registers a handler for one event type
    ///
    /// Returns `false` when that exact handler was already registered.
    pub async fn subscribe(&self, event_type: EventType, handler: HandlerRef) -> bool {
        let mut handlers = self.handlers.write().await;
        let entry = handlers.entry(event_type).or_default();
        if entry.iter().any(|h| same_handler(h, &handler)) {
            return false;
        }
        debug!(handler = handler.name(), %event_type, "Handler subscribed");
        entry.push(handler);
        true
    }

    /// Removes a handler from one event type; returns whether it was registered
    pub async fn unsubscribe(&self, event_type: EventType, handler: &HandlerRef) -> bool {
        let mut handlers = self.handlers.write().await;
        let Some(entry) = handlers.get_mut(&event_type) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|h| !same_handler(h, handler));
        let removed = entry.len() != before;
        if entry.is_empty() {
            handlers.remove(&event_type);
        }
        removed
    }

    /// Registers a listener that receives every event
    pub async fn subscribe_to_all(&self, handler: HandlerRef) -> bool {
        let mut global = self.global.write().await;
        if global.iter().any(|h| same_handler(h, &handler)) {
            return false;
        }
        global.push(handler);
        true
    }

    pub async fn unsubscribe_from_all(&self, handler: &HandlerRef) -> bool {
        let mut global = self.global.write().await;
        let before = global.len();
        global.retain(|h| !same_handler(h, handler));
        global.len() != before
    }

    /// Publishes an event and waits for every handler to settle
    ///
    /// Handler failures never surface here. The only error is publishing
    /// after `drain` has started.
    pub async fn publish(&self, draft: EventDraft) -> BusResult<Arc<Event>> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight { bus: self };

        if self.closed.load(Ordering::SeqCst) {
            let event_type = draft.event_type();
            warn!(%event_type, source = draft.source(), "Publish rejected, bus is draining");
            return Err(BusError::Closed(event_type));
        }

        let event = self.record(draft).await;
        let failures = self.dispatch(&event).await;
        if failures.is_empty() {
            return Ok(event);
        }

        if event.event_type() == EventType::SystemError {
            for failure in failures {
                error!(
                    handler = %failure.handler,
                    error = %failure.error,
                    "SYSTEM_ERROR handler failed; not re-published"
                );
            }
            return Ok(event);
        }

        for failure in failures {
            let mut report = EventDraft::new(
                BUS_SOURCE,
                EventPayload::SystemError {
                    handler: failure.handler,
                    message: failure.error.to_string(),
                    failed_event_id: event.id,
                    failed_event_type: event.event_type(),
                },
            )
            .correlation(event.correlation_id.unwrap_or(event.id));
            if let Some(user_id) = event.user_id {
                report = report.user(user_id);
            }

            let report = self.record(report).await;
            for nested in self.dispatch(&report).await {
                error!(
                    handler = %nested.handler,
                    error = %nested.error,
                    "SYSTEM_ERROR handler failed; not re-published"
                );
            }
        }

        Ok(event)
    }

    /// Publishes each draft independently, in order
    pub async fn publish_batch(&self, drafts: Vec<EventDraft>) -> Vec<BusResult<Arc<Event>>> {
        let mut results = Vec::with_capacity(drafts.len());
        for draft in drafts {
            results.push(self.publish(draft).await);
        }
        results
    }

    /// Fire-and-forget publish on a spawned task
    ///
    /// The caller does not wait for handlers; ordering relative to other
    /// detached publishes is not guaranteed.
    pub fn publish_detached(self: &Arc<Self>, draft: EventDraft) -> JoinHandle<BusResult<Arc<Event>>> {
        let bus = Arc::clone(self);
        tokio::spawn(async move { bus.publish(draft).await })
    }

    /// Most recent events first, optionally restricted to one type
    pub async fn get_event_history(&self, event_type: Option<EventType>, limit: usize) -> Vec<Arc<Event>> {
        let history = self.history.read().await;
        history
            .iter()
            .rev()
            .filter(|e| event_type.map_or(true, |t| e.event_type() == t))
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get_statistics(&self) -> BusStatistics {
        let window_start = Utc::now() - Duration::seconds(RATE_WINDOW_SECS);

        let (total_events, events_by_type, events_last_minute) = {
            let history = self.history.read().await;
            let mut by_type = BTreeMap::new();
            for event in history.iter() {
                *by_type.entry(event.event_type()).or_insert(0) += 1;
            }
            let recent = history.iter().filter(|e| e.timestamp >= window_start).count();
            (history.len(), by_type, recent)
        };

        let typed: usize = self.handlers.read().await.values().map(Vec::len).sum();
        let global = self.global.read().await.len();

        BusStatistics {
            total_events,
            published_total: self.published.load(Ordering::Relaxed),
            events_by_type,
            events_last_minute,
            handler_count: typed + global,
        }
    }

    /// Number of handlers subscribed to one event type
    pub async fn handler_count(&self, event_type: EventType) -> usize {
        self.handlers
            .read()
            .await
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops accepting publishes and waits for in-flight ones to settle
    pub async fn drain(&self) {
        self.closed.store(true, Ordering::SeqCst);
        loop {
            let idle = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            idle.await;
        }
        info!(
            published = self.published.load(Ordering::Relaxed),
            "Event bus drained"
        );
    }

    async fn record(&self, draft: EventDraft) -> Arc<Event> {
        let event = Arc::new(draft.into_event());
        {
            let mut history = self.history.write().await;
            history.push_back(Arc::clone(&event));
            while history.len() > self.config.history_capacity {
                history.pop_front();
            }
        }
        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(
            event_id = %event.id,
            event_type = %event.event_type(),
            source = %event.source,
            "Event published"
        );
        event
    }

    async fn dispatch(&self, event: &Arc<Event>) -> Vec<HandlerFailure> {
        let global = self.global.read().await.clone();
        let typed = self
            .handlers
            .read()
            .await
            .get(&event.event_type())
            .cloned()
            .unwrap_or_default();

        let mut failures = run_handlers(&global, event).await;
        failures.extend(run_handlers(&typed, event).await);
        failures
    }
}

async fn run_handlers(handlers: &[HandlerRef], event: &Arc<Event>) -> Vec<HandlerFailure> {
    let runs = handlers.iter().map(|handler| {
        let handler = Arc::clone(handler);
        let event = Arc::clone(event);
        async move {
            let outcome = AssertUnwindSafe(handler.handle(Arc::clone(&event)))
                .catch_unwind()
                .await;
            let error = match outcome {
                Ok(Ok(())) => return None,
                Ok(Err(error)) => error,
                Err(panic) => HandlerError::Panicked(panic_message(panic.as_ref())),
            };
            error!(
                handler = handler.name(),
                event_id = %event.id,
                event_type = %event.event_type(),
                error = %error,
                "Event handler failed"
            );
            Some(HandlerFailure {
                handler: handler.name().to_string(),
                error,
            })
        }
    });

    join_all(runs).await.into_iter().flatten().collect()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
