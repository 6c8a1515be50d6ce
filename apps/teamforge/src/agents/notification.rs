use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use super::agent::{Agent, AgentCore};
use super::errors::AgentResult;
use crate::domain::repositories::Notifier;
use crate::events::{Event, EventBus, EventPayload, EventType};

pub const NOTIFICATION_AGENT: &str = "notification";

/// Relays `NOTIFICATION_SEND` events to the outbound notifier
///
/// Delivery runs on a detached task; the publisher does not wait for it.
pub struct NotificationAgent {
    core: AgentCore,
    notifier: Arc<dyn Notifier>,
}

impl NotificationAgent {
    pub fn new(bus: Arc<EventBus>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            core: AgentCore::new(
                NOTIFICATION_AGENT,
                "Delivers user notifications through the configured notifier",
                bus,
            ),
            notifier,
        }
    }
}

#[async_trait]
impl Agent for NotificationAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn subscribed_types(&self) -> &'static [EventType] {
        &[EventType::NotificationSend]
    }

    fn published_types(&self) -> &'static [EventType] {
        &[]
    }

    async fn handle(&self, event: &Event) -> AgentResult<()> {
        match &event.payload {
            EventPayload::NotificationSend {
                recipient,
                notification,
            } => {
                let notifier = Arc::clone(&self.notifier);
                let recipient = *recipient;
                let notification = notification.clone();
                let event_id = event.id;

                tokio::spawn(async move {
                    match notifier.send_notification(recipient, &notification).await {
                        Ok(()) => debug!(%recipient, kind = notification.kind(), "Notification delivered"),
                        Err(e) => error!(
                            %recipient,
                            %event_id,
                            error = %e,
                            "Failed to deliver notification"
                        ),
                    }
                });
                Ok(())
            }
            EventPayload::AgentStarted { .. }
            | EventPayload::AgentStopped { .. }
            | EventPayload::ResumeUploaded { .. }
            | EventPayload::ResumeParsed { .. }
            | EventPayload::ResumeParsingFailed { .. }
            | EventPayload::TeamSuggestionsRequested { .. }
            | EventPayload::TeamSuggestionsGenerated { .. }
            | EventPayload::TeamFormationRequested(_)
            | EventPayload::TeamFormed { .. }
            | EventPayload::TeamMemberAdded { .. }
            | EventPayload::SystemError { .. } => Ok(()),
        }
    }
}
