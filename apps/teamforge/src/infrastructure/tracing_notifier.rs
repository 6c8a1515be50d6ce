use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::domain::notification::Notification;
use crate::domain::repositories::Notifier;

/// Notifier that writes every notification to the log
///
/// Delivered notifications are also kept in an outbox for inspection.
#[derive(Default)]
pub struct TracingNotifier {
    outbox: Mutex<Vec<(Uuid, Notification)>>,
}

impl TracingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Uuid, Notification)> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_notification(&self, user_id: Uuid, notification: &Notification) -> Result<(), String> {
        info!(%user_id, kind = notification.kind(), "Notification sent");
        self.outbox
            .lock()
            .map_err(|_| "Notification outbox poisoned".to_string())?
            .push((user_id, notification.clone()));
        Ok(())
    }
}
