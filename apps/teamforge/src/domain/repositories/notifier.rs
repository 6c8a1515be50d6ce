use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::notification::Notification;

/// Outbound notification channel (email, push, websocket bridge...)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification to a user
    async fn send_notification(&self, user_id: Uuid, notification: &Notification) -> Result<(), String>;
}
