//! Log-only sender used when SMTP is not configured.

use async_trait::async_trait;

use crate::sender::{NotificationError, NotificationSender, Recipient};
use crate::templates;

/// Renders each notification and writes it to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(
        &self,
        template_id: &str,
        recipient: &Recipient,
        payload: &serde_json::Value,
    ) -> Result<(), NotificationError> {
        let message = templates::render(template_id, recipient, payload)?;
        tracing::info!(
            template_id,
            recipient_id = recipient.user_id,
            subject = %message.subject,
            "Notification (log only)"
        );
        Ok(())
    }
}
