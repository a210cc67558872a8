//! The notification delivery seam.

use async_trait::async_trait;
use presensi_core::types::DbId;

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: DbId,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Recipient {0} has no email address")]
    NoAddress(DbId),

    #[error("Unknown notification template '{0}'")]
    UnknownTemplate(String),

    #[error(transparent)]
    Email(#[from] crate::delivery::email::EmailError),
}

/// Fire-and-forget delivery of a templated message.
///
/// Callers log failures and carry on; a failed send never undoes the state
/// change that triggered it.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        template_id: &str,
        recipient: &Recipient,
        payload: &serde_json::Value,
    ) -> Result<(), NotificationError>;
}
