//! Turns committed domain events into teacher notifications.
//!
//! [`NotificationDispatcher`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and, for each event, resolves the affected teachers from the roster and
//! hands a templated message to the configured [`NotificationSender`].
//! Failures are logged; they never feed back into the engine.

use std::sync::Arc;

use presensi_core::types::DbId;
use presensi_db::repositories::UserRepo;
use presensi_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::{self, DomainEvent};
use crate::sender::{NotificationSender, Recipient};
use crate::templates;

/// Who gets which template for an event.
pub fn plan(event: &DomainEvent) -> Vec<(DbId, &'static str)> {
    let mut deliveries = Vec::new();
    match event.event_type.as_str() {
        bus::LEAVE_APPROVED => {
            if let Some(teacher) = event.payload_id("teacher_id") {
                deliveries.push((teacher, templates::LEAVE_APPROVED));
            }
            if let Some(substitute) = event.payload_id("substitute_teacher_id") {
                deliveries.push((substitute, templates::SUBSTITUTE_FOR_LEAVE));
            }
        }
        bus::LEAVE_REJECTED => {
            if let Some(teacher) = event.payload_id("teacher_id") {
                deliveries.push((teacher, templates::LEAVE_REJECTED));
            }
        }
        bus::SUBSTITUTE_ASSIGNED => {
            if let Some(substitute) = event.payload_id("substitute_teacher_id") {
                deliveries.push((substitute, templates::SUBSTITUTE_FOR_PERIOD));
            }
        }
        _ => {}
    }
    deliveries
}

pub struct NotificationDispatcher {
    pool: DbPool,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationDispatcher {
    pub fn new(pool: DbPool, sender: Arc<dyn NotificationSender>) -> Self {
        Self { pool, sender }
    }

    /// Run the dispatch loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.dispatch(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Notification dispatcher lagged, some notifications were not sent"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, event: &DomainEvent) {
        for (user_id, template_id) in plan(event) {
            let user = match UserRepo::find_by_id(&self.pool, user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    tracing::warn!(user_id, template_id, "Notification recipient not found");
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, user_id, "Failed to load notification recipient");
                    continue;
                }
            };

            let recipient = Recipient {
                user_id: user.id,
                name: user.name,
                email: user.email,
            };
            if let Err(e) = self.sender.send(template_id, &recipient, &event.payload).await {
                tracing::warn!(
                    error = %e,
                    user_id,
                    template_id,
                    event_type = %event.event_type,
                    "Failed to deliver notification"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn approval_notifies_teacher_and_substitute() {
        let event = DomainEvent::new(bus::LEAVE_APPROVED)
            .with_payload(json!({"teacher_id": 5, "substitute_teacher_id": 6}));
        assert_eq!(
            plan(&event),
            vec![(5, templates::LEAVE_APPROVED), (6, templates::SUBSTITUTE_FOR_LEAVE)]
        );
    }

    #[test]
    fn approval_without_substitute_notifies_teacher_only() {
        let event = DomainEvent::new(bus::LEAVE_APPROVED)
            .with_payload(json!({"teacher_id": 5, "substitute_teacher_id": null}));
        assert_eq!(plan(&event), vec![(5, templates::LEAVE_APPROVED)]);
    }

    #[test]
    fn rejection_notifies_teacher() {
        let event = DomainEvent::new(bus::LEAVE_REJECTED).with_payload(json!({"teacher_id": 5}));
        assert_eq!(plan(&event), vec![(5, templates::LEAVE_REJECTED)]);
    }

    #[test]
    fn single_period_assignment_notifies_substitute() {
        let event = DomainEvent::new(bus::SUBSTITUTE_ASSIGNED)
            .with_payload(json!({"substitute_teacher_id": 8, "teacher_id": 5}));
        assert_eq!(plan(&event), vec![(8, templates::SUBSTITUTE_FOR_PERIOD)]);
    }

    #[test]
    fn submissions_notify_nobody() {
        let event = DomainEvent::new(bus::LEAVE_SUBMITTED).with_payload(json!({"teacher_id": 5}));
        assert!(plan(&event).is_empty());
    }
}
