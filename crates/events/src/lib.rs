//! Domain events and teacher notifications.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the envelope published after a state change commits.
//! - [`NotificationSender`]: the delivery seam, with SMTP and log-only
//!   implementations in [`delivery`].
//! - [`NotificationDispatcher`]: background task turning events into
//!   notifications. Delivery failures are logged and dropped.

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod sender;
pub mod templates;

pub use bus::{EventBus, DomainEvent};
pub use delivery::email::{EmailConfig, EmailNotificationSender};
pub use delivery::log::LogNotificationSender;
pub use dispatcher::NotificationDispatcher;
pub use sender::{NotificationError, NotificationSender, Recipient};
