//! [`NotificationSender`](crate::sender::NotificationSender) implementations.

pub mod email;
pub mod log;
