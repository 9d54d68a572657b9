//! Outbound notifications.

pub mod mailer;

pub use mailer::LogMailer;
