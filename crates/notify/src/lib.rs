//! `recordflow-notify`; notification rules fired on record lifecycle events.
//!
//! Notification is advisory: a failure here must never roll back or block
//! the business operation that triggered it. This is the one place in the
//! engine where errors are recovered locally; every internal failure is
//! caught, logged, and counted, and `fire` never returns an error.

pub mod engine;
pub mod rule;
pub mod template;

pub use engine::{
    Directory, DirectoryError, FireContext, FireReport, Notification, NotificationEngine,
    NotificationSink, SinkError,
};
pub use rule::{NotificationRule, NotifyTarget, Trigger};
pub use template::expand_template;
