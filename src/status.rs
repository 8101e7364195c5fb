//! Transient status line shown while a turn is in progress

use std::sync::Arc;

/// Receives short progress messages; an empty message clears the line
pub trait StatusSink: Send + Sync {
    /// Show `message`
    fn status(&self, message: &str);
}

impl<F> StatusSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn status(&self, message: &str) {
        self(message);
    }
}

/// Shared handle, cheap to pass into background speech tasks
pub type SharedStatus = Arc<dyn StatusSink>;

/// Sink that drops every message
pub struct NoStatus;

impl StatusSink for NoStatus {
    fn status(&self, _message: &str) {}
}

/// A sink that ignores status updates
#[must_use]
pub fn silent() -> SharedStatus {
    Arc::new(NoStatus)
}
