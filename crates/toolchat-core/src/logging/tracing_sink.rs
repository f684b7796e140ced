//! Logger that forwards into `tracing`

use super::traits::Logger;

/// Forwards log lines to the `tracing` macros under the `toolchat` target.
///
/// Hosts that install a `tracing-subscriber` get these as structured events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "toolchat", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "toolchat", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "toolchat", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "toolchat", "{}", message);
    }
}
